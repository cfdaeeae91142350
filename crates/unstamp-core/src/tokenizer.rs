//! Content-stream lexer.
//!
//! Splits a decompressed content stream into tokens following the PDF
//! lexical rules: whitespace separates, `[ ] { } / ( ) < > %` delimit.
//! Token text keeps the original characters (string tokens include their
//! parentheses), so rejoining all tokens with `\n` reproduces an
//! operationally equivalent stream.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// `(...)` literal or `<...>` hex string, delimiters included
    String,
    /// `/Name`
    Name,
    /// `<<`, `>>`, `{`, `}` and stray closing delimiters
    Delimiter,
    /// Numbers and operators
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c' | '\0')
}

fn is_regular(c: char) -> bool {
    !is_whitespace(c)
        && !matches!(
            c,
            '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}' | '/' | '%'
        )
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if is_whitespace(c) => i += 1,
            '%' => {
                // comment to end of line
                while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                    i += 1;
                }
            }
            '[' => {
                tokens.push(Token::new(TokenKind::ArrayOpen, "["));
                i += 1;
            }
            ']' => {
                tokens.push(Token::new(TokenKind::ArrayClose, "]"));
                i += 1;
            }
            '{' | '}' | ')' => {
                tokens.push(Token::new(TokenKind::Delimiter, c.to_string()));
                i += 1;
            }
            '(' => {
                let start = i;
                let mut depth = 1;
                i += 1;
                while i < chars.len() && depth > 0 {
                    match chars[i] {
                        // skip the escaped char, unless the stream ends here
                        '\\' if i + 1 < chars.len() => i += 1,
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }
                tokens.push(Token::new(
                    TokenKind::String,
                    chars[start..i].iter().collect::<String>(),
                ));
            }
            '<' => {
                if chars.get(i + 1) == Some(&'<') {
                    tokens.push(Token::new(TokenKind::Delimiter, "<<"));
                    i += 2;
                } else {
                    let start = i;
                    i += 1;
                    while i < chars.len() && chars[i] != '>' {
                        i += 1;
                    }
                    if i < chars.len() {
                        i += 1;
                    }
                    tokens.push(Token::new(
                        TokenKind::String,
                        chars[start..i].iter().collect::<String>(),
                    ));
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'>') {
                    tokens.push(Token::new(TokenKind::Delimiter, ">>"));
                    i += 2;
                } else {
                    tokens.push(Token::new(TokenKind::Delimiter, ">"));
                    i += 1;
                }
            }
            '/' => {
                let start = i;
                i += 1;
                while i < chars.len() && is_regular(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::new(
                    TokenKind::Name,
                    chars[start..i].iter().collect::<String>(),
                ));
            }
            _ => {
                let start = i;
                while i < chars.len() && is_regular(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::new(
                    TokenKind::Word,
                    chars[start..i].iter().collect::<String>(),
                ));
            }
        }
    }

    tokens
}

/// Reassembles tokens into stream text. `\n` keeps operand/operator
/// boundaries valid for every token kind.
pub fn join(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
