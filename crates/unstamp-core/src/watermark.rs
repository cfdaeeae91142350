//! Removal of the vendor watermark line from page content streams.
//!
//! Different PDF producers emitted the same sentence either as a single
//! literal `Tj` show or as a kerned array `TJ` show. The known literal
//! forms are tried first; when none matches, a token scan locates the
//! show operation by its start and end fragments.

use crate::tokenizer::{self, TokenKind};

const EXACT_TJ: &str = "\n(Das Bundesgesetzblatt im Internet: www.bundesgesetzblatt\
.de | Ein Service des Bundesanzeiger Verlag www.bundesanzei\
ger-verlag.de)Tj";

const EXACT_KERNED_TJ: &str = "\n[(Das Bundesgesetzblatt im Internet: www)55(.bundesgesetzblatt.de \
| Ein Service des Bundesanzeiger V)55(erlag www)55(.bundesanzeiger\
-verlag.de)]TJ";

/// Known literal forms of the watermark line.
pub const WATERMARK_LINES: &[&str] = &[EXACT_TJ, EXACT_KERNED_TJ];

const NEEDLE_START: &str = "(Das Bundesgesetzblatt im Internet";
const NEEDLE_END: &str = "ger-verlag.de)";

enum Pass {
    Exact(&'static str),
    TokenScan,
}

// Ordered; first success wins. New producer variants go in front of the
// token scan.
const PASSES: &[Pass] = &[
    Pass::Exact(EXACT_TJ),
    Pass::Exact(EXACT_KERNED_TJ),
    Pass::TokenScan,
];

/// Returns the stream text with the watermark show operation removed, or
/// `None` when no pass matched. The page is then left unmodified.
pub fn remove_watermark(stream: &str) -> Option<String> {
    PASSES.iter().find_map(|pass| match pass {
        Pass::Exact(line) => stream
            .contains(line)
            .then(|| stream.replace(line, "")),
        Pass::TokenScan => token_scan(stream),
    })
}

/// Locates the semantic span of the watermark sentence when no literal
/// form matches: the last token carrying the start fragment through the
/// last token carrying the end fragment, widened to the enclosing `[`
/// and the terminating `Tj`/`TJ`. The scan order is load-bearing; it
/// mirrors the behavior the removal is validated against.
fn token_scan(stream: &str) -> Option<String> {
    let tokens = tokenizer::tokenize(stream);

    let mut start = None;
    let mut end = None;
    for (i, token) in tokens.iter().enumerate() {
        if token.text.contains(NEEDLE_START) {
            start = Some(i);
            continue;
        }
        if token.text.contains(NEEDLE_END) {
            end = Some(i);
        }
    }
    let (mut start, mut end) = (start?, end?);

    // the kerned form opens an array right before the first fragment
    if start > 0 && tokens[start - 1].kind == TokenKind::ArrayOpen {
        start -= 1;
    }
    // extend to the show operator that terminates the operation
    while !tokens[end].text.eq_ignore_ascii_case("TJ") {
        end += 1;
        if end == tokens.len() {
            return None;
        }
    }
    end += 1;

    let kept: Vec<_> = tokens[..start]
        .iter()
        .chain(&tokens[end..])
        .cloned()
        .collect();
    Some(tokenizer::join(&kept))
}
