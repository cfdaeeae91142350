//! Heuristic detection and removal of the vendor logo image.
//!
//! The logo is recognized by its pixel dimensions rather than by object
//! identity, since every producer assigns it a different resource name.

use lopdf::Dictionary;
use regex::Regex;

pub const LOGO_HEIGHT: i64 = 26;
pub const LOGO_WIDTH: i64 = 113;
pub const THRESHOLD_RATIO: f64 = 0.05;

/// Outcome of classifying one XObject.
///
/// `Unreadable` is distinct from `NotLogo` so malformed attributes can be
/// told apart from legitimate non-logo images; both leave the object in
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoMatch {
    Logo,
    NotLogo,
    /// `Subtype`, `Width` or `Height` missing or not usable.
    Unreadable,
}

/// Reference dimensions and tolerance for the logo image.
#[derive(Debug, Clone)]
pub struct LogoHeuristic {
    pub height: i64,
    pub width: i64,
    pub ratio: f64,
    /// Stricter variant: when set, the XObject's `ColorSpace` name must
    /// match as well.
    pub color_space: Option<Vec<u8>>,
}

impl Default for LogoHeuristic {
    fn default() -> Self {
        LogoHeuristic {
            height: LOGO_HEIGHT,
            width: LOGO_WIDTH,
            ratio: THRESHOLD_RATIO,
            color_space: None,
        }
    }
}

impl LogoHeuristic {
    pub fn classify(&self, dict: &Dictionary) -> LogoMatch {
        let height = match dict.get(b"Height").and_then(|o| o.as_i64()) {
            Ok(h) => h,
            Err(_) => return LogoMatch::Unreadable,
        };
        let width = match dict.get(b"Width").and_then(|o| o.as_i64()) {
            Ok(w) => w,
            Err(_) => return LogoMatch::Unreadable,
        };
        let subtype = match dict.get(b"Subtype").and_then(|o| o.as_name()) {
            Ok(s) => s,
            Err(_) => return LogoMatch::Unreadable,
        };
        if height <= 0 || width <= 0 {
            return LogoMatch::Unreadable;
        }
        if subtype != b"Image" {
            return LogoMatch::NotLogo;
        }
        if let Some(required) = &self.color_space {
            match dict.get(b"ColorSpace").and_then(|o| o.as_name()) {
                Ok(name) if name == required.as_slice() => {}
                _ => return LogoMatch::NotLogo,
            }
        }
        let height_delta = (self.height - height).abs() as f64 / height as f64;
        let width_delta = (self.width - width).abs() as f64 / width as f64;
        if height_delta < self.ratio && width_delta < self.ratio {
            LogoMatch::Logo
        } else {
            LogoMatch::NotLogo
        }
    }
}

/// Excises every `q <matrix> cm /<name> Do Q` paint block for the named
/// XObject from the content text.
pub fn excise_image_paint(stream: &str, name: &str) -> String {
    let pattern = format!(
        r"\nq [\d\.]+ [\d\.]+ [\d\.]+ [\d\.]+ [\d\.]+ [\d\.]+ cm\n/{} Do\nQ",
        regex::escape(name)
    );
    // the pattern is fixed apart from the escaped name
    let re = Regex::new(&pattern).expect("image paint pattern");
    re.replace_all(stream, "").into_owned()
}
