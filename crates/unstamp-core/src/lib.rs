//! Watermark and logo removal for Bundesgesetzblatt PDFs.
//!
//! The engine takes a PDF, has an external codec (`qpdf`) expand its stream
//! filters into editable plain text, removes the vendor watermark line and
//! logo image from every page, rewrites the Info dictionary, and has the
//! codec linearize the result back into a compact, valid document. Files
//! are overwritten in place with a backup of the original kept next to
//! them; the backup doubles as the idempotence guard for re-runs.
//!
//! ```no_run
//! use unstamp_core::{DocumentMeta, Options, QpdfCodec, Stripper};
//!
//! # fn main() -> Result<(), unstamp_core::UnstampError> {
//! let stripper = Stripper::new(QpdfCodec::default(), Options::default());
//! stripper.process_file(
//!     std::path::Path::new("bgbl1_2019_1.pdf"),
//!     &DocumentMeta::default(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod document;
pub mod error;
pub mod logo;
pub mod metadata;
pub mod process;
pub mod tokenizer;
pub mod watermark;

pub use codec::{QpdfCodec, StreamCodec};
pub use document::{PageRef, PdfFile};
pub use error::UnstampError;
pub use logo::{LogoHeuristic, LogoMatch};
pub use process::{
    DocumentMeta, Edited, Options, Outcome, PageWarning, Report, Stripper,
};
