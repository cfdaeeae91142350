//! Per-document orchestration.
//!
//! One document runs fully sequentially: decompress, parse, fix metadata,
//! strip pages in document order, serialize, recompress, back up, write.
//! Any fatal error leaves the file on disk completely untouched. Callers
//! may run independent documents in parallel; a `Stripper` holds only
//! read-only configuration and is shared freely across workers.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::{info, warn};

use crate::codec::StreamCodec;
use crate::document::{PageRef, PdfFile};
use crate::error::UnstampError;
use crate::logo::{self, LogoHeuristic, LogoMatch};
use crate::metadata;
use crate::watermark;

/// Per-document record from the metadata provider.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creation_date: Option<DateTime<FixedOffset>>,
    /// Derived from publication kind and year by the provider; gates the
    /// watermark and logo passes.
    #[serde(default = "default_watermarked")]
    pub likely_watermarked: bool,
}

fn default_watermarked() -> bool {
    true
}

impl Default for DocumentMeta {
    fn default() -> Self {
        DocumentMeta {
            title: None,
            creation_date: None,
            likely_watermarked: true,
        }
    }
}

/// Non-fatal per-page findings; the document still completes. These are
/// the signal for manual review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageWarning {
    /// Page has XObjects but none matched the logo heuristic.
    LogoNotFound { page: u32 },
    /// Neither the literal patterns nor the token scan matched.
    WatermarkNotFound { page: u32 },
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageWarning::LogoNotFound { page } => write!(f, "no logo removed on page {page}"),
            PageWarning::WatermarkNotFound { page } => {
                write!(f, "no watermark removed on page {page}")
            }
        }
    }
}

/// Result of editing a document in memory.
#[derive(Debug)]
pub struct Edited {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub warnings: Vec<PageWarning>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub pages: usize,
    pub warnings: Vec<PageWarning>,
    pub backup_path: PathBuf,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Processed(Report),
    /// Backup already present and `force` not set; nothing was touched.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Re-process even when a backup already exists.
    pub force: bool,
    /// Inserted before the `.pdf` extension of the backup file.
    pub backup_suffix: String,
    pub logo: LogoHeuristic,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            force: false,
            backup_suffix: "_watermarked".to_string(),
            logo: LogoHeuristic::default(),
        }
    }
}

pub struct Stripper<C> {
    codec: C,
    options: Options,
}

impl<C: StreamCodec> Stripper<C> {
    pub fn new(codec: C, options: Options) -> Self {
        Stripper { codec, options }
    }

    /// Runs the full edit pipeline on in-memory bytes.
    pub fn process_bytes(
        &self,
        bytes: &[u8],
        meta: &DocumentMeta,
    ) -> Result<Edited, UnstampError> {
        let decompressed = self.codec.decompress(bytes)?;
        let mut pdf = PdfFile::parse(&decompressed)?;
        let pages = pdf.pages();

        metadata::fix_metadata(&mut pdf, meta.title.as_deref(), meta.creation_date)?;

        let mut warnings = Vec::new();
        if meta.likely_watermarked {
            for page in &pages {
                self.strip_page(&mut pdf, *page, &mut warnings)?;
            }
        }

        let edited = pdf.save()?;
        let recompressed = self.codec.recompress(&edited)?;
        Ok(Edited {
            bytes: recompressed,
            pages: pages.len(),
            warnings,
        })
    }

    fn strip_page(
        &self,
        pdf: &mut PdfFile,
        page: PageRef,
        warnings: &mut Vec<PageWarning>,
    ) -> Result<(), UnstampError> {
        let entries = pdf.xobjects(page)?;
        let had_xobjects = !entries.is_empty();
        let mut removed_logo = false;

        for (name, dict) in entries {
            let class = match &dict {
                Some(dict) => self.options.logo.classify(dict),
                None => LogoMatch::Unreadable,
            };
            match class {
                LogoMatch::Logo => {
                    pdf.remove_xobject(page, &name)?;
                    let content = pdf.page_content(page)?;
                    // resource name `X3` paints as `/X3`
                    let stripped = logo::excise_image_paint(&content, &name);
                    pdf.set_page_content(page, &stripped)?;
                    removed_logo = true;
                }
                LogoMatch::NotLogo => {}
                LogoMatch::Unreadable => {
                    warn!(
                        page = page.number,
                        name = %name,
                        "unreadable XObject attributes, treating as non-logo"
                    );
                }
            }
        }
        if had_xobjects && !removed_logo {
            warn!(page = page.number, "no logo removed");
            warnings.push(PageWarning::LogoNotFound { page: page.number });
        }

        let content = pdf.page_content(page)?;
        match watermark::remove_watermark(&content) {
            Some(stripped) => pdf.set_page_content(page, &stripped)?,
            None => {
                warn!(page = page.number, "no watermark removed");
                warnings.push(PageWarning::WatermarkNotFound { page: page.number });
            }
        }
        Ok(())
    }

    /// The backup path: original name with the suffix before `.pdf`.
    pub fn backup_path(&self, path: &Path) -> PathBuf {
        let mut name = path.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
        name.push(&self.options.backup_suffix);
        name.push(".pdf");
        path.with_file_name(name)
    }

    /// Processes one file in place, keeping a backup of the original.
    ///
    /// The idempotence guard runs before anything else: when the backup is
    /// already present and `force` is not set, the document was processed
    /// by an earlier run and is skipped. The edited bytes go through a
    /// same-directory temp file persisted over the original, so a failure
    /// at any stage leaves the original visible and intact.
    pub fn process_file(
        &self,
        path: &Path,
        meta: &DocumentMeta,
    ) -> Result<Outcome, UnstampError> {
        let backup = self.backup_path(path);
        if !self.options.force && backup.exists() {
            info!(path = %path.display(), "backup present, skipping");
            return Ok(Outcome::Skipped);
        }

        let original = fs::read(path)?;
        let edited = self.process_bytes(&original, meta)?;

        fs::copy(path, &backup)?;
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut output = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        output.write_all(&edited.bytes)?;
        output.flush()?;
        output.persist(path).map_err(|e| UnstampError::Io(e.error))?;

        info!(
            path = %path.display(),
            pages = edited.pages,
            warnings = edited.warnings.len(),
            "document processed"
        );
        Ok(Outcome::Processed(Report {
            pages: edited.pages,
            warnings: edited.warnings,
            backup_path: backup,
        }))
    }
}
