//! Batch watermark removal over single files or directory trees.
//!
//! Each document is processed fully sequentially; independent documents
//! run on a bounded rayon pool. A worker owns its document exclusively,
//! the stripper configuration is shared read-only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::{error, info, warn};
use unstamp_core::{DocumentMeta, Options, Outcome, QpdfCodec, Stripper};

#[derive(Parser, Debug)]
#[command(name = "unstamp", about = "Remove vendor watermarks and logos from PDF files")]
struct Args {
    /// A .pdf file, or a directory searched recursively
    path: PathBuf,

    /// Re-process documents even when a backup already exists
    #[arg(long)]
    force: bool,

    /// Worker threads for independent documents
    #[arg(long)]
    jobs: Option<usize>,

    /// JSON map of file name to {title, creation_date, likely_watermarked}
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Path to the qpdf binary
    #[arg(long, default_value = "qpdf")]
    qpdf: PathBuf,
}

fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.extension().is_some_and(|ext| ext == "pdf") {
        return Ok(vec![path.to_path_buf()]);
    }
    let pattern = path.join("**/*.pdf");
    let pattern = pattern.to_str().context("path is not valid UTF-8")?;

    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        let file = entry?;
        let name = file.file_name().and_then(|n| n.to_str()).unwrap_or("");
        // leftovers of earlier runs
        if name.ends_with("_watermarked.pdf") || name.ends_with("_original.pdf") {
            continue;
        }
        files.push(file);
    }
    Ok(files)
}

fn load_meta(path: Option<&Path>) -> Result<HashMap<String, DocumentMeta>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).context("parsing metadata map")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let files = collect_files(&args.path)?;
    if files.is_empty() {
        info!(path = %args.path.display(), "no PDF files found");
        return Ok(());
    }
    let meta_map = load_meta(args.meta.as_deref())?;

    let stripper = Stripper::new(
        QpdfCodec::new(&args.qpdf),
        Options {
            force: args.force,
            ..Options::default()
        },
    );

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("building worker pool")?;
    }

    let failures: usize = files
        .par_iter()
        .map(|file| {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let meta = meta_map.get(name).cloned().unwrap_or_default();
            match stripper.process_file(file, &meta) {
                Ok(Outcome::Processed(report)) => {
                    for warning in &report.warnings {
                        warn!(file = %file.display(), %warning);
                    }
                    0
                }
                Ok(Outcome::Skipped) => 0,
                Err(err) => {
                    error!(file = %file.display(), %err, "processing failed");
                    1
                }
            }
        })
        .sum();

    if failures > 0 {
        bail!("{failures} of {} documents failed", files.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_files_single_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();
        assert_eq!(collect_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_files_skips_backups() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("a_watermarked.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("b_original.pdf"), b"%PDF-1.4").unwrap();
        assert_eq!(
            collect_files(dir.path()).unwrap(),
            vec![dir.path().join("a.pdf")]
        );
    }

    #[test]
    fn test_collect_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("2019/1")).unwrap();
        std::fs::write(dir.path().join("2019/1/a.pdf"), b"%PDF-1.4").unwrap();
        assert_eq!(
            collect_files(dir.path()).unwrap(),
            vec![dir.path().join("2019/1/a.pdf")]
        );
    }

    #[test]
    fn test_load_meta_without_file_is_empty() {
        assert!(load_meta(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_meta_parses_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(
            &path,
            r#"{"a.pdf": {"title": "BGBl. I", "likely_watermarked": false}}"#,
        )
        .unwrap();
        let map = load_meta(Some(&path)).unwrap();
        let record = &map["a.pdf"];
        assert_eq!(record.title.as_deref(), Some("BGBl. I"));
        assert!(!record.likely_watermarked);
    }
}
