//! Subprocess bridge to the external stream codec (`qpdf`).

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::UnstampError;

/// Decompresses and recompresses PDF stream data. Bytes in, bytes out;
/// non-zero exit is fatal for the document and is never retried, since a
/// half-transformed state cannot be re-derived without the original.
pub trait StreamCodec {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, UnstampError>;
    fn recompress(&self, bytes: &[u8]) -> Result<Vec<u8>, UnstampError>;
}

/// `qpdf`-backed codec. Decompression expands all stream filters into
/// editable plain text; recompression linearizes the edited result into a
/// compact, spec-valid file.
///
/// `qpdf` needs random access to its input, so the bytes go through a
/// temp file; the transformed document is read from stdout.
#[derive(Debug, Clone)]
pub struct QpdfCodec {
    program: PathBuf,
}

impl QpdfCodec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        QpdfCodec {
            program: program.into(),
        }
    }

    fn run(&self, flag: &str, bytes: &[u8]) -> Result<Vec<u8>, UnstampError> {
        let mut input = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        input.write_all(bytes)?;
        input.flush()?;

        debug!(program = %self.program.display(), flag, "invoking stream codec");
        let output = Command::new(&self.program)
            .arg(flag)
            .arg(input.path())
            .arg("-")
            .output()?;

        if !output.status.success() {
            return Err(UnstampError::Codec {
                status: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }
}

impl Default for QpdfCodec {
    fn default() -> Self {
        QpdfCodec::new("qpdf")
    }
}

impl StreamCodec for QpdfCodec {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, UnstampError> {
        self.run("--stream-data=uncompress", bytes)
    }

    fn recompress(&self, bytes: &[u8]) -> Result<Vec<u8>, UnstampError> {
        self.run("--linearize", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_program_surfaces_status_and_stderr() {
        // `false` exits 1 without reading its arguments
        let codec = QpdfCodec::new("false");
        match codec.decompress(b"%PDF-1.7") {
            Err(UnstampError::Codec { status, .. }) => assert_eq!(status, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let codec = QpdfCodec::new("/nonexistent/qpdf");
        assert!(matches!(
            codec.decompress(b"%PDF-1.7"),
            Err(UnstampError::Io(_))
        ));
    }
}
