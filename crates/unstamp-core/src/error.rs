use thiserror::Error;

/// Fatal errors; any of these aborts the current document.
///
/// Heuristic misses are not errors, they are reported as
/// [`PageWarning`](crate::process::PageWarning)s.
#[derive(Error, Debug)]
pub enum UnstampError {
    /// The external stream codec exited non-zero.
    #[error("stream codec exited with status {status}: {stderr}")]
    Codec {
        status: i32,
        stdout: String,
        stderr: String,
    },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
