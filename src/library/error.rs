use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid user id: {0:?}")]
    InvalidSession(String),

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("{0} is not a PDF file")]
    NotPdf(String),

    #[error("No file with id {0}")]
    NotFound(Uuid),

    #[error("Upload was cancelled")]
    Cancelled,

    #[error("Upload task failed: {0}")]
    Task(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt library index {path}: {source}")]
    Index {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LibraryError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        LibraryError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
