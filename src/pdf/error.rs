use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to open PDF {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("Failed to save PDF {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("Page index {index} is out of range (document has {total} pages)")]
    PageOutOfRange { index: u32, total: u32 },

    #[error("Malformed page tree: {0}")]
    MalformedPageTree(String),

    #[error("Invalid text color: {0} (expected #RRGGBB)")]
    InvalidColor(String),

    #[error("Cannot encode character {0:?} with the standard Helvetica font")]
    UnencodableText(char),

    #[error("Invalid font size: {0} (expected a positive number of points)")]
    InvalidFontSize(f32),

    #[error("No text to add")]
    EmptyText,

    #[error("No documents to merge")]
    NothingToMerge,

    #[error(transparent)]
    Lopdf(#[from] lopdf::Error),
}
