pub mod document;
pub mod error;
pub mod merge;
pub mod text;

pub use document::{PdfDocument, PdfInfo};
pub use error::PdfError;
pub use merge::merge_documents;
pub use text::{Rgb, TextStyle};

#[doc(hidden)]
pub mod testing;
