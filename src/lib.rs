//! Page selection, coordinate mapping and PDF editing for cloudpdf.
//!
//! [`page_range::resolve`] turns expressions like `"1-3, 5"` into zero-based
//! page indices, [`placement::to_native_coordinate`] maps clicks on a page
//! preview into PDF user space, and [`pdf::PdfDocument`] applies both to
//! real documents. [`library::Library`] keeps a user's files on disk.

pub mod library;
pub mod page_range;
pub mod pdf;
pub mod placement;
