use anyhow::Result;
use cloudpdf::page_range::resolve;
use cloudpdf::pdf::PdfDocument;
use std::path::Path;

/// Print the zero-based indices a page range expression selects
pub fn run<P: AsRef<Path>>(pages: &str, total: Option<u32>, path: Option<P>) -> Result<()> {
    let total_pages = match (total, path) {
        (Some(total), _) => total,
        (None, Some(path)) => PdfDocument::open(path)?.page_count(),
        (None, None) => anyhow::bail!("Either --total or a PDF path is required"),
    };

    let indices = resolve(pages, total_pages)?;
    println!("Pages: {}", indices);
    println!("Indices: {}", serde_json::to_string(&indices)?);

    Ok(())
}
