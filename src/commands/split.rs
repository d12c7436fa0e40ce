use anyhow::{Context, Result};
use cloudpdf::page_range::resolve;
use cloudpdf::pdf::PdfDocument;
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(input: P, pages: &str, output: Option<PathBuf>) -> Result<()> {
    let input = input.as_ref();
    let doc = PdfDocument::open(input)?;
    let total_pages = doc.page_count();

    let indices = resolve(pages, total_pages)
        .with_context(|| format!("Cannot select pages from {}", input.display()))?;

    let output = output.unwrap_or_else(|| default_output_path(input, pages));
    let mut new_doc = doc.copy_pages(&indices)?;
    new_doc.save(&output)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        pages = %indices,
        "split document"
    );
    println!(
        "Extracted {} page(s) ({}) to {}",
        indices.len(),
        indices,
        output.display()
    );

    Ok(())
}

/// `report.pdf` with pages "1-3, 5" becomes `report_pages_1-3,_5.pdf` next to it
fn default_output_path(input: &Path, pages: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("split");
    let suffix: String = pages
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ',' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    input.with_file_name(format!("{}_pages_{}.pdf", stem, suffix))
}
