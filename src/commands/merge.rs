use anyhow::{Context, Result};
use cloudpdf::pdf::{merge_documents, PdfDocument};
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<()> {
    if inputs.len() < 2 {
        anyhow::bail!("Please select at least two PDF files to merge");
    }

    let documents = inputs
        .iter()
        .map(PdfDocument::open)
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = merge_documents(documents).context("Failed to merge PDFs")?;
    let total_pages = merged.page_count();
    merged.save(&output)?;

    tracing::info!(
        inputs = inputs.len(),
        pages = total_pages,
        output = %output.as_ref().display(),
        "merged documents"
    );
    println!(
        "Merged {} files ({} pages) into {}",
        inputs.len(),
        total_pages,
        output.as_ref().display()
    );

    Ok(())
}
