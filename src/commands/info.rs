use anyhow::Result;
use cloudpdf::pdf::PdfDocument;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let info = doc.get_info();

    println!("File: {}", path.as_ref().display());
    println!("Pages: {}", info.page_count);

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }

    for index in 0..info.page_count {
        let size = doc.page_size(index)?;
        println!("  p{}: {} x {} pt", index + 1, size.width, size.height);
    }

    Ok(())
}

fn format_pdf_date(date: &str) -> String {
    // PDF date format: D:YYYYMMDDHHmmSSOHH'mm
    match date.strip_prefix("D:") {
        Some(d) if d.len() >= 8 && d.is_ascii() => {
            let time = if d.len() >= 14 {
                format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14])
            } else {
                String::new()
            };
            format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time)
        }
        _ => date.to_string(),
    }
}
