use anyhow::{Context, Result};
use cloudpdf::pdf::{PdfDocument, Rgb, TextStyle};
use cloudpdf::placement::{to_native_coordinate, ScreenClick};
use std::path::Path;

pub struct AnnotateOptions {
    /// 1-based page number
    pub page: u32,
    pub click: ScreenClick,
    pub text: String,
    pub color: String,
    pub font_size: f32,
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    options: &AnnotateOptions,
    output: Q,
) -> Result<()> {
    let mut doc = PdfDocument::open(&input)?;
    let total_pages = doc.page_count();
    if options.page < 1 || options.page > total_pages {
        anyhow::bail!(
            "Invalid page number: {}. Must be between 1 and {}.",
            options.page,
            total_pages
        );
    }
    let index = options.page - 1;

    let style = TextStyle {
        font_size: options.font_size,
        color: options.color.parse::<Rgb>()?,
    };
    let at = to_native_coordinate(&options.click, doc.page_size(index)?)
        .context("Cannot place text on the page")?;

    doc.draw_text(index, &options.text, at, &style)?;
    doc.save(&output)?;

    tracing::info!(
        input = %input.as_ref().display(),
        page = options.page,
        x = at.x,
        y = at.y,
        "annotated page"
    );
    println!(
        "Added text to page {} at ({:.2}, {:.2}) in {}",
        options.page,
        at.x,
        at.y,
        output.as_ref().display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpdf::pdf::testing::{as_number, create_test_pdf, page_labels};
    use lopdf::content::Content;

    fn options(text: &str, font_size: f32) -> AnnotateOptions {
        AnnotateOptions {
            page: 1,
            click: ScreenClick {
                x: 100.0,
                y: 50.0,
                container_width: 200.0,
                container_height: 300.0,
            },
            text: text.to_string(),
            color: "#FF0000".to_string(),
            font_size,
        }
    }

    #[test]
    fn test_annotate_writes_text_at_mapped_point() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, create_test_pdf(2, "A", 400, 600)).unwrap();

        run(&input, &options("Approved", 18.0), &output).unwrap();

        let doc = PdfDocument::open(&output).unwrap();
        let page_id = doc.page_id(0).unwrap();
        let ops = Content::decode(&doc.doc.get_page_content(page_id).unwrap())
            .unwrap()
            .operations;
        let td = ops.iter().rev().find(|op| op.operator == "Td").unwrap();
        assert_eq!(as_number(&td.operands[0]), 200.0);
        assert_eq!(as_number(&td.operands[1]), 500.0);
        let tf = ops.iter().rev().find(|op| op.operator == "Tf").unwrap();
        assert_eq!(as_number(&tf.operands[1]), 18.0);
        assert_eq!(page_labels(&doc.doc), vec!["A-Page-1 Approved", "A-Page-2"]);
    }

    #[test]
    fn test_annotate_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, create_test_pdf(1, "A", 400, 600)).unwrap();

        assert!(run(&input, &options("  ", 12.0), &output).is_err());
        assert!(run(&input, &options("x", -1.0), &output).is_err());
        assert!(run(&input, &options("x", f32::NAN), &output).is_err());

        let mut past_end = options("x", 12.0);
        past_end.page = 2;
        assert!(run(&input, &past_end, &output).is_err());
        assert!(!output.exists());
    }
}
