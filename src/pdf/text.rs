use super::document::find_inherited;
use super::error::PdfError;
use super::PdfDocument;
use crate::placement::NativeCoordinate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Resource name the annotation font is registered under on each page
const FONT_RESOURCE: &str = "FCloudPdfHelv";

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").expect("valid regex")
});

/// An RGB color with components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl FromStr for Rgb {
    type Err = PdfError;

    /// Parse `#RRGGBB` (the leading `#` is optional)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = HEX_COLOR
            .captures(s.trim())
            .ok_or_else(|| PdfError::InvalidColor(s.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&caps[i], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| PdfError::InvalidColor(s.to_string()))
        };
        Ok(Rgb {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Rgb,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: 12.0,
            color: Rgb {
                r: 0.0,
                g: 0.0,
                b: 1.0,
            },
        }
    }
}

impl PdfDocument {
    /// Draw a line of Helvetica text on a page, baseline starting at `at`
    pub fn draw_text(
        &mut self,
        index: u32,
        text: &str,
        at: NativeCoordinate,
        style: &TextStyle,
    ) -> Result<(), PdfError> {
        if text.trim().is_empty() {
            return Err(PdfError::EmptyText);
        }
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(PdfError::InvalidFontSize(style.font_size));
        }
        let page_id = self.page_id(index)?;
        let encoded = encode_win_ansi(text)?;
        let [llx, lly, _, _] = self.page_box(index)?;

        add_font_resource(&mut self.doc, page_id)?;

        let Rgb { r, g, b } = style.color;
        let overlay = Content {
            operations: vec![
                // closes the q pushed in front of the existing content
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("rg", vec![r.into(), g.into(), b.into()]),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![FONT_RESOURCE.into(), style.font_size.into()]),
                Operation::new("Td", vec![(at.x + llx).into(), (at.y + lly).into()]),
                Operation::new("Tj", vec![Object::string_literal(encoded)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        wrap_page_content(&mut self.doc, page_id, overlay.encode()?)?;

        tracing::debug!(
            document = %self.label,
            page = index + 1,
            x = at.x,
            y = at.y,
            color = %style.color,
            "drew text"
        );
        Ok(())
    }
}

/// Helvetica with WinAnsiEncoding covers Latin-1 for our purposes
fn encode_win_ansi(text: &str) -> Result<Vec<u8>, PdfError> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| PdfError::UnencodableText(c)))
        .collect()
}

/// Give the page its own Resources dictionary that includes our font.
/// A page that already has the font keeps it.
fn add_font_resource(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfError> {
    let mut resources = match find_inherited(doc, page_id, b"Resources") {
        Some(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    if fonts.has(FONT_RESOURCE.as_bytes()) {
        return Ok(());
    }

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Bracket the existing content in q/Q and append `overlay` after it, so
/// whatever graphics state the page leaves behind does not leak into ours
fn wrap_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
) -> Result<(), PdfError> {
    let existing = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = vec![Object::Reference(save_id)];
    match existing {
        Some(Object::Array(streams)) => contents.extend(streams),
        Some(stream @ Object::Reference(_)) => contents.push(stream),
        _ => {}
    }
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}
