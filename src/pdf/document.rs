use super::error::PdfError;
use crate::page_range::PageIndexSet;
use crate::placement::NativePageSize;
use lopdf::{Document, Object, ObjectId};
use std::path::Path;

/// Parent links followed when looking up inherited page attributes
const MAX_TREE_DEPTH: usize = 32;

/// US Letter, used when no MediaBox can be found
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

pub struct PdfDocument {
    pub doc: Document,
    pub label: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let label = path.as_ref().display().to_string();
        let doc = Document::load(&path).map_err(|source| PdfError::Open {
            path: label.clone(),
            source,
        })?;
        Ok(PdfDocument { doc, label })
    }

    pub fn from_bytes(bytes: &[u8], label: impl Into<String>) -> Result<Self, PdfError> {
        let label = label.into();
        let doc = Document::load_mem(bytes).map_err(|source| PdfError::Open {
            path: label.clone(),
            source,
        })?;
        Ok(PdfDocument { doc, label })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Page object ID for a zero-based page index
    pub fn page_id(&self, index: u32) -> Result<ObjectId, PdfError> {
        self.doc
            .get_pages()
            .get(&(index + 1))
            .copied()
            .ok_or(PdfError::PageOutOfRange {
                index,
                total: self.page_count(),
            })
    }

    /// The page's MediaBox as `[llx, lly, urx, ury]`, following inheritance
    pub fn page_box(&self, index: u32) -> Result<[f32; 4], PdfError> {
        let page_id = self.page_id(index)?;
        let media_box = match find_inherited(&self.doc, page_id, b"MediaBox") {
            Some(Object::Reference(id)) => self.doc.get_object(*id)?,
            Some(obj) => obj,
            None => return Ok(DEFAULT_MEDIA_BOX),
        };

        let values = media_box
            .as_array()?
            .iter()
            .map(|obj| match obj {
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r as f32),
                _ => None,
            })
            .collect::<Option<Vec<f32>>>();

        match values.as_deref() {
            Some(&[llx, lly, urx, ury]) => Ok([
                llx.min(urx),
                lly.min(ury),
                llx.max(urx),
                lly.max(ury),
            ]),
            _ => Err(PdfError::MalformedPageTree(format!(
                "page {} has an unreadable MediaBox",
                index + 1
            ))),
        }
    }

    /// Native width and height of a page
    pub fn page_size(&self, index: u32) -> Result<NativePageSize, PdfError> {
        let [llx, lly, urx, ury] = self.page_box(index)?;
        Ok(NativePageSize {
            width: urx - llx,
            height: ury - lly,
        })
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
            }
        }

        info.page_count = self.page_count();
        info
    }

    /// Copy the selected pages, in ascending order, into a new document
    pub fn copy_pages(&self, indices: &PageIndexSet) -> Result<PdfDocument, PdfError> {
        let total = self.page_count();
        if let Some(index) = indices.iter().find(|&index| index >= total) {
            return Err(PdfError::PageOutOfRange { index, total });
        }

        let pages_to_delete: Vec<u32> = (0..total)
            .filter(|&index| !indices.contains(index))
            .map(|index| index + 1)
            .collect();

        let mut new_doc = self.doc.clone();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
        }
        new_doc.prune_objects();

        tracing::debug!(
            source = %self.label,
            kept = indices.len(),
            deleted = pages_to_delete.len(),
            "copied pages"
        );

        Ok(PdfDocument {
            doc: new_doc,
            label: format!("{} (pages {})", self.label, indices),
        })
    }

    /// Serialize to PDF bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|source| PdfError::Save {
                path: self.label.clone(),
                source: source.into(),
            })?;
        Ok(buffer)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PdfError> {
        self.doc.save(&path).map_err(|source| PdfError::Save {
            path: path.as_ref().display().to_string(),
            source: source.into(),
        })?;
        Ok(())
    }
}

/// Look up a page attribute, walking up the page tree if the page itself
/// does not carry it
pub(crate) fn find_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node_id = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16 BE with BOM, otherwise treat as PDFDocEncoding (approximated as Latin-1)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
