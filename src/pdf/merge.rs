//! Combine several documents into one by appending their pages in order.

use super::document::find_inherited;
use super::error::PdfError;
use super::PdfDocument;
use lopdf::{Document, Object, ObjectId};

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge documents into the first one.
///
/// Every source object is imported with its ID shifted past the
/// destination's highest ID, then all pages are hung directly off the
/// destination's root Pages node. Pages get their inherited attributes
/// copied onto themselves first, since their old ancestors are dropped.
pub fn merge_documents(documents: Vec<PdfDocument>) -> Result<PdfDocument, PdfError> {
    let mut documents = documents.into_iter();
    let mut dest = documents.next().ok_or(PdfError::NothingToMerge)?;
    let mut labels = vec![dest.label.clone()];

    let mut page_refs = materialize_pages(&mut dest.doc)?;

    for source in documents {
        let mut source_doc = source.doc;
        let source_pages = materialize_pages(&mut source_doc)?;

        let id_offset = dest.doc.max_id;
        for (old_id, object) in std::mem::take(&mut source_doc.objects) {
            dest.doc
                .objects
                .insert(shift(old_id, id_offset), remap_object_refs(object, id_offset));
        }
        page_refs.extend(source_pages.into_iter().map(|id| shift(id, id_offset)));
        dest.doc.max_id = dest.doc.max_id.max(source_doc.max_id + id_offset);

        labels.push(source.label);
    }

    rebuild_page_tree(&mut dest.doc, &page_refs)?;
    dest.doc.prune_objects();
    dest.doc.renumber_objects();
    dest.doc.compress();

    tracing::debug!(documents = labels.len(), pages = page_refs.len(), "merged documents");

    dest.label = labels.join(" + ");
    Ok(dest)
}

fn shift(id: ObjectId, offset: u32) -> ObjectId {
    (id.0 + offset, id.1)
}

/// Copy inherited attributes onto every page and return the page IDs in order
fn materialize_pages(doc: &mut Document) -> Result<Vec<ObjectId>, PdfError> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for &page_id in &page_ids {
        let inherited: Vec<(&[u8], Object)> = {
            let page = doc.get_dictionary(page_id)?;
            INHERITABLE
                .iter()
                .filter(|key| !page.has(key))
                .filter_map(|key| find_inherited(doc, page_id, key).map(|v| (*key, v.clone())))
                .collect()
        };

        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(page_ids)
}

/// Recursively shift object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference(shift(id, offset)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the root Pages node at `page_refs` and reparent every page to it
fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfError> {
    let pages_id = doc
        .catalog()?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::MalformedPageTree("catalog has no Pages reference".into()))?;

    let pages_dict = doc
        .get_dictionary_mut(pages_id)
        .map_err(|_| PdfError::MalformedPageTree("Pages node is not a dictionary".into()))?;
    pages_dict.set(
        "Kids",
        page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>(),
    );
    pages_dict.set("Count", page_refs.len() as i64);
    for key in INHERITABLE {
        pages_dict.remove(key);
    }

    for &page_id in page_refs {
        doc.get_dictionary_mut(page_id)?
            .set("Parent", Object::Reference(pages_id));
    }

    Ok(())
}
