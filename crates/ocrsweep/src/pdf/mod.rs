//! Page-level PDF operations.
//!
//! - `split`: explode a document into single-page files
//! - `merge`: reassemble single-page files in order
//! - `overlay`: append invisible text to an existing page

mod merge;
mod overlay;
mod split;

pub use merge::merge_pages;
pub use overlay::{inject_overlay, page_size, render_text_ops, OverlayWord};
pub use split::split_pages;

use std::path::PathBuf;

use lopdf::{Document, Object, ObjectId};
use thiserror::Error;

/// Errors from PDF manipulation.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Input PDF has no pages")]
    NoPages,

    #[error("Page {page} not found in {path}")]
    MissingPage { path: PathBuf, page: u32 },

    #[error("Page has no usable MediaBox")]
    MissingMediaBox,

    #[error("Nothing to merge")]
    NothingToMerge,

    #[error("PDF error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page tree depth when walking `Parent` links.
const MAX_TREE_DEPTH: usize = 64;

/// Resolve `key` on a page, walking up the page tree if needed.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Copy inherited attributes onto every page so pages survive losing their parents.
pub(crate) fn materialize_inherited(doc: &mut Document) -> Result<(), PdfError> {
    for page_id in doc.get_pages().into_values() {
        let has_key = |key: &[u8]| {
            doc.get_dictionary(page_id)
                .map(|page| page.has(key))
                .unwrap_or(false)
        };
        let missing: Vec<(&[u8], Object)> = INHERITABLE
            .iter()
            .filter(|key| !has_key(**key))
            .filter_map(|key| inherited_attribute(doc, page_id, key).map(|value| (*key, value)))
            .collect();
        if missing.is_empty() {
            continue;
        }
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in missing {
            page.set(key.to_vec(), value);
        }
    }
    Ok(())
}

/// Resolve one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

pub(crate) fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(f64::from(*v)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Write a PDF whose pages have the given widths and carry a visible label.
    ///
    /// MediaBox lives on the page tree root so pages rely on inheritance.
    pub fn write_pdf(path: &Path, widths: &[i64]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for (i, width) in widths.iter().enumerate() {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![20.into(), 20.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("page {}", i + 1))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), (*width).into(), 400.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    /// MediaBox widths of every page, in page order.
    pub fn page_widths(path: &Path) -> Vec<i64> {
        let doc = Document::load(path).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| {
                let media_box = super::inherited_attribute(&doc, id, b"MediaBox").unwrap();
                let values = media_box.as_array().unwrap();
                super::as_number(&values[2]).unwrap() as i64
            })
            .collect()
    }
}
