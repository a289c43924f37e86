use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId};

use super::{materialize_inherited, PdfError};

fn type_of(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .ok()
}

/// Concatenate the pages of `inputs`, in order, into `output`.
pub fn merge_pages(inputs: &[PathBuf], output: &Path) -> Result<(), PdfError> {
    if inputs.is_empty() {
        return Err(PdfError::NothingToMerge);
    }

    let mut merged = Document::with_version("1.5");
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for input in inputs {
        let mut doc = Document::load(input)?;
        materialize_inherited(&mut doc)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            tracing::warn!("Skipping {} with no pages during merge", input.display());
            continue;
        }
        page_ids.extend(pages);

        for (id, object) in doc.objects {
            match type_of(&object) {
                Some(b"Catalog") | Some(b"Pages") => {}
                _ => {
                    merged.objects.insert(id, object);
                }
            }
        }
    }

    if page_ids.is_empty() {
        return Err(PdfError::NoPages);
    }

    merged.max_id = max_id;
    let pages_id = merged.new_object_id();
    for page_id in &page_ids {
        let page = merged.get_object_mut(*page_id)?.as_dict_mut()?;
        page.set("Parent", pages_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    merged.save(output)?;

    tracing::debug!("Merged {} pages into {}", page_ids.len(), output.display());
    Ok(())
}
