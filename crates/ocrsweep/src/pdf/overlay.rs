use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::{as_number, inherited_attribute, resolve, PdfError};

/// One invisible text run in PDF user space, relative to the MediaBox origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayWord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl OverlayWord {
    pub fn new(x: f64, y: f64, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            text: text.into(),
        }
    }
}

fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(char::is_ascii) {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Content stream operators drawing `words` in render mode 3 (invisible).
pub fn render_text_ops(words: &[OverlayWord], font_name: &str) -> Vec<u8> {
    let mut ops = String::new();
    for word in words {
        let with_gap = format!("{} ", word.text);
        let font_size = (word.height * 0.9).clamp(4.0, 30.0);
        let estimated = (with_gap.chars().count() as f64 * font_size * 0.55).max(1.0);
        let h_scale = (word.width / estimated * 100.0).clamp(35.0, 280.0);
        ops.push_str(&format!(
            "BT 3 Tr /{} {:.2} Tf {:.2} Tz 1 0 0 1 {:.2} {:.2} Tm ({}) Tj ET\n",
            font_name,
            font_size,
            h_scale,
            word.x,
            word.y,
            escape_pdf_text(&with_gap)
        ));
    }
    ops.into_bytes()
}

fn first_page(doc: &Document) -> Result<ObjectId, PdfError> {
    doc.get_pages()
        .get(&1)
        .copied()
        .ok_or(PdfError::NoPages)
}

fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4], PdfError> {
    let object = inherited_attribute(doc, page_id, b"MediaBox").ok_or(PdfError::MissingMediaBox)?;
    let values = resolve(doc, &object)
        .as_array()
        .map_err(|_| PdfError::MissingMediaBox)?;
    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| as_number(resolve(doc, v)))
        .collect();
    match numbers.as_slice() {
        [x0, y0, x1, y1] => Ok([*x0, *y0, *x1, *y1]),
        _ => Err(PdfError::MissingMediaBox),
    }
}

/// Width and height of the first page's MediaBox, in points.
pub fn page_size(path: &Path) -> Result<(f64, f64), PdfError> {
    let doc = Document::load(path)?;
    let [x0, y0, x1, y1] = media_box(&doc, first_page(&doc)?)?;
    Ok(((x1 - x0).abs(), (y1 - y0).abs()))
}

/// A direct copy of a dictionary entry that may be stored by reference.
fn owned_dict(doc: &Document, object: Option<&Object>) -> Dictionary {
    object
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

fn existing_contents(doc: &Document, page: &Dictionary) -> Vec<Object> {
    match page.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    }
}

/// Append `words` to the first page of `path` as invisible text, in place.
///
/// Existing content streams are bracketed with `q`/`Q` and left untouched.
/// Returns the number of words written.
pub fn inject_overlay(path: &Path, words: &[OverlayWord]) -> Result<usize, PdfError> {
    if words.is_empty() {
        return Ok(0);
    }

    let mut doc = Document::load(path)?;
    let page_id = first_page(&doc)?;
    let [x0, y0, _, _] = media_box(&doc, page_id)?;

    let page = doc.get_dictionary(page_id)?;
    let inherited_resources = inherited_attribute(&doc, page_id, b"Resources");
    let mut resources = owned_dict(&doc, inherited_resources.as_ref());
    let mut fonts = owned_dict(&doc, resources.get(b"Font").ok());
    let font_name = (1..)
        .map(|n| format!("OcrF{}", n))
        .find(|name| !fonts.has(name.as_bytes()))
        .unwrap_or_else(|| "OcrF".to_string());
    let mut contents = existing_contents(&doc, page);

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    fonts.set(font_name.as_bytes().to_vec(), font_id);
    resources.set("Font", fonts);

    let mut overlay = format!("Q\nq 1 0 0 1 {:.2} {:.2} cm\n", x0, y0).into_bytes();
    overlay.extend(render_text_ops(words, &font_name));
    overlay.extend_from_slice(b"Q\n");

    let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, overlay));
    contents.insert(0, Object::Reference(save_id));
    contents.push(Object::Reference(overlay_id));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", resources);
    page.set("Contents", contents);

    doc.save(path)?;
    tracing::debug!("Injected {} invisible words into {}", words.len(), path.display());
    Ok(words.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::split_pages;
    use crate::pdf::test_support::write_pdf;
    use tempfile::TempDir;

    fn single_page(temp: &TempDir) -> std::path::PathBuf {
        let input = temp.path().join("in.pdf");
        write_pdf(&input, &[612]);
        split_pages(&input, &temp.path().join("pages")).unwrap().remove(0)
    }

    #[test]
    fn test_render_text_ops_format() {
        let words = [OverlayWord::new(10.0, 20.0, 30.0, 10.0, "AB")];
        let ops = String::from_utf8(render_text_ops(&words, "OcrF1")).unwrap();
        // size 9, estimated 3 * 9 * 0.55 = 14.85, scale 202.02
        assert_eq!(
            ops,
            "BT 3 Tr /OcrF1 9.00 Tf 202.02 Tz 1 0 0 1 10.00 20.00 Tm (AB ) Tj ET\n"
        );
    }

    #[test]
    fn test_render_text_ops_clamps_and_escapes() {
        let words = [OverlayWord::new(0.0, 0.0, 1.0, 100.0, "(Ж\\)")];
        let ops = String::from_utf8(render_text_ops(&words, "F")).unwrap();
        assert!(ops.contains("/F 30.00 Tf 35.00 Tz"));
        assert!(ops.contains("(\\(\\\\\\) ) Tj"));
    }

    #[test]
    fn test_page_size() {
        let temp = TempDir::new().unwrap();
        let page = single_page(&temp);
        assert_eq!(page_size(&page).unwrap(), (612.0, 400.0));
    }

    #[test]
    fn test_inject_is_additive() {
        let temp = TempDir::new().unwrap();
        let page = single_page(&temp);
        let before = {
            let doc = Document::load(&page).unwrap();
            let id = *doc.get_pages().get(&1).unwrap();
            doc.get_page_content(id).unwrap()
        };

        let words = vec![
            OverlayWord::new(8.0, 8.0, 100.0, 6.0, "DESIGN CODE"),
            OverlayWord::new(8.0, 14.0, 100.0, 6.0, "TAG-101"),
        ];
        assert_eq!(inject_overlay(&page, &words).unwrap(), 2);

        let doc = Document::load(&page).unwrap();
        let id = *doc.get_pages().get(&1).unwrap();
        let after = String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).to_string();
        let original = String::from_utf8_lossy(&before).to_string();
        assert!(after.starts_with("q\n"));
        assert!(after.contains(original.trim()));
        assert!(after.contains("(DESIGN CODE ) Tj"));
        assert!(after.contains("(TAG-101 ) Tj"));

        // Original font still resolvable, overlay font registered beside it.
        let resources = doc.get_dictionary(id).unwrap().get(b"Resources").unwrap();
        let fonts = resources.as_dict().unwrap().get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"OcrF1"));
    }

    #[test]
    fn test_inject_twice_uses_fresh_font_name() {
        let temp = TempDir::new().unwrap();
        let page = single_page(&temp);
        let words = [OverlayWord::new(8.0, 8.0, 50.0, 6.0, "ONE")];
        inject_overlay(&page, &words).unwrap();
        inject_overlay(&page, &words).unwrap();

        let doc = Document::load(&page).unwrap();
        let id = *doc.get_pages().get(&1).unwrap();
        let content = String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).to_string();
        assert!(content.contains("/OcrF2"));
    }

    #[test]
    fn test_inject_nothing() {
        let temp = TempDir::new().unwrap();
        let page = single_page(&temp);
        assert_eq!(inject_overlay(&page, &[]).unwrap(), 0);
    }
}
