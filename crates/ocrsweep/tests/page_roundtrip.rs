//! Page Round-Trip Tests
//!
//! Splits a document, adds invisible text to one page and merges the pages
//! back, checking that page order, page count and visible content survive.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use ocrsweep::pdf::{inject_overlay, merge_pages, page_size, split_pages, OverlayWord};

/// Build a document with one page per entry of `widths`, each page self-contained.
fn build_pdf(path: &Path, widths: &[i64]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for (i, width) in widths.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![30.into(), 30.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("visible {}", i + 1))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), 500.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
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
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn page_text(doc: &Document, page: u32) -> String {
    let id = *doc.get_pages().get(&page).unwrap();
    String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).to_string()
}

#[test]
fn test_split_overlay_merge() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("drawing.pdf");
    build_pdf(&input, &[400, 500, 600]);

    let pages = split_pages(&input, &temp.path().join("split")).unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(page_size(&pages[1]).unwrap(), (500.0, 500.0));

    let words = vec![
        OverlayWord::new(8.0, 8.0, 484.0, 6.0, "DESIGN PRESSURE"),
        OverlayWord::new(8.0, 13.8, 484.0, 6.0, "JOINT EFFICIENCY"),
    ];
    assert_eq!(inject_overlay(&pages[1], &words).unwrap(), 2);

    let output = temp.path().join("nested/dir/out.pdf");
    merge_pages(&pages, &output).unwrap();

    let merged = Document::load(&output).unwrap();
    assert_eq!(merged.get_pages().len(), 3);
    for (page, label) in [(1, "visible 1"), (2, "visible 2"), (3, "visible 3")] {
        assert!(page_text(&merged, page).contains(label));
    }
    assert!(page_text(&merged, 2).contains("(DESIGN PRESSURE ) Tj"));
    assert!(!page_text(&merged, 1).contains("Tr"));
}

#[test]
fn test_split_rejects_non_pdf() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("notes.pdf");
    std::fs::write(&input, b"plain text, not a pdf").unwrap();
    assert!(split_pages(&input, temp.path()).is_err());
}
