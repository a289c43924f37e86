use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;

use super::{materialize_inherited, PdfError};

/// Split `input` into `page_00001.pdf`, `page_00002.pdf`, ... under `out_dir`.
///
/// Returns the written paths in page order.
pub fn split_pages(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    let mut doc = Document::load(input)?;
    let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
    if page_numbers.is_empty() {
        return Err(PdfError::NoPages);
    }
    materialize_inherited(&mut doc)?;
    fs::create_dir_all(out_dir)?;

    let mut outputs = Vec::with_capacity(page_numbers.len());
    for (index, &keep) in page_numbers.iter().enumerate() {
        let others: Vec<u32> = page_numbers.iter().copied().filter(|&p| p != keep).collect();
        let mut single = doc.clone();
        single.delete_pages(&others);
        single.prune_objects();

        let path = out_dir.join(format!("page_{:05}.pdf", index + 1));
        single.save(&path)?;
        outputs.push(path);
    }

    tracing::debug!("Split {} into {} pages", input.display(), outputs.len());
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_widths, write_pdf};
    use tempfile::TempDir;

    #[test]
    fn test_split_names_and_order() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.pdf");
        write_pdf(&input, &[300, 310, 320]);

        let pages = split_pages(&input, &temp.path().join("pages")).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].ends_with("page_00001.pdf"));
        assert!(pages[2].ends_with("page_00003.pdf"));
        for (path, width) in pages.iter().zip([300, 310, 320]) {
            assert_eq!(page_widths(path), vec![width]);
        }
    }

    #[test]
    fn test_split_keeps_inherited_resources() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.pdf");
        write_pdf(&input, &[300]);

        let pages = split_pages(&input, temp.path()).unwrap();
        let doc = Document::load(&pages[0]).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        assert!(doc.get_dictionary(page_id).unwrap().has(b"Resources"));
    }

    #[test]
    fn test_split_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = split_pages(&temp.path().join("nope.pdf"), temp.path());
        assert!(result.is_err());
    }
}
