use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extraction::ExtractedCard;
use crate::models::CrawledPage;
use crate::url_utils::sanitize_filename;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// File name for a card extracted from a page with `title`.
/// Distinct titles may collide after sanitizing; the later page wins.
pub fn extracted_filename(title: &str) -> String {
    format!("extracted_{}.json", sanitize_filename(title))
}

/// Write one value as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n").map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Persist an extracted card under `output_dir`, returning the written path.
pub fn save_extracted(
    card: &ExtractedCard,
    output_dir: &Path,
    title: &str,
) -> Result<PathBuf, ExportError> {
    let path = output_dir.join(extracted_filename(title));
    write_json(card, &path)?;
    Ok(path)
}

/// Export crawled pages to JSONL, one object per line
pub fn export_to_jsonl<W: Write, I: IntoIterator<Item = CrawledPage>>(
    pages: I,
    writer: &mut W,
) -> Result<(), ExportError> {
    for page in pages {
        serde_json::to_writer(&mut *writer, &page)?;
        writer.write_all(b"\n").map_err(|source| ExportError::Io {
            path: PathBuf::from("<jsonl>"),
            source,
        })?;
    }
    Ok(())
}

pub fn export_to_jsonl_file<I: IntoIterator<Item = CrawledPage>>(
    pages: I,
    path: &Path,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    export_to_jsonl(pages, &mut writer)?;
    writer.flush().map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::parse_card;
    use tempfile::TempDir;

    fn page(url: &str, depth: u32, relevant: bool) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            depth,
            domain: "example.com".to_string(),
            status_code: 200,
            title: "Example".to_string(),
            content_size: 1024,
            relevant,
            saved_as: None,
            crawled_at: 1640995200,
        }
    }

    #[test]
    fn test_extracted_filename() {
        assert_eq!(
            extracted_filename("Derm Foundation | Health AI"),
            "extracted_Derm_Foundation_Health_AI.json"
        );
        assert_eq!(extracted_filename(""), "extracted_page.json");
    }

    #[test]
    fn test_save_extracted_round_trips_fields() {
        let dir = TempDir::new().unwrap();
        let card = parse_card(
            r#"{"name": "Derm Foundation", "license": "Health AI Developer Foundations terms"}"#,
        )
        .unwrap();

        let path = save_extracted(&card, &dir.path().join("cards"), "Derm Foundation").unwrap();
        assert_eq!(path.file_name().unwrap(), "extracted_Derm_Foundation.json");

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["name"], "Derm Foundation");
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let card = parse_card("{}").unwrap();
        let err = save_extracted(&card, &blocker, "Title").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_multiple_pages_to_jsonl() {
        let pages = vec![
            page("https://example.com/", 0, true),
            page("https://example.com/about", 1, false),
        ];
        let mut buffer = Vec::new();
        export_to_jsonl(pages, &mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(output.ends_with('\n'));

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["url"], "https://example.com/about");
        assert_eq!(second["depth"], 1);
        assert_eq!(second["relevant"], false);
        assert_eq!(second["saved_as"], serde_json::Value::Null);
    }

    #[test]
    fn test_export_to_jsonl_with_empty_iterator() {
        let mut buffer = Vec::new();
        export_to_jsonl(std::iter::empty::<CrawledPage>(), &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }
}
