use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::model::{DocumentMetadata, FactFragment, FragmentRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct FragmentReader<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
    next_index: usize,
    skipped: Vec<SkippedRecord>,
    read_error: Option<String>,
}

impl<R: BufRead> FragmentReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            next_index: 0,
            skipped: Vec::new(),
            read_error: None,
        }
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn read_error(&self) -> Option<&str> {
        self.read_error.as_deref()
    }
}

impl<R: BufRead> Iterator for FragmentReader<R> {
    type Item = FactFragment;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    self.line_number += 1;
                    warn!(line = self.line_number, error = %err, "failed to read fragment input; stopping");
                    self.read_error = Some(format!("line {}: {err}", self.line_number));
                    return None;
                }
            }
            self.line_number += 1;

            let line = match std::str::from_utf8(&self.buffer) {
                Ok(line) => line,
                Err(err) => {
                    warn!(line = self.line_number, error = %err, "skipping fragment record with invalid UTF-8");
                    self.skipped.push(SkippedRecord {
                        line: self.line_number,
                        reason: format!("invalid UTF-8: {err}"),
                    });
                    continue;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<FragmentRecord>(trimmed) {
                Ok(record) => {
                    let fragment = record.into_fragment(self.next_index);
                    self.next_index += 1;
                    return Some(fragment);
                }
                Err(err) => {
                    warn!(line = self.line_number, error = %err, "skipping malformed fragment record");
                    self.skipped.push(SkippedRecord {
                        line: self.line_number,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
}

pub fn open_fragments(path: &Path) -> Result<FragmentReader<BufReader<File>>> {
    if !path.exists() {
        bail!("fragment input not found: {}", path.display());
    }
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(FragmentReader::new(BufReader::new(file)))
}

pub fn load_document_metadata(path: &Path) -> Result<Option<DocumentMetadata>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_slice::<DocumentMetadata>(&raw) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed document metadata");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("esia-qa-input-{label}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("temp dir");
        dir
    }

    #[test]
    fn reader_skips_blank_and_malformed_lines() {
        let input = concat!(
            "{\"text\": \"The study area covers 5,000 ha.\", \"page\": 12}\n",
            "\n",
            "{\"text\": \"missing page\"}\n",
            "not json at all\n",
            "{\"text\": \"Workforce of 20.\", \"page_number\": 41, \"section\": \" 4.2 Labour \", ",
            "\"metadata\": {\"breadcrumbs\": [\"Project\", \"Workforce\"]}}\n",
        );
        let mut reader = FragmentReader::new(Cursor::new(input));
        let fragments = reader.by_ref().collect::<Vec<FactFragment>>();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].index, 0);
        assert_eq!(fragments[0].page, 12);
        assert_eq!(fragments[1].index, 1);
        assert_eq!(fragments[1].page, 41);
        assert_eq!(fragments[1].section.as_deref(), Some("4.2 Labour"));
        assert_eq!(fragments[1].headings, vec!["Project", "Workforce"]);

        let skipped = reader.skipped();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].line, 3);
        assert_eq!(skipped[1].line, 4);
        assert!(reader.read_error().is_none());
    }

    #[test]
    fn reader_skips_invalid_utf8_and_keeps_reading() {
        let mut input = b"{\"text\": \"Workforce of 3,000 people.\", \"page\": 20}\n".to_vec();
        input.extend_from_slice(b"{\"text\": \"bad \xff byte\", \"page\": 2}\n");
        input.extend_from_slice(b"{\"text\": \"Workforce numbers 20 persons.\", \"page\": 300}");
        let mut reader = FragmentReader::new(Cursor::new(input));
        let fragments = reader.by_ref().collect::<Vec<FactFragment>>();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].page, 20);
        assert_eq!(fragments[1].page, 300);
        assert_eq!(fragments[1].index, 1);

        let skipped = reader.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].line, 2);
        assert!(skipped[0].reason.contains("UTF-8"));
        assert!(reader.read_error().is_none());
    }

    #[test]
    fn open_fragments_names_missing_path() {
        let dir = temp_dir("missing");
        let error = open_fragments(&dir.join("facts.jsonl")).expect_err("missing input must fail");
        assert!(error.to_string().contains("facts.jsonl"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn document_metadata_is_optional_and_tolerant() {
        let dir = temp_dir("metadata");
        let path = dir.join("document_metadata.json");
        assert!(load_document_metadata(&path).expect("absent is ok").is_none());

        fs::write(&path, r#"{"filename": "esia.pdf", "page_count": 212, "table_count": 40}"#)
            .expect("write metadata");
        let metadata = load_document_metadata(&path)
            .expect("metadata loads")
            .expect("metadata present");
        assert_eq!(metadata.filename.as_deref(), Some("esia.pdf"));
        assert_eq!(metadata.page_count, Some(212));

        fs::write(&path, "{ broken").expect("write broken metadata");
        assert!(load_document_metadata(&path).expect("malformed is tolerated").is_none());

        let _ = fs::remove_dir_all(&dir);
    }
}
