use std::fs::{self, File};
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn write_json_lines<T: Serialize>(path: &Path, values: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create jsonl file: {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    for value in values {
        serde_json::to_writer(&mut writer, value)
            .with_context(|| format!("failed to serialize jsonl row: {}", path.display()))?;
        writer
            .write_all(b"\n")
            .with_context(|| format!("failed to write jsonl file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush jsonl file: {}", path.display()))?;

    Ok(())
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }

    let kept = input
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    format!("{}...", kept.trim_end())
}

pub fn char_window(text: &str, span: Range<usize>, radius: usize) -> Range<usize> {
    let start = floor_char_boundary(text, span.start);
    let end = ceil_char_boundary(text, span.end.max(start));

    let window_start = match radius {
        0 => start,
        _ => text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map(|(index, _)| index)
            .unwrap_or(0),
    };
    let window_end = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(offset, _)| end + offset)
        .unwrap_or(text.len());

    window_start..window_end
}

// Whitespace-normalized window of at most `max_chars` characters centred on `span`.
pub fn excerpt_around(text: &str, span: Range<usize>, max_chars: usize) -> String {
    let span_start = floor_char_boundary(text, span.start);
    let span_end = ceil_char_boundary(text, span.end.max(span_start));

    let span_chars = text[span_start..span_end].chars().count();
    let budget = max_chars.saturating_sub(span_chars);
    let before_budget = budget / 2;

    let before = text[..span_start]
        .char_indices()
        .rev()
        .take(before_budget)
        .last()
        .map(|(index, _)| index)
        .unwrap_or(span_start);
    let used_before = text[before..span_start].chars().count();
    let after_budget = budget.saturating_sub(used_before);
    let after = text[span_end..]
        .char_indices()
        .nth(after_budget)
        .map(|(offset, _)| span_end + offset)
        .unwrap_or(text.len());

    let mut excerpt = normalize_whitespace(&text[before..after]);
    if before > 0 {
        excerpt = format!("...{excerpt}");
    }
    if after < text.len() {
        excerpt.push_str("...");
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_around_returns_whole_text_when_short() {
        let text = "study area is 5,000 ha";
        assert_eq!(excerpt_around(text, 14..22, 200), "study area is 5,000 ha");
    }

    #[test]
    fn excerpt_around_marks_trimmed_edges() {
        let text = format!("{} target 42 MW {}", "a ".repeat(100), "b ".repeat(100));
        let start = text.find("42").expect("value present");
        let excerpt = excerpt_around(&text, start..start + 5, 40);
        assert!(excerpt.starts_with("..."));
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.contains("42 MW"));
    }

    #[test]
    fn excerpt_around_respects_multibyte_boundaries() {
        let text = "área de estudio ≈ 5 km² según el capítulo";
        let start = text.find('5').expect("value present");
        let excerpt = excerpt_around(text, start..start + 6, 12);
        assert!(excerpt.contains("5 km²"));
    }

    #[test]
    fn char_window_counts_characters_not_bytes() {
        let text = "ééé 12 km ééé";
        let start = text.find("12").expect("value present");
        let window = char_window(text, start..start + 5, 2);
        assert_eq!(&text[window], "é 12 km é");
        assert_eq!(char_window(text, start..start + 5, 100), 0..text.len());
    }

    #[test]
    fn truncate_chars_appends_ellipsis() {
        assert_eq!(truncate_chars("abcdefghij", 6), "abc...");
        assert_eq!(truncate_chars("abc", 6), "abc");
    }
}
