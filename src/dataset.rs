use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::align::CharSpan;

/// One annotated document: the raw assistant output and its segment spans.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Example {
    pub full_text: String,
    pub spans: Vec<CharSpan>,
}

/// Read a JSONL dataset. Blank lines are ignored; unparsable lines are
/// skipped with a warning naming the line.
pub fn read_jsonl(path: &Path) -> Result<Vec<Example>> {
    let file = File::open(path).with_context(|| format!("open dataset {}", path.display()))?;
    parse_lines(BufReader::new(file), &path.display().to_string())
}

fn parse_lines<R: BufRead>(reader: R, source: &str) -> Result<Vec<Example>> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read {source} line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Example>(&line) {
            Ok(ex) => out.push(ex),
            Err(e) => tracing::warn!("skipping {}:{}: {}", source, i + 1, e),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_lines_and_skips_broken_ones() {
        let data = concat!(
            r#"{"full_text": "Thinking. Done.", "spans": [{"label": "THOUGHT", "start": 0, "end": 9}, {"category": "TEXT", "start": 10, "end": 15}]}"#, "\n",
            "\n",
            "{not json}\n",
            r#"{"full_text": "no spans here", "spans": []}"#, "\n",
            r#"{"spans": []}"#, "\n",
        );
        let examples = parse_lines(data.as_bytes(), "mem").unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].spans.len(), 2);
        assert_eq!(examples[0].spans[1].label, "TEXT");
        assert!(examples[1].spans.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("buzz-dataset-does-not-exist.jsonl");
        assert!(read_jsonl(&path).is_err());
    }
}
