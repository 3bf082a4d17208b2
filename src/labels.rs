use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

pub const BACKGROUND: &str = "O";
pub const BACKGROUND_ID: usize = 0;

/// Labels the segmenter was trained with, in model output order.
pub const DEFAULT_LABELS: [&str; 9] = [
    "O",
    "B-THOUGHT", "I-THOUGHT",
    "B-TOOLCALL", "I-TOOLCALL",
    "B-TOOLRESPONSE", "I-TOOLRESPONSE",
    "B-TEXT", "I-TEXT",
];

/// Ordered BIO label vocabulary. Index 0 is always the background label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocab {
    labels: Vec<String>,
}

impl Default for LabelVocab {
    fn default() -> Self {
        Self { labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect() }
    }
}

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: Option<Value>,
}

impl LabelVocab {
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let labels: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        match labels.first() {
            None => bail!("label vocabulary is empty"),
            Some(first) if first != BACKGROUND => {
                bail!("label 0 must be the background label {BACKGROUND:?}, got {first:?}")
            }
            _ => {}
        }
        for l in &labels[1..] {
            if scheme_suffix(l).is_none() {
                bail!("label {l:?} is not in B-/I- form");
            }
        }
        Ok(Self { labels })
    }

    /// Read `id2label` from a Hugging Face `config.json`. An unreadable file
    /// is an error; a missing or unusable `id2label` falls back to the
    /// default labels with a warning.
    pub fn from_model_config(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read model config {}", path.display()))?;
        let cfg: ModelConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parse model config {}", path.display()))?;

        let parsed = cfg.id2label
            .ok_or_else(|| anyhow!("no id2label"))
            .and_then(Self::from_id2label);
        match parsed {
            Ok(vocab) => Ok(vocab),
            Err(e) => {
                tracing::warn!(path = %path.display(), "{e:#}; using default labels");
                Ok(Self::default())
            }
        }
    }

    fn from_id2label(value: Value) -> Result<Self> {
        let map: HashMap<String, String> = serde_json::from_value(value).context("id2label is not a string map")?;
        let mut labels = vec![String::new(); map.len()];
        for (k, v) in map {
            let idx: usize = k.parse().with_context(|| format!("id2label key {k:?}"))?;
            let slot = labels
                .get_mut(idx)
                .ok_or_else(|| anyhow!("id2label index {idx} out of range"))?;
            *slot = v;
        }
        Self::from_labels(&labels)
    }

    pub fn len(&self) -> usize { self.labels.len() }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Segment type of a label id: `O` for background (and unknown ids), else the suffix.
    pub fn segment_type(&self, id: usize) -> &str {
        self.label(id).map(segment_type).unwrap_or(BACKGROUND)
    }
}

/// `B-TEXT` -> `TEXT`, `O` -> `O`.
pub fn segment_type(label: &str) -> &str {
    if label == BACKGROUND {
        return BACKGROUND;
    }
    scheme_suffix(label).unwrap_or(label)
}

fn scheme_suffix(label: &str) -> Option<&str> {
    label.strip_prefix("B-").or_else(|| label.strip_prefix("I-"))
}
