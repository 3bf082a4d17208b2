use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::labels::{LabelVocab, BACKGROUND_ID};

/// Character span `[start, end)` of one segment in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSpan {
    #[serde(alias = "category")]
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// BIO label id per token for the given character spans.
///
/// A token belongs to a span when its character range intersects the span at
/// all. Zero-width tokens (special tokens) stay background. Spans are applied
/// in order, so a later span wins on a token shared with an earlier one.
pub fn align_spans(offsets: &[(usize, usize)], spans: &[CharSpan], vocab: &LabelVocab) -> Result<Vec<usize>> {
    let mut labels = vec![BACKGROUND_ID; offsets.len()];

    for span in spans {
        let begin = vocab.id(&format!("B-{}", span.label))
            .ok_or_else(|| anyhow!("span label {:?} has no B- entry in the vocabulary", span.label))?;
        let inside = vocab.id(&format!("I-{}", span.label))
            .ok_or_else(|| anyhow!("span label {:?} has no I- entry in the vocabulary", span.label))?;

        let mut first = true;
        for (i, &(tok_start, tok_end)) in offsets.iter().enumerate() {
            if tok_start == tok_end {
                continue;
            }
            if tok_start < span.end && tok_end > span.start {
                labels[i] = if first { begin } else { inside };
                first = false;
            }
        }
    }
    Ok(labels)
}
