use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use super::{TokenEncoding, TokenizerService};

pub const PAD_ID: u32 = 0;
pub const CLS_ID: u32 = 1;
pub const SEP_ID: u32 = 2;
const FIRST_WORD_ID: u32 = 10;

/// Lowercasing word/punctuation tokenizer with a vocabulary grown on demand.
/// Words written as `foo##bar` become two tokens, `foo` and `##bar`.
#[derive(Debug, Default)]
pub struct MockTokenizer {
    vocab: Mutex<Vocab>,
}

#[derive(Debug, Default)]
struct Vocab {
    by_token: HashMap<String, u32>,
    by_id: HashMap<u32, String>,
}

impl MockTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_for(&self, token: &str) -> u32 {
        let mut vocab = self.vocab.lock().unwrap();
        if let Some(id) = vocab.by_token.get(token) {
            return *id;
        }
        let id = FIRST_WORD_ID + vocab.by_token.len() as u32;
        vocab.by_token.insert(token.to_string(), id);
        vocab.by_id.insert(id, token.to_string());
        id
    }
}

fn split_pieces(text: &str) -> Vec<(String, usize, usize)> {
    let mut out = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_alphanumeric() {
            let start = i;
            while i < chars.len() && chars[i].is_alphanumeric() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect::<String>().to_lowercase();
            out.push((word, start, i));
            if chars[i..].starts_with(&['#', '#']) {
                i += 2;
                let start = i;
                while i < chars.len() && chars[i].is_alphanumeric() {
                    i += 1;
                }
                let piece: String = chars[start..i].iter().collect::<String>().to_lowercase();
                out.push((format!("##{piece}"), start, i));
            }
        } else {
            out.push((c.to_string(), i, i + 1));
            i += 1;
        }
    }
    out
}

impl TokenizerService for MockTokenizer {
    fn encode(&self, text: &str, add_boundary_markers: bool) -> Result<TokenEncoding> {
        let mut enc = TokenEncoding::default();
        if add_boundary_markers {
            enc.ids.push(CLS_ID);
            enc.offsets.push((0, 0));
        }
        for (piece, start, end) in split_pieces(text) {
            enc.ids.push(self.id_for(&piece));
            enc.offsets.push((start, end));
        }
        if add_boundary_markers {
            enc.ids.push(SEP_ID);
            enc.offsets.push((0, 0));
        }
        enc.attention_mask = vec![1; enc.ids.len()];
        Ok(enc)
    }

    fn display_tokens(&self, ids: &[u32]) -> Vec<String> {
        let vocab = self.vocab.lock().unwrap();
        ids.iter()
            .map(|id| match *id {
                PAD_ID => "[PAD]".to_string(),
                CLS_ID => "[CLS]".to_string(),
                SEP_ID => "[SEP]".to_string(),
                other => vocab.by_id.get(&other).cloned().unwrap_or_else(|| "[UNK]".to_string()),
            })
            .collect()
    }

    fn begin_marker_id(&self) -> u32 { CLS_ID }

    fn end_marker_id(&self) -> u32 { SEP_ID }

    fn is_special(&self, id: u32) -> bool { id < FIRST_WORD_ID }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_punctuation_and_subwords() {
        let tok = MockTokenizer::new();
        let enc = tok.encode("THOUGHT: play##ing", true).unwrap();
        assert_eq!(enc.ids.len(), 6);
        assert_eq!(enc.offsets, vec![(0, 0), (0, 7), (7, 8), (9, 13), (15, 18), (0, 0)]);
        assert_eq!(
            tok.display_tokens(&enc.ids),
            vec!["[CLS]", "thought", ":", "play", "##ing", "[SEP]"]
        );
    }
}
