use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use hf_hub::api::sync::Api;
use serde_json::Value;
use tokenizers::Tokenizer;

use super::{TokenEncoding, TokenizerService};

const DEFAULT_BEGIN_TOKEN: &str = "[CLS]";
const DEFAULT_END_TOKEN: &str = "[SEP]";

/// Hugging Face tokenizer with truncation and padding switched off; windowing
/// is the labeler's job.
#[derive(Debug, Clone)]
pub struct HfTokenizer {
    inner: Tokenizer,
    begin_id: u32,
    end_id: u32,
    special: HashSet<u32>,
}

impl HfTokenizer {
    /// Load `tokenizer.json` and `tokenizer_config.json` for `model_id` from the HF Hub.
    pub fn from_pretrained(model_id: &str) -> Result<Self> {
        let tok = Tokenizer::from_pretrained(model_id, None).map_err(|e| anyhow!("{}", e))?;

        let api = Api::new()?;
        let repo = api.model(model_id.to_string());
        let cfg = repo.get("tokenizer_config.json").ok()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            .unwrap_or(serde_json::json!({}));

        Self::with_config(tok, &cfg)
    }

    /// Load a local `tokenizer.json`; a sibling `tokenizer_config.json` is read when present.
    pub fn from_file(path: &Path) -> Result<Self> {
        let tok = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("load tokenizer {}", path.display()))?;

        let cfg = path.parent()
            .map(|dir| dir.join("tokenizer_config.json"))
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| serde_json::from_str::<Value>(&s).ok())
            .unwrap_or(serde_json::json!({}));

        Self::with_config(tok, &cfg)
    }

    fn with_config(mut tok: Tokenizer, cfg: &Value) -> Result<Self> {
        tok.with_truncation(None).map_err(|e| anyhow!("{}", e))?;
        tok.with_padding(None);

        let begin = token_from_config(cfg, "cls_token").unwrap_or_else(|| DEFAULT_BEGIN_TOKEN.to_string());
        let end = token_from_config(cfg, "sep_token").unwrap_or_else(|| DEFAULT_END_TOKEN.to_string());
        let begin_id = tok.token_to_id(&begin)
            .ok_or_else(|| anyhow!("begin marker {begin:?} is not in the vocabulary"))?;
        let end_id = tok.token_to_id(&end)
            .ok_or_else(|| anyhow!("end marker {end:?} is not in the vocabulary"))?;

        let mut special: HashSet<u32> = tok
            .get_added_tokens_decoder()
            .iter()
            .filter(|(_, added)| added.special)
            .map(|(id, _)| *id)
            .collect();
        special.insert(begin_id);
        special.insert(end_id);

        tracing::debug!(begin = %begin, end = %end, specials = special.len(), "tokenizer ready");
        Ok(Self { inner: tok, begin_id, end_id, special })
    }
}

// tokenizer_config.json stores special tokens either as a string or as
// an AddedToken object with a "content" field
fn token_from_config(cfg: &Value, key: &str) -> Option<String> {
    match cfg.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("content").and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    }
}

impl TokenizerService for HfTokenizer {
    fn encode(&self, text: &str, add_boundary_markers: bool) -> Result<TokenEncoding> {
        let enc = self.inner
            .encode_char_offsets(text, add_boundary_markers)
            .map_err(|e| anyhow!("{}", e))?;
        Ok(TokenEncoding {
            ids: enc.get_ids().to_vec(),
            attention_mask: enc.get_attention_mask().to_vec(),
            offsets: enc.get_offsets().to_vec(),
        })
    }

    fn display_tokens(&self, ids: &[u32]) -> Vec<String> {
        ids.iter()
            .map(|id| self.inner.id_to_token(*id).unwrap_or_else(|| format!("<{id}>")))
            .collect()
    }

    fn begin_marker_id(&self) -> u32 { self.begin_id }

    fn end_marker_id(&self) -> u32 { self.end_id }

    fn is_special(&self, id: u32) -> bool { self.special.contains(&id) }
}
