pub mod hf;
#[cfg(test)]
pub mod mock;

pub use hf::HfTokenizer;

use anyhow::Result;

/// One tokenized text. `offsets` are char-indexed; special tokens are zero-width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenEncoding {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub offsets: Vec<(usize, usize)>,
}

pub trait TokenizerService {
    fn encode(&self, text: &str, add_boundary_markers: bool) -> Result<TokenEncoding>;
    fn display_tokens(&self, ids: &[u32]) -> Vec<String>;
    fn begin_marker_id(&self) -> u32;
    fn end_marker_id(&self) -> u32;
    fn is_special(&self, id: u32) -> bool;

    /// `[begin] + core + [end]`
    fn frame(&self, core: &[u32]) -> Vec<u32> {
        let mut ids = Vec::with_capacity(core.len() + 2);
        ids.push(self.begin_marker_id());
        ids.extend_from_slice(core);
        ids.push(self.end_marker_id());
        ids
    }
}
