use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::classifier::{Device, OnnxClassifier};
use crate::labeler::window::{WindowConfig, DEFAULT_STRIDE, DEFAULT_WINDOW_SIZE};
use crate::labels::LabelVocab;
use crate::tokenizer::HfTokenizer;

const DEFAULT_MODEL_ID: &str = "distilbert-base-uncased";
const DEFAULT_ONNX_FILE: &str = "onnx/model.onnx";

/// Where the tokenizer, model and labels come from, plus window geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelerConfig {
    /// HF Hub repo for the tokenizer (and the ONNX file when it is not local).
    pub model_id: String,
    pub onnx_file: Option<String>,
    pub tokenizer_file: Option<PathBuf>,
    /// `config.json` whose `id2label` overrides the built-in labels.
    pub model_config: Option<PathBuf>,
    pub device: Device,
    pub window: WindowConfig,
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            onnx_file: Some(DEFAULT_ONNX_FILE.to_string()),
            tokenizer_file: None,
            model_config: None,
            device: Device::Cpu,
            window: WindowConfig { window_size: DEFAULT_WINDOW_SIZE, stride: DEFAULT_STRIDE },
        }
    }
}

impl LabelerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// Unparsable values keep their defaults.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(id) = get("BUZZ_MODEL_ID") {
            cfg.model_id = id;
        }
        if let Some(f) = get("BUZZ_ONNX_FILE") {
            cfg.onnx_file = Some(f);
        }
        if let Some(f) = get("BUZZ_TOKENIZER_FILE") {
            cfg.tokenizer_file = Some(PathBuf::from(f));
        }
        if let Some(f) = get("BUZZ_MODEL_CONFIG") {
            cfg.model_config = Some(PathBuf::from(f));
        }
        if let Some(d) = get("BUZZ_DEVICE").as_deref().and_then(Device::parse) {
            cfg.device = d;
        }
        if let Some(n) = get("BUZZ_WINDOW_SIZE").and_then(|v| v.parse::<usize>().ok()) {
            cfg.window.window_size = n;
        }
        if let Some(n) = get("BUZZ_STRIDE").and_then(|v| v.parse::<usize>().ok()) {
            cfg.window.stride = n;
        }
        cfg
    }

    pub fn load_tokenizer(&self) -> Result<HfTokenizer> {
        match &self.tokenizer_file {
            Some(path) => HfTokenizer::from_file(path),
            None => HfTokenizer::from_pretrained(&self.model_id)
                .with_context(|| format!("load tokenizer for {}", self.model_id)),
        }
    }

    pub fn load_vocab(&self) -> Result<LabelVocab> {
        match &self.model_config {
            Some(path) => LabelVocab::from_model_config(path),
            None => Ok(LabelVocab::default()),
        }
    }

    pub fn load_classifier(&self, vocab: &LabelVocab) -> Result<OnnxClassifier> {
        OnnxClassifier::new(&self.model_id, self.onnx_file.as_deref(), self.device, vocab.len())
            .context("init ONNX classifier")
    }
}

/// Model flags shared by every subcommand; anything unset falls back to the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    #[arg(long)] pub model_id: Option<String>,
    #[arg(long)] pub onnx_file: Option<String>,
    #[arg(long)] pub tokenizer_file: Option<PathBuf>,
    #[arg(long)] pub model_config: Option<PathBuf>,
    #[arg(long, value_enum)] pub device: Option<Device>,
    #[arg(long)] pub window_size: Option<usize>,
    #[arg(long)] pub stride: Option<usize>,
}

impl ModelArgs {
    pub fn resolve(&self) -> Result<LabelerConfig> {
        self.apply(LabelerConfig::from_env())
    }

    fn apply(&self, mut cfg: LabelerConfig) -> Result<LabelerConfig> {
        if let Some(v) = &self.model_id { cfg.model_id = v.clone(); }
        if let Some(v) = &self.onnx_file { cfg.onnx_file = Some(v.clone()); }
        if let Some(v) = &self.tokenizer_file { cfg.tokenizer_file = Some(v.clone()); }
        if let Some(v) = &self.model_config { cfg.model_config = Some(v.clone()); }
        if let Some(v) = self.device { cfg.device = v; }
        cfg.window = WindowConfig::new(
            self.window_size.unwrap_or(cfg.window.window_size),
            self.stride.unwrap_or(cfg.window.stride),
        )?;
        Ok(cfg)
    }
}
