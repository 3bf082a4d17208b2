use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use hf_hub::api::sync::Api;
use ndarray::{Array2, Array3, ArrayD, Axis};

// onnx runtime (ORT)
use ort::inputs;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::Value;

use super::{InferenceError, TokenClassifier};

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Device {
    #[value(name = "cpu")] Cpu,
    #[value(name = "cuda")] Cuda,
}

impl Device {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Device::Cpu),
            "cuda" | "gpu" => Some(Device::Cuda),
            _ => None,
        }
    }
}

/// ONNX token-classification model (DistilBERT/BERT style graph).
pub struct OnnxClassifier {
    session: Session,
    num_labels: usize,
    wants_type_ids: bool,
}

impl OnnxClassifier {
    pub fn new(model_id: &str, onnx_file: Option<&str>, device: Device, num_labels: usize) -> Result<Self> {
        let onnx_path = resolve_onnx(model_id, onnx_file).context("resolve ONNX model")?;
        let session = build_session(&onnx_path, device)?;
        let wants_type_ids = session.inputs.iter().any(|i| i.name == "token_type_ids");
        tracing::debug!(path = %onnx_path.display(), wants_type_ids, num_labels, "onnx session ready");
        Ok(Self { session, num_labels, wants_type_ids })
    }
}

impl TokenClassifier for OnnxClassifier {
    fn num_labels(&self) -> usize { self.num_labels }

    fn infer(&mut self, ids: &[i64], attention_mask: &[i64]) -> Result<Array2<f32>, InferenceError> {
        if ids.len() != attention_mask.len() {
            return Err(InferenceError::InvalidInput(format!(
                "ids={} attention_mask={}", ids.len(), attention_mask.len()
            )));
        }
        let seq = ids.len();
        if seq == 0 {
            return Err(InferenceError::InvalidInput("empty sequence".into()));
        }

        let ids_arr = Array2::from_shape_vec((1, seq), ids.to_vec())
            .map_err(|e| InferenceError::InvalidInput(e.to_string()))?;
        let mask_arr = Array2::from_shape_vec((1, seq), attention_mask.to_vec())
            .map_err(|e| InferenceError::InvalidInput(e.to_string()))?;

        let input_ids_val = Value::from_array(ids_arr).map_err(InferenceError::unavailable)?;
        let attn_mask_val = Value::from_array(mask_arr).map_err(InferenceError::unavailable)?;

        let type_ids_val = Value::from_array(Array2::<i64>::zeros((1, seq)))
            .map_err(InferenceError::unavailable)?;

        let outputs = if self.wants_type_ids {
            self.session.run(inputs! {
                "input_ids" => &input_ids_val,
                "attention_mask" => &attn_mask_val,
                "token_type_ids" => &type_ids_val,
            })
        } else {
            self.session.run(inputs! {
                "input_ids" => &input_ids_val,
                "attention_mask" => &attn_mask_val,
            })
        }
        .map_err(InferenceError::unavailable)?;

        // First output is the logits tensor [batch, seq, labels]
        let first = outputs.iter().next().map(|(_n, v)| v)
            .ok_or_else(|| InferenceError::malformed("no outputs from ONNX session"))?;
        let arr: ArrayD<f32> = first.try_extract_array().map_err(InferenceError::malformed)?.to_owned();
        let shape = arr.shape().to_vec();
        let arr3: Array3<f32> = arr.into_dimensionality()
            .map_err(|_| InferenceError::malformed(format!("expected rank-3 logits, got shape {shape:?}")))?;
        if shape[0] != 1 || shape[1] != seq || shape[2] != self.num_labels {
            return Err(InferenceError::malformed(format!(
                "expected logits [1, {seq}, {}], got {shape:?}", self.num_labels
            )));
        }
        Ok(arr3.index_axis_move(Axis(0), 0))
    }
}

/// A local path wins; otherwise the file (or a known default name) is fetched from the HF Hub.
fn resolve_onnx(model_id: &str, onnx_file: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = onnx_file {
        let local = Path::new(name);
        if local.is_file() {
            return Ok(local.to_path_buf());
        }
    }

    let api = Api::new()?;
    let repo = api.model(model_id.to_string());

    if let Some(name) = onnx_file {
        let p = repo.get(name).with_context(|| format!("{name} is neither a local file nor in {model_id}"))?;
        return Ok(p);
    }

    let candidates = [
        "onnx/model.onnx",
        "model.onnx",
    ];
    for name in candidates {
        if let Ok(p) = repo.get(name) { return Ok(p); }
    }

    bail!("Could not find an ONNX file in {model_id}. Pass --onnx-file to override.")
}

fn build_session(onnx_path: &Path, device: Device) -> Result<Session> {
    let builder = SessionBuilder::new()
        .map_err(|e| anyhow!("{}", e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| anyhow!("{}", e))?;

    #[allow(unreachable_code)]
    let builder = match device {
        Device::Cpu => builder,
        Device::Cuda => {
            #[cfg(feature = "cuda")]
            {
                use ort::execution_providers::CUDAExecutionProvider;
                builder
                    .with_execution_providers([CUDAExecutionProvider::default().into()])
                    .map_err(|e| anyhow!("{}", e))?
            }
            #[cfg(not(feature = "cuda"))]
            {
                bail!("Binary built without CUDA support. Rebuild with `--features cuda` and ensure CUDA is available.")
            }
        }
    };

    let model_bytes = std::fs::read(onnx_path)
        .with_context(|| format!("read {}", onnx_path.display()))?;
    let session = builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| anyhow!("{}", e))?;
    Ok(session)
}
