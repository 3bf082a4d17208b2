//! Sliding-window token labeling for documents longer than the model input.
//!
//! Short documents get one inference over `[begin] + core + [end]`. Longer
//! ones are cut into overlapping windows of `window_size` core tokens every
//! `stride` tokens; per-token scores are summed across windows, divided by
//! the number of windows that saw each token, and arg-maxed.

pub mod accumulate;
pub mod window;

use anyhow::{Context, Result};
use ndarray::{s, Array2};
use serde::Serialize;
use tracing::span::EnteredSpan;

use crate::classifier::{InferenceError, TokenClassifier};
use crate::labels::BACKGROUND_ID;
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::segment::{Phase as SegmentPhase, Segment as SegmentOp};
use crate::tokenizer::TokenizerService;

pub use accumulate::{argmax_row, ScoreAccumulator};
pub use window::{plan_windows, Window, WindowConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePath {
    Short,
    Long,
}

impl InferencePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferencePath::Short => "short",
            InferencePath::Long => "long",
        }
    }
}

/// A document that fits in one window takes the single-inference path.
pub fn choose_path(core_len: usize, cfg: &WindowConfig) -> InferencePath {
    if core_len <= cfg.window_size { InferencePath::Short } else { InferencePath::Long }
}

/// Label ids aligned position by position with `ids = [begin] + core + [end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSequence {
    pub ids: Vec<u32>,
    pub labels: Vec<usize>,
    pub path: InferencePath,
    pub windows: Vec<Window>,
}

impl LabeledSequence {
    pub fn core_len(&self) -> usize {
        self.ids.len().saturating_sub(2)
    }

    /// Labels with the two boundary positions removed.
    pub fn core_labels(&self) -> &[usize] {
        match self.labels.len() {
            0..=2 => &[],
            n => &self.labels[1..n - 1],
        }
    }
}

pub struct WindowedLabeler<'a> {
    tokenizer: &'a dyn TokenizerService,
    classifier: &'a mut dyn TokenClassifier,
    cfg: WindowConfig,
    log: Option<&'a LogCtx<SegmentOp>>,
}

impl<'a> WindowedLabeler<'a> {
    pub fn new(
        tokenizer: &'a dyn TokenizerService,
        classifier: &'a mut dyn TokenClassifier,
        cfg: WindowConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { tokenizer, classifier, cfg, log: None })
    }

    pub fn with_log(mut self, log: &'a LogCtx<SegmentOp>) -> Self {
        self.log = Some(log);
        self
    }

    /// Label every token of `text`. Any inference failure fails the whole request.
    pub fn label(&mut self, text: &str) -> Result<LabeledSequence> {
        let core = {
            let _s = enter_span(self.log, &SegmentPhase::Tokenize);
            self.tokenizer.encode(text, false).context("tokenize input")?.ids
        };

        if core.is_empty() {
            // nothing to classify; boundary positions only
            return Ok(LabeledSequence {
                ids: self.tokenizer.frame(&core),
                labels: vec![BACKGROUND_ID; 2],
                path: InferencePath::Short,
                windows: Vec::new(),
            });
        }

        match choose_path(core.len(), &self.cfg) {
            InferencePath::Short => self.label_short(text, &core),
            InferencePath::Long => self.label_long(&core),
        }
    }

    fn label_short(&mut self, text: &str, core: &[u32]) -> Result<LabeledSequence> {
        let marked = {
            let _s = enter_span(self.log, &SegmentPhase::Tokenize);
            self.tokenizer.encode(text, true).context("tokenize input with boundary markers")?
        };
        let (ids, mask) = if marked.ids.len() == core.len() + 2 {
            (marked.ids, marked.attention_mask)
        } else {
            // tokenizer has no boundary post-processor (or adds more than two markers)
            if let Some(log) = self.log {
                log.warn(format!(
                    "marked encoding has {} ids for {} core tokens; framing manually",
                    marked.ids.len(), core.len()
                ));
            }
            let ids = self.tokenizer.frame(core);
            let mask = vec![1; ids.len()];
            (ids, mask)
        };

        let scores = self.score(&ids, &mask, 0)?;
        let labels = scores.rows().into_iter().map(argmax_row).collect();
        Ok(LabeledSequence {
            ids,
            labels,
            path: InferencePath::Short,
            windows: vec![Window { start: 0, end: core.len() }],
        })
    }

    fn label_long(&mut self, core: &[u32]) -> Result<LabeledSequence> {
        let windows = plan_windows(core.len(), &self.cfg);
        let mut acc = ScoreAccumulator::new(core.len(), self.classifier.num_labels());

        for w in &windows {
            let chunk = self.tokenizer.frame(&core[w.start..w.end]);
            let mask = vec![1; chunk.len()];
            let scores = self.score(&chunk, &mask, w.start)?;

            let _s = enter_span(self.log, &SegmentPhase::Aggregate);
            // drop the begin/end marker rows
            let inner = scores.slice(s![1..scores.nrows() - 1, ..]);
            acc.add(w.start, inner)?;
            if let Some(log) = self.log {
                log.window_scored(w.start, w.end, core.len());
            }
        }

        let uncovered = acc.uncovered();
        if uncovered > 0 {
            if let Some(log) = self.log {
                log.warn(format!("{uncovered} core token(s) not covered by any window; labeled background"));
            }
        }

        let mut labels = Vec::with_capacity(core.len() + 2);
        labels.push(BACKGROUND_ID);
        labels.extend(acc.finalize());
        labels.push(BACKGROUND_ID);

        Ok(LabeledSequence {
            ids: self.tokenizer.frame(core),
            labels,
            path: InferencePath::Long,
            windows,
        })
    }

    /// One inference call over a framed chunk, with the output shape checked.
    fn score(&mut self, ids: &[u32], mask: &[u32], start: usize) -> Result<Array2<f32>> {
        let _s = enter_span(self.log, &SegmentPhase::Infer);
        let input: Vec<i64> = ids.iter().map(|&x| x as i64).collect();
        let mask: Vec<i64> = mask.iter().map(|&x| x as i64).collect();

        let scores = self.classifier
            .infer(&input, &mask)
            .with_context(|| format!("inference for window at offset {start}"))?;

        let num_labels = self.classifier.num_labels();
        if scores.nrows() != ids.len() || scores.ncols() != num_labels {
            let err = InferenceError::Malformed(format!(
                "expected {}x{} scores, got {}x{}",
                ids.len(), num_labels, scores.nrows(), scores.ncols()
            ));
            return Err(anyhow::Error::new(err)
                .context(format!("inference for window at offset {start}")));
        }
        Ok(scores)
    }
}

fn enter_span(log: Option<&LogCtx<SegmentOp>>, phase: &SegmentPhase) -> Option<EnteredSpan> {
    log.map(|ctx| ctx.span(phase).entered())
}
