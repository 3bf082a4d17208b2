use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::config::ModelArgs;
use crate::labeler::{InferencePath, LabeledSequence, Window, WindowedLabeler};
use crate::labels::LabelVocab;
use crate::output::presenter::Render;
use crate::output::types::Meta;
use crate::segment::{group_sequence, LabeledSegment};
use crate::telemetry::{self};
use crate::telemetry::ops::segment::Phase as SegmentPhase;
use crate::tokenizer::TokenizerService;
use crate::util::input::read_input;

#[derive(Args, Debug)]
pub struct SegmentCmd {
    /// Assistant output to segment; falls back to --file, then stdin
    text: Option<String>,
    #[arg(long)] file: Option<PathBuf>,
    #[command(flatten)] model: ModelArgs,
}

#[derive(Debug, Serialize)]
pub struct SegmentResult {
    pub path: InferencePath,
    pub core_tokens: usize,
    pub windows: Vec<Window>,
    pub segments: Vec<LabeledSegment>,
}

impl Render for SegmentResult {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for seg in &self.segments {
            writeln!(w, "{seg}")?;
        }
        Ok(())
    }
}

pub fn run(args: SegmentCmd) -> Result<()> {
    let t0 = Instant::now();
    let log = telemetry::segment();
    let cfg = args.model.resolve()?;
    let _g = log.root_span_kv([
        ("model_id", cfg.model_id.clone()),
        ("device", format!("{:?}", cfg.device)),
        ("window_size", cfg.window.window_size.to_string()),
        ("stride", cfg.window.stride.to_string()),
    ]).entered();

    let text = read_input(args.text.as_deref(), args.file.as_deref())?;
    log.debug(format!("input: {} chars", text.chars().count()));

    let _s = log.span(&SegmentPhase::LoadModel).entered();
    let tokenizer = cfg.load_tokenizer()?;
    let vocab = cfg.load_vocab()?;
    let mut classifier = cfg.load_classifier(&vocab)?;
    drop(_s);

    let seq = WindowedLabeler::new(&tokenizer, &mut classifier, cfg.window)?
        .with_log(&log)
        .label(&text)?;

    let _s = log.span(&SegmentPhase::Group).entered();
    let result = build_result(seq, &tokenizer, &vocab);
    drop(_s);

    log.labeled(result.path.as_str(), result.core_tokens, result.windows.len(), result.segments.len());
    log.result(&result, Some(Meta::for_run(&cfg, t0)))
}

fn build_result(seq: LabeledSequence, tokenizer: &dyn TokenizerService, vocab: &LabelVocab) -> SegmentResult {
    let segments = group_sequence(&seq, tokenizer, vocab);
    SegmentResult {
        path: seq.path,
        core_tokens: seq.core_len(),
        windows: seq.windows,
        segments,
    }
}
