use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::align::align_spans;
use crate::classifier::TokenClassifier;
use crate::config::ModelArgs;
use crate::dataset::{read_jsonl, Example};
use crate::labeler::{WindowConfig, WindowedLabeler};
use crate::labels::LabelVocab;
use crate::metrics::{EvalReport, Evaluation};
use crate::output::types::Meta;
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::eval::{Eval as EvalOp, Phase as EvalPhase};
use crate::telemetry::{self};
use crate::tokenizer::TokenizerService;

/// Score the labeler against an annotated JSONL dataset.
#[derive(Args, Debug)]
pub struct EvalCmd {
    #[arg(long)] dataset: PathBuf,
    /// Only score the first N examples
    #[arg(long)] limit: Option<usize>,
    #[command(flatten)] model: ModelArgs,
}

pub fn run(args: EvalCmd) -> Result<()> {
    let t0 = Instant::now();
    let log = telemetry::eval();
    let cfg = args.model.resolve()?;
    let _g = log.root_span_kv([
        ("dataset", args.dataset.display().to_string()),
        ("limit", format!("{:?}", args.limit)),
        ("model_id", cfg.model_id.clone()),
        ("window_size", cfg.window.window_size.to_string()),
        ("stride", cfg.window.stride.to_string()),
    ]).entered();

    let _s = log.span(&EvalPhase::LoadDataset).entered();
    let mut examples = read_jsonl(&args.dataset)?;
    if let Some(n) = args.limit {
        examples.truncate(n);
    }
    drop(_s);
    log.info(format!("📚 {} example(s) from {}", examples.len(), args.dataset.display()));

    let _s = log.span(&EvalPhase::LoadModel).entered();
    let tokenizer = cfg.load_tokenizer()?;
    let vocab = cfg.load_vocab()?;
    let mut classifier = cfg.load_classifier(&vocab)?;
    drop(_s);

    let report = score_examples(&examples, &tokenizer, &mut classifier, cfg.window, &vocab, &log)?;
    log.result(&report, Some(Meta::for_run(&cfg, t0)))
}

/// Label every example and compare against its aligned gold spans.
pub fn score_examples(
    examples: &[Example],
    tokenizer: &dyn TokenizerService,
    classifier: &mut dyn TokenClassifier,
    window: WindowConfig,
    vocab: &LabelVocab,
    log: &LogCtx<EvalOp>,
) -> Result<EvalReport> {
    let mut labeler = WindowedLabeler::new(tokenizer, classifier, window)?;
    let mut eval = Evaluation::new();

    for (i, ex) in examples.iter().enumerate() {
        let _s = log.span(&EvalPhase::Label).entered();
        let seq = labeler.label(&ex.full_text).with_context(|| format!("label example {i}"))?;
        let offsets = tokenizer.encode(&ex.full_text, false)?.offsets;
        let gold = align_spans(&offsets, &ex.spans, vocab).with_context(|| format!("align example {i}"))?;
        drop(_s);

        let _s = log.span(&EvalPhase::Score).entered();
        let doc = eval.add(&gold, seq.core_labels(), vocab);
        log.example_scored(i, doc.gold, doc.predicted, doc.correct);
    }
    Ok(eval.report())
}
