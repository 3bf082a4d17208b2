use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::config::ModelArgs;
use crate::labeler::window::coverage;
use crate::labeler::{choose_path, plan_windows, InferencePath, Window, WindowConfig};
use crate::output::presenter::Render;
use crate::output::types::Meta;
use crate::telemetry::{self};
use crate::telemetry::ops::windows::Phase as WindowsPhase;
use crate::tokenizer::TokenizerService;
use crate::util::input::read_input;

/// Show how a document would be cut into windows, without loading the model.
#[derive(Args, Debug)]
pub struct WindowsCmd {
    text: Option<String>,
    #[arg(long)] file: Option<PathBuf>,
    #[command(flatten)] model: ModelArgs,
}

#[derive(Debug, Serialize)]
pub struct WindowPlan {
    pub core_tokens: usize,
    pub path: InferencePath,
    pub window_size: usize,
    pub stride: usize,
    pub overlap: usize,
    pub windows: Vec<Window>,
    pub min_coverage: u32,
    pub max_coverage: u32,
}

impl Render for WindowPlan {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{} path: core_tokens={} window_size={} stride={} overlap={}",
            self.path.as_str(), self.core_tokens, self.window_size, self.stride, self.overlap
        )?;
        for win in &self.windows {
            writeln!(w, "  [{}, {}) framed={}", win.start, win.end, win.framed_len())?;
        }
        writeln!(w, "coverage: min={} max={}", self.min_coverage, self.max_coverage)
    }
}

pub fn run(args: WindowsCmd) -> Result<()> {
    let t0 = Instant::now();
    let log = telemetry::windows();
    let cfg = args.model.resolve()?;
    let _g = log.root_span_kv([
        ("model_id", cfg.model_id.clone()),
        ("window_size", cfg.window.window_size.to_string()),
        ("stride", cfg.window.stride.to_string()),
    ]).entered();

    let text = read_input(args.text.as_deref(), args.file.as_deref())?;

    let _s = log.span(&WindowsPhase::Tokenize).entered();
    let tokenizer = cfg.load_tokenizer()?;
    let core_tokens = tokenizer
        .encode(&text, false)
        .context("tokenize input")?
        .ids
        .len();
    drop(_s);

    let _s = log.span(&WindowsPhase::Plan).entered();
    let plan = plan_for(core_tokens, &cfg.window);
    drop(_s);

    log.info_kv("window plan", [
        ("path", plan.path.as_str().to_string()),
        ("core_tokens", plan.core_tokens.to_string()),
        ("windows", plan.windows.len().to_string()),
    ]);
    log.plan(&plan, Some(Meta::for_run(&cfg, t0)))
}

/// The same path and windows the labeler would use for `core_tokens` ids.
pub fn plan_for(core_tokens: usize, cfg: &WindowConfig) -> WindowPlan {
    let path = choose_path(core_tokens, cfg);
    let windows = match path {
        InferencePath::Short if core_tokens == 0 => Vec::new(),
        InferencePath::Short => vec![Window { start: 0, end: core_tokens }],
        InferencePath::Long => plan_windows(core_tokens, cfg),
    };
    let counts = coverage(core_tokens, &windows);
    WindowPlan {
        core_tokens,
        path,
        window_size: cfg.window_size,
        stride: cfg.stride,
        overlap: cfg.overlap(),
        min_coverage: counts.iter().copied().min().unwrap_or(0),
        max_coverage: counts.iter().copied().max().unwrap_or(0),
        windows,
    }
}
