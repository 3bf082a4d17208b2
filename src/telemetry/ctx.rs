use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{info, debug, warn, Span};

use crate::output::presenter::Render;
use crate::output::types::Meta;

use super::emit;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span {
        debug!(op = %self.op_name(), phase = ph.name(), "span_start");
        ph.span()
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        let details = kv_to_string(kv);
        if self.json { info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{} {}", msg, details); }
    }

    pub fn plan<T: Serialize + Render>(&self, plan: &T, meta: Option<Meta>) -> Result<()> { emit::print_plan(self.op_name(), plan, meta) }
    pub fn result<T: Serialize + Render>(&self, result: &T, meta: Option<Meta>) -> Result<()> { emit::print_result(self.op_name(), result, meta) }
}

impl LogCtx<crate::telemetry::ops::segment::Segment> {
    pub fn window_scored(&self, start: usize, end: usize, total: usize) {
        if self.json { debug!(op = %self.op_name(), start, end, total, "window_scored"); }
        else { debug!("🪟 window [{}, {}) of {} core tokens scored", start, end, total); }
    }

    pub fn labeled(&self, path: &str, core_tokens: usize, windows: usize, segments: usize) {
        if self.json { info!(op = %self.op_name(), path, core_tokens, windows, segments, "labeled"); }
        else { info!("✅ {} path: core_tokens={} windows={} segments={}", path, core_tokens, windows, segments); }
    }
}

impl LogCtx<crate::telemetry::ops::eval::Eval> {
    pub fn example_scored(&self, index: usize, gold: usize, pred: usize, correct: usize) {
        if self.json { debug!(op = %self.op_name(), index, gold, pred, correct, "example_scored"); }
        else { debug!("example {}: gold={} pred={} correct={}", index, gold, pred, correct); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
