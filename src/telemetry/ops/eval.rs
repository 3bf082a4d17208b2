use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Eval;

#[derive(Copy, Clone, Debug)]
pub enum Phase { LoadDataset, LoadModel, Label, Score }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::LoadDataset => "load_dataset",
        Phase::LoadModel => "load_model",
        Phase::Label => "label",
        Phase::Score => "score",
    }}
    fn span(&self) -> Span { match self {
        Phase::LoadDataset => info_span!("load_dataset"),
        Phase::LoadModel => info_span!("load_model"),
        Phase::Label => info_span!("label"),
        Phase::Score => info_span!("score"),
    }}
}

impl OpMarker for Eval {
    const NAME: &'static str = "eval";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("eval") }
}
