use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Segment;

#[derive(Copy, Clone, Debug)]
pub enum Phase { LoadModel, Tokenize, Infer, Aggregate, Group }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::LoadModel => "load_model",
        Phase::Tokenize => "tokenize",
        Phase::Infer => "infer",
        Phase::Aggregate => "aggregate",
        Phase::Group => "group",
    }}
    fn span(&self) -> Span { match self {
        Phase::LoadModel => info_span!("load_model"),
        Phase::Tokenize => info_span!("tokenize"),
        Phase::Infer => info_span!("infer"),
        Phase::Aggregate => info_span!("aggregate"),
        Phase::Group => info_span!("group"),
    }}
}

impl OpMarker for Segment {
    const NAME: &'static str = "segment";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("segment") }
}
