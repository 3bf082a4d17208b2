use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Windows;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Tokenize, Plan }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Tokenize => "tokenize",
        Phase::Plan => "plan",
    }}
    fn span(&self) -> Span { match self {
        Phase::Tokenize => info_span!("tokenize"),
        Phase::Plan => info_span!("plan"),
    }}
}

impl OpMarker for Windows {
    const NAME: &'static str = "windows";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("windows") }
}
