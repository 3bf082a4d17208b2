pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn segment() -> LogCtx<ops::segment::Segment> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn windows() -> LogCtx<ops::windows::Windows> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn eval() -> LogCtx<ops::eval::Eval> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
