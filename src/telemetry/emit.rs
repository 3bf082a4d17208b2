use anyhow::Result;
use serde::Serialize;

use crate::output::config::OutputConfig;
use crate::output::presenter::{Emitter, Render};
use crate::output::types::{Envelope, Meta};

pub fn print_plan<T: Serialize + Render>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::plan(op, plan, meta)?;
    Emitter::from_config(OutputConfig::from_env()).emit(&env, plan)?;
    Ok(())
}

pub fn print_result<T: Serialize + Render>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    Emitter::from_config(OutputConfig::from_env()).emit(&env, result)?;
    Ok(())
}
