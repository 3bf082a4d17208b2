use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Document text from the positional argument, else `--file`, else stdin.
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(t) = text {
        return Ok(t.to_string());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).context("read stdin")?;
    Ok(buf)
}
