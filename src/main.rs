use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod align;
mod classifier;
mod config;
mod dataset;
mod labeler;
mod labels;
mod metrics;
mod output;
mod pipeline;
mod segment;
mod telemetry;
mod tokenizer;
mod util;

#[derive(Parser)]
#[command(name = "buzz", about = "Segment assistant output into thought, tool call, tool response and text")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Segment(pipeline::segment::SegmentCmd),
    Windows(pipeline::windows::WindowsCmd),
    Eval(pipeline::eval::EvalCmd),
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // logs to stderr; respects RUST_LOG and BUZZ_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Segment(args) => pipeline::segment::run(args)?,
        Commands::Windows(args) => pipeline::windows::run(args)?,
        Commands::Eval(args) => pipeline::eval::run(args)?,
    }

    Ok(())
}
