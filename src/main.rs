use anyhow::Context;
use clap::Parser;
use weather_summary_processor::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).context("weather summary processing failed")
}
