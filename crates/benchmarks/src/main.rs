//! Benchmark matrix executable.

use anyhow::Result;
use clap::Parser;
use kernelbench_harness::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
