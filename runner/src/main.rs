//! `ctd-runner` - runs tools described by Common Tool Descriptors.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod settings;

fn main() -> Result<ExitCode> {
    ctd_sdk::init_logging().context("installing logger")?;
    let args = cli::Args::parse();
    cli::run(&args)
}
