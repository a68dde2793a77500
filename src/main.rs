#![recursion_limit = "256"]
#![allow(dead_code)]

mod cli;
mod application;
mod training;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();
    infra::logging::init(cli.log_dir())?;
    cli.run()
}
