//! Binary crate for the `daynight` watchface companion.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring platform adapters into the core sequence
//! - Logging setup (stderr; stdout carries watch messages)

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;
    let cmd = cli::Cli::parse();
    cmd.run().await
}
