//! # mocktarget
//!
//! A command-line tool for building mock target catalogs from simulated
//! galaxy, quasar and Milky Way catalogs.
//!
//! ## Usage
//!
//! ```bash
//! # Full run from a TOML configuration
//! mocktarget -v run survey.toml --output out/
//!
//! # Median target density of one mock catalog
//! mocktarget density mocks/ELG.parquet --nside 16
//!
//! # Summarise an output file
//! mocktarget info out/targets.parquet
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
