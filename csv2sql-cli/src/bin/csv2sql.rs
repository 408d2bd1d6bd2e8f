//! csv2sql
//!
//! Reads delimited text and writes SQL statements to stdout or a file. Logs go
//! to stderr.

use anyhow::{anyhow, Result};
use clap::Parser;
use csv2sql::logging::setup::init_logging;
use csv2sql_cli::{run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config()).map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;
    run(cli)
}
