//! cover-sync - replaces external Notion page covers with letterboxed,
//! Notion-hosted copies.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod color;
mod commands;
mod config;
mod cover;
mod error;
mod fetch;
mod notion;
mod sync;
#[cfg(test)]
mod testing;

use commands::{Cli, ExitCode};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = match cli.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    };

    exit_code.into()
}
