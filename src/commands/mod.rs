//! CLI command definitions and handlers.

pub mod page;
pub mod preview;
pub mod sync;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;
use crate::cover::Resample;

/// Replace external Notion page covers with letterboxed uploads
#[derive(Parser)]
#[command(name = "cover-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/cover-sync/config.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sampling step for the border color, 1 = every pixel
    #[arg(long, global = true, value_name = "N")]
    pub quality: Option<u32>,

    /// Resampling filter used to scale the source
    #[arg(long, global = true, value_enum)]
    pub filter: Option<Resample>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Replace the external covers of a database's pages
    Sync(sync::SyncArgs),
    /// Replace the cover of a single page from a given source
    Page(page::PageArgs),
    /// Render a cover locally without touching Notion
    Preview(preview::PreviewArgs),
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    /// The run finished but some pages failed
    PartialFailure,
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::PartialFailure => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}

impl Cli {
    /// Settings from the config file with the CLI overrides applied
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(self.config.as_deref())
            .and_then(|settings| settings.with_overrides(self.quality, self.filter))
            .context("loading configuration")
    }

    /// Run the selected command
    pub fn run(&self) -> Result<ExitCode> {
        let settings = self.settings()?;
        match &self.command {
            Commands::Sync(args) => sync::run(args, &settings),
            Commands::Page(args) => page::run(args, &settings),
            Commands::Preview(args) => preview::run(args, &settings),
        }
    }
}
