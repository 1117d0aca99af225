//! Preview command - render a cover to a local file.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use super::ExitCode;
use crate::config::Settings;
use crate::cover::{self, CoverOptions, RenderedCover};
use crate::fetch::{HttpFetcher, ImageFetcher, PathOrUrlFetcher};

/// Arguments for the preview command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Source image: a local path or a URL
    pub source: String,

    /// Where to write the PNG
    #[arg(short, long, value_name = "OUT.png")]
    pub output: PathBuf,
}

/// Run the preview command.
pub fn run(args: &PreviewArgs, settings: &Settings) -> Result<ExitCode> {
    let fetcher = PathOrUrlFetcher::new(HttpFetcher::new().context("building HTTP client")?);
    let rendered = render_to(&fetcher, &args.source, &settings.cover, &args.output)?;

    let [r, g, b] = rendered.fill.0;
    println!(
        "{} ({}x{} at {},{}, border #{r:02x}{g:02x}{b:02x})",
        args.output.display(),
        rendered.placement.width,
        rendered.placement.height,
        rendered.placement.x,
        rendered.placement.y,
    );
    Ok(ExitCode::Success)
}

/// Fetch `source`, render it and write the PNG to `output`
pub fn render_to<F: ImageFetcher + ?Sized>(
    fetcher: &F,
    source: &str,
    options: &CoverOptions,
    output: &Path,
) -> Result<RenderedCover> {
    let bytes = fetcher.fetch(source)?;
    let rendered = cover::render_bytes(&bytes, options).with_context(|| format!("rendering {source}"))?;

    std::fs::write(output, &rendered.png).with_context(|| format!("writing {}", output.display()))?;
    info!(source, output = %output.display(), bytes = rendered.png.len(), "wrote preview");
    Ok(rendered)
}
