//! Page command - replace the cover of one page from an explicit source.

use anyhow::{Context, Result};
use clap::Args;

use super::ExitCode;
use crate::config::{Credentials, Settings};
use crate::fetch::HttpFetcher;
use crate::notion::{NotionClient, PageId};
use crate::sync::CoverSync;

/// Arguments for the page command
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Id of the page to update
    pub page_id: String,

    /// URL of the source image
    #[arg(long)]
    pub url: String,
}

/// Run the page command.
pub fn run(args: &PageArgs, settings: &Settings) -> Result<ExitCode> {
    let credentials = Credentials::from_env()?;
    let client = NotionClient::new(credentials.token(), &settings.notion).context("building Notion client")?;
    let fetcher = HttpFetcher::new().context("building HTTP client")?;

    let page_id = PageId::new(args.page_id.trim());
    let bound = CoverSync::new(&client, &fetcher, settings.cover)
        .replace_cover(&page_id, &args.url)
        .with_context(|| format!("replacing cover of page {page_id}"))?;

    println!("{} -> file upload {}", bound.page_id, bound.file_upload_id);
    Ok(ExitCode::Success)
}
