//! Sync command - replace the external covers of a whole database.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::io::Write;
use tracing::info;

use super::ExitCode;
use crate::config::{Credentials, Settings};
use crate::cover::CoverOptions;
use crate::fetch::{HttpFetcher, ImageFetcher};
use crate::notion::{query_pages, CreatedTimeFilter, DatabaseApi, DatabaseId, FileUploadApi, NotionClient};
use crate::sync::{eligible_url, CoverSync, FailurePolicy};

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Only pages created on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub since: Option<NaiveDate>,

    /// List the pages that would be updated and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first page that fails
    #[arg(long)]
    pub fail_fast: bool,
}

/// Run the sync command.
pub fn run(args: &SyncArgs, settings: &Settings) -> Result<ExitCode> {
    let credentials = Credentials::from_env()?;
    let database_id = credentials.database_id()?.clone();
    let client = NotionClient::new(credentials.token(), &settings.notion).context("building Notion client")?;
    let fetcher = HttpFetcher::new().context("building HTTP client")?;

    let stdout = std::io::stdout();
    execute(args, &settings.cover, database_id, &client, &fetcher, &mut stdout.lock())
}

/// Query the database and either list or process the pages, writing a
/// summary to `out`
pub fn execute<A, F, W>(
    args: &SyncArgs,
    options: &CoverOptions,
    database_id: DatabaseId,
    api: &A,
    fetcher: &F,
    out: &mut W,
) -> Result<ExitCode>
where
    A: FileUploadApi + DatabaseApi + ?Sized,
    F: ImageFetcher + ?Sized,
    W: Write,
{
    let filter = args.since.map(CreatedTimeFilter::on_or_after);
    info!(database_id = %database_id, since = ?args.since, dry_run = args.dry_run, "starting sync");
    let pages = query_pages(api, database_id, filter);

    if args.dry_run {
        let mut eligible = 0usize;
        for page in pages {
            let page = page.context("querying database")?;
            if let Ok(url) = eligible_url(&page) {
                writeln!(out, "{}\t{}", page.id, url)?;
                eligible += 1;
            }
        }
        writeln!(out, "{eligible} page(s) would be updated")?;
        return Ok(ExitCode::Success);
    }

    let policy = if args.fail_fast {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Continue
    };
    let report = CoverSync::new(api, fetcher, *options)
        .with_policy(policy)
        .sync_pages(pages)
        .context("querying database")?;

    for failure in &report.failed {
        writeln!(out, "failed {}: {}", failure.page_id, failure.error)?;
    }
    writeln!(out, "{report}")?;

    Ok(if report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::PartialFailure
    })
}
