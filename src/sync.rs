//! Sync driver
//!
//! Walks database entries one at a time. For each entry with an external
//! cover it fetches the source, renders the letterboxed PNG and runs the
//! upload protocol before moving to the next entry. A failing entry never
//! touches the others; the [`FailurePolicy`] decides whether the run goes on.

use std::fmt;
use tracing::{debug, error, info, warn};

use crate::cover::{self, CoverOptions};
use crate::error::SyncError;
use crate::fetch::ImageFetcher;
use crate::notion::{upload_cover, BoundCover, FileUploadApi, Page, PageId};

/// What to do after an entry fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and move on to the next entry
    #[default]
    Continue,
    /// Stop at the first failure
    Abort,
}

/// Why an entry was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCover,
    /// Cover of another type, named by its `type` tag
    NotExternal(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCover => f.write_str("no cover"),
            Self::NotExternal(kind) => write!(f, "{kind} cover"),
        }
    }
}

/// Result of processing one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Updated(BoundCover),
    Skipped(SkipReason),
}

#[derive(Debug)]
pub struct PageFailure {
    pub page_id: PageId,
    pub error: SyncError,
}

/// Tally of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    pub updated: Vec<BoundCover>,
    pub skipped: usize,
    pub failed: Vec<PageFailure>,
    /// Set when [`FailurePolicy::Abort`] cut the run short
    pub aborted: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} skipped, {} failed",
            self.updated.len(),
            self.skipped,
            self.failed.len()
        )?;
        if self.aborted {
            f.write_str(" (aborted)")?;
        }
        Ok(())
    }
}

/// Source URL of an entry that should get a new cover
pub fn eligible_url(page: &Page) -> Result<&str, SkipReason> {
    match (&page.cover, page.external_cover_url()) {
        (_, Some(url)) => Ok(url),
        (None, None) => Err(SkipReason::NoCover),
        (Some(cover), None) => Err(SkipReason::NotExternal(cover.kind())),
    }
}

/// Runs the cover pipeline against an upload API and an image source
pub struct CoverSync<'a, A: ?Sized, F: ?Sized> {
    api: &'a A,
    fetcher: &'a F,
    options: CoverOptions,
    policy: FailurePolicy,
}

impl<'a, A, F> CoverSync<'a, A, F>
where
    A: FileUploadApi + ?Sized,
    F: ImageFetcher + ?Sized,
{
    pub fn new(api: &'a A, fetcher: &'a F, options: CoverOptions) -> Self {
        Self {
            api,
            fetcher,
            options,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch `url`, render it and make it the cover of `page_id`
    pub fn replace_cover(&self, page_id: &PageId, url: &str) -> Result<BoundCover, SyncError> {
        let bytes = self.fetcher.fetch(url)?;
        let rendered = cover::render_bytes(&bytes, &self.options)?;
        drop(bytes);

        Ok(upload_cover(self.api, page_id, rendered.png)?)
    }

    /// Process one entry; non-external covers make no remote calls
    pub fn sync_page(&self, page: &Page) -> Result<PageOutcome, SyncError> {
        let url = match eligible_url(page) {
            Ok(url) => url,
            Err(reason) => {
                debug!(page_id = %page.id, %reason, "skipping page");
                return Ok(PageOutcome::Skipped(reason));
            }
        };

        info!(
            page_id = %page.id,
            page_url = page.url.as_deref().unwrap_or_default(),
            created = ?page.created_time,
            url,
            "replacing external cover"
        );
        self.replace_cover(&page.id, url).map(PageOutcome::Updated)
    }

    /// Process entries in order until they run out or the policy stops the run
    ///
    /// An `Err` from `pages` itself (a failed query) ends the run and is
    /// returned as is.
    pub fn sync_pages<I, E>(&self, pages: I) -> Result<SyncReport, E>
    where
        I: IntoIterator<Item = Result<Page, E>>,
    {
        let mut report = SyncReport::default();

        for page in pages {
            let page = page?;
            match self.sync_page(&page) {
                Ok(PageOutcome::Updated(bound)) => report.updated.push(bound),
                Ok(PageOutcome::Skipped(_)) => report.skipped += 1,
                Err(err) => {
                    match &err {
                        SyncError::Upload(upload) => error!(
                            page_id = %page.id,
                            step = %upload.step(),
                            status = ?upload.api_error().status(),
                            error = %err,
                            "failed to replace cover"
                        ),
                        _ => error!(page_id = %page.id, error = %err, "failed to replace cover"),
                    }
                    report.failed.push(PageFailure {
                        page_id: page.id,
                        error: err,
                    });
                    if self.policy == FailurePolicy::Abort {
                        warn!("stopping after first failure");
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        info!(
            updated = report.updated.len(),
            skipped = report.skipped,
            failed = report.failed.len(),
            "sync finished"
        );
        Ok(report)
    }
}
