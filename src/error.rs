//! Typed errors for every stage of the cover pipeline.
//!
//! Each stage has its own enum so callers can match on the failing step:
//! fetching the source image, transforming it, or one of the three upload
//! protocol calls. [`SyncError`] wraps them for a single page.

use std::fmt;

/// Failure downloading the source image of an external cover.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The cover URL could not be parsed.
    #[error("invalid cover URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200.
    #[error("fetching {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Reading a local source file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure turning source bytes into an encoded cover.
#[derive(Debug, thiserror::Error)]
pub enum CoverError {
    /// The source bytes are not a decodable raster image.
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    /// PNG encoding of the composited canvas failed.
    #[error("failed to encode cover as PNG: {0}")]
    Encode(#[source] image::ImageError),
}

/// A Notion API call that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API answered with a non-200 status.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request failed before a status was received, or the body was unreadable.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Remote status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
        }
    }
}

/// Failure in one step of the file upload protocol.
///
/// The variant names the step that failed. Later steps were never attempted.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Reserving the upload slot failed.
    #[error("file upload creation failed with {0}")]
    Init(#[source] ApiError),

    /// Sending the bytes to a reserved slot failed. The slot is abandoned.
    #[error("file upload failed with {0}")]
    Send(#[source] ApiError),

    /// Attaching the uploaded file to the page cover failed.
    #[error("updating page cover failed with {0}")]
    Bind(#[source] ApiError),
}

impl UploadError {
    /// Protocol step that produced this error.
    pub fn step(&self) -> UploadStep {
        match self {
            Self::Init(_) => UploadStep::Create,
            Self::Send(_) => UploadStep::Send,
            Self::Bind(_) => UploadStep::Bind,
        }
    }

    /// The underlying API error.
    pub fn api_error(&self) -> &ApiError {
        match self {
            Self::Init(err) | Self::Send(err) | Self::Bind(err) => err,
        }
    }
}

/// The three calls of the upload protocol, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStep {
    Create,
    Send,
    Bind,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Send => "send",
            Self::Bind => "bind",
        })
    }
}

/// Everything that can abort the processing of a single page.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cover(#[from] CoverError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
