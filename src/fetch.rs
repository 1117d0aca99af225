//! Downloading source images
//!
//! External cover URLs point anywhere on the web, so this client never
//! carries the Notion token.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Source of raw image bytes for a cover URL
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP GET with the client's default timeouts
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(parsed).send().map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(transport)?;
        debug!(url, bytes = bytes.len(), "downloaded source image");
        Ok(bytes.to_vec())
    }
}

/// Reads local files directly and downloads everything else
///
/// Used by the preview command, where the source may be a file on disk.
#[derive(Debug, Clone)]
pub struct PathOrUrlFetcher {
    http: HttpFetcher,
}

impl PathOrUrlFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }
}

impl ImageFetcher for PathOrUrlFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        let path = Path::new(source);
        if path.is_file() {
            return std::fs::read(path).map_err(|source_err| FetchError::Io {
                path: source.to_string(),
                source: source_err,
            });
        }
        self.http.fetch(source)
    }
}
