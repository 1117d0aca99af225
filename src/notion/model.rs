//! Typed Notion API payloads
//!
//! Only the fields this tool reads or writes are modelled; everything else in
//! a response is ignored by serde.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! notion_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

notion_id!(
    /// Id of a page (a database entry)
    PageId
);
notion_id!(
    /// Id of a database
    DatabaseId
);
notion_id!(
    /// Id of a file upload; doubles as the upload session id
    FileUploadId
);

/// A database entry as returned by the query and update endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cover: Option<Cover>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Page {
    /// Source URL of the cover, only when it is externally hosted
    pub fn external_cover_url(&self) -> Option<&str> {
        match &self.cover {
            Some(Cover::External { external }) => Some(&external.url),
            _ => None,
        }
    }
}

/// A page cover, tagged by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cover {
    /// Image hosted somewhere else, referenced by URL
    External { external: ExternalFile },
    /// File hosted by Notion
    File { file: HostedFile },
    /// File attached through the file upload API
    FileUpload { file_upload: FileUploadRef },
    /// Any cover type this tool does not know about
    #[serde(other)]
    Unsupported,
}

impl Cover {
    /// Cover pointing at a completed file upload
    pub fn file_upload(id: FileUploadId) -> Self {
        Self::FileUpload {
            file_upload: FileUploadRef { id },
        }
    }

    /// The `type` tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::External { .. } => "external",
            Self::File { .. } => "file",
            Self::FileUpload { .. } => "file_upload",
            Self::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedFile {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadRef {
    pub id: FileUploadId,
}

/// Body of `POST /file_uploads`; an empty object requests a single-part upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateFileUploadRequest {}

/// File upload object returned by the create endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileUpload {
    pub id: FileUploadId,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `PATCH /pages/{id}` when replacing the cover
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePageRequest {
    pub cover: Cover,
}

/// Body of `POST /databases/{id}/query`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CreatedTimeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Timestamp filter on the page creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTimeFilter {
    timestamp: &'static str,
    created_time: DateCondition,
}

impl CreatedTimeFilter {
    /// Pages created on or after `date`
    pub fn on_or_after(date: NaiveDate) -> Self {
        Self {
            timestamp: "created_time",
            created_time: DateCondition { on_or_after: date },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DateCondition {
    on_or_after: NaiveDate,
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
