//! Notion API access
//!
//! - `model.rs` - typed request and response bodies
//! - `client.rs` - authenticated blocking HTTP client
//! - `upload.rs` - the three-step file upload protocol
//! - `query.rs` - paginated database queries
//!
//! The protocol code talks to the traits [`FileUploadApi`] and
//! [`DatabaseApi`]; [`NotionClient`] is the HTTP implementation of both.

pub mod client;
pub mod model;
pub mod query;
pub mod upload;

pub use client::NotionClient;
pub use model::{CreatedTimeFilter, DatabaseId, Page, PageId};
pub use query::{query_pages, DatabaseApi};
pub use upload::{upload_cover, BoundCover, FileUploadApi};

/// API version every request is pinned to
pub const NOTION_VERSION: &str = "2022-06-28";
/// Public API endpoint
pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
