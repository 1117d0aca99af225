//! Blocking HTTP client for the Notion API
//!
//! Every request carries the bearer token and the pinned `Notion-Version`
//! header. Any status other than 200 becomes [`ApiError::Status`] with the raw
//! response body kept for diagnosis. Calls whose result is not needed check
//! the status only and leave the body unparsed.

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

use super::model::{CreateFileUploadRequest, DatabaseId, FileUpload, FileUploadId, PageId, QueryRequest, QueryResponse, UpdatePageRequest};
use super::query::DatabaseApi;
use super::upload::{FilePart, FileUploadApi};
use crate::config::NotionSettings;
use crate::error::ApiError;

const VERSION_HEADER: &str = "Notion-Version";

/// Authenticated Notion API client
pub struct NotionClient {
    http: Client,
    api_base: String,
    version: String,
    token: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("api_base", &self.api_base)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    /// Build a client for `token` against the configured endpoint
    pub fn new(token: &str, settings: &NotionSettings) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            version: settings.version.clone(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .bearer_auth(&self.token)
            .header(VERSION_HEADER, &self.version)
    }

    fn execute<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T, ApiError> {
        let response = expect_ok(request.send()?)?;
        debug!(path, status = response.status().as_u16(), "notion request succeeded");
        Ok(response.json()?)
    }

    fn execute_unit(&self, path: &str, request: RequestBuilder) -> Result<(), ApiError> {
        let response = expect_ok(request.send()?)?;
        debug!(path, status = response.status().as_u16(), "notion request succeeded");
        Ok(())
    }
}

/// Turn anything but 200 into an error carrying the status and body
fn expect_ok(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

impl FileUploadApi for NotionClient {
    fn create_file_upload(&self, request: &CreateFileUploadRequest) -> Result<FileUpload, ApiError> {
        let path = "file_uploads";
        self.execute(path, self.request(Method::POST, path).json(request))
    }

    fn send_file_upload(&self, id: &FileUploadId, file: FilePart) -> Result<(), ApiError> {
        let path = format!("file_uploads/{id}/send");
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(file.content_type)?;
        let form = Form::new().part("file", part);

        self.execute_unit(&path, self.request(Method::POST, &path).multipart(form))
    }

    fn update_page(&self, page_id: &PageId, request: &UpdatePageRequest) -> Result<(), ApiError> {
        let path = format!("pages/{page_id}");
        self.execute_unit(&path, self.request(Method::PATCH, &path).json(request))
    }
}

impl DatabaseApi for NotionClient {
    fn query_database(&self, database_id: &DatabaseId, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        let path = format!("databases/{database_id}/query");
        self.execute(&path, self.request(Method::POST, &path).json(request))
    }
}
