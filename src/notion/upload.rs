//! File upload protocol
//!
//! Replacing a cover takes three calls, each allowed only after the previous
//! one succeeded:
//! 1. create a file upload (reserves a slot, returns its id)
//! 2. send the PNG bytes to that slot
//! 3. point the page cover at the upload
//!
//! [`UploadSession`] encodes the order in its type: `send` exists only on a
//! created session and `bind` only on a filled one, and both consume the
//! session so an id can never be reused. A failed step is not retried and an
//! abandoned slot is left for Notion to expire.

use std::marker::PhantomData;
use tracing::{debug, info, warn};

use super::model::{Cover, CreateFileUploadRequest, FileUpload, FileUploadId, PageId, UpdatePageRequest};
use crate::error::{ApiError, UploadError};

/// Filename sent with the cover bytes
pub const COVER_FILENAME: &str = "cover.png";
/// Media type sent with the cover bytes
pub const COVER_CONTENT_TYPE: &str = "image/png";

/// The file part of a send request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// A PNG cover part
    pub fn cover_png(bytes: Vec<u8>) -> Self {
        Self {
            filename: COVER_FILENAME,
            content_type: COVER_CONTENT_TYPE,
            bytes,
        }
    }
}

/// Remote calls behind the upload protocol
///
/// Send and update succeed on status alone; their response bodies are not
/// read, so a body this tool cannot parse never turns an applied change into
/// an error.
pub trait FileUploadApi {
    /// `POST /file_uploads`
    fn create_file_upload(&self, request: &CreateFileUploadRequest) -> Result<FileUpload, ApiError>;

    /// `POST /file_uploads/{id}/send` as multipart form data, file part named `file`
    fn send_file_upload(&self, id: &FileUploadId, file: FilePart) -> Result<(), ApiError>;

    /// `PATCH /pages/{id}`
    fn update_page(&self, page_id: &PageId, request: &UpdatePageRequest) -> Result<(), ApiError>;
}

/// Session state: slot reserved, no bytes yet
#[derive(Debug)]
pub struct Created;

/// Session state: bytes accepted by the slot
#[derive(Debug)]
pub struct Filled;

/// An in-progress upload, parameterised by how far it got
#[derive(Debug)]
pub struct UploadSession<'a, A: ?Sized, State> {
    api: &'a A,
    id: FileUploadId,
    state: PhantomData<State>,
}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCover {
    pub page_id: PageId,
    pub file_upload_id: FileUploadId,
}

impl<A: ?Sized, State> UploadSession<'_, A, State> {
    /// Session id issued by Notion
    pub fn id(&self) -> &FileUploadId {
        &self.id
    }
}

impl<'a, A: FileUploadApi + ?Sized> UploadSession<'a, A, Created> {
    /// Reserve a new upload slot
    pub fn reserve(api: &'a A) -> Result<Self, UploadError> {
        let upload = api
            .create_file_upload(&CreateFileUploadRequest::default())
            .map_err(UploadError::Init)?;
        debug!(
            file_upload_id = %upload.id,
            status = upload.status.as_deref().unwrap_or("unknown"),
            "reserved file upload"
        );

        Ok(Self {
            api,
            id: upload.id,
            state: PhantomData,
        })
    }

    /// Stream the PNG bytes into the reserved slot
    pub fn send(self, png: Vec<u8>) -> Result<UploadSession<'a, A, Filled>, UploadError> {
        let size = png.len();
        match self.api.send_file_upload(&self.id, FilePart::cover_png(png)) {
            Ok(()) => {
                debug!(file_upload_id = %self.id, bytes = size, "sent cover bytes");
                Ok(UploadSession {
                    api: self.api,
                    id: self.id,
                    state: PhantomData,
                })
            }
            Err(err) => {
                warn!(file_upload_id = %self.id, "abandoning file upload after failed send");
                Err(UploadError::Send(err))
            }
        }
    }
}

impl<A: FileUploadApi + ?Sized> UploadSession<'_, A, Filled> {
    /// Point the page cover at the uploaded file
    pub fn bind(self, page_id: &PageId) -> Result<BoundCover, UploadError> {
        let request = UpdatePageRequest {
            cover: Cover::file_upload(self.id.clone()),
        };
        self.api.update_page(page_id, &request).map_err(UploadError::Bind)?;

        info!(page_id = %page_id, file_upload_id = %self.id(), "page cover replaced");
        Ok(BoundCover {
            page_id: page_id.clone(),
            file_upload_id: self.id,
        })
    }
}

/// Run all three steps for one page with a fresh session
pub fn upload_cover<A: FileUploadApi + ?Sized>(api: &A, page_id: &PageId, png: Vec<u8>) -> Result<BoundCover, UploadError> {
    UploadSession::reserve(api)?.send(png)?.bind(page_id)
}
