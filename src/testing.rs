//! In-memory fakes of the remote services, for unit tests.
//!
//! Both fakes record every call so tests can assert on ordering and on the
//! absence of calls. [`TestServer`] serves scripted responses over real HTTP
//! for the clients themselves.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::sync::oneshot;

use crate::error::{ApiError, FetchError, UploadStep};
use crate::fetch::ImageFetcher;
use crate::notion::model::{
    Cover, CreateFileUploadRequest, CreatedTimeFilter, DatabaseId, ExternalFile, FileUpload, FileUploadId, Page, PageId, QueryRequest,
    QueryResponse, UpdatePageRequest,
};
use crate::notion::query::DatabaseApi;
use crate::notion::upload::{FilePart, FileUploadApi};

/// A call received by [`FakeNotion`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create,
    Send {
        id: FileUploadId,
        filename: &'static str,
        content_type: &'static str,
        len: usize,
    },
    Update {
        page_id: PageId,
        cover: Cover,
    },
    Query {
        database_id: DatabaseId,
        filter: Option<CreatedTimeFilter>,
        start_cursor: Option<String>,
        page_size: Option<u32>,
    },
}

/// Fake Notion API with scripted failures
#[derive(Default)]
pub struct FakeNotion {
    calls: RefCell<Vec<Call>>,
    covers: RefCell<Vec<(PageId, Cover)>>,
    sent: RefCell<Vec<Vec<u8>>>,
    next_upload: Cell<u32>,
    fail_at: Option<UploadStep>,
    fail_queries: bool,
    result_pages: Vec<Vec<Page>>,
}

impl FakeNotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call of `step` with a 500
    pub fn failing_at(mut self, step: UploadStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Answer every query with a 500
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Serve these pages of results, one per query, by page id
    pub fn with_result_pages(self, pages: Vec<Vec<&str>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|ids| ids.into_iter().map(|id| page(id, None)).collect())
            .collect();
        self.with_query_results(pages)
    }

    /// Serve these pages of results, one per query
    pub fn with_query_results(mut self, pages: Vec<Vec<Page>>) -> Self {
        self.result_pages = pages;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Covers that were successfully applied, in order
    pub fn covers(&self) -> Vec<(PageId, Cover)> {
        self.covers.borrow().clone()
    }

    /// Bytes of every send call, in order
    pub fn sent_files(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, step: UploadStep) -> Result<(), ApiError> {
        if self.fail_at == Some(step) {
            return Err(server_error());
        }
        Ok(())
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        body: r#"{"object":"error","status":500,"code":"internal_server_error"}"#.to_string(),
    }
}

impl FileUploadApi for FakeNotion {
    fn create_file_upload(&self, _request: &CreateFileUploadRequest) -> Result<FileUpload, ApiError> {
        self.record(Call::Create);
        self.check(UploadStep::Create)?;

        let n = self.next_upload.get() + 1;
        self.next_upload.set(n);
        Ok(FileUpload {
            id: FileUploadId::new(format!("upload-{n}")),
            status: Some("pending".to_string()),
        })
    }

    fn send_file_upload(&self, id: &FileUploadId, file: FilePart) -> Result<(), ApiError> {
        self.record(Call::Send {
            id: id.clone(),
            filename: file.filename,
            content_type: file.content_type,
            len: file.bytes.len(),
        });
        self.check(UploadStep::Send)?;
        self.sent.borrow_mut().push(file.bytes);
        Ok(())
    }

    fn update_page(&self, page_id: &PageId, request: &UpdatePageRequest) -> Result<(), ApiError> {
        self.record(Call::Update {
            page_id: page_id.clone(),
            cover: request.cover.clone(),
        });
        self.check(UploadStep::Bind)?;

        self.covers.borrow_mut().push((page_id.clone(), request.cover.clone()));
        Ok(())
    }
}

impl DatabaseApi for FakeNotion {
    fn query_database(&self, database_id: &DatabaseId, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.record(Call::Query {
            database_id: database_id.clone(),
            filter: request.filter.clone(),
            start_cursor: request.start_cursor.clone(),
            page_size: request.page_size,
        });
        if self.fail_queries {
            return Err(server_error());
        }

        // Cursors are "cursor-N", pointing at the N-th page of results
        let index = match request.start_cursor.as_deref() {
            None => 0,
            Some(cursor) => cursor.trim_start_matches("cursor-").parse().unwrap_or(usize::MAX),
        };
        let results = self.result_pages.get(index).cloned().unwrap_or_default();
        let has_more = index.saturating_add(1) < self.result_pages.len();

        Ok(QueryResponse {
            results,
            has_more,
            next_cursor: has_more.then(|| format!("cursor-{}", index + 1)),
        })
    }
}

/// Fake image host keyed by URL; unknown URLs answer 404
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Result<Vec<u8>, u16>>,
    calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), Ok(bytes));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), Err(status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ImageFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.borrow_mut().push(url.to_string());

        match self.responses.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// A page with the given id and cover
pub fn page(id: &str, cover: Option<Cover>) -> Page {
    Page {
        id: PageId::new(id),
        created_time: None,
        cover,
        url: None,
    }
}

/// A page whose cover points at `url`
pub fn external_page(id: &str, url: &str) -> Page {
    let external = ExternalFile { url: url.to_string() };
    page(id, Some(Cover::External { external }))
}

/// PNG bytes of a solid-colored image
pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encoding");
    bytes
}

/// Scripted answer of [`TestServer`] to one method and path
#[derive(Debug, Clone)]
pub struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    body: Vec<u8>,
}

impl Route {
    pub fn new(method: &'static str, path: &'static str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            path,
            status,
            body: body.into(),
        }
    }
}

/// A request received by [`TestServer`]
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json request body")
    }
}

struct ServerState {
    routes: Vec<Route>,
    captured: Mutex<Vec<Captured>>,
}

/// HTTP server on a random localhost port, running on its own runtime thread
///
/// Unscripted requests answer 404.
pub struct TestServer {
    base_url: String,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn spawn(routes: Vec<Route>) -> Self {
        let state = Arc::new(ServerState {
            routes,
            captured: Mutex::new(Vec::new()),
        });
        let router = Router::new().fallback(respond).with_state(Arc::clone(&state));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test HTTP listener");
        listener.set_nonblocking(true).expect("non-blocking listener");
        let addr = listener.local_addr().expect("read test listener local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("adopt test listener");
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .expect("run test HTTP server");
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Absolute URL of `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<Captured> {
        self.state.captured.lock().expect("captured requests").clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

async fn respond(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Vec<u8>) {
    let path = uri.path().to_string();
    state.captured.lock().expect("captured requests").push(Captured {
        method: method.to_string(),
        path: path.clone(),
        headers,
        body: body.to_vec(),
    });

    match state.routes.iter().find(|r| r.method == method.as_str() && r.path == path) {
        Some(route) => (
            StatusCode::from_u16(route.status).expect("valid status"),
            route.body.clone(),
        ),
        None => (StatusCode::NOT_FOUND, b"not found".to_vec()),
    }
}
