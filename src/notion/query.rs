//! Database queries with cursor pagination

use std::collections::VecDeque;
use tracing::debug;

use super::model::{CreatedTimeFilter, DatabaseId, Page, QueryRequest, QueryResponse};
use crate::error::ApiError;

/// Largest page size the query endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Remote call behind database queries
pub trait DatabaseApi {
    /// `POST /databases/{id}/query`
    fn query_database(&self, database_id: &DatabaseId, request: &QueryRequest) -> Result<QueryResponse, ApiError>;
}

/// Iterator over every page matching a query, fetching result pages lazily
///
/// Yields at most one error, after which it is exhausted.
pub struct Pages<'a, A: ?Sized> {
    api: &'a A,
    database_id: DatabaseId,
    filter: Option<CreatedTimeFilter>,
    buffered: VecDeque<Page>,
    cursor: Option<String>,
    exhausted: bool,
}

/// Query all pages of a database, optionally filtered by creation date
pub fn query_pages<'a, A: DatabaseApi + ?Sized>(
    api: &'a A,
    database_id: DatabaseId,
    filter: Option<CreatedTimeFilter>,
) -> Pages<'a, A> {
    Pages {
        api,
        database_id,
        filter,
        buffered: VecDeque::new(),
        cursor: None,
        exhausted: false,
    }
}

impl<A: DatabaseApi + ?Sized> Pages<'_, A> {
    fn fetch_next(&mut self) -> Result<(), ApiError> {
        let request = QueryRequest {
            filter: self.filter.clone(),
            start_cursor: self.cursor.take(),
            page_size: Some(MAX_PAGE_SIZE),
        };
        let response = self.api.query_database(&self.database_id, &request)?;
        debug!(
            database_id = %self.database_id,
            results = response.results.len(),
            has_more = response.has_more,
            "queried database"
        );

        self.buffered.extend(response.results);
        self.cursor = response.next_cursor.filter(|_| response.has_more);
        self.exhausted = self.cursor.is_none();
        Ok(())
    }
}

impl<A: DatabaseApi + ?Sized> Iterator for Pages<'_, A> {
    type Item = Result<Page, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(page) = self.buffered.pop_front() {
                return Some(Ok(page));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_next() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}
