//! SOQL query cursor.
//!
//! A [`QueryCursor`] walks the pages of one query. Results can be consumed
//! three ways, all driven by the same page fetching:
//!
//! - [`QueryCursor::run`] pushes records into a [`QueryObserver`]
//! - [`QueryCursor::execute`] collects everything into a `Vec`
//! - [`QueryCursor::records`] returns a lazy [`Stream`](futures::Stream)
//!
//! With `auto_fetch` off a cursor fetches a single page. With it on, pages
//! are followed through `nextRecordsUrl` until the service reports the last
//! one or `max_fetch` records have been delivered. A page that would cross
//! `max_fetch` is cut short, so the cursor delivers exactly
//! `min(total_size, max_fetch)` records.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use forcelink_sf_client::{RequestBuilder, SalesforceClient};

use crate::error::{Error, ErrorKind, Result};
use crate::record::Record;

/// One page of query results as sent by the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryResult {
    #[serde(rename = "totalSize")]
    pub total_size: u64,
    pub done: bool,
    #[serde(rename = "nextRecordsUrl", default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
    pub records: Vec<Record>,
}

/// Paging behaviour of a cursor.
///
/// ```rust
/// use forcelink_sf_rest::QueryOptions;
///
/// let options = QueryOptions::new().auto_fetch(true).max_fetch(5000);
/// assert_eq!(options.max_fetch_limit(), Some(5000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    auto_fetch: bool,
    max_fetch: Option<u64>,
    include_deleted: bool,
    batch_size: Option<u32>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `nextRecordsUrl` after the first page. Off by default.
    pub fn auto_fetch(mut self, enabled: bool) -> Self {
        self.auto_fetch = enabled;
        self
    }

    /// Stop after this many records. Unlimited by default.
    pub fn max_fetch(mut self, max: u64) -> Self {
        self.max_fetch = Some(max);
        self
    }

    /// Query through `queryAll`, which also returns deleted and archived rows.
    pub fn include_deleted(mut self, enabled: bool) -> Self {
        self.include_deleted = enabled;
        self
    }

    /// Requested page size (200 to 2000). The service treats it as a hint.
    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn is_auto_fetch(&self) -> bool {
        self.auto_fetch
    }

    pub fn max_fetch_limit(&self) -> Option<u64> {
        self.max_fetch
    }

    pub fn is_include_deleted(&self) -> bool {
        self.include_deleted
    }

    pub fn batch_size_hint(&self) -> Option<u32> {
        self.batch_size
    }
}

/// Lifecycle of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing requested yet.
    Created,
    /// First page in flight.
    Fetching,
    /// Between pages with more to fetch.
    Paused,
    /// A follow-up page in flight.
    Draining,
    /// Finished, successfully or not. No further requests are made.
    Done,
}

/// Receiver for [`QueryCursor::run`].
///
/// Exactly one of `on_end` and `on_error` is called, once, after every
/// `on_record`.
pub trait QueryObserver {
    /// A record, with its zero-based position in the result and the total
    /// size the service reported.
    fn on_record(&mut self, record: Record, index: u64, total_size: u64);

    /// All requested records have been delivered.
    fn on_end(&mut self, total_size: u64, total_fetched: u64);

    /// The query failed. Records already delivered stay valid.
    fn on_error(&mut self, error: Error);
}

/// Cursor over the pages of a SOQL query.
///
/// Created by [`Connection::query`](crate::Connection::query) and friends.
#[derive(Debug, Clone)]
pub struct QueryCursor {
    client: Option<SalesforceClient>,
    soql: Option<String>,
    options: QueryOptions,
    state: CursorState,
    total_size: u64,
    /// Records accepted from pages, delivered or not.
    received: u64,
    total_fetched: u64,
    next_records_url: Option<String>,
    /// Accepted but not yet handed to the caller.
    pending: VecDeque<Record>,
}

impl QueryCursor {
    pub(crate) fn new(
        client: Option<SalesforceClient>,
        soql: impl Into<String>,
        options: QueryOptions,
    ) -> Self {
        Self {
            client,
            soql: Some(soql.into()),
            options,
            state: CursorState::Created,
            total_size: 0,
            received: 0,
            total_fetched: 0,
            pending: VecDeque::new(),
            next_records_url: None,
        }
    }

    /// Cursor that starts at a `nextRecordsUrl` from an earlier page.
    pub(crate) fn resume(
        client: Option<SalesforceClient>,
        next_records_url: impl Into<String>,
        options: QueryOptions,
    ) -> Self {
        Self {
            client,
            soql: None,
            options,
            state: CursorState::Created,
            total_size: 0,
            received: 0,
            total_fetched: 0,
            pending: VecDeque::new(),
            next_records_url: Some(next_records_url.into()),
        }
    }

    pub fn soql(&self) -> Option<&str> {
        self.soql.as_deref()
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// No requests left to make and every accepted record delivered.
    pub fn is_done(&self) -> bool {
        self.state == CursorState::Done && self.pending.is_empty()
    }

    /// Row count reported by the most recent page, 0 before the first.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Records delivered so far.
    pub fn total_fetched(&self) -> u64 {
        self.total_fetched
    }

    /// Locator of the next unread page.
    ///
    /// Still set after a single-page fetch so the rest can be read later
    /// through [`Connection::query_more`](crate::Connection::query_more).
    pub fn next_records_url(&self) -> Option<&str> {
        self.next_records_url.as_deref()
    }

    /// Push every record into `observer`.
    ///
    /// On a finished cursor the observer only receives `on_error` with
    /// [`ErrorKind::InvalidState`].
    #[instrument(skip(self, observer), fields(auto_fetch = self.options.auto_fetch))]
    pub async fn run<O: QueryObserver + ?Sized>(&mut self, observer: &mut O) {
        if let Err(err) = self.ensure_not_done() {
            observer.on_error(err);
            return;
        }

        while let Some(next) = self.next_record().await {
            match next {
                Ok(record) => {
                    observer.on_record(record, self.total_fetched - 1, self.total_size);
                }
                Err(err) => {
                    observer.on_error(err);
                    return;
                }
            }
        }
        observer.on_end(self.total_size, self.total_fetched);
    }

    /// Fetch and collect all records.
    ///
    /// Any failure discards what was collected and returns the error.
    #[instrument(skip(self), fields(auto_fetch = self.options.auto_fetch))]
    pub async fn execute(&mut self) -> Result<Vec<Record>> {
        self.ensure_not_done()?;

        let mut records = Vec::new();
        while let Some(record) = self.next_record().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// Lazily stream records, fetching pages as the stream is polled.
    ///
    /// A failure is yielded as a final `Err` after the records that were
    /// already delivered; the stream then ends. Dropping the stream part way
    /// leaves the undelivered records on the cursor, and a later call picks
    /// up where it stopped.
    ///
    /// ```rust,ignore
    /// use futures::TryStreamExt;
    ///
    /// let mut cursor = conn.query_with("SELECT Id FROM Account", QueryOptions::new().auto_fetch(true));
    /// let mut records = cursor.records();
    /// while let Some(record) = records.try_next().await? {
    ///     println!("{:?}", record.id());
    /// }
    /// ```
    pub fn records(&mut self) -> BoxStream<'_, Result<Record>> {
        if let Err(err) = self.ensure_not_done() {
            return stream::once(async move { Err(err) }).boxed();
        }

        stream::unfold(self, |cursor| async move {
            let next = cursor.next_record().await?;
            Some((next, cursor))
        })
        .boxed()
    }

    fn ensure_not_done(&self) -> Result<()> {
        if self.is_done() {
            return Err(Error::new(ErrorKind::InvalidState(
                "query cursor has already finished".to_string(),
            )));
        }
        Ok(())
    }

    /// Next record in result order, fetching a page when none is pending.
    /// `None` once the cursor is done.
    ///
    /// Errors move the cursor to `Done`.
    async fn next_record(&mut self) -> Option<Result<Record>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                self.total_fetched += 1;
                return Some(Ok(record));
            }
            if self.state == CursorState::Done {
                return None;
            }
            match self.fetch_page().await {
                Ok(records) => self.pending.extend(records),
                Err(err) => {
                    warn!(error = %err, total_fetched = self.total_fetched, "query page failed");
                    self.state = CursorState::Done;
                    self.next_records_url = None;
                    return Some(Err(err));
                }
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<Vec<Record>> {
        let client = self.client.clone().ok_or_else(Error::not_authenticated)?;
        let request = self.page_request(&client)?;

        self.state = match self.state {
            CursorState::Created => CursorState::Fetching,
            _ => CursorState::Draining,
        };

        let page: QueryResult = client.execute(request).await?.json().await?;
        Ok(self.accept(page))
    }

    fn page_request(&self, client: &SalesforceClient) -> Result<RequestBuilder> {
        let request = match (&self.next_records_url, &self.soql) {
            (Some(locator), _) => client.get(&client.url(locator)),
            (None, Some(soql)) => {
                let resource = if self.options.include_deleted {
                    "queryAll"
                } else {
                    "query"
                };
                client.get(&client.rest_url(resource)).query("q", soql.as_str())
            }
            (None, None) => {
                return Err(Error::new(ErrorKind::InvalidState(
                    "no query and no page locator to fetch".to_string(),
                )))
            }
        };

        Ok(match self.options.batch_size {
            Some(size) => request.sforce_query_options(size),
            None => request,
        })
    }

    /// Apply a received page to the cursor and return the records to queue.
    fn accept(&mut self, mut page: QueryResult) -> Vec<Record> {
        self.total_size = page.total_size;

        let cap = match self.options.max_fetch {
            Some(max) => max.min(page.total_size),
            None => page.total_size,
        };
        let remaining = cap.saturating_sub(self.received);
        if page.records.len() as u64 > remaining {
            page.records.truncate(remaining as usize);
        }
        self.received += page.records.len() as u64;

        self.next_records_url = if page.done {
            None
        } else {
            page.next_records_url
        };

        let finished = !self.options.auto_fetch
            || self.next_records_url.is_none()
            || self.received >= cap;
        self.state = if finished {
            CursorState::Done
        } else {
            CursorState::Paused
        };

        debug!(
            page_size = page.records.len(),
            received = self.received,
            total_size = self.total_size,
            state = ?self.state,
            "query page received"
        );
        page.records
    }
}
