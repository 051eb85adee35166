use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{domain::Resource, protocol::ListParams};
use tracing::{debug, info, warn};

use crate::{
    error::{InvalidState, ListSyncError},
    pagination::{clamp_page, total_pages},
    service::RecordService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub filter: Option<String>,
    pub total_count: u64,
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            filter: None,
            total_count: 0,
        }
    }

    pub fn for_resource<R: Resource>() -> Self {
        Self::new(R::PAGE_SIZE)
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    fn clamp(&mut self) {
        self.page = clamp_page(self.page, self.total_pages());
    }

    fn params(&self) -> ListParams {
        ListParams {
            page: self.page,
            page_size: self.page_size,
            search: self.filter.clone(),
        }
    }
}

fn normalize_filter(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A consistent view: `records` and `query.total_count` always come from the same response.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<R> {
    pub query: ListQuery,
    pub records: Vec<R>,
    pub loaded_from: Option<ListParams>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { sequence: u64 },
    Stale { sequence: u64 },
}

struct ListState<R> {
    query: ListQuery,
    records: Vec<R>,
    loaded_from: Option<ListParams>,
    last_error: Option<String>,
    issued: u64,
    disposed: bool,
}

pub struct ListSyncController<R: Resource> {
    service: Arc<dyn RecordService<R>>,
    state: Mutex<ListState<R>>,
}

impl<R: Resource> ListSyncController<R> {
    pub fn new(service: Arc<dyn RecordService<R>>, mut query: ListQuery) -> Self {
        query.clamp();
        Self {
            service,
            state: Mutex::new(ListState {
                query,
                records: Vec::new(),
                loaded_from: None,
                last_error: None,
                issued: 0,
                disposed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn configure(&self, mut query: ListQuery) {
        query.filter = query.filter.as_deref().and_then(normalize_filter);
        query.clamp();
        let mut state = self.lock();
        state.issued += 1;
        state.query = query;
    }

    pub fn query(&self) -> ListQuery {
        self.lock().query.clone()
    }

    pub fn records(&self) -> Vec<R> {
        self.lock().records.clone()
    }

    pub fn total_count(&self) -> u64 {
        self.lock().query.total_count
    }

    pub fn total_pages(&self) -> u32 {
        self.lock().query.total_pages()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> ListSnapshot<R> {
        let state = self.lock();
        ListSnapshot {
            query: state.query.clone(),
            records: state.records.clone(),
            loaded_from: state.loaded_from.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Retrieve the current page. Only the response to the most recently
    /// issued request is applied; on failure the held records stay as they were.
    pub async fn fetch(&self) -> Result<FetchOutcome, ListSyncError> {
        let (sequence, params) = {
            let mut state = self.lock();
            if state.disposed {
                return Err(InvalidState::Disposed.into());
            }
            state.query.clamp();
            state.issued += 1;
            (state.issued, state.query.params())
        };
        debug!(
            sequence,
            page = params.page,
            search = ?params.search,
            "list: fetching {}s",
            R::LABEL
        );

        let result = self.service.list(&params).await;

        let mut state = self.lock();
        if state.disposed || sequence != state.issued {
            debug!(sequence, latest = state.issued, "list: discarding stale response");
            return Ok(FetchOutcome::Stale { sequence });
        }

        match result {
            Ok(page) => {
                state.records = page.results;
                state.query.total_count = page.count;
                state.loaded_from = Some(params);
                state.last_error = None;
                state.query.clamp();
                info!(
                    sequence,
                    total = page.count,
                    rows = state.records.len(),
                    "list: applied {} page",
                    R::LABEL
                );
                Ok(FetchOutcome::Applied { sequence })
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(sequence, error = %message, "list: failed to fetch {}s", R::LABEL);
                state.last_error = Some(message.clone());
                Err(ListSyncError::Fetch(message))
            }
        }
    }

    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome, ListSyncError> {
        {
            let mut state = self.lock();
            state.query.page = page;
            state.query.clamp();
        }
        self.fetch().await
    }

    pub fn set_filter(&self, filter: &str) {
        let mut state = self.lock();
        state.query.filter = normalize_filter(filter);
        state.query.page = 1;
    }

    pub async fn commit_filter(&self) -> Result<FetchOutcome, ListSyncError> {
        self.lock().query.page = 1;
        self.fetch().await
    }

    pub async fn apply_filter(&self, filter: &str) -> Result<FetchOutcome, ListSyncError> {
        self.set_filter(filter);
        self.commit_filter().await
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, ListSyncError> {
        self.fetch().await
    }

    pub fn dispose(&self) {
        let mut state = self.lock();
        state.disposed = true;
        state.issued += 1;
    }
}

#[cfg(test)]
#[path = "tests/list_sync_tests.rs"]
mod tests;
