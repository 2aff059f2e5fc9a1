use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::Transport;
use crate::config::Config;
use crate::debounce::{self, DebounceHandle, Settled};
use crate::fetch::{FetchOrchestrator, FetchState};
use crate::query::{QueryState, QueryStore};
use crate::resource::ListResource;

/// Keeps one remote list in sync with its query for the lifetime of a view.
///
/// Search input is debounced; sort and date-range changes refetch at once.
/// Overlapping fetches are fine: only the most recent one is applied.
/// After [`ListController::unmount`] every input is ignored.
pub struct ListController<R: ListResource, T> {
    query: QueryStore<R::Sort>,
    fetch: FetchOrchestrator<R, T>,
    search: DebounceHandle<String>,
    sync_task: JoinHandle<()>,
    mounted: AtomicBool,
}

impl<R: ListResource, T: Transport + 'static> ListController<R, T> {
    /// Starts the controller on the current tokio runtime and issues the
    /// initial fetch.
    pub fn mount(transport: Arc<T>, config: &Config) -> Self {
        let query = QueryStore::new(R::default_sort());
        let fetch = FetchOrchestrator::new(transport, config.timezone);
        let (search, settled) = debounce::spawn(config.search_debounce);

        info!(resource = R::NAME, "mounting list controller");
        tokio::spawn(fetch.refresh(query.snapshot()));
        let sync_task = tokio::spawn(sync_search(query.clone(), fetch.clone(), settled));

        Self {
            query,
            fetch,
            search,
            sync_task,
            mounted: AtomicBool::new(true),
        }
    }

    /// Raw keystrokes from the search box.
    pub fn input_search(&self, text: impl Into<String>) {
        if self.is_mounted() {
            self.search.observe(text.into());
        }
    }

    pub fn set_sort(&self, field: R::Sort) {
        if self.is_mounted() {
            self.query.set_sort(field);
            self.spawn_refresh();
        }
    }

    pub fn set_date_range<Z: TimeZone>(&self, start: Option<&DateTime<Z>>, end: Option<&DateTime<Z>>) {
        if self.is_mounted() {
            self.query.set_date_range(start, end);
            self.spawn_refresh();
        }
    }

    pub fn set_date_range_days(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if self.is_mounted() {
            self.query.set_date_range_days(start, end);
            self.spawn_refresh();
        }
    }

    pub fn clear_date_range(&self) {
        if self.is_mounted() {
            self.query.clear_date_range();
            self.spawn_refresh();
        }
    }

    /// Fetches again with the current query and returns the request to drive.
    /// Unlike the setters this is not gated on being mounted; the caller owns
    /// the returned future and must await or spawn it.
    #[must_use = "the request only runs when the returned future is driven"]
    pub fn refresh(&self) -> impl Future<Output = ()> + Send + use<R, T> {
        self.fetch.refresh(self.query.snapshot())
    }

    /// Refetches with the current query, e.g. from a retry button.
    pub fn retry(&self) {
        if self.is_mounted() {
            self.spawn_refresh();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn query(&self) -> QueryState<R::Sort> {
        self.query.snapshot()
    }

    pub fn subscribe_query(&self) -> watch::Receiver<QueryState<R::Sort>> {
        self.query.subscribe()
    }

    pub fn fetch_state(&self) -> FetchState<R::Item> {
        self.fetch.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<R::Item>> {
        self.fetch.subscribe()
    }

    /// The orchestrator, for mutations that reconcile the list locally.
    pub fn orchestrator(&self) -> &FetchOrchestrator<R, T> {
        &self.fetch
    }

    /// Stops reacting to input. A search still waiting on its quiet period
    /// is dropped, and later setters and retries are ignored.
    pub fn unmount(&self) {
        if !self.mounted.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(resource = R::NAME, "unmounting list controller");
        self.search.cancel();
        self.sync_task.abort();
    }

    fn spawn_refresh(&self) {
        tokio::spawn(self.refresh());
    }
}

impl<R: ListResource, T> Drop for ListController<R, T> {
    fn drop(&mut self) {
        self.sync_task.abort();
    }
}

async fn sync_search<R, T>(query: QueryStore<R::Sort>, fetch: FetchOrchestrator<R, T>, mut settled: Settled<String>)
where
    R: ListResource,
    T: Transport + 'static,
{
    while let Some(text) = settled.recv().await {
        if query.snapshot().search == text {
            debug!("settled search unchanged; skipping fetch");
            continue;
        }
        query.set_search(text);
        tokio::spawn(fetch.refresh(query.snapshot()));
    }
    debug!("search debouncer closed");
}
