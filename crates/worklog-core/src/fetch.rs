use std::marker::PhantomData;
use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::api::{ApiRequest, Transport, into_data};
use crate::error::ApiError;
use crate::query::QueryState;
use crate::resource::{Identified, ListResource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// What the view renders: the last applied response and its status.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<I> {
    pub status: FetchStatus,
    pub items: Vec<I>,
    pub error_reason: Option<String>,
}

impl<I> Default for FetchState<I> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            items: Vec::new(),
            error_reason: None,
        }
    }
}

impl<I> FetchState<I> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Identifies one issued fetch. Only the most recently minted token may
/// apply its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

struct Inner<I> {
    latest: RequestToken,
    state: FetchState<I>,
}

/// Turns query snapshots into requests for one [`ListResource`] and keeps
/// the resulting [`FetchState`].
pub struct FetchOrchestrator<R: ListResource, T> {
    transport: Arc<T>,
    tz: Tz,
    inner: Arc<Mutex<Inner<R::Item>>>,
    tx: Arc<watch::Sender<FetchState<R::Item>>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: ListResource, T> Clone for FetchOrchestrator<R, T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tz: self.tz,
            inner: Arc::clone(&self.inner),
            tx: Arc::clone(&self.tx),
            _resource: PhantomData,
        }
    }
}

impl<R: ListResource, T: Transport + 'static> FetchOrchestrator<R, T> {
    /// `tz` is the display timezone used to read timestamps in responses.
    pub fn new(transport: Arc<T>, tz: Tz) -> Self {
        let (tx, _rx) = watch::channel(FetchState::default());
        Self {
            transport,
            tz,
            inner: Arc::new(Mutex::new(Inner {
                latest: RequestToken(0),
                state: FetchState::default(),
            })),
            tx: Arc::new(tx),
            _resource: PhantomData,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn snapshot(&self) -> FetchState<R::Item> {
        self.inner.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<R::Item>> {
        self.tx.subscribe()
    }

    /// Fetches the list for `query`. The token is minted and `Loading` is
    /// published before this returns; the returned future performs the
    /// request and never fails, errors land in the state instead.
    ///
    /// The future must be awaited or spawned. Dropping it leaves the state
    /// in `Loading` until the next refresh supersedes it.
    #[must_use = "the request only runs when the returned future is driven"]
    pub fn refresh(&self, query: QueryState<R::Sort>) -> impl Future<Output = ()> + Send + use<R, T> {
        let token = self.begin();
        let request = ApiRequest::get(R::PATH, R::query_params(&query));
        let span = info_span!("refresh", resource = R::NAME, ?token);
        let this = self.clone();
        let tz = self.tz;

        async move {
            debug!(params = ?request.params, "issuing list request");
            let outcome = this
                .transport
                .execute(request)
                .await
                .and_then(into_data)
                .and_then(|data| R::decode(data, tz).map_err(ApiError::from));
            this.complete(token, outcome);
        }
        .instrument(span)
    }

    /// Mints a token and enters `Loading` before anything can suspend.
    fn begin(&self) -> RequestToken {
        let mut inner = self.inner.lock();
        inner.latest = RequestToken(inner.latest.0 + 1);
        inner.state.status = FetchStatus::Loading;
        inner.state.error_reason = None;
        self.tx.send_replace(inner.state.clone());
        inner.latest
    }

    fn complete(&self, token: RequestToken, outcome: Result<Vec<R::Item>, ApiError>) {
        let mut inner = self.inner.lock();
        if token != inner.latest {
            debug!(?token, latest = ?inner.latest, "discarding stale response");
            return;
        }

        inner.state = match outcome {
            Ok(items) => {
                info!(?token, count = items.len(), "list refreshed");
                FetchState {
                    status: FetchStatus::Success,
                    items,
                    error_reason: None,
                }
            }
            Err(err) => {
                warn!(?token, error = %err, "list refresh failed");
                FetchState {
                    status: FetchStatus::Error,
                    items: Vec::new(),
                    error_reason: Some(list_error_reason(&err)),
                }
            }
        };
        self.tx.send_replace(inner.state.clone());
    }
}

impl<R, T> FetchOrchestrator<R, T>
where
    R: ListResource,
    R::Item: Identified,
    T: Transport,
{
    /// Drops the item with `id` from the current list without refetching.
    /// Returns whether anything was removed.
    pub fn remove_local(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.state.items.len();
        inner.state.items.retain(|item| item.id() != id);
        let removed = inner.state.items.len() != before;
        if removed {
            self.tx.send_replace(inner.state.clone());
        }
        removed
    }
}

fn list_error_reason(err: &ApiError) -> String {
    match err {
        ApiError::Schema(err) => format!("The server sent data that could not be read ({err})."),
        ApiError::Transport(_) => "Could not reach the server. Check your connection and retry.".to_string(),
        _ => err.user_message(),
    }
}
