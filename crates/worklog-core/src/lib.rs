//! Query-synchronized list views and work-log mutations against the
//! work-log REST API.

pub mod api;
pub mod config;
pub mod controller;
pub mod datetime;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod form;
pub mod mutation;
pub mod projection;
pub mod query;
pub mod resource;
pub mod telemetry;
pub mod work_log;

pub use api::{ApiRequest, HttpTransport, Method, Transport};
pub use config::Config;
pub use controller::ListController;
pub use error::{ApiError, MutationError, SchemaError, ValidationError};
pub use fetch::{FetchOrchestrator, FetchState, FetchStatus};
pub use form::WorkLogDraft;
pub use mutation::{Acknowledgement, ConfirmGate, DeleteOutcome, MutationCoordinator};
pub use query::{DateRange, QueryState, QueryStore, Sort, SortKey, SortOrder};
pub use resource::{CategoryTotal, ListResource, SalesSummary, WorkLogSummary, WorkLogs};
pub use work_log::{Contributor, WorkLog, WorkLogSort};

/// HTTP transport plus one controller per list, built from one config.
pub struct Client {
    pub config: Config,
    transport: std::sync::Arc<HttpTransport>,
}

impl Client {
    #[tracing::instrument(skip_all)]
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let transport = std::sync::Arc::new(HttpTransport::new(&config)?);
        Ok(Self { config, transport })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(Config::load()?)
    }

    pub fn work_logs(&self) -> ListController<WorkLogs, HttpTransport> {
        ListController::mount(self.transport.clone(), &self.config)
    }

    pub fn work_log_summary(&self) -> ListController<WorkLogSummary, HttpTransport> {
        ListController::mount(self.transport.clone(), &self.config)
    }

    pub fn sales_summary(&self) -> ListController<SalesSummary, HttpTransport> {
        ListController::mount(self.transport.clone(), &self.config)
    }

    pub fn mutations(&self) -> MutationCoordinator<HttpTransport> {
        MutationCoordinator::new(self.transport.clone(), &self.config)
    }
}
