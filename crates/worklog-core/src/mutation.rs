use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::{info, instrument, warn};
use worklog_shared::WorkLogPayload;

use crate::api::{ApiRequest, Transport, into_data};
use crate::config::Config;
use crate::error::{ApiError, MutationError};
use crate::fetch::FetchOrchestrator;
use crate::form::WorkLogDraft;
use crate::resource::{Identified, ListResource, WorkLogs};
use crate::work_log::{WorkLog, decode_work_log};

pub const LIST_ROUTE: &str = "/worklogs";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this work log?";

/// Blocking yes/no question put to the user before a destructive action.
pub trait ConfirmGate {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Success notice shown after a save; the view navigates to `route` once
/// `delay` has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub message: String,
    pub route: &'static str,
    pub delay: Duration,
}

impl Acknowledgement {
    /// Waits out the acknowledgement and returns where to go next.
    pub async fn settle(self) -> &'static str {
        tokio::time::sleep(self.delay).await;
        self.route
    }
}

/// Create, update and delete for work logs.
pub struct MutationCoordinator<T> {
    transport: Arc<T>,
    redirect_delay: Duration,
    tz: Tz,
}

impl<T> Clone for MutationCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            redirect_delay: self.redirect_delay,
            tz: self.tz,
        }
    }
}

impl<T: Transport + 'static> MutationCoordinator<T> {
    pub fn new(transport: Arc<T>, config: &Config) -> Self {
        Self {
            transport,
            redirect_delay: config.redirect_delay,
            tz: config.timezone,
        }
    }

    /// Fetches one work log to prefill the edit form.
    #[instrument(skip(self))]
    pub async fn load(&self, id: u64) -> Result<WorkLog, MutationError> {
        let request = ApiRequest::get(item_path(id), Vec::new());
        let envelope = self.transport.execute(request).await.inspect_err(|err| {
            warn!(id, error = %err, "failed to load work log");
        })?;
        let data = into_data(envelope)?;
        decode_work_log(data, self.tz).map_err(|err| MutationError::Api(err.into()))
    }

    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: &WorkLogDraft) -> Result<Acknowledgement, MutationError> {
        let payload = draft.validate()?;
        let request = ApiRequest::post(WorkLogs::PATH, encode(&payload)?);
        self.submit(request).await?;
        info!("work log created");
        Ok(self.acknowledge("Work log saved."))
    }

    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: u64, draft: &WorkLogDraft) -> Result<Acknowledgement, MutationError> {
        let payload = draft.validate()?;
        let request = ApiRequest::put(item_path(id), encode(&payload)?);
        self.submit(request).await?;
        info!("work log updated");
        Ok(self.acknowledge("Work log updated."))
    }

    /// Deletes after confirmation and drops the row from `list` locally.
    /// On failure the list is left as it was and the error is returned.
    #[instrument(skip(self, gate, list))]
    pub async fn delete<R>(
        &self,
        id: u64,
        gate: &dyn ConfirmGate,
        list: &FetchOrchestrator<R, T>,
    ) -> Result<DeleteOutcome, MutationError>
    where
        R: ListResource,
        R::Item: Identified,
    {
        if !gate.confirm(DELETE_PROMPT) {
            info!("delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.submit(ApiRequest::delete(item_path(id))).await?;
        let removed = list.remove_local(id);
        info!(removed, "work log deleted");
        Ok(DeleteOutcome::Deleted)
    }

    async fn submit(&self, request: ApiRequest) -> Result<(), MutationError> {
        let path = request.path.clone();
        let outcome = self
            .transport
            .execute(request)
            .await
            .and_then(into_data);
        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(path = %path, error = %err, "mutation failed");
                Err(err.into())
            }
        }
    }

    fn acknowledge(&self, message: &str) -> Acknowledgement {
        Acknowledgement {
            message: message.to_string(),
            route: LIST_ROUTE,
            delay: self.redirect_delay,
        }
    }
}

fn item_path(id: u64) -> String {
    format!("{}/{id}", WorkLogs::PATH)
}

fn encode(payload: &WorkLogPayload) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(payload)
        .map_err(|err| ApiError::Transport(format!("failed to encode request body: {err}")))
}
