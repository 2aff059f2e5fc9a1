#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use worklog_core::api::{ApiRequest, Method, Transport};
use worklog_core::error::ApiError;
use worklog_shared::Envelope;

/// In-memory backend that records every request it sees.
#[derive(Default)]
pub struct FakeApi {
    rows: Mutex<Vec<Value>>,
    requests: Mutex<Vec<ApiRequest>>,
    failures: Mutex<VecDeque<ApiError>>,
}

impl FakeApi {
    pub fn with_ids(ids: &[u64]) -> Self {
        let api = Self::default();
        *api.rows.lock() = ids.iter().map(|id| row(*id)).collect();
        api
    }

    /// The next request fails with `err` instead of being served.
    pub fn fail_next(&self, err: ApiError) {
        self.failures.lock().push_back(err);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests.lock().iter().filter(|r| r.method == method).count()
    }

    pub fn last(&self) -> ApiRequest {
        self.requests.lock().last().cloned().expect("at least one request")
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn execute(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        self.requests.lock().push(request.clone());
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }

        let data = match request.method {
            Method::Get if request.path == "/work-logs" => Value::Array(self.rows.lock().clone()),
            Method::Get => {
                let id = id_from(&request.path);
                self.rows
                    .lock()
                    .iter()
                    .find(|r| r["id"] == json!(id))
                    .cloned()
                    .unwrap_or(Value::Null)
            }
            Method::Post | Method::Put => request.body.clone().unwrap_or(Value::Null),
            Method::Delete => Value::Null,
        };
        Ok(Envelope {
            error: Some(false),
            message: Some("ok".to_string()),
            data: Some(data),
        })
    }
}

fn id_from(path: &str) -> u64 {
    path.rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .unwrap_or_default()
}

pub fn row(id: u64) -> Value {
    json!({
        "id": id,
        "task_description": format!("Task {id}"),
        "date": "2024-03-10",
        "hourly_rate": "75000.00",
        "additional_charges": 0,
        "total_remuneration": 187500,
        "contributors": [{"employee_name": "Ana", "hours_spent": 2.5}]
    })
}

pub fn params(pairs: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
    pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

/// Lets spawned work run without moving the clock meaningfully.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
