use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize
};

/// Numeric value as the backend may send
/// it: a JSON number or a decimal
/// rendered as text (`"75000.00"`).
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(untagged)]
pub enum NumberOrText {
  Number(f64),
  Text(String)
}

impl NumberOrText {
  pub fn to_f64(&self) -> Option<f64> {
    match self {
      | Self::Number(n) => Some(*n),
      | Self::Text(raw) => {
        raw.trim().parse::<f64>().ok()
      }
    }
  }
}

impl Default for NumberOrText {
  fn default() -> Self {
    Self::Number(0.0)
  }
}

impl From<f64> for NumberOrText {
  fn from(value: f64) -> Self {
    Self::Number(value)
  }
}

/// Top-level response body of every
/// endpoint.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct Envelope {
  #[serde(default)]
  pub error:   Option<bool>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub data:    Option<serde_json::Value>
}

impl Envelope {
  pub fn reports_error(&self) -> bool {
    self.error.unwrap_or(false)
  }
}

/// Body of a 4xx/5xx response.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
  Eq,
)]
pub struct ErrorBody {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub errors:
    Option<BTreeMap<String, Vec<String>>>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct ContributorDto {
  #[serde(default)]
  pub employee_name: String,
  #[serde(default)]
  pub hours_spent:   NumberOrText
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct WorkLogDto {
  pub id:                 u64,
  #[serde(default)]
  pub task_description:   String,
  pub date:               String,
  pub hourly_rate:        NumberOrText,
  /// Optional on the wire; absent means
  /// no additional charges.
  #[serde(default)]
  pub additional_charges: NumberOrText,
  pub total_remuneration: NumberOrText,
  #[serde(default)]
  pub contributors:
    Vec<ContributorDto>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct ContributorPayload {
  pub employee_name: String,
  pub hours_spent:   f64
}

/// Body of `POST /work-logs` and
/// `PUT /work-logs/:id`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct WorkLogPayload {
  pub task_description:   String,
  pub date:               String,
  pub hourly_rate:        f64,
  pub additional_charges: f64,
  pub contributors:
    Vec<ContributorPayload>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct CategoryTotalDto {
  pub category: String,
  #[serde(
    alias = "total_sold",
    alias = "total_hours"
  )]
  pub total:    NumberOrText
}

/// `data` of the summary endpoints.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
)]
pub struct SummaryDto {
  #[serde(default)]
  pub categories: Vec<CategoryTotalDto>
}
