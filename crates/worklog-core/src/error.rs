use worklog_shared::ErrorBody;

const GENERIC_FAILURE: &str =
    "Something went wrong while talking to the server.";

/// Field order used when picking the one server message to show.
const FIELD_PRIORITY: [&str; 4] = ["task_description", "date", "hourly_rate", "contributors"];

/// Failure at the network boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with HTTP {status}")]
    Status { status: u16, body: Option<ErrorBody> },
    #[error("server reported an error: {0}")]
    Application(String),
    #[error("unexpected response shape: {0}")]
    Schema(#[from] SchemaError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The most specific message worth showing to a person: a field error
    /// from the server, then its `message`, then a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                body: Some(body), ..
            } => first_field_error(body)
                .or_else(|| body.message.clone().filter(|m| !m.trim().is_empty()))
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ApiError::Application(message) if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

fn first_field_error(body: &ErrorBody) -> Option<String> {
    let errors = body.errors.as_ref()?;
    FIELD_PRIORITY
        .iter()
        .filter_map(|field| errors.get(*field))
        .chain(errors.values())
        .find_map(|messages| messages.first().cloned())
}

/// A payload that decoded as JSON but not into the expected shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("response body is not valid JSON: {0}")]
    Json(String),
    #[error("`data` has the wrong shape: {0}")]
    Data(String),
    #[error("item {id}: {reason}")]
    Item { id: u64, reason: String },
}

/// Pre-flight rejection of a work-log form. Never reaches the network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("task description is required")]
    MissingDescription,
    #[error("date is required")]
    MissingDate,
    #[error("date must be formatted as YYYY-MM-DD")]
    InvalidDate,
    #[error("hourly rate is required")]
    MissingHourlyRate,
    #[error("{field} must be a number greater than or equal to 0")]
    InvalidAmount { field: &'static str },
    #[error("at least one contributor is required")]
    NoContributors,
    #[error("contributor #{row} needs an employee name")]
    ContributorName { row: usize },
    #[error("contributor #{row} needs more than 0 hours")]
    ContributorHours { row: usize },
}

/// Failure of a create, update or delete.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl MutationError {
    pub fn user_message(&self) -> String {
        match self {
            MutationError::Validation(err) => err.to_string(),
            MutationError::Api(err) => err.user_message(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MutationError::Validation(_))
    }
}
