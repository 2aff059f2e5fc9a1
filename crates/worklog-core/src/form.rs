use worklog_shared::{ContributorPayload, WorkLogPayload};

use crate::datetime::{format_wire_date, parse_form_date};
use crate::error::ValidationError;
use crate::work_log::WorkLog;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContributorDraft {
    pub employee_name: String,
    pub hours_spent: f64,
}

/// The work-log form as typed. Text fields hold raw input; nothing is
/// trimmed or parsed until [`WorkLogDraft::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLogDraft {
    pub task_description: String,
    pub date: String,
    pub hourly_rate: String,
    pub additional_charges: String,
    contributors: Vec<ContributorDraft>,
}

impl Default for WorkLogDraft {
    fn default() -> Self {
        Self {
            task_description: String::new(),
            date: String::new(),
            hourly_rate: String::new(),
            additional_charges: String::new(),
            contributors: vec![ContributorDraft::default()],
        }
    }
}

impl WorkLogDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefills the edit form from a fetched work log.
    pub fn from_work_log(log: &WorkLog) -> Self {
        Self {
            task_description: log.task_description.clone(),
            date: format_wire_date(log.date),
            hourly_rate: log.hourly_rate.to_string(),
            additional_charges: log.additional_charges.to_string(),
            contributors: log
                .contributors
                .iter()
                .map(|c| ContributorDraft {
                    employee_name: c.employee_name.clone(),
                    hours_spent: c.hours_spent,
                })
                .collect(),
        }
    }

    pub fn contributors(&self) -> &[ContributorDraft] {
        &self.contributors
    }

    pub fn add_contributor(&mut self) {
        self.contributors.push(ContributorDraft::default());
    }

    /// Removes a row. The last remaining row cannot be removed.
    pub fn remove_contributor(&mut self, index: usize) -> bool {
        if self.contributors.len() <= 1 || index >= self.contributors.len() {
            return false;
        }
        self.contributors.remove(index);
        true
    }

    pub fn set_contributor_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(row) = self.contributors.get_mut(index) {
            row.employee_name = name.into();
        }
    }

    /// Stores the hours typed into a row. Anything that is not a positive
    /// number becomes 0.
    pub fn set_contributor_hours(&mut self, index: usize, raw: &str) {
        if let Some(row) = self.contributors.get_mut(index) {
            row.hours_spent = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|h| h.is_finite() && *h > 0.0)
                .unwrap_or(0.0);
        }
    }

    /// Checks every rule the backend would enforce and produces the request
    /// body.
    pub fn validate(&self) -> Result<WorkLogPayload, ValidationError> {
        if self.contributors.is_empty() {
            return Err(ValidationError::NoContributors);
        }
        for (index, row) in self.contributors.iter().enumerate() {
            if row.employee_name.trim().is_empty() {
                return Err(ValidationError::ContributorName { row: index + 1 });
            }
            if !(row.hours_spent.is_finite() && row.hours_spent > 0.0) {
                return Err(ValidationError::ContributorHours { row: index + 1 });
            }
        }

        if self.task_description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let date = parse_form_date(&self.date).ok_or(ValidationError::InvalidDate)?;
        if self.hourly_rate.trim().is_empty() {
            return Err(ValidationError::MissingHourlyRate);
        }
        let hourly_rate = parse_amount(&self.hourly_rate, "hourly rate")?;
        let additional_charges = if self.additional_charges.trim().is_empty() {
            0.0
        } else {
            parse_amount(&self.additional_charges, "additional charges")?
        };

        Ok(WorkLogPayload {
            task_description: self.task_description.clone(),
            date: format_wire_date(date),
            hourly_rate,
            additional_charges,
            contributors: self
                .contributors
                .iter()
                .map(|row| ContributorPayload {
                    employee_name: row.employee_name.clone(),
                    hours_spent: row.hours_spent,
                })
                .collect(),
        })
    }
}

fn parse_amount(raw: &str, field: &'static str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or(ValidationError::InvalidAmount { field })
}
