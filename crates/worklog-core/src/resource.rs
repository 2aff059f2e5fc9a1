use std::fmt::Debug;

use chrono_tz::Tz;
use serde_json::Value;
use worklog_shared::SummaryDto;

use crate::error::SchemaError;
use crate::query::{QueryState, SortKey};
use crate::work_log::{WorkLog, WorkLogSort, decode_work_logs};

/// Anything that can be removed from a fetched list by id.
pub trait Identified {
    fn id(&self) -> u64;
}

impl Identified for WorkLog {
    fn id(&self) -> u64 {
        self.id
    }
}

/// A remote list the controller can keep in sync with a query.
pub trait ListResource: Send + Sync + 'static {
    type Sort: SortKey;
    type Item: Clone + Debug + PartialEq + Send + Sync + 'static;

    const NAME: &'static str;
    const PATH: &'static str;

    fn default_sort() -> Self::Sort;

    fn query_params(query: &QueryState<Self::Sort>) -> Vec<(&'static str, String)> {
        query.to_params()
    }

    /// The schema boundary: untyped `data` in, validated items out. Dates
    /// are resolved in `tz`.
    fn decode(data: Option<Value>, tz: Tz) -> Result<Vec<Self::Item>, SchemaError>;
}

#[derive(Debug, Clone, Copy)]
pub struct WorkLogs;

impl ListResource for WorkLogs {
    type Sort = WorkLogSort;
    type Item = WorkLog;

    const NAME: &'static str = "work-logs";
    const PATH: &'static str = "/work-logs";

    fn default_sort() -> WorkLogSort {
        WorkLogSort::Date
    }

    fn decode(data: Option<Value>, tz: Tz) -> Result<Vec<WorkLog>, SchemaError> {
        decode_work_logs(data, tz)
    }
}

/// One bar of a summary chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Summary lists are only ordered by category server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySort {
    Category,
}

impl SortKey for SummarySort {
    fn as_param(&self) -> &'static str {
        "category"
    }
}

fn summary_params(query: &QueryState<SummarySort>) -> Vec<(&'static str, String)> {
    query.date_params()
}

pub fn decode_summary(data: Option<Value>) -> Result<Vec<CategoryTotal>, SchemaError> {
    let Some(data) = data else {
        return Ok(Vec::new());
    };
    if !data.is_object() {
        return Err(SchemaError::Data("expected a summary object".to_string()));
    }
    let dto: SummaryDto =
        serde_json::from_value(data).map_err(|err| SchemaError::Data(err.to_string()))?;
    dto.categories
        .into_iter()
        .map(|c| -> Result<CategoryTotal, SchemaError> {
            let total = c.total.to_f64().filter(|v| v.is_finite()).ok_or_else(|| {
                SchemaError::Data(format!("category {:?} has a non-numeric total", c.category))
            })?;
            Ok(CategoryTotal {
                category: c.category,
                total,
            })
        })
        .collect()
}

/// Dashboard totals per category of sold goods.
#[derive(Debug, Clone, Copy)]
pub struct SalesSummary;

impl ListResource for SalesSummary {
    type Sort = SummarySort;
    type Item = CategoryTotal;

    const NAME: &'static str = "sales-summary";
    const PATH: &'static str = "/sales/summary";

    fn default_sort() -> SummarySort {
        SummarySort::Category
    }

    fn query_params(query: &QueryState<SummarySort>) -> Vec<(&'static str, String)> {
        summary_params(query)
    }

    fn decode(data: Option<Value>, _tz: Tz) -> Result<Vec<CategoryTotal>, SchemaError> {
        decode_summary(data)
    }
}

/// Dashboard totals for work logs, same shape as the sales summary.
#[derive(Debug, Clone, Copy)]
pub struct WorkLogSummary;

impl ListResource for WorkLogSummary {
    type Sort = SummarySort;
    type Item = CategoryTotal;

    const NAME: &'static str = "work-log-summary";
    const PATH: &'static str = "/work-logs/summary";

    fn default_sort() -> SummarySort {
        SummarySort::Category
    }

    fn query_params(query: &QueryState<SummarySort>) -> Vec<(&'static str, String)> {
        summary_params(query)
    }

    fn decode(data: Option<Value>, _tz: Tz) -> Result<Vec<CategoryTotal>, SchemaError> {
        decode_summary(data)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[test]
    fn summaries_only_send_complete_date_ranges() {
        let mut query = QueryState::new(SalesSummary::default_sort());
        query.set_search("ignored");
        assert!(SalesSummary::query_params(&query).is_empty());

        query.set_date_range_days(NaiveDate::from_ymd_opt(2024, 1, 1), None);
        assert!(WorkLogSummary::query_params(&query).is_empty());

        query.set_date_range_days(NaiveDate::from_ymd_opt(2024, 1, 1), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(
            SalesSummary::query_params(&query),
            vec![
                ("start_date", "2024-01-01".to_string()),
                ("end_date", "2024-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn summary_decodes_categories() {
        let totals = SalesSummary::decode(
            Some(json!({
                "categories": [
                    {"category": "Konsumsi", "total_sold": 12},
                    {"category": "Pembersih", "total_sold": "3"}
                ]
            })),
            Tz::UTC,
        )
        .expect("valid summary");
        assert_eq!(
            totals,
            vec![
                CategoryTotal { category: "Konsumsi".into(), total: 12.0 },
                CategoryTotal { category: "Pembersih".into(), total: 3.0 },
            ]
        );
        assert_eq!(SalesSummary::decode(None, Tz::UTC).expect("empty"), Vec::new());
        assert!(SalesSummary::decode(Some(json!([])), Tz::UTC).is_err());
    }

    #[test]
    fn work_logs_send_every_facet() {
        let mut query = QueryState::new(WorkLogs::default_sort());
        query.set_search("design");
        let params = WorkLogs::query_params(&query);
        assert_eq!(params[0], ("search", "design".to_string()));
        assert_eq!(params[1], ("sort", "date".to_string()));
        assert_eq!(params[2], ("order", "asc".to_string()));
    }
}
