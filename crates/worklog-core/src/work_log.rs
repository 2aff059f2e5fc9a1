use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::Value;
use worklog_shared::{NumberOrText, WorkLogDto};

use crate::datetime::parse_wire_date;
use crate::error::SchemaError;
use crate::query::SortKey;

#[derive(Debug, Clone, PartialEq)]
pub struct Contributor {
    pub employee_name: String,
    pub hours_spent: f64,
}

/// A validated work-log row as served by `/work-logs`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLog {
    pub id: u64,
    pub task_description: String,
    pub date: NaiveDate,
    pub hourly_rate: f64,
    pub additional_charges: f64,
    /// Computed by the server; never recomputed here.
    pub total_remuneration: f64,
    pub contributors: Vec<Contributor>,
}

impl WorkLog {
    pub fn total_hours(&self) -> f64 {
        self.contributors.iter().map(|c| c.hours_spent).sum()
    }

    /// Timestamps in `dto.date` are read as calendar dates in `tz`.
    pub fn try_from_dto(dto: WorkLogDto, tz: Tz) -> Result<Self, SchemaError> {
        let id = dto.id;
        let fail = |reason: String| SchemaError::Item { id, reason };

        let date = parse_wire_date(&dto.date, tz)
            .ok_or_else(|| fail(format!("invalid date {:?}", dto.date)))?;
        let hourly_rate = amount(&dto.hourly_rate, "hourly_rate").map_err(fail)?;
        let additional_charges =
            amount(&dto.additional_charges, "additional_charges").map_err(fail)?;
        let total_remuneration = dto
            .total_remuneration
            .to_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| fail("total_remuneration is not a number".to_string()))?;

        let mut contributors = Vec::with_capacity(dto.contributors.len());
        for (index, c) in dto.contributors.into_iter().enumerate() {
            if c.employee_name.trim().is_empty() {
                return Err(fail(format!("contributor {} has no name", index + 1)));
            }
            let hours_spent = c
                .hours_spent
                .to_f64()
                .filter(|h| h.is_finite() && *h > 0.0)
                .ok_or_else(|| fail(format!("contributor {} has no hours", index + 1)))?;
            contributors.push(Contributor {
                employee_name: c.employee_name,
                hours_spent,
            });
        }

        Ok(Self {
            id,
            task_description: dto.task_description,
            date,
            hourly_rate,
            additional_charges,
            total_remuneration,
            contributors,
        })
    }
}

fn amount(value: &NumberOrText, field: &str) -> Result<f64, String> {
    value
        .to_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| format!("{field} must be a number >= 0"))
}

/// Decodes `data` of `GET /work-logs`: an array of work logs. Absent data is
/// an empty list; any invalid item rejects the whole payload.
pub fn decode_work_logs(data: Option<Value>, tz: Tz) -> Result<Vec<WorkLog>, SchemaError> {
    let Some(data) = data else {
        return Ok(Vec::new());
    };
    if !data.is_array() {
        return Err(SchemaError::Data("expected an array of work logs".to_string()));
    }
    let dtos: Vec<WorkLogDto> =
        serde_json::from_value(data).map_err(|err| SchemaError::Data(err.to_string()))?;
    dtos.into_iter().map(|dto| WorkLog::try_from_dto(dto, tz)).collect()
}

/// Decodes `data` of `GET /work-logs/:id`.
pub fn decode_work_log(data: Option<Value>, tz: Tz) -> Result<WorkLog, SchemaError> {
    let data = data.ok_or_else(|| SchemaError::Data("missing work log".to_string()))?;
    let dto: WorkLogDto =
        serde_json::from_value(data).map_err(|err| SchemaError::Data(err.to_string()))?;
    WorkLog::try_from_dto(dto, tz)
}

/// Columns of the work-log table the backend can order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkLogSort {
    Date,
    TaskDescription,
    HourlyRate,
    AdditionalCharges,
    TotalRemuneration,
}

impl SortKey for WorkLogSort {
    fn as_param(&self) -> &'static str {
        match self {
            WorkLogSort::Date => "date",
            WorkLogSort::TaskDescription => "task_description",
            WorkLogSort::HourlyRate => "hourly_rate",
            WorkLogSort::AdditionalCharges => "additional_charges",
            WorkLogSort::TotalRemuneration => "total_remuneration",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Asia::Jakarta;
    use serde_json::json;

    use super::*;

    fn sample(id: u64) -> Value {
        json!({
            "id": id,
            "task_description": "UI/UX Design",
            "date": "2024-03-10",
            "hourly_rate": "75000.00",
            "additional_charges": 50000,
            "total_remuneration": 237500,
            "contributors": [
                {"employee_name": "Ana", "hours_spent": 1.5},
                {"employee_name": "Budi", "hours_spent": "1.0"}
            ]
        })
    }

    #[test]
    fn decodes_and_sums_hours() {
        let logs = decode_work_logs(Some(json!([sample(1), sample(2)])), Jakarta).expect("valid payload");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].hourly_rate, 75_000.0);
        assert_eq!(logs[0].total_hours(), 2.5);
        assert_eq!(logs[1].total_remuneration, 237_500.0);
    }

    #[test]
    fn one_bad_item_rejects_the_payload() {
        let mut bad = sample(9);
        bad["contributors"][0]["hours_spent"] = json!(0);
        let err = decode_work_logs(Some(json!([sample(1), bad])), Jakarta).expect_err("invalid");
        assert_eq!(
            err,
            SchemaError::Item {
                id: 9,
                reason: "contributor 1 has no hours".to_string()
            }
        );
    }

    #[test]
    fn shape_errors_are_reported() {
        assert!(matches!(
            decode_work_logs(Some(json!({"id": 1})), Jakarta),
            Err(SchemaError::Data(_))
        ));
        assert!(matches!(
            decode_work_logs(Some(json!([{"id": "x"}])), Jakarta),
            Err(SchemaError::Data(_))
        ));
        assert_eq!(decode_work_logs(None, Jakarta).expect("empty"), Vec::new());
    }

    #[test]
    fn negative_rates_are_rejected() {
        let mut bad = sample(3);
        bad["hourly_rate"] = json!(-1);
        assert!(decode_work_log(Some(bad), Jakarta).is_err());
    }

    #[test]
    fn missing_money_fields_are_schema_errors() {
        for field in ["total_remuneration", "hourly_rate"] {
            let mut bad = sample(4);
            bad.as_object_mut().expect("object").remove(field);
            assert!(
                matches!(
                    decode_work_logs(Some(json!([bad])), Jakarta),
                    Err(SchemaError::Data(_))
                ),
                "missing {field}"
            );
        }

        let mut no_charges = sample(5);
        no_charges.as_object_mut().expect("object").remove("additional_charges");
        let logs = decode_work_logs(Some(json!([no_charges])), Jakarta).expect("charges are optional");
        assert_eq!(logs[0].additional_charges, 0.0);
    }

    #[test]
    fn timestamps_resolve_in_the_display_timezone() {
        let mut utc = sample(6);
        utc["date"] = json!("2024-03-09T17:00:00.000000Z");
        let mut naive = sample(7);
        naive["date"] = json!("2024-03-10T00:00:00");

        let logs = decode_work_logs(Some(json!([utc, naive])), Jakarta).expect("valid dates");
        let expected = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");
        assert_eq!(logs[0].date, expected);
        assert_eq!(logs[1].date, expected);
    }
}
