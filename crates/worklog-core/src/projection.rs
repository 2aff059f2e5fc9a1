//! Pure derivations from fetched items to what a table or chart shows.

use crate::datetime::format_display_date;
use crate::query::DateRange;
use crate::resource::CategoryTotal;
use crate::work_log::WorkLog;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkLogRow {
    /// 1-based position in the current list.
    pub number: usize,
    pub id: u64,
    pub task_description: String,
    pub date: String,
    pub contributors: String,
    pub total_hours: f64,
    pub hours_label: String,
    pub hourly_rate: String,
    pub additional_charges: String,
    pub total_remuneration: String,
}

pub fn project(items: &[WorkLog]) -> Vec<WorkLogRow> {
    items
        .iter()
        .enumerate()
        .map(|(index, log)| {
            let total_hours = log.total_hours();
            WorkLogRow {
                number: index + 1,
                id: log.id,
                task_description: log.task_description.clone(),
                date: format_display_date(log.date),
                contributors: log
                    .contributors
                    .iter()
                    .map(|c| c.employee_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                total_hours,
                hours_label: format!("{total_hours} h"),
                hourly_rate: format_rupiah(log.hourly_rate),
                additional_charges: format_rupiah(log.additional_charges),
                total_remuneration: format_rupiah(log.total_remuneration),
            }
        })
        .collect()
}

/// `Rp. 1.234.567`: rounded to whole rupiah, `.` as thousands separator.
pub fn format_rupiah(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp. {sign}{grouped}")
}

/// One bar dataset, ready for a chart widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub fill_colors: Vec<String>,
    pub border_colors: Vec<String>,
}

impl ChartSeries {
    /// Colors derive from each category name, so the same result set always
    /// renders with the same colors no matter how often it is re-projected.
    pub fn from_totals(label: &str, totals: &[CategoryTotal]) -> Self {
        let hues: Vec<u16> = totals.iter().map(|t| hue_for(&t.category)).collect();
        Self {
            label: label.to_string(),
            labels: totals.iter().map(|t| t.category.clone()).collect(),
            values: totals.iter().map(|t| t.total).collect(),
            fill_colors: hues.iter().map(|h| format!("hsl({h}, 70%, 50%)")).collect(),
            border_colors: hues.iter().map(|h| format!("hsl({h}, 70%, 40%)")).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// FNV-1a over the key, folded onto the color wheel.
pub fn hue_for(key: &str) -> u16 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (hash % 360) as u16
}

/// `10 March 2024 - 12 March 2024` for a complete range.
pub fn period_label(range: &DateRange) -> Option<String> {
    let (start, end) = range.bounds()?;
    Some(format!(
        "{} - {}",
        start.format("%d %B %Y"),
        end.format("%d %B %Y")
    ))
}
