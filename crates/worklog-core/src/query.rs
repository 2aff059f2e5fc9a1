use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, TimeZone};
use tokio::sync::watch;
use tracing::debug;

use crate::datetime::{calendar_date, format_wire_date};

/// A column a list can be ordered by. Implementations are closed enums so a
/// sort field is always one of a fixed set of identifiers.
pub trait SortKey: Copy + Eq + Debug + Send + Sync + 'static {
    /// Value sent as the `sort` query parameter.
    fn as_param(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<S> {
    pub field: S,
    pub order: SortOrder,
}

/// Start and end as calendar dates. Either end may be missing while the user
/// is still picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Both endpoints when the range is complete and ordered. A one-sided or
    /// inverted range counts as no range at all.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.bounds().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState<S> {
    pub search: String,
    pub sort: Sort<S>,
    pub date_range: DateRange,
}

impl<S: SortKey> QueryState<S> {
    pub fn new(default_sort: S) -> Self {
        Self {
            search: String::new(),
            sort: Sort {
                field: default_sort,
                order: SortOrder::Ascending,
            },
            date_range: DateRange::default(),
        }
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    /// Same field flips the order; a different field starts ascending.
    pub fn set_sort(&mut self, field: S) {
        if self.sort.field == field {
            self.sort.order = self.sort.order.flipped();
        } else {
            self.sort = Sort {
                field,
                order: SortOrder::Ascending,
            };
        }
    }

    pub fn set_date_range<Z: TimeZone>(
        &mut self,
        start: Option<&DateTime<Z>>,
        end: Option<&DateTime<Z>>,
    ) {
        self.date_range = DateRange {
            start: start.map(calendar_date),
            end: end.map(calendar_date),
        };
    }

    pub fn set_date_range_days(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.date_range = DateRange { start, end };
    }

    pub fn clear_date_range(&mut self) {
        self.date_range = DateRange::default();
    }

    /// `search`, `sort` and `order`, plus `start_date`/`end_date` only for a
    /// complete range.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("search", self.search.clone()),
            ("sort", self.sort.field.as_param().to_string()),
            ("order", self.sort.order.as_param().to_string()),
        ];
        params.extend(self.date_params());
        params
    }

    pub fn date_params(&self) -> Vec<(&'static str, String)> {
        match self.date_range.bounds() {
            Some((start, end)) => vec![
                ("start_date", format_wire_date(start)),
                ("end_date", format_wire_date(end)),
            ],
            None => Vec::new(),
        }
    }
}

/// Owner of one view's query. Every change is broadcast to subscribers.
#[derive(Debug, Clone)]
pub struct QueryStore<S> {
    tx: watch::Sender<QueryState<S>>,
}

impl<S: SortKey> QueryStore<S> {
    pub fn new(default_sort: S) -> Self {
        let (tx, _rx) = watch::channel(QueryState::new(default_sort));
        Self { tx }
    }

    pub fn snapshot(&self) -> QueryState<S> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<S>> {
        self.tx.subscribe()
    }

    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        self.tx.send_if_modified(|state| {
            if state.search == text {
                return false;
            }
            debug!(search = %text, "search changed");
            state.set_search(text);
            true
        });
    }

    pub fn set_sort(&self, field: S) {
        self.tx.send_modify(|state| {
            state.set_sort(field);
            debug!(field = field.as_param(), order = state.sort.order.as_param(), "sort changed");
        });
    }

    pub fn set_date_range<Z: TimeZone>(&self, start: Option<&DateTime<Z>>, end: Option<&DateTime<Z>>) {
        self.tx.send_modify(|state| {
            state.set_date_range(start, end);
            debug!(range = ?state.date_range, "date range changed");
        });
    }

    pub fn set_date_range_days(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.tx.send_modify(|state| state.set_date_range_days(start, end));
    }

    pub fn clear_date_range(&self) {
        self.tx.send_if_modified(|state| {
            let changed = state.date_range != DateRange::default();
            state.clear_date_range();
            changed
        });
    }
}
