use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{ClientGroup, MonthGroup, YearGroup};

/// The three live filter fields. Empty string means "not set".
///
/// Dates use YYYY-MM-DD; both bounds are inclusive, and the end bound
/// covers its whole day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_term: String,
    pub start_date: String,
    pub end_date: String,
}

impl FilterCriteria {
    pub fn new(
        search_term: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            search_term: search_term.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.start_date.is_empty() && self.end_date.is_empty()
    }

    /// Prune a tree down to the files matching the criteria.
    ///
    /// Pure: the input is never mutated. The text term matches the client
    /// name or the file name, case-insensitively; a client-name hit keeps
    /// every file of that client. Pruning runs bottom-up so no emptied
    /// month, year or client survives.
    pub fn apply(&self, tree: &[ClientGroup]) -> Vec<ClientGroup> {
        if self.is_empty() {
            return tree.to_vec();
        }

        let term = self.search_term.to_lowercase();
        let start = parse_bound(&self.start_date).map(|d| d.and_time(NaiveTime::MIN));
        let end = parse_bound(&self.end_date).and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999));

        tree.iter()
            .filter_map(|client| {
                let client_hit =
                    !term.is_empty() && client.client_name.to_lowercase().contains(&term);

                let years: Vec<YearGroup> = client
                    .years
                    .iter()
                    .filter_map(|year| {
                        let months: Vec<MonthGroup> = year
                            .months
                            .iter()
                            .filter_map(|month| {
                                let files: Vec<_> = month
                                    .files
                                    .iter()
                                    .filter(|file| {
                                        let text_ok = term.is_empty()
                                            || client_hit
                                            || file.name.to_lowercase().contains(&term);
                                        text_ok && in_window(&file.date, start, end)
                                    })
                                    .cloned()
                                    .collect();

                                (!files.is_empty()).then(|| MonthGroup {
                                    id: month.id.clone(),
                                    month_name: month.month_name.clone(),
                                    files,
                                })
                            })
                            .collect();

                        (!months.is_empty()).then(|| YearGroup {
                            id: year.id.clone(),
                            year: year.year,
                            months,
                        })
                    })
                    .collect();

                (!years.is_empty()).then(|| ClientGroup {
                    id: client.id.clone(),
                    client_name: client.client_name.clone(),
                    years,
                })
            })
            .collect()
    }
}

fn parse_bound(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// A file with a malformed stored date never matches an active bound.
fn in_window(date: &str, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let Ok(day) = NaiveDate::parse_from_str(date, "%d/%m/%Y") else {
        return false;
    };
    let at = day.and_time(NaiveTime::MIN);
    start.map_or(true, |s| at >= s) && end.map_or(true, |e| at <= e)
}
