mod browser;
mod filter;
mod group;
mod selection;

pub use browser::DocumentBrowser;
pub use filter::FilterCriteria;
pub use group::{group_client, group_portfolio};
pub use selection::{ids_under_node, SelectionState};

use chrono::{Locale, NaiveDate};
use serde::Serialize;

/// A single downloadable tax document, the leaf of the catalog tree.
///
/// `id` is the stable string identifier selection state is keyed by;
/// `raw_id` is the backend identifier used to fetch artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DteFile {
    pub id: String,
    pub raw_id: i64,
    pub name: String,
    /// Display date, always "dd/mm/yyyy".
    pub date: String,
    /// The portal does not report sizes.
    pub size: String,
}

/// One calendar month of documents within a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGroup {
    /// `"{client}/{year}-{month_index}"` with a 0-based month index.
    pub id: String,
    /// Localized full month name, first letter capitalized (e.g. "Agosto").
    pub month_name: String,
    pub files: Vec<DteFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearGroup {
    /// `"{client}/{year}"`.
    pub id: String,
    pub year: i32,
    pub months: Vec<MonthGroup>,
}

/// Top level of the tree: one linked portal account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientGroup {
    pub id: String,
    pub client_name: String,
    pub years: Vec<YearGroup>,
}

/// Tree level a node id belongs to. Node ids are unique within a level,
/// and the year/month id prefixes keep them unique across the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLevel {
    Client,
    Year,
    Month,
}

/// Flatten a tree into its files, client -> year -> month -> file order.
pub fn flatten_files(tree: &[ClientGroup]) -> Vec<&DteFile> {
    tree.iter()
        .flat_map(|client| &client.years)
        .flat_map(|year| &year.months)
        .flat_map(|month| &month.files)
        .collect()
}

/// Spanish month name for a 0-based month index, capitalized.
pub fn month_name(month_index: u32) -> String {
    let name = NaiveDate::from_ymd_opt(2000, month_index + 1, 1)
        .map(|d| d.format_localized("%B", Locale::es_ES).to_string())
        .unwrap_or_default();
    capitalize(&name)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
