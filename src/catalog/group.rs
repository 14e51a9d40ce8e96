use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::catalog::{month_name, ClientGroup, DteFile, MonthGroup, YearGroup};
use crate::portal::InvoiceRecord;

/// Generation-code characters kept in the derived display name.
const NAME_PREFIX_LEN: usize = 8;

/// Group one account's raw invoice records into a year/month tree.
///
/// Records with an unparseable `created_at` are skipped with a warning so
/// that one malformed row never takes down the whole listing. Years and
/// months come out sorted descending (most recent first); files keep the
/// order they arrived in.
pub fn group_client(client_id: &str, client_name: &str, records: &[InvoiceRecord]) -> ClientGroup {
    let mut years: Vec<YearGroup> = Vec::new();

    for record in records {
        let Some(date) = parse_created_at(&record.created_at) else {
            warn!(
                id = record.id,
                created_at = %record.created_at,
                "skipping document with unparseable date"
            );
            continue;
        };

        let year = date.year();
        let month_index = date.month0();

        let yi = match years.iter().position(|y| y.year == year) {
            Some(i) => i,
            None => {
                years.push(YearGroup {
                    id: format!("{client_id}/{year}"),
                    year,
                    months: Vec::new(),
                });
                years.len() - 1
            }
        };

        let month_id = format!("{client_id}/{year}-{month_index}");
        let mi = match years[yi].months.iter().position(|m| m.id == month_id) {
            Some(i) => i,
            None => {
                years[yi].months.push(MonthGroup {
                    id: month_id,
                    month_name: month_name(month_index),
                    files: Vec::new(),
                });
                years[yi].months.len() - 1
            }
        };

        years[yi].months[mi].files.push(DteFile {
            id: record.id.to_string(),
            raw_id: record.id,
            name: derive_name(&record.generation_code),
            date: date.format("%d/%m/%Y").to_string(),
            size: "N/A".to_string(),
        });
    }

    years.sort_by(|a, b| b.year.cmp(&a.year));
    for year in &mut years {
        year.months
            .sort_by(|a, b| month_index_of(b).cmp(&month_index_of(a)));
    }

    ClientGroup {
        id: client_id.to_string(),
        client_name: client_name.to_string(),
        years,
    }
}

/// Group several accounts into a full tree, dropping accounts that end up
/// with no documents so that no empty node ever enters the tree.
pub fn group_portfolio(entries: Vec<(String, String, Vec<InvoiceRecord>)>) -> Vec<ClientGroup> {
    entries
        .into_iter()
        .map(|(id, name, records)| group_client(&id, &name, &records))
        .filter(|client| !client.years.is_empty())
        .collect()
}

/// Month ids end in the 0-based month index.
fn month_index_of(month: &MonthGroup) -> u32 {
    month
        .id
        .rsplit('-')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn derive_name(generation_code: &str) -> String {
    let prefix: String = generation_code.chars().take(NAME_PREFIX_LEN).collect();
    if generation_code.chars().count() > NAME_PREFIX_LEN {
        format!("DTE-{prefix}…")
    } else {
        format!("DTE-{prefix}")
    }
}

/// Accepts the timestamp shapes the portal has been seen to emit.
fn parse_created_at(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
