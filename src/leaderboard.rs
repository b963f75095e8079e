//! Leaderboard rows read from spreadsheet CSV exports.
//!
//! The exports come from hand-edited sheets, so column names vary. Each row
//! is interpreted by looking for well-known headers first and falling back
//! to the shape of the values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::grid::GridPreset;
use crate::submission::Category;
use crate::util::{is_email, is_time, parse_time};

const NAME_HEADERS: [&str; 4] = ["Name", "Student Name", "Player", "Student"];
const TIME_HEADERS: [&str; 5] = ["time", "best time", "final time", "your time", "result"];
const TIMESTAMP_HEADERS: [&str; 4] = ["Timestamp", "Date", "Submitted At", "Submission Time"];
const MISSING: &str = "N/A";

/// One raw CSV row keyed by header, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub fields: Vec<(String, String)>,
    /// 1-based row number below the header
    pub row: usize,
}

impl SheetRow {
    fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    pub fn name(&self) -> Option<String> {
        let by_header = NAME_HEADERS
            .iter()
            .filter_map(|h| self.get(h))
            .find(|v| usable(v));
        if let Some(name) = by_header {
            return Some(name.to_string());
        }

        self.values()
            .find(|v| usable(v) && !is_email(v) && !is_time(v))
            .map(str::to_string)
    }

    pub fn time(&self) -> Option<String> {
        let by_header = TIME_HEADERS.iter().find_map(|wanted| {
            self.fields
                .iter()
                .find(|(h, _)| h.to_lowercase() == *wanted)
                .map(|(_, v)| v.as_str())
                .filter(|v| is_time(v))
        });
        if let Some(time) = by_header {
            return Some(time.to_string());
        }

        self.values().find(|v| is_time(v)).map(str::to_string)
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let by_header = TIMESTAMP_HEADERS
            .iter()
            .filter_map(|h| self.get(h))
            .find(|v| usable(v));
        match by_header {
            Some(v) => parse_timestamp(v),
            None => self.values().find_map(parse_timestamp),
        }
    }
}

fn usable(v: &str) -> bool {
    !v.is_empty() && v != MISSING
}

/// Parse the timestamp formats spreadsheet exports produce
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt);
    }
    ["%m/%d/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a CSV export into rows. Short rows are padded with `N/A`;
/// rows whose first column is empty are dropped.
pub fn parse_csv<R: Read>(input: R) -> Result<Vec<SheetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.get(0).map(str::is_empty).unwrap_or(true) {
            continue;
        }
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = record.get(i).unwrap_or(MISSING).to_string();
                (h.clone(), value)
            })
            .collect();
        rows.push(SheetRow {
            fields,
            row: index + 1,
        });
    }

    Ok(rows)
}

/// A usable leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub time: String,
    pub ms: u64,
    pub timestamp: Option<NaiveDateTime>,
    pub grid: GridPreset,
    pub category: Category,
    pub row: usize,
}

/// Turn sheet rows into entries; rows without a name or a time are skipped
pub fn entries(rows: &[SheetRow], grid: GridPreset, category: Category) -> Vec<Entry> {
    rows.iter()
        .filter_map(|r| {
            let name = r.name()?;
            let time = r.time()?;
            Some(Entry {
                ms: parse_time(&time).unwrap_or(u64::MAX),
                name,
                time,
                timestamp: r.timestamp(),
                grid,
                category,
                row: r.row,
            })
        })
        .collect()
}

/// Source file for a grid and category, e.g. `12x12-Primary.csv`
pub fn source_path(dir: &Path, grid: GridPreset, category: Category) -> PathBuf {
    dir.join(format!("{}-{}.csv", grid.id(), category))
}

/// Load every known source under `dir`. Missing or unreadable sources are
/// logged and skipped.
pub fn load_dir(dir: &Path) -> Vec<Entry> {
    GridPreset::ALL
        .into_iter()
        .cartesian_product(Category::ALL)
        .flat_map(|(grid, category)| {
            let path = source_path(dir, grid, category);
            if !path.exists() {
                tracing::debug!(path = %path.display(), "no leaderboard source");
                return Vec::new();
            }
            match std::fs::File::open(&path)
                .map_err(Into::into)
                .and_then(parse_csv)
            {
                Ok(rows) => entries(&rows, grid, category),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load leaderboard source");
                    Vec::new()
                }
            }
        })
        .collect()
}

/// Fastest entry per category for one grid
pub fn top_players(entries: &[Entry], grid: GridPreset) -> BTreeMap<Category, Entry> {
    entries
        .iter()
        .filter(|e| e.grid == grid)
        .sorted_by_key(|e| (e.ms, e.row))
        .fold(BTreeMap::new(), |mut best, e| {
            best.entry(e.category).or_insert_with(|| e.clone());
            best
        })
}

/// Entries for one grid and category, fastest first
pub fn ranking(entries: &[Entry], grid: GridPreset, category: Category) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| e.grid == grid && e.category == category)
        .sorted_by_key(|e| (e.ms, e.row))
        .cloned()
        .collect()
}
