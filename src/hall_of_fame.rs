use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::grid::GridPreset;
use crate::leaderboard::Entry;
use crate::submission::Category;

/// Calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// e.g. `January 2026`
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

/// Fastest run for one month, grid and category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub month: MonthKey,
    pub grid: GridPreset,
    pub category: Category,
    pub name: String,
    pub time: String,
    pub ms: u64,
}

/// Whether `challenger` beats `holder`: lower time, then earlier
/// submission, then earlier sheet row
fn beats(challenger: &Entry, holder: &Entry) -> bool {
    (challenger.ms, challenger.timestamp, challenger.row) < (holder.ms, holder.timestamp, holder.row)
}

/// Winners per (month, grid, category), sorted by month, then grid order,
/// then category order. Entries without a timestamp are ignored.
pub fn winners(entries: &[Entry]) -> Vec<Winner> {
    let mut best: HashMap<(MonthKey, GridPreset, Category), &Entry> = HashMap::new();

    for entry in entries {
        let Some(ts) = entry.timestamp else {
            continue;
        };
        let key = (MonthKey::of(&ts), entry.grid, entry.category);
        best.entry(key)
            .and_modify(|holder| {
                if beats(entry, *holder) {
                    *holder = entry;
                }
            })
            .or_insert(entry);
    }

    best.into_iter()
        .map(|((month, grid, category), e)| Winner {
            month,
            grid,
            category,
            name: e.name.clone(),
            time: e.time.clone(),
            ms: e.ms,
        })
        .sorted_by_key(|w| (w.month, w.grid.order(), w.category.order()))
        .collect()
}

/// Months to offer: every month with data plus the current and previous
/// month, ascending
pub fn months(entries: &[Entry], today: NaiveDate) -> Vec<MonthKey> {
    let current = MonthKey::of(&today);
    entries
        .iter()
        .filter_map(|e| e.timestamp.as_ref().map(MonthKey::of))
        .chain([current, current.previous()])
        .sorted()
        .dedup()
        .collect()
}

pub fn for_month(winners: &[Winner], month: MonthKey) -> Vec<Winner> {
    winners
        .iter()
        .filter(|w| w.month == month)
        .cloned()
        .collect()
}
