use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::Display;

use crate::error::Error;

/// Supported grid sizes, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum GridPreset {
    #[serde(rename = "5x5")]
    #[strum(serialize = "5x5")]
    FiveByFive,
    #[serde(rename = "5x12")]
    #[strum(serialize = "5x12")]
    FiveByTwelve,
    #[serde(rename = "12x12")]
    #[strum(serialize = "12x12")]
    TwelveByTwelve,
    #[serde(rename = "15x15")]
    #[strum(serialize = "15x15")]
    FifteenByFifteen,
}

impl GridPreset {
    pub const ALL: [GridPreset; 4] = [
        GridPreset::FiveByFive,
        GridPreset::FiveByTwelve,
        GridPreset::TwelveByTwelve,
        GridPreset::FifteenByFifteen,
    ];

    pub fn rows(self) -> usize {
        match self {
            GridPreset::FiveByFive | GridPreset::FiveByTwelve => 5,
            GridPreset::TwelveByTwelve => 12,
            GridPreset::FifteenByFifteen => 15,
        }
    }

    pub fn cols(self) -> usize {
        match self {
            GridPreset::FiveByFive => 5,
            GridPreset::FiveByTwelve | GridPreset::TwelveByTwelve => 12,
            GridPreset::FifteenByFifteen => 15,
        }
    }

    pub fn total_cells(self) -> u32 {
        (self.rows() * self.cols()) as u32
    }

    /// Identifier used by spreadsheet sources and payloads, e.g. `12x12`
    pub fn id(self) -> String {
        self.to_string()
    }

    /// Human label, e.g. `12×12`
    pub fn label(self) -> String {
        format!("{}×{}", self.rows(), self.cols())
    }

    /// Next preset, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Position in display order, used for sorting
    pub fn order(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(usize::MAX)
    }
}

impl Default for GridPreset {
    fn default() -> Self {
        GridPreset::TwelveByTwelve
    }
}

impl FromStr for GridPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('×', "x");
        GridPreset::ALL
            .into_iter()
            .find(|p| p.id() == normalized)
            .ok_or_else(|| Error::UnknownGrid(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub value: String,
    /// `None` while empty
    pub correct: Option<bool>,
    pub answer: u32,
}

impl Cell {
    fn new(answer: u32) -> Self {
        Self {
            value: String::new(),
            correct: None,
            answer,
        }
    }

    fn max_len(&self) -> usize {
        self.answer.to_string().len() + 1
    }
}

/// The multiplication grid being filled in
#[derive(Debug, Clone)]
pub struct Grid {
    preset: GridPreset,
    cells: Vec<Vec<Cell>>,
    pub cursor: Pos,
}

impl Grid {
    pub fn new(preset: GridPreset) -> Self {
        let cells = (1..=preset.rows())
            .map(|r| {
                (1..=preset.cols())
                    .map(|c| Cell::new((r * c) as u32))
                    .collect()
            })
            .collect();
        Self {
            preset,
            cells,
            cursor: Pos::default(),
        }
    }

    pub fn preset(&self) -> GridPreset {
        self.preset
    }

    pub fn rows(&self) -> usize {
        self.preset.rows()
    }

    pub fn cols(&self) -> usize {
        self.preset.cols()
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.cells.get(pos.row).and_then(|row| row.get(pos.col))
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &Vec<Cell>> {
        self.cells.iter()
    }

    /// Append a digit to the cell under the cursor. Returns whether the
    /// value changed; input past the cell's length cap is dropped.
    pub fn type_digit(&mut self, digit: char) -> bool {
        if !digit.is_ascii_digit() {
            return false;
        }
        let pos = self.cursor;
        let Some(cell) = self.cells.get_mut(pos.row).and_then(|r| r.get_mut(pos.col)) else {
            return false;
        };
        if cell.value.len() >= cell.max_len() {
            return false;
        }
        cell.value.push(digit);
        cell.correct = Some(cell.value.parse::<u32>().ok() == Some(cell.answer));
        true
    }

    /// Empty the cell under the cursor. Returns whether it had a value.
    pub fn clear(&mut self) -> bool {
        let pos = self.cursor;
        match self.cells.get_mut(pos.row).and_then(|r| r.get_mut(pos.col)) {
            Some(cell) if !cell.value.is_empty() => {
                cell.value.clear();
                cell.correct = None;
                true
            }
            _ => false,
        }
    }

    pub fn current_is_empty(&self) -> bool {
        self.cell(self.cursor)
            .map(|c| c.value.is_empty())
            .unwrap_or(true)
    }

    /// Move to the next cell, wrapping to the start of the next row.
    /// Stays put on the last cell.
    pub fn advance(&mut self) {
        if self.cursor.col + 1 < self.cols() {
            self.cursor.col += 1;
        } else if self.cursor.row + 1 < self.rows() {
            self.cursor = Pos::new(self.cursor.row + 1, 0);
        }
    }

    pub fn move_cursor(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.cursor.row = self.cursor.row.saturating_sub(1),
            Direction::Down => {
                if self.cursor.row + 1 < self.rows() {
                    self.cursor.row += 1;
                }
            }
            Direction::Left => self.cursor.col = self.cursor.col.saturating_sub(1),
            Direction::Right => {
                if self.cursor.col + 1 < self.cols() {
                    self.cursor.col += 1;
                }
            }
        }
    }

    pub fn correct_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.correct == Some(true))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|c| c.correct == Some(true))
    }
}
