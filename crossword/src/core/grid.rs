//! Grid occupancy derived from an ordered sequence of word placements.
//!
//! Occupancy is never stored: every validation recomputes it from the words,
//! so a rejected proposal only has to be removed from the word list.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::types::PlacedWord;

/// A single letter on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: i64,
    pub column: i64,
    pub character: char,
}

/// Flattened cells (one per letter placed, crossings repeated per word) and
/// the words in placement order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub cells: Vec<Cell>,
    pub words: Vec<String>,
}

impl Occupancy {
    /// Cell position to character, with crossings merged.
    pub fn map(&self) -> BTreeMap<(i64, i64), char> {
        self.cells
            .iter()
            .map(|cell| ((cell.row, cell.column), cell.character))
            .collect()
    }

    /// Text drawing of the grid: letters for occupied cells, `_` otherwise.
    pub fn render(&self, grid_size: usize) -> String {
        let map = self.map();
        let mut out = String::new();
        for row in 0..grid_size as i64 {
            let line: Vec<String> = (0..grid_size as i64)
                .map(|column| match map.get(&(row, column)) {
                    Some(ch) => ch.to_string(),
                    None => "_".to_string(),
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

/// Expected, recoverable placement violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    CharacterConflict {
        row: i64,
        column: i64,
        existing: char,
    },
    OutOfBounds {
        row: i64,
        column: i64,
    },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::CharacterConflict {
                row,
                column,
                existing,
            } => write!(
                f,
                "conflict at row {row}, column {column}: cell already holds '{existing}'"
            ),
            PlacementError::OutOfBounds { row, column } => {
                write!(f, "out of bounds at row {row}, column {column}")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Walk every word in order and derive the occupancy of the grid.
///
/// Valid indices are `0..grid_size`. Each word is bounds-checked as a whole
/// before any of its cells is compared with the grid, so a word that leaves
/// the grid is always reported as `OutOfBounds`.
pub fn compute_occupancy(
    words: &[PlacedWord],
    grid_size: usize,
) -> Result<Occupancy, PlacementError> {
    let limit = grid_size as i64;
    let mut occupied: BTreeMap<(i64, i64), char> = BTreeMap::new();
    let mut occupancy = Occupancy {
        cells: Vec::new(),
        words: Vec::with_capacity(words.len()),
    };

    for placed in words {
        if let Some((row, column)) = word_positions(placed)
            .find(|&(row, column)| row < 0 || column < 0 || row >= limit || column >= limit)
        {
            return Err(PlacementError::OutOfBounds { row, column });
        }

        occupancy.words.push(placed.word.clone());
        for ((row, column), character) in word_positions(placed).zip(placed.word.chars()) {
            match occupied.get(&(row, column)) {
                Some(&existing) if existing != character => {
                    return Err(PlacementError::CharacterConflict {
                        row,
                        column,
                        existing,
                    });
                }
                Some(_) => {}
                None => {
                    occupied.insert((row, column), character);
                }
            }
            occupancy.cells.push(Cell {
                row,
                column,
                character,
            });
        }
    }

    Ok(occupancy)
}

/// Cells covered by `placed`, one per character.
fn word_positions(placed: &PlacedWord) -> impl Iterator<Item = (i64, i64)> + '_ {
    let (row, column) = (placed.row, placed.column);
    (0..placed.word.chars().count() as i64).map(move |offset| {
        if placed.is_across {
            (row, column + offset)
        } else {
            (row + offset, column)
        }
    })
}
