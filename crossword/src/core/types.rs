//! Shared deterministic types for the crossword core.
//!
//! These types define the stable contracts between the grid model, the
//! proposal protocol and the calibrator. Field names serialize in the
//! camelCase form used by puzzle files and oracle payloads.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest grid the CLI accepts.
pub const MIN_GRID_SIZE: usize = 10;

/// One word placed on the grid together with its clue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedWord {
    pub word: String,
    pub row: i64,
    pub column: i64,
    pub is_across: bool,
    pub clue: String,
}

impl PlacedWord {
    /// Ground-truth key used to match a guess back to the puzzle.
    pub fn key(&self) -> (i64, i64, bool) {
        (self.row, self.column, self.is_across)
    }
}

/// An ordered collection of placed words on a square grid.
///
/// Order is placement order; it only affects which word is reported in a
/// conflict, never whether a set of placements is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub grid_size: usize,
    pub words: Vec<PlacedWord>,
}

impl Puzzle {
    pub fn answers(&self) -> Vec<String> {
        self.words.iter().map(|w| w.word.clone()).collect()
    }
}

/// Solver-facing view of a placed word. The answer is withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClueMetadata {
    pub row: i64,
    pub column: i64,
    pub is_across: bool,
    pub length: usize,
    pub clue: String,
}

/// Words one solver agent got right or wrong on one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub solved: BTreeSet<String>,
    pub unsolved: BTreeSet<String>,
}

/// Requested difficulty profile for the finished puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placed_word_uses_camel_case_field_names() {
        let word = PlacedWord {
            word: "bravo".to_string(),
            row: 0,
            column: 1,
            is_across: true,
            clue: "form of joy".to_string(),
        };
        let value = serde_json::to_value(&word).expect("serialize");
        assert_eq!(value["isAcross"], serde_json::Value::Bool(true));
        assert!(value.get("is_across").is_none());
    }

    #[test]
    fn placed_word_ignores_unknown_fields() {
        let raw = r#"{"word":"air","row":0,"column":3,"isAcross":false,"clue":"used to breathe","positions":"(a, 0, 3)"}"#;
        let word: PlacedWord = serde_json::from_str(raw).expect("parse");
        assert_eq!(word.key(), (0, 3, false));
    }
}
