//! Solver-facing clue views and scoring of guesses against ground truth.

use std::collections::{BTreeSet, HashMap};

use crate::core::types::{ClueMetadata, PlacedWord, Puzzle, SolveResponse};

/// `(row, column, isAcross)`: identifies a slot independently of its answer.
pub type SlotKey = (i64, i64, bool);

/// Ground-truth answer for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    /// Answer as written in the puzzle.
    pub word: String,
    /// Lowercased answer used for comparison.
    pub normalized: String,
}

/// Clue views for every word, in puzzle order.
pub fn clue_metadata(puzzle: &Puzzle) -> Vec<ClueMetadata> {
    puzzle
        .words
        .iter()
        .map(|placed| ClueMetadata {
            row: placed.row,
            column: placed.column,
            is_across: placed.is_across,
            length: placed.word.chars().count(),
            clue: placed.clue.clone(),
        })
        .collect()
}

/// Slot key to answer.
pub fn solution_index(puzzle: &Puzzle) -> HashMap<SlotKey, SolutionEntry> {
    puzzle
        .words
        .iter()
        .map(|placed| {
            (
                placed.key(),
                SolutionEntry {
                    word: placed.word.clone(),
                    normalized: placed.word.to_lowercase(),
                },
            )
        })
        .collect()
}

/// Score one agent's accepted guesses.
///
/// A guess counts once, and only when its slot exists and the answer matches
/// case-insensitively. Every answer not solved is unsolved.
pub fn score_guesses(puzzle: &Puzzle, guesses: &[PlacedWord]) -> SolveResponse {
    let solution = solution_index(puzzle);
    let mut solved = BTreeSet::new();

    for guess in guesses {
        let Some(entry) = solution.get(&guess.key()) else {
            continue;
        };
        if entry.normalized == guess.word.to_lowercase() && !solved.contains(&entry.word) {
            solved.insert(entry.word.clone());
        }
    }

    let unsolved = puzzle
        .words
        .iter()
        .filter(|placed| !solved.contains(&placed.word))
        .map(|placed| placed.word.clone())
        .collect();

    SolveResponse { solved, unsolved }
}

/// Drop every remaining clue whose text matches the accepted guess's clue.
pub fn remove_answered_clue(clues: &mut Vec<ClueMetadata>, guess: &PlacedWord) -> usize {
    let before = clues.len();
    clues.retain(|clue| clue.clue != guess.clue);
    before - clues.len()
}
