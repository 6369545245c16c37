//! Accuracy scoring and per-word clue rewrite decisions.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::types::{Difficulty, Puzzle, SolveResponse};

const LOW_CEILING: f64 = 0.5;
const HIGH_FLOOR: f64 = 0.75;

/// Accuracy band of a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyBucket {
    /// `accuracy < 0.5`
    Low,
    /// `0.5 <= accuracy <= 0.75`
    Medium,
    /// `accuracy > 0.75`
    High,
}

impl AccuracyBucket {
    pub fn of(accuracy: f64) -> Self {
        if accuracy < LOW_CEILING {
            AccuracyBucket::Low
        } else if accuracy > HIGH_FLOOR {
            AccuracyBucket::High
        } else {
            AccuracyBucket::Medium
        }
    }
}

/// Solved ratio per word across all agent responses.
///
/// A word no agent observed (no responses at all) scores `0.0`.
pub fn score_accuracy(puzzle: &Puzzle, responses: &[SolveResponse]) -> BTreeMap<String, f64> {
    let mut solved: HashMap<&str, u32> = HashMap::new();
    let mut unsolved: HashMap<&str, u32> = HashMap::new();
    for response in responses {
        for word in &response.solved {
            *solved.entry(word.as_str()).or_default() += 1;
        }
        for word in &response.unsolved {
            *unsolved.entry(word.as_str()).or_default() += 1;
        }
    }

    puzzle
        .words
        .iter()
        .map(|placed| {
            let hits = solved.get(placed.word.as_str()).copied().unwrap_or(0);
            let misses = unsolved.get(placed.word.as_str()).copied().unwrap_or(0);
            let total = hits + misses;
            let accuracy = if total == 0 {
                0.0
            } else {
                f64::from(hits) / f64::from(total)
            };
            (placed.word.clone(), accuracy)
        })
        .collect()
}

/// Decide which clues must be rewritten to move toward `target`.
///
/// Returns an empty map when the bucket proportions already match the
/// target, or when no individual word would need a new clue. Otherwise every
/// word maps to whether its clue must change.
pub fn decide_updates(
    words: &[String],
    accuracy: &BTreeMap<String, f64>,
    target: Difficulty,
) -> BTreeMap<String, bool> {
    let accuracy_of = |word: &str| accuracy.get(word).copied().unwrap_or(0.0);

    let total = words.len() as f64;
    let count = |bucket: AccuracyBucket| {
        words
            .iter()
            .filter(|word| AccuracyBucket::of(accuracy_of(word.as_str())) == bucket)
            .count() as f64
    };
    let low = count(AccuracyBucket::Low);
    let medium = count(AccuracyBucket::Medium);
    let high = count(AccuracyBucket::High);

    let matches_target = match target {
        Difficulty::Easy => high >= HIGH_FLOOR * total,
        Difficulty::Hard => low > LOW_CEILING * total,
        Difficulty::Medium => LOW_CEILING * total <= medium && medium < HIGH_FLOOR * total,
    };
    if matches_target {
        return BTreeMap::new();
    }

    let decisions: BTreeMap<String, bool> = words
        .iter()
        .map(|word| {
            let value = accuracy_of(word.as_str());
            let rewrite = match target {
                Difficulty::Easy => value < HIGH_FLOOR,
                Difficulty::Hard => value > LOW_CEILING,
                Difficulty::Medium => AccuracyBucket::of(value) != AccuracyBucket::Medium,
            };
            (word.clone(), rewrite)
        })
        .collect();

    if decisions.values().any(|rewrite| *rewrite) {
        decisions
    } else {
        BTreeMap::new()
    }
}

/// Words whose clue must change, in puzzle order.
pub fn flagged_words(puzzle: &Puzzle, decisions: &BTreeMap<String, bool>) -> Vec<String> {
    let mut flagged: Vec<String> = Vec::new();
    for placed in &puzzle.words {
        if decisions.get(&placed.word).copied().unwrap_or(false) && !flagged.contains(&placed.word)
        {
            flagged.push(placed.word.clone());
        }
    }
    flagged
}

/// One rewritten clue returned by the rewrite oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClueRewrite {
    pub word: String,
    #[serde(default)]
    pub updated_clue: Option<String>,
}

/// Apply non-empty rewrites to flagged words. Returns the words that changed.
pub fn apply_clue_rewrites(
    puzzle: &mut Puzzle,
    flagged: &[String],
    rewrites: &[ClueRewrite],
) -> Vec<String> {
    let mut changed = Vec::new();
    for placed in &mut puzzle.words {
        if !flagged.contains(&placed.word) {
            continue;
        }
        let replacement = rewrites
            .iter()
            .filter(|rewrite| rewrite.word == placed.word)
            .filter_map(|rewrite| rewrite.updated_clue.as_deref())
            .map(str::trim)
            .find(|clue| !clue.is_empty());
        if let Some(clue) = replacement {
            placed.clue = clue.to_string();
            if !changed.contains(&placed.word) {
                changed.push(placed.word.clone());
            }
        }
    }
    changed
}
