//! Puzzle construction: add words one at a time until the target count or budget.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::budget::RetryBudget;
use crate::core::protocol::{Proposer, propose_one};
use crate::core::types::Puzzle;
use crate::io::config::BuildSettings;
use crate::io::puzzle_store::write_snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    pub grid_size: usize,
    pub word_count: usize,
    /// Proposer calls per word.
    pub word_retry_budget: u32,
    /// Consecutive failed rounds tolerated; refilled after every added word.
    pub puzzle_retry_budget: u32,
}

impl BuildConfig {
    pub fn new(grid_size: usize, word_count: usize, settings: &BuildSettings) -> Self {
        Self {
            grid_size,
            word_count,
            word_retry_budget: settings.word_retry_budget,
            puzzle_retry_budget: settings.puzzle_retry_budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub puzzle: Puzzle,
    pub placed: usize,
    /// `placed == word_count`.
    pub complete: bool,
    /// Rounds played, successful or not.
    pub rounds: u32,
}

/// Build a puzzle. Budget exhaustion yields a partial puzzle, never an error.
#[instrument(skip_all, fields(grid_size = config.grid_size, word_count = config.word_count))]
pub fn build_puzzle<P: Proposer + ?Sized>(proposer: &mut P, config: &BuildConfig) -> BuildOutcome {
    let mut words = Vec::new();
    let mut budget = RetryBudget::new(config.puzzle_retry_budget);
    let mut rounds = 0u32;

    while words.len() < config.word_count && !budget.is_exhausted() {
        rounds += 1;
        let outcome = propose_one(proposer, config.grid_size, words, config.word_retry_budget);
        words = outcome.words;
        match outcome.proposal {
            Some(word) if outcome.accepted => {
                budget.reset();
                info!(word = %word.word, placed = words.len(), "added word");
            }
            _ => {
                budget.consume();
                warn!(
                    attempts = outcome.attempts,
                    budget_left = budget.remaining(),
                    "failed to add a word this round"
                );
            }
        }
    }

    let placed = words.len();
    let complete = placed == config.word_count;
    info!(placed, complete, rounds, "build finished");
    BuildOutcome {
        puzzle: Puzzle {
            grid_size: config.grid_size,
            words,
        },
        placed,
        complete,
        rounds,
    }
}

/// Build and persist the result as snapshot 0.
pub fn build_and_store<P: Proposer + ?Sized>(
    proposer: &mut P,
    config: &BuildConfig,
    output_dir: &Path,
) -> Result<(BuildOutcome, PathBuf)> {
    let outcome = build_puzzle(proposer, config);
    let path = write_snapshot(output_dir, 0, &outcome.puzzle)?;
    Ok((outcome, path))
}
