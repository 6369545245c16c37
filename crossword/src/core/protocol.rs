//! Propose → validate → accept/reject → retry cycle for adding one word.
//!
//! The cycle is an explicit state machine:
//!
//! ```text
//! Proposing ──word──▶ Validating ──ok──▶ Accepted
//!     │                   │
//!     │ no answer /       │ conflict / out of bounds
//!     │ malformed /       │ (rollback tentative append)
//!     │ failed            ▼
//!     └──────────────▶ Rejected ──budget left──▶ Proposing
//!                         │
//!                         └──budget spent──▶ BudgetExhausted
//! ```
//!
//! The word collection is an owned value: it is moved in, extended at most
//! once, and moved back out. Callers never observe a rejected proposal.

use tracing::{debug, warn};

use crate::core::budget::RetryBudget;
use crate::core::grid::{Occupancy, PlacementError, compute_occupancy};
use crate::core::types::{ClueMetadata, PlacedWord};

/// Read-only context handed to a proposer for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct ProposalContext<'a> {
    pub grid_size: usize,
    pub occupancy: &'a Occupancy,
    /// Remaining clues when solving; `None` when constructing.
    pub clues: Option<&'a [ClueMetadata]>,
}

/// What a proposer produced for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// A well-formed placement, pending validation.
    Word(PlacedWord),
    /// The oracle explicitly declined (`message` sentinel).
    NoAnswer(String),
    /// Output could not be turned into a placement.
    Malformed(String),
    /// The oracle call itself failed.
    Failed(String),
}

/// Source of candidate words (an oracle-backed agent, or a script in tests).
pub trait Proposer {
    fn propose(&mut self, context: &ProposalContext<'_>) -> Proposal;
}

/// Reason a single attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoAnswer(String),
    Malformed(String),
    Failed(String),
    Placement(PlacementError),
}

/// States of one `propose_one` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalState {
    Proposing,
    Validating(PlacedWord),
    Accepted(PlacedWord),
    Rejected(Rejection),
    BudgetExhausted,
}

/// Result of trying to add one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalOutcome {
    pub accepted: bool,
    /// The caller's words, extended by the proposal when accepted.
    pub words: Vec<PlacedWord>,
    /// The accepted proposal.
    pub proposal: Option<PlacedWord>,
    /// Number of proposer invocations.
    pub attempts: u32,
    /// Rejections in the order they happened.
    pub rejections: Vec<Rejection>,
}

/// Try to extend `words` by one proposal within `retry_budget` attempts.
pub fn propose_one<P: Proposer + ?Sized>(
    proposer: &mut P,
    grid_size: usize,
    words: Vec<PlacedWord>,
    retry_budget: u32,
) -> ProposalOutcome {
    propose_one_with_clues(proposer, grid_size, words, None, retry_budget)
}

/// Solving variant of [`propose_one`]: the proposer also sees the remaining clues.
pub fn propose_one_with_clues<P: Proposer + ?Sized>(
    proposer: &mut P,
    grid_size: usize,
    mut words: Vec<PlacedWord>,
    clues: Option<&[ClueMetadata]>,
    retry_budget: u32,
) -> ProposalOutcome {
    // Context only: the current words are not revalidated before the call.
    let occupancy = compute_occupancy(&words, grid_size).unwrap_or_else(|err| {
        warn!(%err, "current words do not form a valid grid; proposing without occupancy");
        Occupancy::default()
    });
    let context = ProposalContext {
        grid_size,
        occupancy: &occupancy,
        clues,
    };

    let mut budget = RetryBudget::new(retry_budget);
    let mut attempts = 0u32;
    let mut rejections = Vec::new();
    let mut state = if budget.is_exhausted() {
        ProposalState::BudgetExhausted
    } else {
        ProposalState::Proposing
    };

    loop {
        state = match state {
            ProposalState::Proposing => {
                attempts += 1;
                match proposer.propose(&context) {
                    Proposal::Word(word) => ProposalState::Validating(word),
                    Proposal::NoAnswer(message) => {
                        ProposalState::Rejected(Rejection::NoAnswer(message))
                    }
                    Proposal::Malformed(reason) => {
                        ProposalState::Rejected(Rejection::Malformed(reason))
                    }
                    Proposal::Failed(reason) => ProposalState::Rejected(Rejection::Failed(reason)),
                }
            }
            ProposalState::Validating(word) => {
                words.push(word.clone());
                match compute_occupancy(&words, grid_size) {
                    Ok(_) => ProposalState::Accepted(word),
                    Err(err) => {
                        // Rollback of the tentative append.
                        words.pop();
                        ProposalState::Rejected(Rejection::Placement(err))
                    }
                }
            }
            ProposalState::Rejected(rejection) => {
                debug!(?rejection, attempts, "proposal rejected");
                rejections.push(rejection);
                if budget.consume() {
                    ProposalState::Proposing
                } else {
                    ProposalState::BudgetExhausted
                }
            }
            ProposalState::Accepted(word) => {
                debug!(word = %word.word, attempts, "proposal accepted");
                return ProposalOutcome {
                    accepted: true,
                    words,
                    proposal: Some(word),
                    attempts,
                    rejections,
                };
            }
            ProposalState::BudgetExhausted => {
                debug!(attempts, "proposal budget exhausted");
                return ProposalOutcome {
                    accepted: false,
                    words,
                    proposal: None,
                    attempts,
                    rejections,
                };
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Script {
        proposals: VecDeque<Proposal>,
        calls: u32,
        saw_clues: Vec<usize>,
    }

    impl Script {
        fn new(proposals: Vec<Proposal>) -> Self {
            Self {
                proposals: proposals.into(),
                calls: 0,
                saw_clues: Vec::new(),
            }
        }
    }

    impl Proposer for Script {
        fn propose(&mut self, context: &ProposalContext<'_>) -> Proposal {
            self.calls += 1;
            self.saw_clues.push(context.clues.map_or(0, <[ClueMetadata]>::len));
            self.proposals
                .pop_front()
                .unwrap_or_else(|| Proposal::Failed("script exhausted".to_string()))
        }
    }

    fn placed(word: &str, row: i64, column: i64, is_across: bool) -> PlacedWord {
        PlacedWord {
            word: word.to_string(),
            row,
            column,
            is_across,
            clue: format!("{word} clue"),
        }
    }

    #[test]
    fn accepts_first_valid_proposal() {
        let mut script = Script::new(vec![Proposal::Word(placed("bravo", 0, 1, true))]);
        let outcome = propose_one(&mut script, 10, Vec::new(), 5);
        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.words.len(), 1);
        assert_eq!(outcome.proposal, Some(placed("bravo", 0, 1, true)));
    }

    #[test]
    fn rolls_back_conflicts_and_retries() {
        let start = vec![placed("bravo", 0, 1, true)];
        let mut script = Script::new(vec![
            Proposal::Word(placed("oil", 0, 3, false)),
            Proposal::Malformed("not json".to_string()),
            Proposal::Word(placed("air", 0, 3, false)),
        ]);
        let outcome = propose_one(&mut script, 10, start, 5);
        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(
            outcome.words,
            vec![placed("bravo", 0, 1, true), placed("air", 0, 3, false)]
        );
        assert!(matches!(
            outcome.rejections[0],
            Rejection::Placement(PlacementError::CharacterConflict { row: 0, column: 3, .. })
        ));
    }

    #[test]
    fn exhausted_budget_preserves_collection() {
        let start = vec![placed("bravo", 0, 1, true)];
        let mut script = Script::new(vec![
            Proposal::Word(placed("outside", 9, 9, true)),
            Proposal::NoAnswer("nothing fits".to_string()),
            Proposal::Failed("timeout".to_string()),
            Proposal::Word(placed("late", 5, 5, true)),
        ]);
        let outcome = propose_one(&mut script, 10, start.clone(), 3);
        assert!(!outcome.accepted);
        assert_eq!(script.calls, 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.words, start);
        assert_eq!(outcome.proposal, None);
        assert_eq!(outcome.rejections.len(), 3);
    }

    #[test]
    fn zero_budget_never_calls_proposer() {
        let mut script = Script::new(vec![Proposal::Word(placed("bravo", 0, 1, true))]);
        let outcome = propose_one(&mut script, 10, Vec::new(), 0);
        assert!(!outcome.accepted);
        assert_eq!(script.calls, 0);
    }

    #[test]
    fn clues_are_forwarded_to_proposer() {
        let clues = vec![ClueMetadata {
            row: 0,
            column: 1,
            is_across: true,
            length: 5,
            clue: "form of joy".to_string(),
        }];
        let mut script = Script::new(vec![Proposal::Word(placed("bravo", 0, 1, true))]);
        let outcome = propose_one_with_clues(&mut script, 10, Vec::new(), Some(&clues), 1);
        assert!(outcome.accepted);
        assert_eq!(script.saw_clues, vec![1]);
    }
}
