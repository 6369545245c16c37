//! One solver agent working through a puzzle's clues.

use tracing::{debug, info, instrument};

use crate::core::budget::RetryBudget;
use crate::core::grid::compute_occupancy;
use crate::core::protocol::{Proposer, propose_one_with_clues};
use crate::core::scoring::{clue_metadata, remove_answered_clue, score_guesses};
use crate::core::types::{PlacedWord, Puzzle, SolveResponse};
use crate::io::config::SolveSettings;
use crate::io::log_sink::AgentLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveConfig {
    /// Proposer calls per guess round.
    pub attempt_budget: u32,
    /// Consecutive unproductive rounds before the agent gives up.
    pub retry_budget: u32,
    /// Budget left after a round that answers a clue.
    pub reset_budget: u32,
}

impl From<&SolveSettings> for SolveConfig {
    fn from(settings: &SolveSettings) -> Self {
        Self {
            attempt_budget: settings.attempt_budget,
            retry_budget: settings.retry_budget,
            reset_budget: settings.reset_budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveReport {
    pub agent: String,
    pub response: SolveResponse,
    /// The agent's final grid: every accepted guess in order.
    pub guesses: Vec<PlacedWord>,
    pub rounds: u32,
}

/// Let one agent solve `puzzle` until every clue is consumed or it runs out of budget.
///
/// A round that is accepted but consumes no clue (the guess names a clue
/// text that is not remaining) counts against the budget.
#[instrument(skip_all, fields(agent = log.agent()))]
pub fn solve_one<P: Proposer + ?Sized>(
    proposer: &mut P,
    puzzle: &Puzzle,
    config: &SolveConfig,
    log: &AgentLog,
) -> SolveReport {
    let mut clues = clue_metadata(puzzle);
    let mut guesses: Vec<PlacedWord> = Vec::new();
    let mut budget = RetryBudget::new(config.retry_budget);
    let mut rounds = 0u32;

    while !clues.is_empty() && !budget.is_exhausted() {
        rounds += 1;
        let outcome = propose_one_with_clues(
            proposer,
            puzzle.grid_size,
            guesses,
            Some(&clues),
            config.attempt_budget,
        );
        guesses = outcome.words;

        let removed = match &outcome.proposal {
            Some(guess) if outcome.accepted => remove_answered_clue(&mut clues, guess),
            _ => 0,
        };
        if removed > 0 {
            budget.reset_to(config.reset_budget);
            let grid = compute_occupancy(&guesses, puzzle.grid_size)
                .map(|occupancy| occupancy.render(puzzle.grid_size))
                .unwrap_or_default();
            log.line(format!("{} clues left\n{grid}", clues.len()));
            debug!(remaining = clues.len(), "guess accepted");
        } else {
            budget.consume();
            debug!(budget_left = budget.remaining(), "round produced no answer");
        }
    }

    let response = score_guesses(puzzle, &guesses);
    let summary = format!("Correct {}/{}", response.solved.len(), puzzle.words.len());
    info!(rounds, solved = response.solved.len(), "{summary}");
    log.line(summary);

    SolveReport {
        agent: log.agent().to_string(),
        response,
        guesses,
        rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::Proposal;
    use crate::io::log_sink::LogSink;
    use crate::test_support::{ScriptedProposer, bravo_air_puzzle, placed};

    fn config() -> SolveConfig {
        SolveConfig {
            attempt_budget: 1,
            retry_budget: 2,
            reset_budget: 2,
        }
    }

    #[test]
    fn solves_every_clue() {
        let sink = LogSink::new();
        let mut proposer = ScriptedProposer::new(vec![
            Proposal::Word(placed("air", 0, 3, false)),
            Proposal::Word(placed("bravo", 0, 1, true)),
        ]);
        let report = solve_one(&mut proposer, &bravo_air_puzzle(), &config(), &sink.agent("gpt"));

        assert_eq!(report.response.solved.len(), 2);
        assert!(report.response.unsolved.is_empty());
        assert_eq!(report.rounds, 2);
        let lines = sink.drain();
        assert_eq!(lines.last().map(|l| l.message.as_str()), Some("Correct 2/2"));
    }

    #[test]
    fn wrong_letters_stay_unsolved_and_budget_runs_out() {
        let sink = LogSink::new();
        let mut guess = placed("bravX", 0, 1, true);
        guess.clue = "clue for bravo".to_string();
        let mut proposer = ScriptedProposer::new(vec![Proposal::Word(guess)]);
        let report = solve_one(&mut proposer, &bravo_air_puzzle(), &config(), &sink.agent("gpt"));

        assert!(report.response.solved.is_empty());
        assert_eq!(report.response.unsolved.len(), 2);
        // One accepted round, then two declined rounds exhaust the budget.
        assert_eq!(report.rounds, 3);
        assert_eq!(proposer.calls(), 3);
    }

    #[test]
    fn answered_clue_refills_to_reset_budget() {
        let sink = LogSink::new();
        let config = SolveConfig {
            attempt_budget: 1,
            retry_budget: 5,
            reset_budget: 1,
        };
        let mut proposer = ScriptedProposer::new(vec![Proposal::Word(placed("air", 0, 3, false))]);
        let report = solve_one(&mut proposer, &bravo_air_puzzle(), &config, &sink.agent("gpt"));

        // After the answer a single declined round ends the agent.
        assert_eq!(report.rounds, 2);
        assert_eq!(proposer.calls(), 2);
        assert!(report.response.solved.contains("air"));
    }

    #[test]
    fn guesses_naming_unknown_clues_spend_budget() {
        let sink = LogSink::new();
        let mut stray = placed("sky", 5, 0, true);
        stray.clue = "not a clue in this puzzle".to_string();
        let mut other = placed("sea", 7, 0, true);
        other.clue = "nor this one".to_string();
        let mut proposer =
            ScriptedProposer::new(vec![Proposal::Word(stray), Proposal::Word(other)]);
        let report = solve_one(&mut proposer, &bravo_air_puzzle(), &config(), &sink.agent("gpt"));

        assert_eq!(report.rounds, 2);
        assert_eq!(report.guesses.len(), 2);
        assert!(report.response.solved.is_empty());
    }
}
