//! Calibration loop: solve, score, rewrite flagged clues, repeat.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::agents::reviser::ReviserAgent;
use crate::core::calibration::{apply_clue_rewrites, decide_updates, flagged_words, score_accuracy};
use crate::core::types::{Difficulty, Puzzle, SolveResponse};
use crate::evaluate::{SolverSpec, evaluate_all};
use crate::io::iteration_log::{AgentReport, IterationReport, write_iteration};
use crate::io::log_sink::{LogSink, render_lines};
use crate::io::puzzle_store::write_snapshot;
use crate::solve::SolveConfig;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// No clue needed rewriting in this (1-based) iteration.
    Converged { iteration: u32 },
    /// Every iteration flagged at least one clue.
    IterationsExhausted { max_iterations: u32 },
}

/// Summary of a calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub puzzle: Puzzle,
    pub iterations_run: u32,
    pub stop: LoopStop,
    /// Accuracy measured in the last iteration.
    pub accuracy: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub target: Difficulty,
    pub max_iterations: u32,
    pub solve: SolveConfig,
    /// `0` means one worker per CPU.
    pub workers: usize,
    pub output_dir: PathBuf,
}

/// Refine `puzzle` toward `config.target`.
///
/// A failed or unparsable rewrite is logged and leaves the clues unchanged
/// for that iteration. Only persistence errors abort the loop.
#[instrument(skip_all, fields(difficulty = %config.target, max_iterations = config.max_iterations))]
pub fn run_loop<F: FnMut(&IterationReport)>(
    mut puzzle: Puzzle,
    solvers: &[SolverSpec],
    reviser: &ReviserAgent,
    config: &CalibrationConfig,
    mut on_iteration: F,
) -> Result<LoopOutcome> {
    let mut accuracy = BTreeMap::new();

    for iteration in 1..=config.max_iterations {
        info!(iteration, "starting calibration iteration");
        let sink = LogSink::new();
        let reports = evaluate_all(solvers, &puzzle, &config.solve, config.workers, &sink)?;
        let responses: Vec<SolveResponse> =
            reports.iter().map(|report| report.response.clone()).collect();

        accuracy = score_accuracy(&puzzle, &responses);
        let decisions = decide_updates(&puzzle.answers(), &accuracy, config.target);
        let flagged = flagged_words(&puzzle, &decisions);

        let rewritten = if flagged.is_empty() {
            Vec::new()
        } else {
            match reviser.request_rewrites(&puzzle, &flagged, config.target) {
                Ok(rewrites) => apply_clue_rewrites(&mut puzzle, &flagged, &rewrites),
                Err(err) => {
                    warn!(iteration, error = %format!("{err:#}"), "clue rewrite failed; keeping clues");
                    Vec::new()
                }
            }
        };
        info!(
            iteration,
            flagged = flagged.len(),
            rewritten = rewritten.len(),
            "calibration iteration scored"
        );

        let report = IterationReport {
            iteration,
            target: config.target,
            agents: reports
                .iter()
                .map(|report| AgentReport {
                    agent: report.agent.clone(),
                    solved: report.response.solved.clone(),
                    unsolved: report.response.unsolved.clone(),
                    rounds: report.rounds,
                })
                .collect(),
            accuracy: accuracy.clone(),
            decisions,
            rewritten,
        };
        let agent_log = render_lines(&sink.drain());
        write_iteration(&config.output_dir, &report, Some(&agent_log))?;
        on_iteration(&report);

        if flagged.is_empty() {
            return Ok(LoopOutcome {
                puzzle,
                iterations_run: iteration,
                stop: LoopStop::Converged { iteration },
                accuracy,
            });
        }
        write_snapshot(&config.output_dir, iteration, &puzzle)?;
    }

    Ok(LoopOutcome {
        puzzle,
        iterations_run: config.max_iterations,
        stop: LoopStop::IterationsExhausted {
            max_iterations: config.max_iterations,
        },
        accuracy,
    })
}
