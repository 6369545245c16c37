//! Run every solver agent against the same puzzle on a fixed-size worker pool.

use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Result, anyhow};
use tracing::{debug, info, instrument};

use crate::agents::solver::SolverAgent;
use crate::core::types::Puzzle;
use crate::io::log_sink::LogSink;
use crate::io::oracle::Oracle;
use crate::solve::{SolveConfig, SolveReport, solve_one};

/// One configured solving agent.
#[derive(Clone)]
pub struct SolverSpec {
    pub name: String,
    pub oracle: Arc<dyn Oracle>,
}

/// `configured` workers (`0` = one per CPU), capped at the number of agents.
pub fn worker_count(configured: usize, agents: usize) -> usize {
    let wanted = if configured == 0 {
        thread::available_parallelism().map_or(1, usize::from)
    } else {
        configured
    };
    wanted.min(agents).max(1)
}

/// Solve `puzzle` once per solver. Reports come back in solver order.
///
/// Each worker pulls the next agent index from a shared cursor and owns that
/// agent's state for the whole attempt; the puzzle is shared read-only.
#[instrument(skip_all, fields(agents = solvers.len(), workers))]
pub fn evaluate_all(
    solvers: &[SolverSpec],
    puzzle: &Puzzle,
    config: &SolveConfig,
    workers: usize,
    sink: &LogSink,
) -> Result<Vec<SolveReport>> {
    if solvers.is_empty() {
        return Ok(Vec::new());
    }
    let workers = worker_count(workers, solvers.len());
    tracing::Span::current().record("workers", workers);
    let cursor = AtomicUsize::new(0);
    let logs: Vec<_> = solvers.iter().map(|spec| sink.agent(&spec.name)).collect();

    let batches = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cursor = &cursor;
                let logs = &logs;
                scope.spawn(move || {
                    let mut done: Vec<(usize, Result<SolveReport>)> = Vec::new();
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(spec) = solvers.get(index) else {
                            break;
                        };
                        let report = SolverAgent::new(&spec.name, spec.oracle.clone()).map(
                            |mut agent| {
                                debug!(agent = agent.name(), "worker picked agent");
                                solve_one(&mut agent, puzzle, config, &logs[index])
                            },
                        );
                        done.push((index, report));
                    }
                    done
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    });

    let mut slots: Vec<Option<SolveReport>> = vec![None; solvers.len()];
    for batch in batches {
        let batch = match batch {
            Ok(batch) => batch,
            Err(payload) => panic::resume_unwind(payload),
        };
        for (index, report) in batch {
            slots[index] = Some(report?);
        }
    }

    let reports = slots
        .into_iter()
        .enumerate()
        .map(|(index, report)| {
            report.ok_or_else(|| anyhow!("no report for solver {}", solvers[index].name))
        })
        .collect::<Result<Vec<_>>>()?;
    info!(agents = reports.len(), "all solvers finished");
    Ok(reports)
}
