//! Oracle-driven crossword construction and difficulty calibration.
//!
//! A generator oracle proposes words one at a time; each proposal is checked
//! against the grid and rolled back when it conflicts. A panel of solver
//! oracles then attempts the finished puzzle, and clues are rewritten until
//! the per-word solve rates match the requested difficulty. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (grid occupancy, the proposal
//!   state machine, scoring, calibration decisions). No I/O.
//! - **[`io`]**: Side-effecting operations (oracle transports, prompts,
//!   config, persisted puzzles and reports).
//! - **[`agents`]**: Oracle-backed implementations of the core proposer seam.
//!
//! Orchestration modules ([`build`], [`solve`], [`evaluate`], [`looping`])
//! coordinate core logic with I/O to implement CLI commands.

pub mod agents;
pub mod build;
pub mod core;
pub mod evaluate;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod solve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
