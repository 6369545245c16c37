//! Deterministic, pure logic shared by the crossword pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! puzzles and proposals and return deterministic outputs suitable for tests.
//! Oracles are reached only through the [`protocol::Proposer`] seam.

pub mod budget;
pub mod calibration;
pub mod extract;
pub mod grid;
pub mod protocol;
pub mod scoring;
pub mod types;
