//! Stable exit codes for crossword CLI commands.

/// Command succeeded: the puzzle is complete and (when calibrating) matched the target.
pub const OK: i32 = 0;
/// Invalid flags, config or puzzle file, or a fatal I/O error.
pub const INVALID: i32 = 1;
/// The build stopped with fewer words than requested.
pub const PARTIAL: i32 = 2;
/// Calibration ran out of iterations before matching the target difficulty.
pub const NOT_CONVERGED: i32 = 3;
