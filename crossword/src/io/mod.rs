//! I/O helpers: oracles, prompts, configuration and persisted artifacts.

pub mod chat;
pub mod config;
pub mod iteration_log;
pub mod log_sink;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod puzzle_store;
pub mod schema;
