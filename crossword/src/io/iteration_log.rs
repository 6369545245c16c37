//! Iteration reports under `<output>/iterations/<iteration>/`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::Difficulty;

/// One solver agent's result for an iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReport {
    pub agent: String,
    pub solved: BTreeSet<String>,
    pub unsolved: BTreeSet<String>,
    /// Guess rounds the agent played.
    pub rounds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationReport {
    pub iteration: u32,
    pub target: Difficulty,
    pub agents: Vec<AgentReport>,
    pub accuracy: BTreeMap<String, f64>,
    /// Empty when the puzzle already matched the target.
    pub decisions: BTreeMap<String, bool>,
    /// Words whose clue the reviser replaced.
    pub rewritten: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IterationPaths {
    pub dir: PathBuf,
    pub report_path: PathBuf,
    pub agent_log_path: PathBuf,
}

impl IterationPaths {
    pub fn new(output_dir: &Path, iteration: u32) -> Self {
        let dir = output_dir.join("iterations").join(iteration.to_string());
        Self {
            report_path: dir.join("report.json"),
            agent_log_path: dir.join("agents.log"),
            dir,
        }
    }
}

/// Write the report and, when present, the agents' progress lines.
pub fn write_iteration(
    output_dir: &Path,
    report: &IterationReport,
    agent_log: Option<&str>,
) -> Result<IterationPaths> {
    let paths = IterationPaths::new(output_dir, report.iteration);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create iteration dir {}", paths.dir.display()))?;

    write_json(&paths.report_path, report)?;
    if let Some(log) = agent_log {
        write_text(&paths.agent_log_path, log)?;
    }
    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}
