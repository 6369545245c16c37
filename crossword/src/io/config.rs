//! Crossword configuration stored in `crossword.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "crossword.toml";

/// Crossword configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to the values the
/// pipeline was tuned with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrosswordConfig {
    pub build: BuildSettings,
    pub solve: SolveSettings,
    pub output: OutputSettings,
    /// Oracle that proposes words and rewrites clues.
    pub generator: OracleSettings,
    /// Independent solving agents, one per entry.
    pub solvers: Vec<OracleSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildSettings {
    /// Oracle attempts per word before the round counts as failed.
    pub word_retry_budget: u32,
    /// Consecutive failed rounds before the build stops with a partial puzzle.
    pub puzzle_retry_budget: u32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            word_retry_budget: 5,
            puzzle_retry_budget: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolveSettings {
    /// Oracle attempts per guess round.
    pub attempt_budget: u32,
    /// Consecutive failed guess rounds before an agent gives up.
    pub retry_budget: u32,
    /// Budget an agent is refilled to after each answered clue.
    pub reset_budget: u32,
    /// Worker threads for solver agents; `0` means one per available CPU.
    pub workers: usize,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            attempt_budget: 1,
            retry_budget: 5,
            reset_budget: 3,
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory for `crossword-<iteration>.json` snapshots and iteration reports.
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// Wire protocol and default endpoint of an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Groq,
    Mistral,
    /// Local command reading the prompt on stdin.
    Command,
}

impl Provider {
    /// Provider implied by a model name.
    pub fn for_model(model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        if model.starts_with("claude") {
            Provider::Anthropic
        } else if model.starts_with("llama") || model.starts_with("mixtral") {
            Provider::Groq
        } else if model.starts_with("mistral") {
            Provider::Mistral
        } else {
            Provider::OpenAi
        }
    }

    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1"),
            Provider::Anthropic => Some("https://api.anthropic.com/v1"),
            Provider::Groq => Some("https://api.groq.com/openai/v1"),
            Provider::Mistral => Some("https://api.mistral.ai/v1"),
            Provider::Command => None,
        }
    }

    pub fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::Mistral => Some("MISTRAL_API_KEY"),
            Provider::Command => None,
        }
    }
}

/// One oracle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleSettings {
    pub model: String,
    /// Inferred from `model` when unset.
    pub provider: Option<Provider>,
    /// Provider default when unset.
    pub base_url: Option<String>,
    /// Environment variable holding the API key; provider default when unset.
    pub api_key_env: Option<String>,
    /// Program and arguments for `provider = "command"`.
    pub command: Vec<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Per-request timeout; none when unset.
    pub timeout_secs: Option<u64>,
    /// Transport-level retries after a failed request.
    pub max_retries: u32,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self::for_model("gpt-4o")
    }
}

impl OracleSettings {
    pub fn for_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            provider: None,
            base_url: None,
            api_key_env: None,
            command: Vec::new(),
            temperature: 1.0,
            max_tokens: None,
            timeout_secs: None,
            max_retries: 4,
        }
    }

    fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn resolved_provider(&self) -> Provider {
        self.provider
            .unwrap_or_else(|| Provider::for_model(&self.model))
    }

    /// Human-readable name used in logs and reports.
    pub fn label(&self) -> &str {
        &self.model
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            bail!("oracle model must be non-empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!(
                "{}: temperature must be within [0, 2], got {}",
                self.model,
                self.temperature
            );
        }
        if self.timeout_secs == Some(0) {
            bail!("{}: timeout_secs must be > 0 when set", self.model);
        }
        let provider = self.resolved_provider();
        if provider == Provider::Command
            && (self.command.is_empty() || self.command[0].trim().is_empty())
        {
            bail!("{}: command provider needs a non-empty command", self.model);
        }
        if provider != Provider::Command
            && self.base_url.is_none()
            && provider.default_base_url().is_none()
        {
            bail!("{}: missing base_url", self.model);
        }
        Ok(())
    }
}

/// Solver line-up the pipeline was tuned with.
pub fn default_solvers() -> Vec<OracleSettings> {
    vec![
        OracleSettings::for_model("gpt-4o"),
        OracleSettings::for_model("gpt-4o-mini"),
        OracleSettings::for_model("claude-3-5-sonnet-latest").with_max_tokens(1000),
        OracleSettings::for_model("claude-3-5-haiku-latest").with_max_tokens(1000),
        OracleSettings::for_model("llama-3.3-70b-versatile"),
        OracleSettings::for_model("mixtral-8x7b-32768"),
    ]
}

impl Default for CrosswordConfig {
    fn default() -> Self {
        Self {
            build: BuildSettings::default(),
            solve: SolveSettings::default(),
            output: OutputSettings::default(),
            generator: OracleSettings::default(),
            solvers: default_solvers(),
        }
    }
}

impl CrosswordConfig {
    pub fn validate(&self) -> Result<()> {
        if self.build.word_retry_budget == 0 {
            return Err(anyhow!("build.word_retry_budget must be > 0"));
        }
        if self.build.puzzle_retry_budget == 0 {
            return Err(anyhow!("build.puzzle_retry_budget must be > 0"));
        }
        if self.solve.attempt_budget == 0 {
            return Err(anyhow!("solve.attempt_budget must be > 0"));
        }
        if self.solve.retry_budget == 0 {
            return Err(anyhow!("solve.retry_budget must be > 0"));
        }
        if self.solve.reset_budget == 0 {
            return Err(anyhow!("solve.reset_budget must be > 0"));
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(anyhow!("output.dir must be non-empty"));
        }
        if self.solvers.is_empty() {
            return Err(anyhow!("at least one [[solvers]] entry is required"));
        }
        self.generator.validate().context("generator")?;
        for solver in &self.solvers {
            solver.validate().context("solvers")?;
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CrosswordConfig::default()`.
pub fn load_config(path: &Path) -> Result<CrosswordConfig> {
    if !path.exists() {
        let cfg = CrosswordConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CrosswordConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CrosswordConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
