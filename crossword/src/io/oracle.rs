//! Oracle abstraction for text-generation backends.
//!
//! The [`Oracle`] trait decouples the pipeline from the concrete backend
//! (HTTP chat endpoints or a local command). Tests use scripted oracles that
//! return predetermined text without any network or process access.

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::io::chat::ChatOracle;
use crate::io::config::{OracleSettings, Provider};
use crate::io::process::run_with_input;

/// Output limit for command oracles.
pub const COMMAND_OUTPUT_LIMIT_BYTES: usize = 200_000;

/// One prompt for an oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub system: String,
    pub user: String,
}

/// Abstraction over text-generation backends.
///
/// Implementations must be shareable across solver worker threads.
pub trait Oracle: Send + Sync {
    /// Return the raw completion text for `request`.
    fn complete(&self, request: &OracleRequest) -> Result<String>;
}

/// Oracle that runs a local command with the prompt on stdin.
pub struct CommandOracle {
    command: Vec<String>,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl CommandOracle {
    pub fn new(command: Vec<String>, timeout: Option<Duration>) -> Result<Self> {
        if command.is_empty() || command[0].trim().is_empty() {
            return Err(anyhow!("command oracle needs a non-empty command"));
        }
        Ok(Self {
            command,
            timeout,
            output_limit_bytes: COMMAND_OUTPUT_LIMIT_BYTES,
        })
    }
}

impl Oracle for CommandOracle {
    #[instrument(skip_all, fields(program = %self.command[0]))]
    fn complete(&self, request: &OracleRequest) -> Result<String> {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        let prompt = format!("{}\n\n{}", request.system.trim_end(), request.user);

        let output = run_with_input(cmd, prompt.as_bytes(), self.timeout, self.output_limit_bytes)
            .context("run oracle command")?;
        if output.timed_out {
            warn!("oracle command timed out");
            return Err(anyhow!("oracle command timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "oracle command failed");
            return Err(anyhow!(
                "oracle command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text().trim()
            ));
        }
        debug!(bytes = output.stdout.len(), "oracle command completed");
        Ok(output.stdout_text())
    }
}

/// Build the oracle described by `settings`.
///
/// Fails (before any request is sent) when credentials are missing.
pub fn build_oracle(settings: &OracleSettings) -> Result<Arc<dyn Oracle>> {
    settings.validate()?;
    let timeout = settings.timeout_secs.map(Duration::from_secs);
    let provider = settings.resolved_provider();
    info!(model = %settings.model, ?provider, "configuring oracle");
    match provider {
        Provider::Command => Ok(Arc::new(CommandOracle::new(
            settings.command.clone(),
            timeout,
        )?)),
        _ => Ok(Arc::new(ChatOracle::from_settings(settings)?)),
    }
}
