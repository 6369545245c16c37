//! Embedded JSON Schemas for oracle payloads and puzzle files.

use anyhow::{Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde_json::Value;

pub const PROPOSAL_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/proposal.schema.json"
));
pub const PUZZLE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/puzzle.schema.json"
));
pub const REWRITE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/rewrite.schema.json"
));

/// A compiled schema with a name for error messages.
pub struct Schema {
    name: &'static str,
    validator: Validator,
}

impl Schema {
    pub fn compile(name: &'static str, contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|err| anyhow!("parse {name} schema: {err}"))?;
        let validator =
            validator_for(&value).map_err(|err| anyhow!("invalid {name} schema: {err}"))?;
        Ok(Self { name, validator })
    }

    pub fn proposal() -> Result<Self> {
        Self::compile("proposal", PROPOSAL_SCHEMA)
    }

    pub fn puzzle() -> Result<Self> {
        Self::compile("puzzle", PUZZLE_SCHEMA)
    }

    pub fn rewrite() -> Result<Self> {
        Self::compile("rewrite", REWRITE_SCHEMA)
    }

    /// List every violation of `value`, joined with `; `.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if self.validator.is_valid(value) {
            return Ok(());
        }
        let messages = self
            .validator
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        Err(format!(
            "{} schema validation failed: {}",
            self.name,
            messages.join("; ")
        ))
    }
}
