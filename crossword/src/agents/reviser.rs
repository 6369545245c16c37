//! Reviser agent: rewrites flagged clues toward a target difficulty.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::calibration::ClueRewrite;
use crate::core::extract::extract_outer_json_object;
use crate::core::types::{Difficulty, Puzzle};
use crate::io::oracle::Oracle;
use crate::io::prompt::{ClueToRevise, PromptEngine};
use crate::io::schema::Schema;

#[derive(Deserialize)]
struct RewriteResponse {
    words: Vec<ClueRewrite>,
}

pub struct ReviserAgent {
    oracle: Arc<dyn Oracle>,
    prompts: PromptEngine,
    schema: Schema,
}

impl ReviserAgent {
    pub fn new(oracle: Arc<dyn Oracle>) -> Result<Self> {
        Ok(Self {
            oracle,
            prompts: PromptEngine::new()?,
            schema: Schema::rewrite()?,
        })
    }

    /// Ask once for new clues for `flagged` words. No call is made when nothing is flagged.
    #[instrument(skip_all, fields(flagged = flagged.len(), difficulty = %target))]
    pub fn request_rewrites(
        &self,
        puzzle: &Puzzle,
        flagged: &[String],
        target: Difficulty,
    ) -> Result<Vec<ClueRewrite>> {
        let words: Vec<ClueToRevise> = puzzle
            .words
            .iter()
            .filter(|placed| flagged.contains(&placed.word))
            .map(|placed| ClueToRevise {
                word: placed.word.clone(),
                clue: placed.clue.clone(),
            })
            .collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.prompts.reviser(&words, target)?;
        let text = self.oracle.complete(&request)?;
        let value = extract_outer_json_object(&text).map_err(|err| anyhow!(err))?;
        self.schema.check(&value).map_err(|err| anyhow!(err))?;
        let response: RewriteResponse = serde_json::from_value(value)?;
        debug!(rewrites = response.words.len(), "reviser responded");
        Ok(response.words)
    }
}
