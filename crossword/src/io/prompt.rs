//! Prompt rendering for the generator, solver and reviser roles.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::grid::Occupancy;
use crate::core::types::{ClueMetadata, Difficulty};
use crate::io::oracle::OracleRequest;

const GENERATOR_TEMPLATE: &str = include_str!("prompts/generator.md");
const GENERATOR_USER_TEMPLATE: &str = include_str!("prompts/generator_user.md");
const SOLVER_TEMPLATE: &str = include_str!("prompts/solver.md");
const SOLVER_USER_TEMPLATE: &str = include_str!("prompts/solver_user.md");
const REVISER_TEMPLATE: &str = include_str!("prompts/reviser.md");
const REVISER_USER_TEMPLATE: &str = include_str!("prompts/reviser_user.md");

/// Word and current clue sent to the reviser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClueToRevise {
    pub word: String,
    pub clue: String,
}

#[derive(Serialize)]
struct RevisionPayload<'a> {
    words: &'a [ClueToRevise],
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        let templates = [
            ("generator", GENERATOR_TEMPLATE),
            ("generator_user", GENERATOR_USER_TEMPLATE),
            ("solver", SOLVER_TEMPLATE),
            ("solver_user", SOLVER_USER_TEMPLATE),
            ("reviser", REVISER_TEMPLATE),
            ("reviser_user", REVISER_USER_TEMPLATE),
        ];
        for (name, source) in templates {
            env.add_template(name, source)
                .with_context(|| format!("load {name} template"))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render {name} template"))
    }

    /// Prompt asking for one new word given the current occupancy.
    pub fn generator(&self, grid_size: usize, occupancy: &Occupancy) -> Result<OracleRequest> {
        let cells = serde_json::to_string(&occupancy.cells).context("serialize cells")?;
        let words = serde_json::to_string(&occupancy.words).context("serialize words")?;
        Ok(OracleRequest {
            system: self.render("generator", context! { grid_size })?,
            user: self.render(
                "generator_user",
                context! { cells, words, grid_size },
            )?,
        })
    }

    /// Prompt asking for one answer among the remaining clues.
    pub fn solver(
        &self,
        grid_size: usize,
        occupancy: &Occupancy,
        clues: &[ClueMetadata],
    ) -> Result<OracleRequest> {
        let grid = occupancy.render(grid_size);
        let clues = serde_json::to_string_pretty(clues).context("serialize clues")?;
        Ok(OracleRequest {
            system: self.render("solver", context! { grid_size })?,
            user: self.render(
                "solver_user",
                context! { grid => grid.trim_end(), clues, grid_size },
            )?,
        })
    }

    /// Prompt asking for new clues for `words` at `difficulty`.
    pub fn reviser(&self, words: &[ClueToRevise], difficulty: Difficulty) -> Result<OracleRequest> {
        let payload = serde_json::to_string_pretty(&RevisionPayload { words })
            .context("serialize revision payload")?;
        let difficulty = difficulty.as_str().to_uppercase();
        Ok(OracleRequest {
            system: self.render("reviser", context! { difficulty => &difficulty })?,
            user: self.render(
                "reviser_user",
                context! { words => payload, difficulty },
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::compute_occupancy;
    use crate::core::types::PlacedWord;

    fn bravo() -> PlacedWord {
        PlacedWord {
            word: "bravo".to_string(),
            row: 0,
            column: 1,
            is_across: true,
            clue: "form of joy".to_string(),
        }
    }

    #[test]
    fn generator_prompt_lists_cells_and_words() {
        let engine = PromptEngine::new().expect("engine");
        let occupancy = compute_occupancy(&[bravo()], 10).expect("occupancy");
        let request = engine.generator(10, &occupancy).expect("render");
        assert!(request.system.contains("0..10"));
        assert!(request.user.contains("words=[\"bravo\"]"));
        assert!(request.user.contains("\"character\":\"b\""));
        assert!(request.user.trim_end().ends_with("grid_size=10"));
    }

    #[test]
    fn solver_prompt_draws_grid_and_withholds_answers() {
        let engine = PromptEngine::new().expect("engine");
        let clues = vec![ClueMetadata {
            row: 0,
            column: 1,
            is_across: true,
            length: 5,
            clue: "form of joy".to_string(),
        }];
        let request = engine
            .solver(10, &Occupancy::default(), &clues)
            .expect("render");
        assert!(request.user.contains("_ _ _ _ _ _ _ _ _ _"));
        assert!(request.user.contains("form of joy"));
        assert!(request.user.contains("\"length\": 5"));
        assert!(!request.user.contains("bravo"));
    }

    #[test]
    fn reviser_prompt_uses_uppercase_difficulty() {
        let engine = PromptEngine::new().expect("engine");
        let words = vec![ClueToRevise {
            word: "bravo".to_string(),
            clue: "form of joy".to_string(),
        }];
        let request = engine.reviser(&words, Difficulty::Hard).expect("render");
        assert!(request.user.contains("difficulty:HARD"));
        assert!(request.user.contains("\"clue\": \"form of joy\""));
    }
}
