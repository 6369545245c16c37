//! Solver agent: answers one remaining clue per call.

use std::sync::Arc;

use anyhow::Result;

use crate::core::protocol::{Proposal, ProposalContext, Proposer};
use crate::io::oracle::Oracle;
use crate::io::prompt::PromptEngine;

use super::{ProposalParser, ask};

pub struct SolverAgent {
    name: String,
    oracle: Arc<dyn Oracle>,
    prompts: PromptEngine,
    parser: ProposalParser,
}

impl SolverAgent {
    pub fn new(name: &str, oracle: Arc<dyn Oracle>) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            oracle,
            prompts: PromptEngine::new()?,
            parser: ProposalParser::new()?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Proposer for SolverAgent {
    fn propose(&mut self, context: &ProposalContext<'_>) -> Proposal {
        let clues = context.clues.unwrap_or(&[]);
        let request = self
            .prompts
            .solver(context.grid_size, context.occupancy, clues);
        ask(self.oracle.as_ref(), &self.parser, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::propose_one_with_clues;
    use crate::core::scoring::clue_metadata;
    use crate::test_support::{ScriptedOracle, bravo_air_puzzle, placed, proposal_reply};

    #[test]
    fn prompt_carries_remaining_clues() {
        let puzzle = bravo_air_puzzle();
        let clues = clue_metadata(&puzzle);
        let oracle = Arc::new(ScriptedOracle::new([proposal_reply(&placed(
            "bravo", 0, 1, true,
        ))]));
        let mut agent = SolverAgent::new("gpt-4o", oracle.clone()).expect("agent");

        let outcome = propose_one_with_clues(&mut agent, 10, Vec::new(), Some(&clues), 1);
        assert!(outcome.accepted);
        assert_eq!(agent.name(), "gpt-4o");

        let user = &oracle.requests()[0].user;
        assert!(user.contains("clue for air"));
        assert!(!user.contains("\"word\""));
    }
}
