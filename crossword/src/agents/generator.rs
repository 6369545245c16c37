//! Generator agent: proposes the next word for a puzzle under construction.

use std::sync::Arc;

use anyhow::Result;

use crate::core::protocol::{Proposal, ProposalContext, Proposer};
use crate::io::oracle::Oracle;
use crate::io::prompt::PromptEngine;

use super::{ProposalParser, ask};

pub struct GeneratorAgent {
    oracle: Arc<dyn Oracle>,
    prompts: PromptEngine,
    parser: ProposalParser,
}

impl GeneratorAgent {
    pub fn new(oracle: Arc<dyn Oracle>) -> Result<Self> {
        Ok(Self {
            oracle,
            prompts: PromptEngine::new()?,
            parser: ProposalParser::new()?,
        })
    }
}

impl Proposer for GeneratorAgent {
    fn propose(&mut self, context: &ProposalContext<'_>) -> Proposal {
        let request = self.prompts.generator(context.grid_size, context.occupancy);
        ask(self.oracle.as_ref(), &self.parser, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::propose_one;
    use crate::test_support::{ScriptedOracle, placed, proposal_reply};

    #[test]
    fn conflicting_reply_is_retried_until_a_word_fits() {
        let bravo = placed("bravo", 0, 1, true);
        let oil = placed("oil", 0, 3, false);
        let air = placed("air", 0, 3, false);
        let oracle = Arc::new(ScriptedOracle::new([
            "{\"message\": \"thinking\"}".to_string(),
            proposal_reply(&oil),
            proposal_reply(&air),
        ]));
        let mut agent = GeneratorAgent::new(oracle.clone()).expect("agent");

        let outcome = propose_one(&mut agent, 10, vec![bravo.clone()], 5);
        assert!(outcome.accepted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.words, vec![bravo, air]);

        let requests = oracle.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].user.contains("words=[\"bravo\"]"));
    }

    #[test]
    fn transport_failure_counts_as_rejection() {
        let oracle = Arc::new(ScriptedOracle::with_results([Err("timeout".to_string())]));
        let mut agent = GeneratorAgent::new(oracle).expect("agent");

        let outcome = propose_one(&mut agent, 10, Vec::new(), 1);
        assert!(!outcome.accepted);
        assert!(outcome.words.is_empty());
        assert_eq!(outcome.attempts, 1);
    }
}
