//! Test-only helpers: scripted oracles and puzzle fixtures.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::core::protocol::{Proposal, ProposalContext, Proposer};
use crate::core::types::{PlacedWord, Puzzle};
use crate::io::oracle::{Oracle, OracleRequest};

/// Create a placed word with a deterministic clue.
pub fn placed(word: &str, row: i64, column: i64, is_across: bool) -> PlacedWord {
    PlacedWord {
        word: word.to_string(),
        row,
        column,
        is_across,
        clue: format!("clue for {word}"),
    }
}

/// `bravo` across from (0,1) crossed by `air` down from (0,3).
pub fn bravo_air_puzzle() -> Puzzle {
    Puzzle {
        grid_size: 10,
        words: vec![placed("bravo", 0, 1, true), placed("air", 0, 3, false)],
    }
}

/// Oracle reply proposing `word` with the fixture clue, wrapped in prose.
pub fn proposal_reply(word: &PlacedWord) -> String {
    format!(
        "Here is my answer.\n{{\"word\": \"{}\", \"row\": {}, \"column\": {}, \"isAcross\": {}, \"clue\": \"{}\"}}",
        word.word, word.row, word.column, word.is_across, word.clue
    )
}

/// Oracle that returns queued replies in order and records every request.
///
/// An exhausted script, or an `Err` entry, fails the call like a transport error.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::with_results(replies.into_iter().map(|reply| Ok(reply.into())))
    }

    pub fn with_results(replies: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, request: &OracleRequest) -> Result<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        match self.replies.lock().expect("replies lock").pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(err)) => Err(anyhow!(err)),
            None => Err(anyhow!("scripted oracle exhausted")),
        }
    }
}

/// Proposer that replays a fixed list, then declines.
pub struct ScriptedProposer {
    proposals: VecDeque<Proposal>,
    calls: u32,
}

impl ScriptedProposer {
    pub fn new(proposals: Vec<Proposal>) -> Self {
        Self {
            proposals: proposals.into(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl Proposer for ScriptedProposer {
    fn propose(&mut self, _context: &ProposalContext<'_>) -> Proposal {
        self.calls += 1;
        self.proposals
            .pop_front()
            .unwrap_or_else(|| Proposal::NoAnswer("script exhausted".to_string()))
    }
}
