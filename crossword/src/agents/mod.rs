//! Oracle-backed agents for the generator, solver and reviser roles.

use anyhow::Result;
use tracing::warn;

use crate::core::extract::{extract_json_object, is_message_sentinel};
use crate::core::protocol::Proposal;
use crate::core::types::PlacedWord;
use crate::io::oracle::{Oracle, OracleRequest};
use crate::io::schema::Schema;

pub mod generator;
pub mod reviser;
pub mod solver;

/// Turns raw oracle text into a [`Proposal`].
pub(crate) struct ProposalParser {
    schema: Schema,
}

impl ProposalParser {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            schema: Schema::proposal()?,
        })
    }

    pub(crate) fn parse(&self, text: &str) -> Proposal {
        let value = match extract_json_object(text) {
            Ok(value) => value,
            Err(err) => return Proposal::Malformed(err.to_string()),
        };
        if is_message_sentinel(&value) {
            let message = match &value["message"] {
                serde_json::Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            return Proposal::NoAnswer(message);
        }
        if let Err(err) = self.schema.check(&value) {
            return Proposal::Malformed(err);
        }
        match serde_json::from_value::<PlacedWord>(value) {
            Ok(word) => Proposal::Word(word),
            Err(err) => Proposal::Malformed(err.to_string()),
        }
    }
}

/// Send `request` and parse the reply; transport errors become `Failed`.
pub(crate) fn ask(
    oracle: &dyn Oracle,
    parser: &ProposalParser,
    request: Result<OracleRequest>,
) -> Proposal {
    let request = match request {
        Ok(request) => request,
        Err(err) => return Proposal::Failed(format!("{err:#}")),
    };
    match oracle.complete(&request) {
        Ok(text) => parser.parse(&text),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "oracle call failed");
            Proposal::Failed(format!("{err:#}"))
        }
    }
}
