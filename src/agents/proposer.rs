// Algorithm-proposal collaborator
// Occasionally asked to sketch a new RL variant; the descriptor is logged
// into the run history and never executed

use crate::agents::evaluator::parse_json_reply;
use crate::agents::{AlgorithmProposal, AlgorithmProposer, OpenRouterClient};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const PROPOSAL_TIMEOUT: Duration = Duration::from_secs(30);
const PROPOSAL_TEMPERATURE: f64 = 0.8;
const PROPOSAL_MAX_TOKENS: u32 = 1000;

/// Proposer backed by a chat model
pub struct ProposerAgent {
    client: OpenRouterClient,
}

impl ProposerAgent {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlgorithmProposer for ProposerAgent {
    async fn propose(&self, existing: &[String]) -> AlgorithmProposal {
        let prompt = format!(
            "You are an RL expert. Propose a new RL algorithm by combining or modifying \
             existing ones ({}).\n\
             Return a JSON object with: name (str), description (str), pseudo_code (str).",
            existing.join(", ")
        );

        match self
            .client
            .chat(
                &prompt,
                PROPOSAL_TEMPERATURE,
                PROPOSAL_MAX_TOKENS,
                PROPOSAL_TIMEOUT,
            )
            .await
        {
            Ok(reply) => match parse_json_reply::<AlgorithmProposal>(&reply) {
                Some(proposal) => proposal,
                None => {
                    debug!("Unparseable proposal reply: {}", reply);
                    AlgorithmProposal::failure("malformed proposal response")
                }
            },
            Err(e) => AlgorithmProposal::failure(e),
        }
    }
}
