// Code-review collaborator
// Asks a model to score the generated project; every failure mode collapses
// into a zero-score verdict so the simulation keeps iterating

use crate::agents::{Evaluation, Evaluator, OpenRouterClient};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const EVALUATION_TIMEOUT: Duration = Duration::from_secs(30);
const EVALUATION_TEMPERATURE: f64 = 0.5;
const EVALUATION_MAX_TOKENS: u32 = 500;

/// Evaluator backed by a chat model
pub struct EvaluatorAgent {
    client: OpenRouterClient,
}

impl EvaluatorAgent {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }

    fn build_prompt(
        code: &str,
        project_type: &str,
        project_description: &str,
        test_results: &str,
    ) -> String {
        format!(
            "You are an expert code reviewer. Evaluate the following code for a {} project ({}):\n\n\
             ```\n{}\n```\n\n\
             Test Results:\n{}\n\n\
             Score it from 0 to 100 based on:\n\
             1. **Functionality (50%):** Does it meet the requirements? Weight test pass rate heavily.\n\
             2. **Code Quality (50%):** Is it modular, DRY, and built on a reusable library?\n\n\
             Return a JSON object with: score (int), functionality_feedback (str), quality_feedback (str).",
            project_type, project_description, code, test_results
        )
    }
}

/// Pull the first JSON object out of a reply that may wrap it in prose or
/// code fences
pub(crate) fn parse_json_reply<T: serde::de::DeserializeOwned>(reply: &str) -> Option<T> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

#[async_trait]
impl Evaluator for EvaluatorAgent {
    fn model_id(&self) -> &str {
        self.client.model()
    }

    async fn evaluate(
        &self,
        code: &str,
        project_type: &str,
        project_description: &str,
        test_results: &str,
    ) -> Evaluation {
        let prompt = Self::build_prompt(code, project_type, project_description, test_results);
        match self
            .client
            .chat(
                &prompt,
                EVALUATION_TEMPERATURE,
                EVALUATION_MAX_TOKENS,
                EVALUATION_TIMEOUT,
            )
            .await
        {
            Ok(reply) => match parse_json_reply::<Evaluation>(&reply) {
                Some(evaluation) => evaluation,
                None => {
                    debug!("Unparseable evaluation reply: {}", reply);
                    Evaluation::failure("malformed evaluator response")
                }
            },
            Err(e) => Evaluation::failure(e),
        }
    }
}
