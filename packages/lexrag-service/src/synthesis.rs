use serde::{Deserialize, Serialize};

use lexrag_domain::CandidateRecord;
use lexrag_providers::completion::{ChatMessage, GenerationParams};

use crate::{Error, RagService, Result, Stage};

/// Generated text plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerWithProvenance {
	pub answer: String,
	pub jurisdiction: String,
	pub id: String,
	pub path: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
}

impl RagService {
	pub async fn synthesize(
		&self,
		top: &CandidateRecord,
		instruction: &str,
	) -> Result<AnswerWithProvenance> {
		let cfg = &self.cfg.synthesis;
		let provider = &self.cfg.providers.completion;
		let messages = [ChatMessage::user(build_synthesis_prompt(instruction, &top.content))];
		let params = GenerationParams { max_tokens: cfg.max_tokens, temperature: cfg.temperature };
		let answer = self
			.providers
			.completion
			.complete(provider, &messages, params)
			.await
			.map_err(|err| Error::provider(Stage::Synthesis, &provider.provider_id, err))?
			.ok_or_else(|| Error::Synthesis {
				message: format!("Completion provider returned no answer for document {}.", top.id),
			})?;

		tracing::info!(id = %top.id, path = %top.path, "Answer synthesized.");

		Ok(AnswerWithProvenance {
			answer,
			jurisdiction: top.jurisdiction.clone(),
			id: top.id.clone(),
			path: top.path.clone(),
			score: None,
		})
	}
}

pub(crate) fn build_synthesis_prompt(instruction: &str, content: &str) -> String {
	if instruction.is_empty() || instruction.ends_with(char::is_whitespace) {
		format!("{instruction}{content}")
	} else {
		format!("{instruction} {content}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_trailing_space_of_instruction() {
		assert_eq!(
			build_synthesis_prompt("Summarize this result: ", "Consumers may opt out."),
			"Summarize this result: Consumers may opt out."
		);
	}

	#[test]
	fn separates_instruction_from_content() {
		assert_eq!(build_synthesis_prompt("Summarize:", "text"), "Summarize: text");
		assert_eq!(build_synthesis_prompt("", "text"), "text");
	}
}
