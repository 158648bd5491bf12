use lexrag_config::ON_PARSE_ERROR_UNFILTERED;
use lexrag_domain::{Filter, parse_filter_response};
use lexrag_providers::completion::{ChatMessage, GenerationParams};

use crate::{Error, RagService, Result, Stage};

const FILTER_INSTRUCTION: &str = "You determine if there are any US states present in this text";
const FILTER_SHAPE: &str = r#"{"jurisdiction": []}"#;

impl RagService {
	/// Asks the completion provider which jurisdictions the query names.
	pub async fn extract_filters(&self, query: &str) -> Result<Filter> {
		let cfg = &self.cfg.filter_extraction;
		let provider = &self.cfg.providers.completion;
		let messages = build_filter_messages(query);
		let params = GenerationParams { max_tokens: cfg.max_tokens, temperature: cfg.temperature };
		let raw = self
			.providers
			.completion
			.complete(provider, &messages, params)
			.await
			.map_err(|err| Error::provider(Stage::FilterExtraction, &provider.provider_id, err))?;
		let Some(raw) = raw else {
			return Err(Error::FilterParse {
				message: "Completion provider returned no choices.".to_string(),
			});
		};
		let filter = parse_filter_response(&raw)?;

		tracing::info!(jurisdictions = ?filter.values(), "Query filter extracted.");

		Ok(filter)
	}

	/// Extracts the query filter and applies the configured parse-error policy.
	pub async fn resolve_filter(&self, query: &str) -> Result<Filter> {
		let cfg = &self.cfg.filter_extraction;

		if !cfg.enabled {
			return Ok(Filter::empty());
		}

		match self.extract_filters(query).await {
			Err(Error::FilterParse { message })
				if cfg.on_parse_error == ON_PARSE_ERROR_UNFILTERED =>
			{
				tracing::warn!(error = %message, "Unparseable filter. Searching unfiltered.");

				Ok(Filter::empty())
			},
			result => result,
		}
	}
}

pub(crate) fn build_filter_messages(query: &str) -> Vec<ChatMessage> {
	let prompt = format!(
		"{FILTER_INSTRUCTION}: {query}.\n\
		Your response should be JSON like the following:\n{FILTER_SHAPE}"
	);

	vec![ChatMessage::user(prompt)]
}
