use std::fmt::{Display, Formatter};

use serde::Serialize;

use lexrag_domain::FilterParseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Pipeline step that talks to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	FilterExtraction,
	Embedding,
	IndexSearch,
	Rerank,
	Synthesis,
}
impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::FilterExtraction => "filter_extraction",
			Self::Embedding => "embedding",
			Self::IndexSearch => "index_search",
			Self::Rerank => "rerank",
			Self::Synthesis => "synthesis",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Filter extraction failed: {message}")]
	FilterParse { message: String },
	#[error("Provider {provider} failed during {stage}: {message}")]
	ProviderUnavailable { stage: Stage, provider: String, message: String },
	#[error("No candidates matched the query.")]
	EmptyCandidateSet,
	#[error("Synthesis failed: {message}")]
	Synthesis { message: String },
	#[error("Index {index} expects {expected}-dimensional vectors but received {actual}.")]
	EmbeddingSpaceMismatch { index: String, expected: usize, actual: usize },
	#[error("Configuration error: {message}")]
	Config { message: String },
}
impl Error {
	pub(crate) fn provider(stage: Stage, provider: &str, err: color_eyre::Report) -> Self {
		Self::ProviderUnavailable {
			stage,
			provider: provider.to_string(),
			message: err.to_string(),
		}
	}
}
impl From<FilterParseError> for Error {
	fn from(err: FilterParseError) -> Self {
		Self::FilterParse { message: err.message }
	}
}
