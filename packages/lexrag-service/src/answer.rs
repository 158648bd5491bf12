use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lexrag_domain::{Filter, RankedResult};

use crate::{AnswerWithProvenance, Error, RagService, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub num_results: Option<u32>,
	pub top_n: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
	pub id: String,
	pub jurisdiction: String,
	pub path: String,
	pub content: String,
	pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub filter: Filter,
	pub candidate_count: usize,
	pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
	pub query: String,
	pub instruction: Option<String>,
	pub num_results: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
	pub trace_id: Uuid,
	pub query: String,
	pub filter: Filter,
	pub candidate_count: usize,
	pub answer: AnswerWithProvenance,
}

struct Ranked {
	filter: Filter,
	candidate_count: usize,
	result: RankedResult,
}

impl RagService {
	/// Resolves the filter, retrieves, fuses and reranks, returning the best `top_n` items.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let trace_id = Uuid::new_v4();
		let query = validate_query(&req.query)?;
		let top_n = req.top_n.unwrap_or(self.cfg.retrieval.top_n);

		if top_n == 0 {
			return Err(Error::InvalidRequest {
				message: "top_n must be greater than zero.".to_string(),
			});
		}

		let ranked = self.rank_query(trace_id, query, req.num_results).await?;
		let items = ranked
			.result
			.into_items()
			.into_iter()
			.take(top_n as usize)
			.map(|item| SearchItem {
				id: item.record.id,
				jurisdiction: item.record.jurisdiction,
				path: item.record.path,
				content: item.record.content,
				score: item.score,
			})
			.collect();

		Ok(SearchResponse {
			trace_id,
			filter: ranked.filter,
			candidate_count: ranked.candidate_count,
			items,
		})
	}

	/// Runs the whole chain and answers from the single most relevant candidate.
	pub async fn ask(&self, req: AskRequest) -> Result<AskResponse> {
		let trace_id = Uuid::new_v4();
		let query = validate_query(&req.query)?;
		let ranked = self.rank_query(trace_id, query, req.num_results).await?;
		let Some(top) = ranked.result.top() else {
			return Err(Error::EmptyCandidateSet);
		};
		let instruction =
			req.instruction.as_deref().unwrap_or(self.cfg.synthesis.instruction.as_str());
		let mut answer = self.synthesize(&top.record, instruction).await?;

		answer.score = Some(top.score);

		tracing::info!(
			trace_id = %trace_id,
			jurisdiction = %answer.jurisdiction,
			id = %answer.id,
			path = %answer.path,
			"Query answered."
		);

		Ok(AskResponse {
			trace_id,
			query: query.to_string(),
			filter: ranked.filter,
			candidate_count: ranked.candidate_count,
			answer,
		})
	}

	async fn rank_query(
		&self,
		trace_id: Uuid,
		query: &str,
		num_results: Option<u32>,
	) -> Result<Ranked> {
		let k = num_results.unwrap_or(self.cfg.retrieval.num_results);

		if k == 0 {
			return Err(Error::InvalidRequest {
				message: "num_results must be greater than zero.".to_string(),
			});
		}

		let filter = self.resolve_filter(query).await?;
		let candidates = self.retrieve(query, &filter, k).await?;

		if candidates.is_empty() {
			tracing::info!(trace_id = %trace_id, filter = ?filter.values(), "No candidates found.");

			return Err(Error::EmptyCandidateSet);
		}

		let candidate_count = candidates.len();
		let result = self.rerank(query, candidates).await?;

		Ok(Ranked { filter, candidate_count, result })
	}
}

fn validate_query(query: &str) -> Result<&str> {
	let query = query.trim();

	if query.is_empty() {
		return Err(Error::InvalidRequest { message: "query must not be empty.".to_string() });
	}

	Ok(query)
}
