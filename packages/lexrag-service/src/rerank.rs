use lexrag_domain::{CandidateSet, RankedResult, rank};

use crate::{Error, RagService, Result, Stage};

impl RagService {
	/// Scores every candidate against the query in one batch and orders them by relevance.
	pub async fn rerank(&self, query: &str, candidates: CandidateSet) -> Result<RankedResult> {
		if candidates.is_empty() {
			return Ok(RankedResult::default());
		}

		let provider = &self.cfg.providers.rerank;
		let docs: Vec<String> = candidates.iter().map(|record| record.content.clone()).collect();
		let scores = self
			.providers
			.rerank
			.rerank(provider, query, &docs)
			.await
			.map_err(|err| Error::provider(Stage::Rerank, &provider.provider_id, err))?;
		let ranked = rank(candidates, &scores).map_err(|err| Error::ProviderUnavailable {
			stage: Stage::Rerank,
			provider: provider.provider_id.clone(),
			message: err.to_string(),
		})?;

		tracing::info!(
			candidates = ranked.len(),
			top_score = ?ranked.top().map(|item| item.score),
			"Candidates reranked."
		);

		Ok(ranked)
	}
}
