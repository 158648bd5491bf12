use std::{collections::HashMap, sync::Arc};

use futures_util::future;

use lexrag_domain::{CandidateRecord, CandidateSet, EmbeddingSpace, Filter, fuse};

use crate::{Error, RagService, Result, Stage, VectorIndex};

/// A vector index together with the embedding space its vectors live in.
#[derive(Clone)]
pub struct BoundIndex {
	pub name: String,
	pub space: EmbeddingSpace,
	pub index: Arc<dyn VectorIndex>,
}
impl BoundIndex {
	pub fn new(
		name: impl Into<String>,
		space: EmbeddingSpace,
		index: Arc<dyn VectorIndex>,
	) -> Self {
		Self { name: name.into(), space, index }
	}

	/// Rejects vectors from a different space before the backend sees them.
	pub async fn search(
		&self,
		vector: &[f32],
		filter: &Filter,
		k: u32,
	) -> Result<Vec<CandidateRecord>> {
		self.space.check(vector).map_err(|err| Error::EmbeddingSpaceMismatch {
			index: self.name.clone(),
			expected: err.expected,
			actual: err.actual,
		})?;

		self.index
			.search(vector, filter, k)
			.await
			.map_err(|err| Error::provider(Stage::IndexSearch, &self.name, err))
	}
}

impl RagService {
	/// Searches every configured index with `k` results each and fuses the hits.
	pub async fn retrieve(&self, query: &str, filter: &Filter, k: u32) -> Result<CandidateSet> {
		if k == 0 {
			return Err(Error::InvalidRequest {
				message: "num_results must be greater than zero.".to_string(),
			});
		}

		let vectors = self.embed_query(query).await?;
		let searches = self.indexes.iter().map(|index| {
			let vector = vectors.get(&index.space.name);

			async move {
				let vector = vector.ok_or_else(|| Error::Config {
					message: format!("No query vector for index {}.", index.name),
				})?;

				index.search(vector, filter, k).await
			}
		});
		let results = future::join_all(searches).await;
		let mut per_index = Vec::with_capacity(results.len());

		for (index, result) in self.indexes.iter().zip(results) {
			let records = result?;

			tracing::info!(index = %index.name, hits = records.len(), "Index searched.");

			per_index.push(records);
		}

		let candidates = fuse(per_index);

		tracing::info!(candidates = candidates.len(), "Index results fused.");

		Ok(candidates)
	}

	/// Embeds the query once for each distinct embedding space the indexes use.
	async fn embed_query(&self, query: &str) -> Result<HashMap<String, Vec<f32>>> {
		let mut spaces: Vec<&str> = Vec::new();

		for index in &self.indexes {
			if !spaces.contains(&index.space.name.as_str()) {
				spaces.push(index.space.name.as_str());
			}
		}

		let texts = [query.to_string()];
		let texts = &texts[..];
		let calls = spaces.into_iter().map(|space| async move {
			let cfg = self.cfg.embedding_space(space).ok_or_else(|| Error::Config {
				message: format!("Embedding space {space} is not configured."),
			})?;
			let vectors = self
				.providers
				.embedding
				.embed(cfg, texts)
				.await
				.map_err(|err| Error::provider(Stage::Embedding, space, err))?;
			let vector =
				vectors.into_iter().next().ok_or_else(|| Error::ProviderUnavailable {
					stage: Stage::Embedding,
					provider: space.to_string(),
					message: "Embedding provider returned no vectors.".to_string(),
				})?;

			Ok::<_, Error>((space.to_string(), vector))
		});

		future::try_join_all(calls).await.map(|pairs| pairs.into_iter().collect())
	}
}
