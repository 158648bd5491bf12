pub mod answer;
pub mod filters;
pub mod rerank;
pub mod retrieval;
pub mod synthesis;

mod error;

pub use answer::{AskRequest, AskResponse, SearchItem, SearchRequest, SearchResponse};
pub use error::{Error, Result, Stage};
pub use retrieval::BoundIndex;
pub use synthesis::AnswerWithProvenance;

use std::{future::Future, pin::Pin, sync::Arc};

use lexrag_config::{Config, EmbeddingProviderConfig, ProviderConfig};
use lexrag_domain::{CandidateRecord, EmbeddingSpace, Filter};
use lexrag_providers::{
	completion::{self, ChatMessage, GenerationParams},
	embedding, rerank as rerank_api,
};
use lexrag_storage::VectorStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	/// `Ok(None)` means the provider answered without a usable choice.
	fn complete<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		messages: &'a [ChatMessage],
		params: GenerationParams,
	) -> BoxFuture<'a, color_eyre::Result<Option<String>>>;
}

/// Similarity search over one vector index.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a Filter,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, rerank, completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), rerank: provider.clone(), completion: provider }
	}
}

pub struct RagService {
	pub cfg: Config,
	pub indexes: Vec<BoundIndex>,
	pub providers: Providers,
}
impl RagService {
	/// Connects every configured index and wires the HTTP-backed providers.
	pub fn new(cfg: Config) -> Result<Self> {
		let mut indexes = Vec::with_capacity(cfg.indexes.len());

		for index in &cfg.indexes {
			let space = cfg.embedding_space(&index.embedding).ok_or_else(|| Error::Config {
				message: format!(
					"Index {} references unknown embedding space {}.",
					index.name, index.embedding
				),
			})?;
			let store = VectorStore::connect(index).map_err(|err| Error::Config {
				message: format!("Index {} could not be opened: {err}", index.name),
			})?;

			tracing::info!(
				index = %index.name,
				backend = store.backend(),
				embedding = %space.name,
				"Index connected."
			);

			indexes.push(BoundIndex::new(
				index.name.clone(),
				EmbeddingSpace::from(space),
				Arc::new(store),
			));
		}

		Ok(Self { cfg, indexes, providers: Providers::default() })
	}

	pub fn with_parts(cfg: Config, indexes: Vec<BoundIndex>, providers: Providers) -> Self {
		Self { cfg, indexes, providers }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async move { Ok(rerank_api::rerank(cfg, query, docs).await?) })
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		messages: &'a [ChatMessage],
		params: GenerationParams,
	) -> BoxFuture<'a, color_eyre::Result<Option<String>>> {
		Box::pin(async move { Ok(completion::complete(cfg, messages, params).await?) })
	}
}

impl VectorIndex for VectorStore {
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a Filter,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>> {
		Box::pin(async move { Ok(VectorStore::search(self, vector, filter, k).await?) })
	}
}
