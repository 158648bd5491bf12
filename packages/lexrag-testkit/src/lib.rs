mod error;

pub use error::Error;

use std::{
	collections::{HashMap, VecDeque},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::Map;

use lexrag_config::{
	BACKEND_QDRANT, Config, EmbeddingProviderConfig, FilterExtraction, IndexConfig, IndexFields,
	ProviderConfig, Providers as ProviderSettings, Retrieval, Service, Synthesis,
};
use lexrag_domain::{CandidateRecord, EmbeddingSpace, Filter};
use lexrag_providers::completion::{ChatMessage, GenerationParams};
use lexrag_service::{
	BoundIndex, BoxFuture, CompletionProvider, EmbeddingProvider, Providers, RagService,
	RerankProvider, VectorIndex,
};

/// Builds a config with one embedding space per `(name, dimensions)` and one Qdrant index
/// per `(index, space)`. Nothing in it points at a reachable endpoint.
pub fn test_config(spaces: &[(&str, u32)], indexes: &[(&str, &str)]) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:8080".to_string(), log_level: "info".to_string() },
		providers: ProviderSettings {
			embedding: spaces
				.iter()
				.map(|(name, dimensions)| EmbeddingProviderConfig {
					name: name.to_string(),
					provider_id: format!("{name}-provider"),
					api_base: "http://127.0.0.1:1".to_string(),
					api_key: "test-key".to_string(),
					api_key_env: None,
					auth: "bearer".to_string(),
					path: "/embeddings".to_string(),
					model: format!("{name}-model"),
					dimensions: *dimensions,
					send_dimensions: false,
					timeout_ms: 1_000,
					default_headers: Map::new(),
				})
				.collect(),
			rerank: provider("reranker", "/rerank"),
			completion: provider("completion", "/chat/completions"),
		},
		indexes: indexes
			.iter()
			.map(|(name, space)| IndexConfig {
				name: name.to_string(),
				embedding: space.to_string(),
				backend: BACKEND_QDRANT.to_string(),
				url: "http://127.0.0.1:6334".to_string(),
				index: name.to_string(),
				vector_name: None,
				api_key: None,
				api_key_env: None,
				timeout_ms: 1_000,
				fields: IndexFields::default(),
			})
			.collect(),
		retrieval: Retrieval::default(),
		filter_extraction: FilterExtraction::default(),
		synthesis: Synthesis::default(),
	}
}

fn provider(provider_id: &str, path: &str) -> ProviderConfig {
	ProviderConfig {
		provider_id: provider_id.to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		api_key_env: None,
		auth: "bearer".to_string(),
		path: path.to_string(),
		model: format!("{provider_id}-model"),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

/// Builds a service whose indexes are bound to the spaces named in `cfg`.
pub fn service_with(
	cfg: Config,
	indexes: Vec<(&str, Arc<dyn VectorIndex>)>,
	providers: Providers,
) -> RagService {
	let bound = indexes
		.into_iter()
		.map(|(name, index)| {
			let space = cfg
				.indexes
				.iter()
				.find(|candidate| candidate.name == name)
				.and_then(|index_cfg| cfg.embedding_space(&index_cfg.embedding))
				.map(EmbeddingSpace::from)
				.unwrap_or_else(|| EmbeddingSpace::new(name, 0));

			BoundIndex::new(name, space, index)
		})
		.collect();

	RagService::with_parts(cfg, bound, providers)
}

/// Returns a constant vector of the requested space's width and records each call.
#[derive(Default)]
pub struct StaticEmbedding {
	width: Option<usize>,
	calls: Mutex<Vec<String>>,
}
impl StaticEmbedding {
	pub fn new() -> Self {
		Self::default()
	}

	/// Ignores the configured dimensions and always returns `width` values.
	pub fn with_width(width: usize) -> Self {
		Self { width: Some(width), calls: Mutex::default() }
	}

	/// Embedding space names in call order.
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl EmbeddingProvider for StaticEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(cfg.name.clone());

		let width = self.width.unwrap_or(cfg.dimensions as usize);
		let vector = vec![0.1; width];

		Box::pin(async move { Ok(vec![vector; texts.len()]) })
	}
}

/// Scores documents by looking their content up in a table. Unknown content scores 0.
#[derive(Default)]
pub struct TableRerank {
	scores: HashMap<String, f32>,
	calls: AtomicUsize,
	batches: Mutex<Vec<Vec<String>>>,
}
impl TableRerank {
	pub fn new<I, S>(scores: I) -> Self
	where
		I: IntoIterator<Item = (S, f32)>,
		S: Into<String>,
	{
		Self {
			scores: scores.into_iter().map(|(content, score)| (content.into(), score)).collect(),
			..Self::default()
		}
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn batches(&self) -> Vec<Vec<String>> {
		self.batches.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl RerankProvider for TableRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.batches.lock().unwrap_or_else(|err| err.into_inner()).push(docs.to_vec());

		let scores =
			docs.iter().map(|doc| self.scores.get(doc).copied().unwrap_or(0.0)).collect();

		Box::pin(async move { Ok(scores) })
	}
}

/// Replays queued completion responses in order.
#[derive(Default)]
pub struct ScriptedCompletion {
	responses: Mutex<VecDeque<Option<String>>>,
	requests: Mutex<Vec<(Vec<ChatMessage>, GenerationParams)>>,
}
impl ScriptedCompletion {
	pub fn new<I, S>(responses: I) -> Self
	where
		I: IntoIterator<Item = Option<S>>,
		S: Into<String>,
	{
		Self {
			responses: Mutex::new(
				responses.into_iter().map(|response| response.map(Into::into)).collect(),
			),
			requests: Mutex::default(),
		}
	}

	pub fn count(&self) -> usize {
		self.requests().len()
	}

	pub fn requests(&self) -> Vec<(Vec<ChatMessage>, GenerationParams)> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		messages: &'a [ChatMessage],
		params: GenerationParams,
	) -> BoxFuture<'a, color_eyre::Result<Option<String>>> {
		self.requests
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((messages.to_vec(), params));

		let next = self
			.responses
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.pop_front()
			.ok_or_else(|| {
				color_eyre::Report::new(Error::Message("No scripted completion left.".to_string()))
			});

		Box::pin(async move { next })
	}
}

/// An in-memory index that honors jurisdiction filters and `k`.
#[derive(Default)]
pub struct StaticIndex {
	records: Vec<CandidateRecord>,
	calls: AtomicUsize,
	filters: Mutex<Vec<Filter>>,
}
impl StaticIndex {
	pub fn new(records: Vec<CandidateRecord>) -> Self {
		Self { records, ..Self::default() }
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn filters(&self) -> Vec<Filter> {
		self.filters.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl VectorIndex for StaticIndex {
	fn search<'a>(
		&'a self,
		_vector: &'a [f32],
		filter: &'a Filter,
		k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.filters.lock().unwrap_or_else(|err| err.into_inner()).push(filter.clone());

		let hits = self
			.records
			.iter()
			.filter(|record| filter.is_empty() || filter.values().contains(&record.jurisdiction))
			.take(k as usize)
			.cloned()
			.collect();

		Box::pin(async move { Ok(hits) })
	}
}

/// Fails every call it receives, whichever collaborator it stands in for.
pub struct Unavailable {
	collaborator: &'static str,
	calls: AtomicUsize,
}
impl Unavailable {
	pub fn new(collaborator: &'static str) -> Self {
		Self { collaborator, calls: AtomicUsize::new(0) }
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn fail<T>(&self) -> BoxFuture<'_, color_eyre::Result<T>>
	where
		T: Send + 'static,
	{
		self.calls.fetch_add(1, Ordering::SeqCst);

		let err = color_eyre::Report::new(Error::Unavailable {
			collaborator: self.collaborator,
			reason: "connection refused".to_string(),
		});

		Box::pin(async move { Err(err) })
	}
}
impl EmbeddingProvider for Unavailable {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.fail()
	}
}
impl RerankProvider for Unavailable {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		_docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		self.fail()
	}
}
impl CompletionProvider for Unavailable {
	fn complete<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_messages: &'a [ChatMessage],
		_params: GenerationParams,
	) -> BoxFuture<'a, color_eyre::Result<Option<String>>> {
		self.fail()
	}
}
impl VectorIndex for Unavailable {
	fn search<'a>(
		&'a self,
		_vector: &'a [f32],
		_filter: &'a Filter,
		_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateRecord>>> {
		self.fail()
	}
}
