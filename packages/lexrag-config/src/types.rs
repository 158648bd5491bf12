use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub indexes: Vec<IndexConfig>,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub filter_extraction: FilterExtraction,
	#[serde(default)]
	pub synthesis: Synthesis,
}
impl Config {
	/// Looks up the embedding provider that defines the named embedding space.
	pub fn embedding_space(&self, name: &str) -> Option<&EmbeddingProviderConfig> {
		self.providers.embedding.iter().find(|provider| provider.name == name)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	/// One entry per embedding space. Indexes refer to these by `name`.
	pub embedding: Vec<EmbeddingProviderConfig>,
	pub rerank: ProviderConfig,
	pub completion: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub name: String,
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	/// Optional. Name of an environment variable that overrides `api_key`.
	#[serde(default)]
	pub api_key_env: Option<String>,
	#[serde(default = "default_auth")]
	pub auth: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	/// Azure ADA deployments reject a `dimensions` field, so it is opt-in.
	#[serde(default)]
	pub send_dimensions: bool,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	#[serde(default)]
	pub api_key_env: Option<String>,
	#[serde(default = "default_auth")]
	pub auth: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
	pub name: String,
	/// Name of the embedding space whose vectors this index stores.
	pub embedding: String,
	/// One of `qdrant` or `databricks`.
	pub backend: String,
	/// Qdrant URL or Databricks workspace URL.
	pub url: String,
	/// Qdrant collection or fully qualified Databricks index name.
	pub index: String,
	/// Optional. Qdrant named vector to query.
	#[serde(default)]
	pub vector_name: Option<String>,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default)]
	pub api_key_env: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub fields: IndexFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexFields {
	pub id: String,
	pub jurisdiction: String,
	pub path: String,
	pub content: String,
}
impl Default for IndexFields {
	fn default() -> Self {
		Self {
			id: "id".to_string(),
			jurisdiction: "state".to_string(),
			path: "url".to_string(),
			content: "content".to_string(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Result count requested from every index.
	pub num_results: u32,
	/// Ranked items returned by a search request.
	pub top_n: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { num_results: 10, top_n: 5 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterExtraction {
	pub enabled: bool,
	pub max_tokens: u32,
	pub temperature: f32,
	/// One of `unfiltered` or `fail`.
	pub on_parse_error: String,
}
impl Default for FilterExtraction {
	fn default() -> Self {
		Self {
			enabled: true,
			max_tokens: 64,
			temperature: 0.0,
			on_parse_error: "unfiltered".to_string(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Synthesis {
	pub instruction: String,
	pub max_tokens: u32,
	pub temperature: f32,
}
impl Default for Synthesis {
	fn default() -> Self {
		Self {
			instruction: "Summarize this result: ".to_string(),
			max_tokens: 1_500,
			temperature: 0.8,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_auth() -> String {
	"bearer".to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}
