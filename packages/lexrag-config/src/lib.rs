mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, FilterExtraction, IndexConfig, IndexFields, ProviderConfig,
	Providers, Retrieval, Service, Synthesis,
};

use std::{collections::HashSet, env, fs, path::Path};

pub const BACKEND_QDRANT: &str = "qdrant";
pub const BACKEND_DATABRICKS: &str = "databricks";
pub const AUTH_BEARER: &str = "bearer";
pub const AUTH_API_KEY: &str = "api_key";
pub const ON_PARSE_ERROR_UNFILTERED: &str = "unfiltered";
pub const ON_PARSE_ERROR_FAIL: &str = "fail";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	resolve_secrets(&mut cfg, |name| env::var(name).ok())?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding must define at least one embedding space.".to_string(),
		});
	}

	let mut space_names = HashSet::new();

	for provider in &cfg.providers.embedding {
		if provider.name.is_empty() {
			return Err(Error::Validation {
				message: "providers.embedding.name must be non-empty.".to_string(),
			});
		}
		if !space_names.insert(provider.name.as_str()) {
			return Err(Error::Validation {
				message: format!("providers.embedding.name {} is defined twice.", provider.name),
			});
		}
		if provider.dimensions == 0 {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding.{}.dimensions must be greater than zero.",
					provider.name
				),
			});
		}

		validate_auth(&format!("providers.embedding.{}", provider.name), &provider.auth)?;
	}

	validate_auth("providers.rerank", &cfg.providers.rerank.auth)?;
	validate_auth("providers.completion", &cfg.providers.completion.auth)?;

	for (label, key) in [
		("rerank", &cfg.providers.rerank.api_key),
		("completion", &cfg.providers.completion.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for provider in &cfg.providers.embedding {
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider embedding.{} api_key must be non-empty.", provider.name),
			});
		}
	}

	if cfg.indexes.is_empty() {
		return Err(Error::Validation {
			message: "indexes must define at least one vector index.".to_string(),
		});
	}

	let mut index_names = HashSet::new();

	for index in &cfg.indexes {
		if index.name.is_empty() {
			return Err(Error::Validation {
				message: "indexes.name must be non-empty.".to_string(),
			});
		}
		if !index_names.insert(index.name.as_str()) {
			return Err(Error::Validation {
				message: format!("indexes.name {} is defined twice.", index.name),
			});
		}
		if cfg.embedding_space(&index.embedding).is_none() {
			return Err(Error::Validation {
				message: format!(
					"indexes.{}.embedding refers to unknown embedding space {}.",
					index.name, index.embedding
				),
			});
		}
		if index.url.trim().is_empty() || index.index.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("indexes.{} url and index must be non-empty.", index.name),
			});
		}

		match index.backend.as_str() {
			BACKEND_QDRANT => {},
			BACKEND_DATABRICKS =>
				if index.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(true) {
					return Err(Error::Validation {
						message: format!(
							"indexes.{}.api_key must be non-empty for the databricks backend.",
							index.name
						),
					});
				},
			_ => {
				return Err(Error::Validation {
					message: format!(
						"indexes.{}.backend must be one of qdrant or databricks.",
						index.name
					),
				});
			},
		}

		for (label, field) in [
			("id", &index.fields.id),
			("jurisdiction", &index.fields.jurisdiction),
			("path", &index.fields.path),
			("content", &index.fields.content),
		] {
			if field.trim().is_empty() {
				return Err(Error::Validation {
					message: format!("indexes.{}.fields.{label} must be non-empty.", index.name),
				});
			}
		}
	}

	if cfg.retrieval.num_results == 0 {
		return Err(Error::Validation {
			message: "retrieval.num_results must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.top_n == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_n must be greater than zero.".to_string(),
		});
	}
	if cfg.filter_extraction.max_tokens == 0 {
		return Err(Error::Validation {
			message: "filter_extraction.max_tokens must be greater than zero.".to_string(),
		});
	}

	validate_temperature("filter_extraction.temperature", cfg.filter_extraction.temperature)?;

	if !matches!(
		cfg.filter_extraction.on_parse_error.as_str(),
		ON_PARSE_ERROR_UNFILTERED | ON_PARSE_ERROR_FAIL
	) {
		return Err(Error::Validation {
			message: "filter_extraction.on_parse_error must be one of unfiltered or fail."
				.to_string(),
		});
	}
	if cfg.synthesis.instruction.trim().is_empty() {
		return Err(Error::Validation {
			message: "synthesis.instruction must be non-empty.".to_string(),
		});
	}
	if cfg.synthesis.max_tokens == 0 {
		return Err(Error::Validation {
			message: "synthesis.max_tokens must be greater than zero.".to_string(),
		});
	}

	validate_temperature("synthesis.temperature", cfg.synthesis.temperature)?;

	Ok(())
}

/// Replaces `api_key` values with the environment variables named by `api_key_env`.
///
/// `lookup` is injected so tests do not depend on the process environment.
pub fn resolve_secrets<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let resolve = |key: String, name: &str| {
		lookup(name)
			.filter(|value| !value.trim().is_empty())
			.ok_or_else(|| Error::MissingEnv { key, name: name.to_string() })
	};

	for provider in &mut cfg.providers.embedding {
		if let Some(name) = provider.api_key_env.as_deref() {
			provider.api_key =
				resolve(format!("providers.embedding.{}.api_key_env", provider.name), name)?;
		}
	}

	if let Some(name) = cfg.providers.rerank.api_key_env.as_deref() {
		cfg.providers.rerank.api_key =
			resolve("providers.rerank.api_key_env".to_string(), name)?;
	}
	if let Some(name) = cfg.providers.completion.api_key_env.as_deref() {
		cfg.providers.completion.api_key =
			resolve("providers.completion.api_key_env".to_string(), name)?;
	}

	for index in &mut cfg.indexes {
		if let Some(name) = index.api_key_env.as_deref() {
			index.api_key = Some(resolve(format!("indexes.{}.api_key_env", index.name), name)?);
		}
	}

	Ok(())
}

fn validate_auth(label: &str, auth: &str) -> Result<()> {
	if !matches!(auth, AUTH_BEARER | AUTH_API_KEY) {
		return Err(Error::Validation {
			message: format!("{label}.auth must be one of bearer or api_key."),
		});
	}

	Ok(())
}

fn validate_temperature(label: &str, temperature: f32) -> Result<()> {
	if !temperature.is_finite() {
		return Err(Error::Validation { message: format!("{label} must be a finite number.") });
	}
	if temperature < 0.0 {
		return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in &mut cfg.providers.embedding {
		provider.name = provider.name.trim().to_string();
		provider.api_key_env = blank_to_none(provider.api_key_env.take());
	}

	cfg.providers.rerank.api_key_env = blank_to_none(cfg.providers.rerank.api_key_env.take());
	cfg.providers.completion.api_key_env =
		blank_to_none(cfg.providers.completion.api_key_env.take());

	for index in &mut cfg.indexes {
		index.name = index.name.trim().to_string();
		index.embedding = index.embedding.trim().to_string();
		index.vector_name = blank_to_none(index.vector_name.take());
		index.api_key = blank_to_none(index.api_key.take());
		index.api_key_env = blank_to_none(index.api_key_env.take());
	}
}

fn blank_to_none(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.trim().is_empty())
}
