use serde::{Deserialize, Serialize};

use lexrag_config::EmbeddingProviderConfig;

/// Identity of the vector space an embedding provider produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingSpace {
	pub name: String,
	pub dimensions: u32,
}
impl EmbeddingSpace {
	pub fn new(name: impl Into<String>, dimensions: u32) -> Self {
		Self { name: name.into(), dimensions }
	}

	pub fn check(&self, vector: &[f32]) -> Result<(), DimensionMismatch> {
		if vector.len() != self.dimensions as usize {
			return Err(DimensionMismatch {
				space: self.name.clone(),
				expected: self.dimensions as usize,
				actual: vector.len(),
			});
		}

		Ok(())
	}
}
impl From<&EmbeddingProviderConfig> for EmbeddingSpace {
	fn from(cfg: &EmbeddingProviderConfig) -> Self {
		Self::new(cfg.name.clone(), cfg.dimensions)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Embedding space {space} expects {expected} dimensions but the vector has {actual}.")]
pub struct DimensionMismatch {
	pub space: String,
	pub expected: usize,
	pub actual: usize,
}
