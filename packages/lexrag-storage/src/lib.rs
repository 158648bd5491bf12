pub mod databricks;
pub mod qdrant;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

use lexrag_config::{BACKEND_DATABRICKS, BACKEND_QDRANT, IndexConfig};
use lexrag_domain::{CandidateRecord, Filter};

use crate::{databricks::DatabricksIndex, qdrant::QdrantIndex};

/// A configured similarity-search backend.
pub enum VectorStore {
	Qdrant(QdrantIndex),
	Databricks(DatabricksIndex),
}
impl VectorStore {
	pub fn connect(cfg: &IndexConfig) -> Result<Self> {
		match cfg.backend.as_str() {
			BACKEND_QDRANT => Ok(Self::Qdrant(QdrantIndex::new(cfg)?)),
			BACKEND_DATABRICKS => Ok(Self::Databricks(DatabricksIndex::new(cfg)?)),
			other => Err(Error::InvalidConfig(format!("Unknown index backend {other}."))),
		}
	}

	pub fn backend(&self) -> &'static str {
		match self {
			Self::Qdrant(_) => BACKEND_QDRANT,
			Self::Databricks(_) => BACKEND_DATABRICKS,
		}
	}

	/// Returns at most `k` records in backend similarity order.
	pub async fn search(
		&self,
		vector: &[f32],
		filter: &Filter,
		k: u32,
	) -> Result<Vec<CandidateRecord>> {
		match self {
			Self::Qdrant(index) => index.search(vector, filter, k).await,
			Self::Databricks(index) => index.search(vector, filter, k).await,
		}
	}
}
