pub mod candidate;
pub mod embedding_space;
pub mod filter;
pub mod rank;

pub use candidate::{CandidateRecord, CandidateSet, fuse};
pub use embedding_space::{DimensionMismatch, EmbeddingSpace};
pub use filter::{Filter, FilterParseError, parse_filter_response, strip_code_fences};
pub use rank::{RankedResult, ScoreCountMismatch, ScoredCandidate, rank};
