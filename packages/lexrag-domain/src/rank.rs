use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateRecord, CandidateSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
	pub record: CandidateRecord,
	pub score: f32,
}

/// Candidates in descending score order. Equal scores keep submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedResult {
	items: Vec<ScoredCandidate>,
}
impl RankedResult {
	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn top(&self) -> Option<&ScoredCandidate> {
		self.items.first()
	}

	pub fn items(&self) -> &[ScoredCandidate] {
		&self.items
	}

	pub fn into_items(self) -> Vec<ScoredCandidate> {
		self.items
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Expected {expected} relevance scores but received {actual}.")]
pub struct ScoreCountMismatch {
	pub expected: usize,
	pub actual: usize,
}

/// Pairs each candidate with its aligned score and sorts descending.
///
/// The sort is stable, so ties keep the order the candidates were scored in. NaN scores
/// sort last.
pub fn rank(candidates: CandidateSet, scores: &[f32]) -> Result<RankedResult, ScoreCountMismatch> {
	if candidates.len() != scores.len() {
		return Err(ScoreCountMismatch { expected: candidates.len(), actual: scores.len() });
	}

	let mut items: Vec<ScoredCandidate> = candidates
		.into_iter()
		.zip(scores.iter().copied())
		.map(|(record, score)| ScoredCandidate { record, score })
		.collect();

	items.sort_by(|a, b| compare_desc(a.score, b.score));

	Ok(RankedResult { items })
}

fn compare_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
