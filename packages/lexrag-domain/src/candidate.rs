use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One retrieved chunk. Two records are the same candidate only when every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateRecord {
	pub id: String,
	pub jurisdiction: String,
	pub path: String,
	pub content: String,
}
impl CandidateRecord {
	pub fn new(
		id: impl Into<String>,
		jurisdiction: impl Into<String>,
		path: impl Into<String>,
		content: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			jurisdiction: jurisdiction.into(),
			path: path.into(),
			content: content.into(),
		}
	}
}

/// Distinct candidates gathered from every index, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
	records: Vec<CandidateRecord>,
}
impl CandidateSet {
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &CandidateRecord> {
		self.records.iter()
	}

	pub fn contains(&self, record: &CandidateRecord) -> bool {
		self.records.contains(record)
	}
}
impl IntoIterator for CandidateSet {
	type IntoIter = std::vec::IntoIter<CandidateRecord>;
	type Item = CandidateRecord;

	fn into_iter(self) -> Self::IntoIter {
		self.records.into_iter()
	}
}

/// Concatenates per-index results and drops exact-tuple duplicates, keeping the first one.
pub fn fuse<I, R>(per_index: I) -> CandidateSet
where
	I: IntoIterator<Item = R>,
	R: IntoIterator<Item = CandidateRecord>,
{
	let mut seen = HashSet::new();
	let mut records = Vec::new();

	for record in per_index.into_iter().flatten() {
		if seen.contains(&record) {
			continue;
		}

		seen.insert(record.clone());
		records.push(record);
	}

	CandidateSet { records }
}
