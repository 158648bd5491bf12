use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant,
	qdrant::{
		Condition, Filter as QdrantFilter, PointId, Query, QueryPointsBuilder, ScoredPoint, Value,
		point_id::PointIdOptions, value::Kind,
	},
};

use lexrag_config::{IndexConfig, IndexFields};
use lexrag_domain::{CandidateRecord, Filter};

use crate::{Error, Result};

pub struct QdrantIndex {
	pub client: Qdrant,
	pub collection: String,
	pub vector_name: Option<String>,
	pub fields: IndexFields,
}
impl QdrantIndex {
	pub fn new(cfg: &IndexConfig) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.api_key(cfg.api_key.clone())
			.build()?;

		Ok(Self {
			client,
			collection: cfg.index.clone(),
			vector_name: cfg.vector_name.clone(),
			fields: cfg.fields.clone(),
		})
	}

	pub async fn search(
		&self,
		vector: &[f32],
		filter: &Filter,
		k: u32,
	) -> Result<Vec<CandidateRecord>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.with_payload(true)
			.limit(k as u64);

		if let Some(name) = self.vector_name.as_deref() {
			search = search.using(name);
		}
		if let Some(filter) = jurisdiction_filter(&self.fields, filter) {
			search = search.filter(filter);
		}

		let response = self.client.query(search).await?;

		response.result.iter().map(|point| point_to_record(&self.fields, point)).collect()
	}
}

fn jurisdiction_filter(fields: &IndexFields, filter: &Filter) -> Option<QdrantFilter> {
	if filter.is_empty() {
		return None;
	}

	Some(QdrantFilter::must([Condition::matches(
		fields.jurisdiction.clone(),
		filter.values().to_vec(),
	)]))
}

fn point_to_record(fields: &IndexFields, point: &ScoredPoint) -> Result<CandidateRecord> {
	let id = payload_string(&point.payload, &fields.id)
		.or_else(|| point.id.as_ref().and_then(point_id_to_string))
		.ok_or_else(|| Error::InvalidResponse("Qdrant point has no id.".to_string()))?;
	let content = payload_string(&point.payload, &fields.content).ok_or_else(|| {
		Error::InvalidResponse(format!("Qdrant point {id} is missing {}.", fields.content))
	})?;

	Ok(CandidateRecord {
		jurisdiction: payload_string(&point.payload, &fields.jurisdiction).unwrap_or_default(),
		path: payload_string(&point.payload, &fields.path).unwrap_or_default(),
		id,
		content,
	})
}

fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		None => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		Some(Kind::IntegerValue(value)) => Some(value.to_string()),
		Some(Kind::DoubleValue(value)) if value.fract() == 0.0 => Some((*value as i64).to_string()),
		Some(Kind::DoubleValue(value)) => Some(value.to_string()),
		_ => None,
	}
}
