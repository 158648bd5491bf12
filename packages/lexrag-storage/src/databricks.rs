use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};

use lexrag_config::{IndexConfig, IndexFields};
use lexrag_domain::{CandidateRecord, Filter};

use crate::{Error, Result};

/// Client for a Databricks Vector Search index queried with a caller-supplied vector.
pub struct DatabricksIndex {
	client: Client,
	url: String,
	index: String,
	api_key: String,
	fields: IndexFields,
}
impl DatabricksIndex {
	pub fn new(cfg: &IndexConfig) -> Result<Self> {
		let api_key = cfg.api_key.clone().ok_or_else(|| {
			Error::InvalidConfig(format!("Index {} has no api_key.", cfg.name))
		})?;
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			client,
			url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.index.clone(),
			api_key,
			fields: cfg.fields.clone(),
		})
	}

	pub async fn search(
		&self,
		vector: &[f32],
		filter: &Filter,
		k: u32,
	) -> Result<Vec<CandidateRecord>> {
		let url = format!("{}/api/2.0/vector-search/indexes/{}/query", self.url, self.index);
		let body = build_query_body(&self.fields, vector, filter, k);
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", self.api_key))?);

		let res = self.client.post(url).headers(headers).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_query_response(&self.fields, &json)
	}
}

fn requested_columns(fields: &IndexFields) -> [&str; 4] {
	[
		fields.id.as_str(),
		fields.jurisdiction.as_str(),
		fields.path.as_str(),
		fields.content.as_str(),
	]
}

fn build_query_body(fields: &IndexFields, vector: &[f32], filter: &Filter, k: u32) -> Value {
	let mut body = serde_json::json!({
		"query_vector": vector,
		"columns": requested_columns(fields),
		"num_results": k,
	});

	if !filter.is_empty() {
		let mut filters = Map::new();

		filters.insert(fields.jurisdiction.clone(), Value::from(filter.values().to_vec()));

		body["filters_json"] = Value::from(Value::Object(filters).to_string());
	}

	body
}

fn parse_query_response(fields: &IndexFields, json: &Value) -> Result<Vec<CandidateRecord>> {
	let result = json
		.get("result")
		.ok_or_else(|| Error::InvalidResponse("Query response is missing result.".to_string()))?;
	// Databricks omits data_array when no rows match.
	let Some(rows) = result.get("data_array").and_then(|v| v.as_array()) else {
		return Ok(Vec::new());
	};
	let manifest: Option<Vec<&str>> = json
		.get("manifest")
		.and_then(|m| m.get("columns"))
		.and_then(|c| c.as_array())
		.map(|columns| {
			columns.iter().filter_map(|c| c.get("name").and_then(|n| n.as_str())).collect()
		});
	let requested = requested_columns(fields);
	// Rows follow the requested column order only when no manifest is returned.
	let position = |slot: usize| match &manifest {
		None => Ok(slot),
		Some(names) => names.iter().position(|name| *name == requested[slot]).ok_or_else(|| {
			Error::InvalidResponse(format!("Query manifest is missing column {}.", requested[slot]))
		}),
	};
	let [id_at, jurisdiction_at, path_at, content_at] =
		[position(0)?, position(1)?, position(2)?, position(3)?];
	let mut records = Vec::with_capacity(rows.len());

	for row in rows {
		let cells = row
			.as_array()
			.ok_or_else(|| Error::InvalidResponse("Query row is not an array.".to_string()))?;
		let cell = |at: usize| cells.get(at).map(cell_to_string).unwrap_or_default();

		records.push(CandidateRecord {
			id: cell(id_at),
			jurisdiction: cell(jurisdiction_at),
			path: cell(path_at),
			content: cell(content_at),
		});
	}

	Ok(records)
}

fn cell_to_string(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Number(number) => match (number.as_i64(), number.as_f64()) {
			(Some(int), _) => int.to_string(),
			(None, Some(float)) if float.fract() == 0.0 => (float as i64).to_string(),
			_ => number.to_string(),
		},
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unfiltered_query_has_no_filters_json() {
		let body = build_query_body(&IndexFields::default(), &[0.1, 0.2], &Filter::empty(), 10);

		assert_eq!(body["columns"], serde_json::json!(["id", "state", "url", "content"]));
		assert_eq!(body["num_results"], 10);
		assert!(body.get("filters_json").is_none());
	}

	#[test]
	fn filtered_query_encodes_jurisdictions() {
		let filter = Filter::from_values(["Colorado"]);
		let body = build_query_body(&IndexFields::default(), &[0.1], &filter, 3);
		let filters_json = body["filters_json"].as_str().expect("filters_json must be a string");
		let decoded: Value = serde_json::from_str(filters_json).expect("filters_json must be JSON");

		assert_eq!(decoded, serde_json::json!({ "state": ["Colorado"] }));
	}

	#[test]
	fn maps_rows_by_manifest_columns() {
		let json = serde_json::json!({
			"manifest": {
				"column_count": 5,
				"columns": [
					{ "name": "content" },
					{ "name": "id" },
					{ "name": "state" },
					{ "name": "url" },
					{ "name": "score" }
				]
			},
			"result": {
				"row_count": 1,
				"data_array": [["consumers may opt out", 12.0, "Colorado", "/docs/co.pdf", 0.81]]
			}
		});
		let records =
			parse_query_response(&IndexFields::default(), &json).expect("parse failed");

		assert_eq!(
			records,
			vec![CandidateRecord::new("12", "Colorado", "/docs/co.pdf", "consumers may opt out")]
		);
	}

	#[test]
	fn rows_without_manifest_follow_requested_order() {
		let json = serde_json::json!({
			"result": { "data_array": [["12", "Colorado", "/docs/co.pdf", "consumers may opt out"]] }
		});
		let records =
			parse_query_response(&IndexFields::default(), &json).expect("parse failed");

		assert_eq!(
			records,
			vec![CandidateRecord::new("12", "Colorado", "/docs/co.pdf", "consumers may opt out")]
		);
	}

	#[test]
	fn manifest_without_requested_column_is_an_error() {
		let json = serde_json::json!({
			"manifest": {
				"columns": [{ "name": "id" }, { "name": "url" }, { "name": "content" }]
			},
			"result": { "data_array": [["12", "/docs/co.pdf", "consumers may opt out"]] }
		});
		let err = parse_query_response(&IndexFields::default(), &json)
			.expect_err("missing state column must be rejected");

		assert!(matches!(err, Error::InvalidResponse(_)), "Unexpected error: {err:?}");
	}

	#[test]
	fn missing_data_array_means_no_rows() {
		let json = serde_json::json!({ "result": { "row_count": 0 } });
		let records =
			parse_query_response(&IndexFields::default(), &json).expect("parse failed");

		assert!(records.is_empty());
	}

	#[test]
	fn missing_result_is_an_error() {
		let json = serde_json::json!({ "error_code": "NOT_FOUND" });

		assert!(parse_query_response(&IndexFields::default(), &json).is_err());
	}
}
