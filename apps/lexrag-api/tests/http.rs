use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
	response::Response,
};
use serde_json::Value;
use tower::util::ServiceExt;

use lexrag_api::{routes, state::AppState};
use lexrag_domain::CandidateRecord;
use lexrag_service::{CompletionProvider, Providers, RerankProvider, VectorIndex};
use lexrag_testkit::{
	ScriptedCompletion, StaticEmbedding, StaticIndex, TableRerank, Unavailable, service_with,
	test_config,
};

const INDEX: &str = "bge_self_managed_index";

fn colorado() -> CandidateRecord {
	CandidateRecord::new(
		"12",
		"Colorado",
		"/docs/colorado_privacy_act.pdf",
		"Colorado consumers may opt out of targeted advertising.",
	)
}

fn app(
	index: Arc<dyn VectorIndex>,
	rerank: Arc<dyn RerankProvider>,
	completion: Arc<dyn CompletionProvider>,
) -> Router {
	let providers = Providers::new(Arc::new(StaticEmbedding::new()), rerank, completion);
	let service = service_with(
		test_config(&[("bge", 4)], &[(INDEX, "bge")]),
		vec![(INDEX, index)],
		providers,
	);

	routes::router(AppState::from_service(service))
}

async fn post(app: Router, uri: &str, payload: Value) -> Response {
	app.oneshot(
		Request::builder()
			.method("POST")
			.uri(uri)
			.header("content-type", "application/json")
			.body(Body::from(payload.to_string()))
			.expect("Failed to build request."),
	)
	.await
	.expect("Failed to call the router.")
}

async fn json_body(response: Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let app = app(
		Arc::new(StaticIndex::default()),
		Arc::new(TableRerank::default()),
		Arc::new(ScriptedCompletion::new(Vec::<Option<String>>::new())),
	);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn filters_route_returns_extracted_jurisdictions() {
	let app = app(
		Arc::new(StaticIndex::default()),
		Arc::new(TableRerank::default()),
		Arc::new(ScriptedCompletion::new([Some("```json\n{\"state\": [\"California\"]}\n```")])),
	);
	let response = post(
		app,
		"/v1/filters",
		serde_json::json!({ "query": "What are the privacy laws in California?" }),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, serde_json::json!({ "jurisdiction": ["California"] }));
}

#[tokio::test]
async fn ask_route_returns_answer_with_provenance() {
	let app = app(
		Arc::new(StaticIndex::new(vec![colorado()])),
		Arc::new(TableRerank::new([(colorado().content, 0.9)])),
		Arc::new(ScriptedCompletion::new([
			Some(r#"{"state": ["Colorado"]}"#),
			Some("Colorado consumers can opt out of targeted advertising."),
		])),
	);
	let payload = serde_json::json!({ "query": "What are the privacy laws in Colorado?" });
	let response = post(app, "/v1/ask", payload).await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["query"], "What are the privacy laws in Colorado?");
	assert_eq!(json["filter"]["jurisdiction"][0], "Colorado");
	assert_eq!(json["candidate_count"], 1);
	assert_eq!(json["answer"]["answer"], "Colorado consumers can opt out of targeted advertising.");
	assert_eq!(json["answer"]["jurisdiction"], "Colorado");
	assert_eq!(json["answer"]["id"], "12");
	assert_eq!(json["answer"]["path"], "/docs/colorado_privacy_act.pdf");
	assert!(json["trace_id"].is_string());
}

#[tokio::test]
async fn search_without_candidates_is_not_found() {
	let app = app(
		Arc::new(StaticIndex::new(vec![colorado()])),
		Arc::new(TableRerank::default()),
		Arc::new(ScriptedCompletion::new([Some(r#"{"state": ["Wyoming"]}"#)])),
	);
	let response =
		post(app, "/v1/search", serde_json::json!({ "query": "privacy laws in Wyoming" })).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(json_body(response).await["error_code"], "NO_RESULTS");
}

#[tokio::test]
async fn blank_query_is_a_bad_request() {
	let app = app(
		Arc::new(StaticIndex::default()),
		Arc::new(TableRerank::default()),
		Arc::new(ScriptedCompletion::new(Vec::<Option<String>>::new())),
	);
	let response = post(app, "/v1/ask", serde_json::json!({ "query": "  " })).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn reranker_outage_is_a_bad_gateway() {
	let app = app(
		Arc::new(StaticIndex::new(vec![colorado()])),
		Arc::new(Unavailable::new("reranker")),
		Arc::new(ScriptedCompletion::new([Some(r#"{"state": []}"#)])),
	);
	let response = post(app, "/v1/search", serde_json::json!({ "query": "privacy laws" })).await;

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "PROVIDER_UNAVAILABLE");
	assert_eq!(json["fields"], serde_json::json!(["rerank", "reranker"]));
}

#[tokio::test]
async fn unparseable_filter_is_a_bad_gateway_on_the_filters_route() {
	let app = app(
		Arc::new(StaticIndex::default()),
		Arc::new(TableRerank::default()),
		Arc::new(ScriptedCompletion::new([Some("There are no states here.")])),
	);
	let response = post(app, "/v1/filters", serde_json::json!({ "query": "privacy laws" })).await;

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
	assert_eq!(json_body(response).await["error_code"], "FILTER_PARSE_ERROR");
}
