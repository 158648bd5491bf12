use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use lexrag_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("lexrag_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn expect_validation(cfg: &Config, needle: &str) {
	let err = lexrag_config::validate(cfg).expect_err("Expected validation error.");

	assert!(err.to_string().contains(needle), "Unexpected error: {err}");
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = lexrag_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.providers.embedding.len(), 2);
	assert_eq!(cfg.indexes.len(), 2);
	assert_eq!(cfg.embedding_space("ada").map(|space| space.dimensions), Some(1_536));
	assert_eq!(cfg.indexes[0].fields.jurisdiction, "state");
}

#[test]
fn optional_sections_use_defaults() {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Sample config must be a table.");

	root.remove("retrieval");
	root.remove("filter_extraction");
	root.remove("synthesis");

	let cfg: Config = toml::from_str(&render(&value)).expect("Failed to parse config.");

	assert_eq!(cfg.retrieval.num_results, 10);
	assert_eq!(cfg.filter_extraction.max_tokens, 64);
	assert_eq!(cfg.filter_extraction.temperature, 0.0);
	assert_eq!(cfg.filter_extraction.on_parse_error, "unfiltered");
	assert_eq!(cfg.synthesis.instruction, "Summarize this result: ");
	assert_eq!(cfg.synthesis.max_tokens, 1_500);
	assert!((cfg.synthesis.temperature - 0.8).abs() < f32::EPSILON);
	assert!(lexrag_config::validate(&cfg).is_ok());
}

#[test]
fn index_must_reference_known_embedding_space() {
	let mut cfg = base_config();

	cfg.indexes[1].embedding = "e5".to_string();

	expect_validation(&cfg, "refers to unknown embedding space e5.");
}

#[test]
fn index_names_must_be_unique() {
	let mut cfg = base_config();

	cfg.indexes[1].name = cfg.indexes[0].name.clone();

	expect_validation(&cfg, "is defined twice.");
}

#[test]
fn embedding_dimensions_must_be_positive() {
	let mut cfg = base_config();

	cfg.providers.embedding[0].dimensions = 0;

	expect_validation(&cfg, "providers.embedding.bge.dimensions must be greater than zero.");
}

#[test]
fn num_results_must_be_positive() {
	let mut cfg = base_config();

	cfg.retrieval.num_results = 0;

	expect_validation(&cfg, "retrieval.num_results must be greater than zero.");
}

#[test]
fn backend_must_be_known() {
	let mut cfg = base_config();

	cfg.indexes[0].backend = "pinecone".to_string();

	expect_validation(&cfg, "backend must be one of qdrant or databricks.");
}

#[test]
fn databricks_backend_requires_api_key() {
	let mut cfg = base_config();

	cfg.indexes[0].api_key = None;

	expect_validation(&cfg, "api_key must be non-empty for the databricks backend.");
}

#[test]
fn parse_error_policy_must_be_known() {
	let mut cfg = base_config();

	cfg.filter_extraction.on_parse_error = "retry".to_string();

	expect_validation(&cfg, "filter_extraction.on_parse_error must be one of unfiltered or fail.");
}

#[test]
fn temperatures_must_be_finite_and_non_negative() {
	let mut cfg = base_config();

	cfg.synthesis.temperature = f32::NAN;

	expect_validation(&cfg, "synthesis.temperature must be a finite number.");

	cfg = base_config();
	cfg.filter_extraction.temperature = -0.1;

	expect_validation(&cfg, "filter_extraction.temperature must be zero or greater.");
}

#[test]
fn auth_scheme_must_be_known() {
	let mut cfg = base_config();

	cfg.providers.completion.auth = "basic".to_string();

	expect_validation(&cfg, "providers.completion.auth must be one of bearer or api_key.");
}

#[test]
fn provider_keys_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.rerank.api_key = "  ".to_string();

	expect_validation(&cfg, "Provider rerank api_key must be non-empty.");
}

#[test]
fn api_key_env_overrides_inline_key() {
	let mut cfg = base_config();

	cfg.providers.completion.api_key_env = Some("LEXRAG_COMPLETION_KEY".to_string());

	lexrag_config::resolve_secrets(&mut cfg, |name| {
		(name == "LEXRAG_COMPLETION_KEY").then(|| "from-env".to_string())
	})
	.expect("Secret resolution must succeed.");

	assert_eq!(cfg.providers.completion.api_key, "from-env");
}

#[test]
fn missing_api_key_env_is_reported() {
	let mut cfg = base_config();

	cfg.indexes[0].api_key_env = Some("LEXRAG_MISSING_KEY".to_string());

	let err = lexrag_config::resolve_secrets(&mut cfg, |_| None)
		.expect_err("Expected missing environment variable error.");

	assert!(
		matches!(&err, Error::MissingEnv { name, .. } if name == "LEXRAG_MISSING_KEY"),
		"Unexpected error: {err}"
	);
}
