use serde::{Deserialize, Serialize};
use serde_json::Value;

use lexrag_config::ProviderConfig;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: String,
	pub content: String,
}
impl ChatMessage {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: "user".to_string(), content: content.into() }
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
	pub max_tokens: u32,
	pub temperature: f32,
}

/// Sends a chat completion request and returns the text of the first choice.
///
/// `Ok(None)` means the provider answered but produced no usable choice.
pub async fn complete(
	cfg: &ProviderConfig,
	messages: &[ChatMessage],
	params: GenerationParams,
) -> Result<Option<String>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"messages": messages,
		"max_tokens": params.max_tokens,
		"temperature": params.temperature,
	});

	if !cfg.model.trim().is_empty() {
		body["model"] = Value::from(cfg.model.as_str());
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.auth, &cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(parse_completion_response(&json))
}

fn parse_completion_response(json: &Value) -> Option<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.filter(|content| !content.trim().is_empty())
		.map(str::to_string)
}
