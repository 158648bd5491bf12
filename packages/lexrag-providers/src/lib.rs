pub mod completion;
pub mod embedding;
pub mod rerank;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

use lexrag_config::{AUTH_API_KEY, AUTH_BEARER};

const API_KEY_HEADER: &str = "api-key";

/// Builds request headers for `auth` (`bearer` or `api_key`) plus the configured extras.
pub fn auth_headers(
	auth: &str,
	api_key: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	match auth {
		AUTH_BEARER => {
			headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
		},
		AUTH_API_KEY => {
			headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key.parse()?);
		},
		other => {
			return Err(Error::InvalidConfig { message: format!("Unknown auth scheme {other}.") });
		},
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn http_client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}
