use std::collections::HashSet;

use serde::{Deserialize, Serialize};

const FENCE_JSON: &str = "```json";
const FENCE: &str = "```";

/// Jurisdiction constraint extracted from a query. An empty filter means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
	pub jurisdiction: Vec<String>,
}
impl Filter {
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builds a filter from raw values, trimming them and dropping blanks and repeats.
	pub fn from_values<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut seen = HashSet::new();
		let mut jurisdiction = Vec::new();

		for value in values {
			let value = value.as_ref().trim();

			if value.is_empty() || !seen.insert(value.to_string()) {
				continue;
			}

			jurisdiction.push(value.to_string());
		}

		Self { jurisdiction }
	}

	pub fn is_empty(&self) -> bool {
		self.jurisdiction.is_empty()
	}

	pub fn values(&self) -> &[String] {
		&self.jurisdiction
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Filter response is not a jurisdiction object: {message}")]
pub struct FilterParseError {
	pub message: String,
}

#[derive(Deserialize)]
struct FilterPayload {
	#[serde(alias = "state")]
	jurisdiction: Vec<String>,
}

/// Removes markdown code-fence markers wherever they appear and trims the result.
pub fn strip_code_fences(raw: &str) -> String {
	raw.replace(FENCE_JSON, "").replace(FENCE, "").trim().to_string()
}

/// Parses a completion response into a [`Filter`].
///
/// Accepts a bare object, a fenced one, or one surrounded by prose. Literal-style output with
/// single-quoted strings or trailing commas is accepted too. The object must carry a
/// `jurisdiction` (or `state`) list of strings.
pub fn parse_filter_response(raw: &str) -> Result<Filter, FilterParseError> {
	let cleaned = strip_code_fences(raw);

	if cleaned.is_empty() {
		return Err(FilterParseError { message: "response is empty".to_string() });
	}

	let object = object_span(&cleaned).ok_or_else(|| FilterParseError {
		message: "response contains no JSON object".to_string(),
	})?;
	let payload: FilterPayload = serde_json::from_str(&normalize_literal(object))
		.map_err(|err| FilterParseError { message: err.to_string() })?;

	Ok(Filter::from_values(payload.jurisdiction))
}

fn object_span(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	(start < end).then(|| &text[start..=end])
}

/// Rewrites single-quoted strings as JSON strings and drops commas that directly precede a
/// closing bracket. Valid JSON passes through unchanged.
fn normalize_literal(text: &str) -> String {
	let chars: Vec<char> = text.chars().collect();
	let mut out = String::with_capacity(text.len());
	let mut quote: Option<char> = None;
	let mut i = 0;

	while i < chars.len() {
		let c = chars[i];

		match quote {
			Some(open) => match c {
				'\\' if i + 1 < chars.len() => {
					let escaped = chars[i + 1];

					if open == '\'' && escaped == '\'' {
						out.push('\'');
					} else {
						out.push('\\');
						out.push(escaped);
					}

					i += 2;

					continue;
				},
				'"' if open == '\'' => out.push_str("\\\""),
				_ if c == open => {
					out.push('"');

					quote = None;
				},
				_ => out.push(c),
			},
			None => match c {
				'\'' | '"' => {
					out.push('"');

					quote = Some(c);
				},
				',' if closes_next(&chars[i + 1..]) => {},
				_ => out.push(c),
			},
		}

		i += 1;
	}

	out
}

fn closes_next(rest: &[char]) -> bool {
	rest.iter().find(|next| !next.is_whitespace()).is_some_and(|next| matches!(next, ']' | '}'))
}
