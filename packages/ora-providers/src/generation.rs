use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Runs one chat completion and returns the assistant message text. The
/// caller owns prompt construction; this function owns only the wire call.
pub async fn generate(
	cfg: &ora_config::GenerationProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	if let Some(max_tokens) = cfg.max_tokens
		&& let Some(map) = body.as_object_mut()
	{
		map.insert("max_tokens".to_string(), Value::from(max_tokens));
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_generation_response(json)
}

fn parse_generation_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| eyre::eyre!("Generation response is missing message content."))?;
	let text = content.trim();

	if text.is_empty() {
		return Err(eyre::eyre!("Generation response content is empty."));
	}

	Ok(text.to_string())
}
