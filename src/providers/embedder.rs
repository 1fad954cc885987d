//! Embedding service client
//!
//! Calls an OpenAI-compatible `/v1/embeddings` endpoint, one request per
//! text, blocking until the service answers or the timeout elapses.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::config::{EmbeddingSettings, EMBED_TIMEOUT};
use crate::core::Embedding;

/// Turns diff text into a fixed-length vector
pub trait Embedder {
	fn embed(&self, text: &str) -> Result<Embedding>;
}

pub struct HttpEmbedder {
	client: Client,
	settings: EmbeddingSettings,
}

impl HttpEmbedder {
	pub fn new(settings: EmbeddingSettings) -> Result<Self> {
		let client = Client::builder()
			.timeout(EMBED_TIMEOUT)
			.build()
			.context("Failed to build HTTP client")?;

		Ok(Self { client, settings })
	}

	fn endpoint(&self) -> String {
		format!("{}/v1/embeddings", self.settings.base_url.trim_end_matches('/'))
	}
}

impl Embedder for HttpEmbedder {
	fn embed(&self, text: &str) -> Result<Embedding> {
		let key = self.settings.require_key()?;
		let body = json!({
			"model": self.settings.model,
			"input": text,
		});

		let resp = self
			.client
			.post(self.endpoint())
			.bearer_auth(key)
			.json(&body)
			.send()
			.with_context(|| format!("Embedding service not reachable at {}", self.settings.base_url))?;

		if !resp.status().is_success() {
			let status = resp.status();
			let text = resp.text().unwrap_or_default();
			anyhow::bail!("Embedding request failed ({}): {}", status, text);
		}

		let v: Value = resp.json().context("Invalid JSON from embedding service")?;
		parse_response(&v)
	}
}

/// Extracts `data[0].embedding` from an OpenAI-style response
fn parse_response(v: &Value) -> Result<Embedding> {
	let values = v["data"][0]["embedding"]
		.as_array()
		.context("No 'data[0].embedding' array in response")?;

	let vec: Vec<f32> = values
		.iter()
		.filter_map(|x| x.as_f64().map(|f| f as f32))
		.collect();

	if vec.is_empty() {
		anyhow::bail!("Empty embedding vector from service");
	}

	Ok(Embedding::new(vec))
}
