use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub normalizer: Normalizer,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub synthesis: Synthesis,
	pub monitor: Monitor,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: Option<u32>,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Normalizer {
	pub max_variants: u32,
	pub max_query_chars: u32,
}
impl Default for Normalizer {
	fn default() -> Self {
		Self { max_variants: 3, max_query_chars: 2_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub min_confidence: f32,
	pub floor_confidence: f32,
	pub threshold_step: f32,
	pub max_attempts: u32,
	pub adapter_timeout_ms: u64,
	pub overall_deadline_ms: u64,
	pub keyword_token_limit: u32,
	pub embed_cache_size: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 10,
			min_confidence: 0.7,
			floor_confidence: 0.3,
			threshold_step: 0.4,
			max_attempts: 3,
			adapter_timeout_ms: 5_000,
			overall_deadline_ms: 9_000,
			keyword_token_limit: 3,
			embed_cache_size: 256,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
	pub keyword_source_boost: f32,
	pub length_norm_chars: u32,
	pub title_boost: f32,
	pub priority_boost: f32,
}
impl Default for Fusion {
	fn default() -> Self {
		Self {
			keyword_source_boost: 0.9,
			length_norm_chars: 500,
			title_boost: 1.05,
			priority_boost: 1.5,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Synthesis {
	pub insufficient_information_text: String,
	pub max_attributed_sources: u32,
	pub max_source_chars: u32,
}
impl Default for Synthesis {
	fn default() -> Self {
		Self {
			insufficient_information_text: String::new(),
			max_attributed_sources: 2,
			max_source_chars: 1_200,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Monitor {
	pub snapshot_path: String,
	#[serde(default = "default_flush_interval_secs")]
	pub flush_interval_secs: u64,
	#[serde(default = "default_retention_days")]
	pub retention_days: i64,
}

fn default_flush_interval_secs() -> u64 {
	300
}

fn default_retention_days() -> i64 {
	30
}
