mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Fusion, GenerationProviderConfig, Monitor, Normalizer,
	Postgres, Providers, Qdrant, Retrieval, Service, Storage, Synthesis,
};

use std::{fs, path::Path};

pub const DEFAULT_INSUFFICIENT_INFORMATION_TEXT: &str = "I could not find enough reliable \
	information to answer this question. Please try rephrasing it or ask about something else.";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("generation", &cfg.providers.generation.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.normalizer.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "normalizer.max_query_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.min_confidence.is_finite()
		|| !(0.0..=1.0).contains(&cfg.retrieval.min_confidence)
	{
		return Err(Error::Validation {
			message: "retrieval.min_confidence must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.retrieval.floor_confidence.is_finite()
		|| !(0.0..=1.0).contains(&cfg.retrieval.floor_confidence)
	{
		return Err(Error::Validation {
			message: "retrieval.floor_confidence must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.floor_confidence > cfg.retrieval.min_confidence {
		return Err(Error::Validation {
			message: "retrieval.floor_confidence must not exceed retrieval.min_confidence."
				.to_string(),
		});
	}
	if !cfg.retrieval.threshold_step.is_finite() || cfg.retrieval.threshold_step <= 0.0 {
		return Err(Error::Validation {
			message: "retrieval.threshold_step must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_attempts == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.adapter_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.adapter_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.overall_deadline_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.overall_deadline_ms must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("fusion.keyword_source_boost", cfg.fusion.keyword_source_boost),
		("fusion.title_boost", cfg.fusion.title_boost),
		("fusion.priority_boost", cfg.fusion.priority_boost),
	] {
		if !value.is_finite() || value <= 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a positive finite number."),
			});
		}
	}

	if cfg.fusion.length_norm_chars == 0 {
		return Err(Error::Validation {
			message: "fusion.length_norm_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.synthesis.max_attributed_sources == 0 {
		return Err(Error::Validation {
			message: "synthesis.max_attributed_sources must be greater than zero.".to_string(),
		});
	}
	if cfg.monitor.snapshot_path.trim().is_empty() {
		return Err(Error::Validation {
			message: "monitor.snapshot_path must be non-empty.".to_string(),
		});
	}
	if cfg.monitor.flush_interval_secs == 0 {
		return Err(Error::Validation {
			message: "monitor.flush_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.monitor.retention_days <= 0 {
		return Err(Error::Validation {
			message: "monitor.retention_days must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.synthesis.insufficient_information_text.trim().is_empty() {
		cfg.synthesis.insufficient_information_text =
			DEFAULT_INSUFFICIENT_INFORMATION_TEXT.to_string();
	}
}
