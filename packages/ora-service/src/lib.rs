pub mod adapters;
pub mod cache;
pub mod coordinator;
pub mod fusion;
pub mod gate;
pub mod query;
pub mod synthesize;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use adapters::{AdapterError, KeywordSearch, VectorSearch};
pub use fusion::{FusedSet, FusedSummary, RankedCandidate};
pub use gate::{AttemptRecord, GateState, RetryPolicy};
pub use query::{QueryRequest, QueryResponse, UsedDocument};

use ora_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use ora_monitor::Monitor;
use ora_providers::{embedding, generation};
use ora_storage::{db::Db, vector::QdrantStore};

use crate::{adapters::{PgKeywordSearch, QdrantVectorSearch}, cache::EmbedCache};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidQuery { message: String },
}

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidQuery { message } => write!(f, "Invalid query: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}

#[derive(Clone)]
pub struct Adapters {
	pub vector: Arc<dyn VectorSearch>,
	pub keyword: Arc<dyn KeywordSearch>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(cfg, messages))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

/// The engine. One instance per process; individual queries share nothing
/// but the monitor's aggregate counters.
pub struct OraService {
	pub cfg: Config,
	pub providers: Providers,
	pub adapters: Adapters,
	pub monitor: Monitor,
}

impl OraService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore, monitor: Monitor) -> Self {
		let providers = Providers::default();
		let cache = EmbedCache::new(cfg.retrieval.embed_cache_size as usize);
		let adapters = Adapters {
			vector: Arc::new(QdrantVectorSearch::new(
				Arc::new(qdrant),
				providers.embedding.clone(),
				cfg.providers.embedding.clone(),
				cache,
				monitor.clone(),
			)),
			keyword: Arc::new(PgKeywordSearch::new(Arc::new(db))),
		};

		Self { cfg, providers, adapters, monitor }
	}

	pub fn with_components(
		cfg: Config,
		providers: Providers,
		adapters: Adapters,
		monitor: Monitor,
	) -> Self {
		Self { cfg, providers, adapters, monitor }
	}
}
