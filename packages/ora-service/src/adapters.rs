use std::{collections::HashMap, sync::Arc};

use ora_config::EmbeddingProviderConfig;
use ora_domain::Candidate;
use ora_monitor::Monitor;
use ora_storage::{
	db::Db,
	keyword::{KeywordSearchArgs, ranked_text_search},
	vector::QdrantStore,
};

use crate::{BoxFuture, EmbeddingProvider, cache::EmbedCache, fusion::cmp_f32_desc};

/// Per-source failure surfaced to the coordinator. Never crosses the
/// coordinator boundary towards the caller.
#[derive(Debug)]
pub enum AdapterError {
	Timeout,
	Unavailable { message: String },
}

impl std::fmt::Display for AdapterError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Timeout => write!(f, "Adapter deadline elapsed."),
			Self::Unavailable { message } => write!(f, "Adapter unavailable: {message}"),
		}
	}
}

impl std::error::Error for AdapterError {}

pub trait VectorSearch
where
	Self: Send + Sync,
{
	/// Searches with every attempt text and merges per-point by best score.
	/// Scores are cosine-like, normalized to [0, 1], higher is better.
	fn search<'a>(
		&'a self,
		texts: &'a [String],
		k: u32,
		score_threshold: f32,
		filters: &'a HashMap<String, String>,
	) -> BoxFuture<'a, Result<Vec<Candidate>, AdapterError>>;
}

pub trait KeywordSearch
where
	Self: Send + Sync,
{
	/// Ranked full-text search; `min_rank` is on the same normalized [0, 1]
	/// scale as the returned scores.
	fn search<'a>(
		&'a self,
		texts: &'a [String],
		k: u32,
		min_rank: f32,
		filters: &'a HashMap<String, String>,
	) -> BoxFuture<'a, Result<Vec<Candidate>, AdapterError>>;
}

pub struct QdrantVectorSearch {
	store: Arc<QdrantStore>,
	embedding: Arc<dyn EmbeddingProvider>,
	embedding_cfg: EmbeddingProviderConfig,
	cache: EmbedCache,
	monitor: Monitor,
}

impl QdrantVectorSearch {
	pub fn new(
		store: Arc<QdrantStore>,
		embedding: Arc<dyn EmbeddingProvider>,
		embedding_cfg: EmbeddingProviderConfig,
		cache: EmbedCache,
		monitor: Monitor,
	) -> Self {
		Self { store, embedding, embedding_cfg, cache, monitor }
	}

	async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError> {
		let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
		let mut missing: Vec<String> = Vec::new();

		for text in texts {
			match self.cache.get(text) {
				Some(vector) => {
					self.monitor.log_cache(true);
					vectors.push(Some(vector));
				},
				None => {
					self.monitor.log_cache(false);
					missing.push(text.clone());
					vectors.push(None);
				},
			}
		}

		if !missing.is_empty() {
			let embedded = self
				.embedding
				.embed(&self.embedding_cfg, &missing)
				.await
				.map_err(|err| AdapterError::Unavailable { message: err.to_string() })?;

			if embedded.len() != missing.len() {
				return Err(AdapterError::Unavailable {
					message: "Embedding provider returned mismatched vector count.".to_string(),
				});
			}

			let mut fresh = missing.iter().zip(embedded);

			for slot in &mut vectors {
				if slot.is_none() {
					let Some((text, vector)) = fresh.next() else { break };

					self.cache.put(text, vector.clone());

					*slot = Some(vector);
				}
			}
		}

		Ok(vectors.into_iter().flatten().collect())
	}
}

impl VectorSearch for QdrantVectorSearch {
	fn search<'a>(
		&'a self,
		texts: &'a [String],
		k: u32,
		score_threshold: f32,
		filters: &'a HashMap<String, String>,
	) -> BoxFuture<'a, Result<Vec<Candidate>, AdapterError>> {
		Box::pin(async move {
			let vectors = self.embed_texts(texts).await?;

			for vector in &vectors {
				if vector.len() != self.store.vector_dim as usize {
					return Err(AdapterError::Unavailable {
						message: "Embedding vector dimension mismatch.".to_string(),
					});
				}
			}

			let mut merged: Vec<Candidate> = Vec::new();

			for vector in vectors {
				let batch = self
					.store
					.similarity_search(vector, k, score_threshold, filters)
					.await
					.map_err(|err| AdapterError::Unavailable { message: err.to_string() })?;

				merge_by_best_score(&mut merged, batch);
			}

			finalize(merged, k)
		})
	}
}

pub struct PgKeywordSearch {
	db: Arc<Db>,
}

impl PgKeywordSearch {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}
}

impl KeywordSearch for PgKeywordSearch {
	fn search<'a>(
		&'a self,
		texts: &'a [String],
		k: u32,
		min_rank: f32,
		filters: &'a HashMap<String, String>,
	) -> BoxFuture<'a, Result<Vec<Candidate>, AdapterError>> {
		Box::pin(async move {
			let mut merged: Vec<Candidate> = Vec::new();

			for text in texts {
				let batch = ranked_text_search(
					&self.db,
					KeywordSearchArgs { query_text: text, k, min_rank, filters },
				)
				.await
				.map_err(|err| AdapterError::Unavailable { message: err.to_string() })?;

				merge_by_best_score(&mut merged, batch);
			}

			finalize(merged, k)
		})
	}
}

/// Folds a per-text result batch into the running merge, keeping the best
/// score for documents returned by more than one attempt text.
fn merge_by_best_score(merged: &mut Vec<Candidate>, batch: Vec<Candidate>) {
	for candidate in batch {
		match merged.iter_mut().find(|existing| existing.id == candidate.id) {
			Some(existing) => {
				if candidate.score > existing.score {
					*existing = candidate;
				}
			},
			None => merged.push(candidate),
		}
	}
}

fn finalize(mut merged: Vec<Candidate>, k: u32) -> Result<Vec<Candidate>, AdapterError> {
	merged.sort_by(|left, right| {
		cmp_f32_desc(left.score, right.score).then_with(|| left.id.cmp(&right.id))
	});
	merged.truncate(k.max(1) as usize);

	Ok(merged)
}
