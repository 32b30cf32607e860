use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::{Duration, Instant},
};

use ora_domain::{Query, QueryRejectReason, SourceType, normalize::normalize_query};
use ora_monitor::{ErrorKind, StageTimings};

use crate::{
	OraService, ServiceError, ServiceResult,
	coordinator::{RetrievalMode, plan_retrieval},
	fusion::{self, FusedSet},
	gate::{AttemptRecord, GateState, RetryPolicy},
	synthesize::SynthesisOutcome,
};

/// Inbound contract consumed by the orchestration layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QueryRequest {
	pub text: String,
	#[serde(default)]
	pub k: Option<u32>,
	#[serde(default)]
	pub min_confidence: Option<f32>,
	#[serde(default)]
	pub filters: HashMap<String, String>,
	#[serde(default)]
	pub prioritized_source_urls: Vec<String>,
	#[serde(default)]
	pub conversation_context: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UsedDocument {
	pub id: String,
	pub title: Option<String>,
	pub url: Option<String>,
	pub source_type: SourceType,
	pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QueryResponse {
	pub response_text: String,
	pub used_documents: Vec<UsedDocument>,
	pub confidence_achieved: f32,
	pub attempts: u32,
}

impl OraService {
	/// The full pipeline for one user turn. Only `InvalidQuery` surfaces as
	/// an error; every other failure mode resolves to a well-formed,
	/// possibly degraded response plus a monitor entry.
	pub async fn query(&self, req: QueryRequest) -> ServiceResult<QueryResponse> {
		let started = Instant::now();
		let query = match normalize_query(
			&req.text,
			req.conversation_context.as_deref(),
			self.cfg.normalizer.max_variants as usize,
			self.cfg.normalizer.max_query_chars as usize,
		) {
			Ok(query) => query,
			Err(reason) => {
				let message = match reason {
					QueryRejectReason::Empty => "Query text is empty.",
					QueryRejectReason::TooLong => "Query text exceeds the maximum length.",
				};

				self.monitor.log_error(ErrorKind::InvalidQuery, &req.text, message);

				return Err(ServiceError::InvalidQuery { message: message.to_string() });
			},
		};
		tracing::debug!(
			intent = query.intent.as_str(),
			language = query.language.as_deref().unwrap_or("und"),
			variants = query.variants.len(),
			"Query normalized."
		);

		let analysis_ms = started.elapsed().as_secs_f64() * 1_000.0;
		let k = req.k.unwrap_or(self.cfg.retrieval.top_k).max(1);
		let policy = RetryPolicy::resolve(&self.cfg.retrieval, req.min_confidence);
		let attempts = Arc::new(AtomicU32::new(1));
		let overall = Duration::from_millis(self.cfg.retrieval.overall_deadline_ms);
		let retrieval_started = Instant::now();
		let fused = match tokio::time::timeout(
			overall,
			self.run_attempts(&query, k, policy, &req, attempts.clone()),
		)
		.await
		{
			Ok(fused) => fused,
			Err(_) => {
				// In-flight adapter calls are dropped, not awaited further.
				tracing::warn!(
					deadline_ms = self.cfg.retrieval.overall_deadline_ms,
					"Overall query deadline exceeded; abandoning retries."
				);

				FusedSet::empty(policy.floor)
			},
		};
		let retrieval_ms = retrieval_started.elapsed().as_secs_f64() * 1_000.0;
		let generation_started = Instant::now();
		let (response_text, outcome) = self.synthesize(&query, &fused).await;
		let generation_ms = generation_started.elapsed().as_secs_f64() * 1_000.0;
		let timings = StageTimings { analysis_ms, retrieval_ms, generation_ms };

		match &outcome {
			SynthesisOutcome::Generated => {
				self.monitor.log_success(
					&query.text,
					fused.items.len(),
					timings,
					fused.summary.source_mix(),
				);
			},
			SynthesisOutcome::Insufficient => {
				self.monitor.log_error(
					ErrorKind::LowConfidence,
					&query.text,
					"No candidates cleared the confidence floor.",
				);
			},
			SynthesisOutcome::Failed { detail } => {
				self.monitor.log_error(ErrorKind::SynthesisFailure, &query.text, detail);
			},
		}

		let used_documents = match outcome {
			SynthesisOutcome::Generated => fused
				.items
				.iter()
				.map(|item| UsedDocument {
					id: item.candidate.id.clone(),
					title: item.candidate.title.clone(),
					url: item.candidate.url.clone(),
					source_type: item.candidate.source,
					score: item.final_score,
				})
				.collect(),
			_ => Vec::new(),
		};

		Ok(QueryResponse {
			response_text,
			used_documents,
			confidence_achieved: fused.summary.confidence,
			attempts: attempts.load(Ordering::Relaxed),
		})
	}

	/// The gate loop: bounded retries at descending thresholds, plus one
	/// vector-only degraded attempt when both adapters fail.
	async fn run_attempts(
		&self,
		query: &Query,
		k: u32,
		policy: RetryPolicy,
		req: &QueryRequest,
		attempts: Arc<AtomicU32>,
	) -> FusedSet {
		let plan = plan_retrieval(&query.text, k, self.cfg.retrieval.keyword_token_limit);
		let (mut attempt, mut threshold) = policy.first_attempt();
		let mut mode = RetrievalMode::Full;

		loop {
			attempts.store(attempt, Ordering::Relaxed);

			let texts = attempt_texts(query, attempt);
			let outcome = self.retrieve(&texts, plan, threshold, &req.filters, mode).await;

			if mode == RetrievalMode::VectorOnly && outcome.vector.error.is_some() {
				return FusedSet::empty(threshold);
			}
			if outcome.unavailable() {
				self.monitor.log_error(
					ErrorKind::RetrievalUnavailable,
					&query.text,
					"Both retrieval adapters failed.",
				);
				tracing::warn!("Both adapters failed; attempting vector-only fallback.");

				mode = RetrievalMode::VectorOnly;
				attempt += 1;
				threshold = policy.floor;

				continue;
			}

			let fused = fusion::fuse(
				outcome.vector.candidates,
				outcome.keyword.candidates,
				k as usize,
				threshold,
				&self.cfg.fusion,
				&req.prioritized_source_urls,
			);

			match policy.observe(AttemptRecord {
				attempt,
				threshold,
				result_count: fused.items.len(),
			}) {
				GateState::Accepted { .. } => return fused,
				GateState::Retrying { attempt: next_attempt, threshold: next_threshold } => {
					tracing::info!(
						attempt = next_attempt,
						threshold = next_threshold,
						"Zero results; retrying at a lower confidence threshold."
					);

					attempt = next_attempt;
					threshold = next_threshold;
				},
				GateState::Exhausted { .. } | GateState::Initial => return fused,
			}
		}
	}
}

/// The first attempt uses the cleaned query alone; retries widen recall
/// with the normalizer's variants.
fn attempt_texts(query: &Query, attempt: u32) -> Vec<String> {
	let mut texts = vec![query.text.clone()];

	if attempt > 1 {
		texts.extend(query.variants.iter().cloned());
	}

	texts
}
