use std::{
	collections::BTreeMap,
	path::PathBuf,
	sync::{Arc, Mutex},
	time::Duration,
};

use time::OffsetDateTime;

use ora_domain::SourceMix;

/// Smoothing factor for the stage-timing moving averages.
const EMA_ALPHA: f64 = 0.2;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// The error taxonomy the monitor distinguishes. Terminal kinds close out a
/// query; the adapter kinds are per-source events recorded mid-query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	InvalidQuery,
	AdapterTimeout,
	AdapterUnavailable,
	RetrievalUnavailable,
	LowConfidence,
	SynthesisFailure,
}
impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::InvalidQuery => "invalid_query",
			Self::AdapterTimeout => "adapter_timeout",
			Self::AdapterUnavailable => "adapter_unavailable",
			Self::RetrievalUnavailable => "retrieval_unavailable",
			Self::LowConfidence => "low_confidence",
			Self::SynthesisFailure => "synthesis_failure",
		}
	}

	/// Whether this kind terminates a query (exactly one terminal event or
	/// one success is recorded per query).
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::InvalidQuery | Self::LowConfidence | Self::SynthesisFailure)
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StageTimings {
	pub analysis_ms: f64,
	pub retrieval_ms: f64,
	pub generation_ms: f64,
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Bucket {
	pub total: u64,
	pub successes: u64,
	pub failures: u64,
}

/// Process-wide aggregate state. Owned exclusively by the [`Monitor`]; every
/// other component writes through its logging calls.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
	pub started_at_unix: i64,
	pub total_queries: u64,
	pub successes: u64,
	pub failures: u64,
	pub low_confidence: u64,
	pub errors_by_kind: BTreeMap<String, u64>,
	pub source_mix: BTreeMap<String, u64>,
	pub ema_analysis_ms: f64,
	pub ema_retrieval_ms: f64,
	pub ema_generation_ms: f64,
	pub cache_hits: u64,
	pub cache_misses: u64,
	pub hourly: BTreeMap<i64, Bucket>,
	pub daily: BTreeMap<i64, Bucket>,
}
impl MetricsSnapshot {
	fn new(now_unix: i64) -> Self {
		Self {
			started_at_unix: now_unix,
			total_queries: 0,
			successes: 0,
			failures: 0,
			low_confidence: 0,
			errors_by_kind: BTreeMap::new(),
			source_mix: BTreeMap::new(),
			ema_analysis_ms: 0.0,
			ema_retrieval_ms: 0.0,
			ema_generation_ms: 0.0,
			cache_hits: 0,
			cache_misses: 0,
			hourly: BTreeMap::new(),
			daily: BTreeMap::new(),
		}
	}

	fn record_outcome(&mut self, now_unix: i64, retention_days: i64, success: bool) {
		self.total_queries += 1;

		if success {
			self.successes += 1;
		} else {
			self.failures += 1;
		}

		let hour = now_unix / SECONDS_PER_HOUR;
		let day = now_unix / SECONDS_PER_DAY;

		for (buckets, key, horizon) in [
			(&mut self.hourly, hour, hour - retention_days * 24),
			(&mut self.daily, day, day - retention_days),
		] {
			let bucket = buckets.entry(key).or_default();

			bucket.total += 1;

			if success {
				bucket.successes += 1;
			} else {
				bucket.failures += 1;
			}

			buckets.retain(|existing, _| *existing > horizon);
		}
	}
}

#[derive(Clone)]
pub struct Monitor {
	retention_days: i64,
	inner: Arc<Mutex<MetricsSnapshot>>,
}
impl Monitor {
	pub fn new(retention_days: i64) -> Self {
		let now_unix = OffsetDateTime::now_utc().unix_timestamp();

		Self {
			retention_days: retention_days.max(1),
			inner: Arc::new(Mutex::new(MetricsSnapshot::new(now_unix))),
		}
	}

	pub fn log_success(
		&self,
		query: &str,
		doc_count: usize,
		timings: StageTimings,
		mix: SourceMix,
	) {
		let now_unix = OffsetDateTime::now_utc().unix_timestamp();
		let mut snapshot = self.lock();

		snapshot.record_outcome(now_unix, self.retention_days, true);
		*snapshot.source_mix.entry(mix.as_str().to_string()).or_insert(0) += 1;

		update_ema(&mut snapshot.ema_analysis_ms, timings.analysis_ms);
		update_ema(&mut snapshot.ema_retrieval_ms, timings.retrieval_ms);
		update_ema(&mut snapshot.ema_generation_ms, timings.generation_ms);

		tracing::debug!(
			query_chars = query.chars().count(),
			doc_count,
			source_mix = mix.as_str(),
			"Query completed."
		);
	}

	pub fn log_error(&self, kind: ErrorKind, query: &str, detail: &str) {
		let now_unix = OffsetDateTime::now_utc().unix_timestamp();
		let mut snapshot = self.lock();

		*snapshot.errors_by_kind.entry(kind.as_str().to_string()).or_insert(0) += 1;

		if kind.is_terminal() {
			if kind == ErrorKind::LowConfidence {
				snapshot.low_confidence += 1;
				snapshot.record_outcome(now_unix, self.retention_days, true);
			} else {
				snapshot.record_outcome(now_unix, self.retention_days, false);
			}
		}

		tracing::debug!(
			kind = kind.as_str(),
			query_chars = query.chars().count(),
			detail,
			"Query event recorded."
		);
	}

	pub fn log_cache(&self, hit: bool) {
		let mut snapshot = self.lock();

		if hit {
			snapshot.cache_hits += 1;
		} else {
			snapshot.cache_misses += 1;
		}
	}

	pub fn report(&self) -> MetricsSnapshot {
		self.lock().clone()
	}

	/// Operator action: clears every counter and bucket.
	pub fn reset(&self) {
		let now_unix = OffsetDateTime::now_utc().unix_timestamp();

		*self.lock() = MetricsSnapshot::new(now_unix);
	}

	pub fn snapshot_json(&self) -> serde_json::Value {
		serde_json::to_value(self.report()).unwrap_or(serde_json::Value::Null)
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, MetricsSnapshot> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}
}

fn update_ema(ema: &mut f64, value: f64) {
	if !value.is_finite() {
		return;
	}
	if *ema == 0.0 {
		*ema = value;
	} else {
		*ema = EMA_ALPHA * value + (1.0 - EMA_ALPHA) * *ema;
	}
}

/// Periodic snapshot persistence. Runs until the task is dropped; a failed
/// write is logged and retried on the next tick.
pub async fn run_flush(monitor: Monitor, path: PathBuf, interval: Duration) {
	loop {
		tokio::time::sleep(interval).await;

		if let Err(err) = flush_once(&monitor, &path).await {
			tracing::error!(error = %err, path = %path.display(), "Metrics snapshot flush failed.");
		}
	}
}

pub async fn flush_once(monitor: &Monitor, path: &PathBuf) -> std::io::Result<()> {
	let payload = serde_json::to_vec_pretty(&monitor.report())
		.map_err(|err| std::io::Error::other(err.to_string()))?;

	tokio::fs::write(path, payload).await
}
