use std::{collections::HashMap, time::Duration};

use tokio::time::timeout;
use unicode_segmentation::UnicodeSegmentation;

use ora_domain::Candidate;
use ora_monitor::ErrorKind;

use crate::{OraService, adapters::AdapterError};

/// Structural punctuation marks a query as keyword-like. Terminal sentence
/// punctuation is natural language, not structure, and does not count.
const SENTENCE_PUNCTUATION: &[char] = &['?', '!', '.', ','];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrievalMode {
	Full,
	VectorOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrievalPlan {
	pub keyword_like: bool,
	pub vector_k: u32,
	pub keyword_k: u32,
}

/// What one adapter contributed to an attempt: its candidates, or the
/// failure that was absorbed in their place.
#[derive(Debug, Default)]
pub struct SourceOutcome {
	pub candidates: Vec<Candidate>,
	pub error: Option<AdapterError>,
}

#[derive(Debug, Default)]
pub struct RetrievalOutcome {
	pub vector: SourceOutcome,
	pub keyword: SourceOutcome,
}

impl RetrievalOutcome {
	/// Both sources failed; the gate treats this as a zero-result outcome
	/// eligible for the degraded vector-only fallback.
	pub fn unavailable(&self) -> bool {
		self.vector.error.is_some() && self.keyword.error.is_some()
	}
}

/// Splits the result budget between the two adapters. Short or structurally
/// punctuated queries favor the keyword index; prose favors the vector
/// index. The other source keeps half the budget, never zero.
pub fn plan_retrieval(text: &str, k: u32, keyword_token_limit: u32) -> RetrievalPlan {
	let words = text.unicode_words().count() as u32;
	let keyword_like = words <= keyword_token_limit || has_structural_punctuation(text);
	let full = k.max(1);
	let half = (full / 2).max(1);

	if keyword_like {
		RetrievalPlan { keyword_like, vector_k: half, keyword_k: full }
	} else {
		RetrievalPlan { keyword_like, vector_k: full, keyword_k: half }
	}
}

fn has_structural_punctuation(text: &str) -> bool {
	text.chars().any(|ch| {
		!ch.is_alphanumeric() && !ch.is_whitespace() && !SENTENCE_PUNCTUATION.contains(&ch)
	})
}

impl OraService {
	/// Runs both adapters concurrently under independent deadlines. One
	/// adapter failing or timing out never cancels the other; its outcome is
	/// recorded and its slot contributes an empty list.
	pub(crate) async fn retrieve(
		&self,
		texts: &[String],
		plan: RetrievalPlan,
		threshold: f32,
		filters: &HashMap<String, String>,
		mode: RetrievalMode,
	) -> RetrievalOutcome {
		let deadline = Duration::from_millis(self.cfg.retrieval.adapter_timeout_ms);
		let vector_fut =
			timeout(deadline, self.adapters.vector.search(texts, plan.vector_k, threshold, filters));

		let (vector, keyword) = match mode {
			RetrievalMode::Full => {
				let keyword_fut = timeout(
					deadline,
					self.adapters.keyword.search(texts, plan.keyword_k, threshold, filters),
				);
				let (vector, keyword) = tokio::join!(vector_fut, keyword_fut);

				(collapse(vector), collapse(keyword))
			},
			RetrievalMode::VectorOnly => (collapse(vector_fut.await), SourceOutcome::default()),
		};

		for (label, kind, outcome) in [
			("vector", error_kind(&vector), &vector),
			("keyword", error_kind(&keyword), &keyword),
		] {
			let Some(kind) = kind else { continue };
			let Some(error) = outcome.error.as_ref() else { continue };

			tracing::warn!(adapter = label, error = %error, "Adapter failed; continuing with partial results.");
			self.monitor.log_error(kind, texts.first().map(String::as_str).unwrap_or(""), &error.to_string());
		}

		RetrievalOutcome { vector, keyword }
	}
}

fn collapse(
	result: Result<Result<Vec<Candidate>, AdapterError>, tokio::time::error::Elapsed>,
) -> SourceOutcome {
	match result {
		Ok(Ok(candidates)) => SourceOutcome { candidates, error: None },
		Ok(Err(error)) => SourceOutcome { candidates: Vec::new(), error: Some(error) },
		Err(_) => SourceOutcome { candidates: Vec::new(), error: Some(AdapterError::Timeout) },
	}
}

fn error_kind(outcome: &SourceOutcome) -> Option<ErrorKind> {
	match outcome.error.as_ref()? {
		AdapterError::Timeout => Some(ErrorKind::AdapterTimeout),
		AdapterError::Unavailable { .. } => Some(ErrorKind::AdapterUnavailable),
	}
}
