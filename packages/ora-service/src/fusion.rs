use std::{cmp::Ordering, collections::HashMap};

use ora_domain::{Candidate, SourceMix, SourceType};

/// One fused candidate with its final weighted score.
#[derive(Clone, Debug)]
pub struct RankedCandidate {
	pub candidate: Candidate,
	pub final_score: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct FusedSummary {
	pub vector_count: usize,
	pub keyword_count: usize,
	pub confidence: f32,
	pub threshold_used: f32,
}

impl FusedSummary {
	pub fn source_mix(&self) -> SourceMix {
		SourceMix::of(self.vector_count, self.keyword_count)
	}
}

#[derive(Clone, Debug)]
pub struct FusedSet {
	pub items: Vec<RankedCandidate>,
	pub summary: FusedSummary,
}

impl FusedSet {
	pub fn empty(threshold_used: f32) -> Self {
		Self {
			items: Vec::new(),
			summary: FusedSummary {
				vector_count: 0,
				keyword_count: 0,
				confidence: 0.0,
				threshold_used,
			},
		}
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

/// Merges the two source lists into one deduplicated, re-scored, totally
/// ordered list. The vector list is folded in first so a cross-source
/// duplicate keeps the vector-origin copy and its source tag.
pub fn fuse(
	vector: Vec<Candidate>,
	keyword: Vec<Candidate>,
	k: usize,
	threshold_used: f32,
	cfg: &ora_config::Fusion,
	prioritized_urls: &[String],
) -> FusedSet {
	let mut by_key: HashMap<String, Candidate> = HashMap::new();
	let mut order: Vec<String> = Vec::new();

	for candidate in vector.into_iter().chain(keyword) {
		let key = candidate.content_key();

		if by_key.contains_key(&key) {
			continue;
		}

		by_key.insert(key.clone(), candidate);
		order.push(key);
	}

	let mut items: Vec<RankedCandidate> = order
		.into_iter()
		.filter_map(|key| by_key.remove(&key))
		.map(|candidate| {
			let final_score = final_weighted_score(&candidate, cfg, prioritized_urls);

			RankedCandidate { candidate, final_score }
		})
		.collect();

	items.sort_by(rank_order);
	items.truncate(k.max(1));

	let vector_count =
		items.iter().filter(|item| item.candidate.source == SourceType::Vector).count();
	let keyword_count = items.len() - vector_count;
	let confidence = items.first().map(|item| item.final_score).unwrap_or(0.0);

	FusedSet {
		items,
		summary: FusedSummary { vector_count, keyword_count, confidence, threshold_used },
	}
}

/// `raw × source × length × title × priority`, every factor non-negative.
pub fn final_weighted_score(
	candidate: &Candidate,
	cfg: &ora_config::Fusion,
	prioritized_urls: &[String],
) -> f32 {
	let source_boost = match candidate.source {
		SourceType::Vector => 1.0,
		SourceType::Keyword => cfg.keyword_source_boost,
	};
	let length_boost = (candidate.content.chars().count() as f32
		/ cfg.length_norm_chars.max(1) as f32)
		.min(1.0);
	let title_boost = match candidate.title.as_deref() {
		Some(title) if !title.trim().is_empty() => cfg.title_boost,
		_ => 1.0,
	};
	let priority_boost =
		if matches_prioritized_url(candidate.url.as_deref(), prioritized_urls) {
			cfg.priority_boost
		} else {
			1.0
		};

	candidate.score.max(0.0) * source_boost * length_boost * title_boost * priority_boost
}

fn matches_prioritized_url(url: Option<&str>, prioritized_urls: &[String]) -> bool {
	let Some(url) = url else { return false };
	let lowered = url.to_lowercase();

	prioritized_urls.iter().any(|prioritized| {
		let needle = prioritized.trim().to_lowercase();

		!needle.is_empty() && lowered.contains(&needle)
	})
}

/// Total order: final score descending, vector before keyword, longer
/// content first, content key as the last word so equal candidates cannot
/// flip between runs.
fn rank_order(left: &RankedCandidate, right: &RankedCandidate) -> Ordering {
	cmp_f32_desc(left.final_score, right.final_score)
		.then_with(|| {
			left.candidate.source.rank_order().cmp(&right.candidate.source.rank_order())
		})
		.then_with(|| {
			right
				.candidate
				.content
				.chars()
				.count()
				.cmp(&left.candidate.content.chars().count())
		})
		.then_with(|| left.candidate.content_key().cmp(&right.candidate.content_key()))
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
