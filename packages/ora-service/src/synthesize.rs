use serde_json::Value;

use ora_domain::{Intent, Query, SourceMix};

use crate::{
	OraService,
	fusion::{FusedSet, RankedCandidate},
};

/// How synthesis ended; the caller maps this onto monitor events.
#[derive(Debug)]
pub enum SynthesisOutcome {
	Generated,
	Insufficient,
	Failed { detail: String },
}

impl OraService {
	/// Produces the final response text. Generation is constrained to the
	/// fused candidates; an empty set or a failed generation both resolve to
	/// the fixed insufficient-information text instead of an error.
	pub(crate) async fn synthesize(
		&self,
		query: &Query,
		fused: &FusedSet,
	) -> (String, SynthesisOutcome) {
		if fused.is_empty() {
			return (
				self.cfg.synthesis.insufficient_information_text.clone(),
				SynthesisOutcome::Insufficient,
			);
		}

		let messages = build_messages(query, fused, self.cfg.synthesis.max_source_chars as usize);

		match self.providers.generation.generate(&self.cfg.providers.generation, &messages).await {
			Ok(answer) => {
				let text = compose_response(
					&answer,
					&fused.items,
					fused.summary.source_mix(),
					self.cfg.synthesis.max_attributed_sources as usize,
				);

				(text, SynthesisOutcome::Generated)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Generation failed; substituting the insufficient-information response.");

				(
					self.cfg.synthesis.insufficient_information_text.clone(),
					SynthesisOutcome::Failed { detail: err.to_string() },
				)
			},
		}
	}
}

/// Chat messages for a strictly grounded answer: the system prompt forbids
/// facts outside the numbered excerpts, the user message carries excerpts,
/// optional prior-turn context, and the question.
pub fn build_messages(query: &Query, fused: &FusedSet, max_source_chars: usize) -> Vec<Value> {
	let mut sources = String::new();

	for (index, item) in fused.items.iter().enumerate() {
		let number = index + 1;

		sources.push_str(&format!("[{number}] "));

		if let Some(title) = item.candidate.title.as_deref() {
			sources.push_str(title);
			sources.push_str(": ");
		}

		sources.push_str(&truncate_chars(&item.candidate.content, max_source_chars));
		sources.push('\n');
	}

	let mut user = String::new();

	user.push_str("Source excerpts:\n");
	user.push_str(&sources);

	if let Some(context) = query.context.as_deref() {
		user.push_str("\nConversation context:\n");
		user.push_str(context);
		user.push('\n');
	}

	user.push_str("\nQuestion: ");
	user.push_str(&query.text);

	let mut system = "You answer questions using ONLY the numbered source excerpts provided. \
		Do not add facts that are not in the excerpts. If the excerpts do not contain the \
		answer, say that the information is not available. Answer in the language of the \
		question."
		.to_string();

	system.push_str(intent_hint(query.intent));

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

fn intent_hint(intent: Intent) -> &'static str {
	match intent {
		Intent::HowTo =>
			" When the excerpts describe a procedure, answer as a short ordered list of steps.",
		Intent::Location => " Include any address or location details present in the excerpts.",
		Intent::Temporal =>
			" Include any dates, times, or schedules present in the excerpts.",
		Intent::Informational | Intent::Unknown => "",
	}
}

/// Appends the attribution block and the one-line origin summary.
pub fn compose_response(
	answer: &str,
	items: &[RankedCandidate],
	mix: SourceMix,
	max_sources: usize,
) -> String {
	let mut out = answer.trim().to_string();
	let attributed = distinct_sources(items, max_sources);

	if !attributed.is_empty() {
		out.push_str("\n\nSources:\n");

		for line in &attributed {
			out.push_str(line);
			out.push('\n');
		}
	}

	out.push_str(&format!(
		"Based on {} document{} ({}).",
		items.len(),
		if items.len() == 1 { "" } else { "s" },
		mix_label(mix),
	));

	out
}

/// The top distinct sources by final score. Identity is URL when present,
/// then title, then the document id, so mirrored chunks of one page count
/// once.
fn distinct_sources(items: &[RankedCandidate], max_sources: usize) -> Vec<String> {
	let mut seen: Vec<String> = Vec::new();
	let mut out = Vec::new();

	for item in items {
		if out.len() >= max_sources {
			break;
		}

		let identity = item
			.candidate
			.url
			.clone()
			.or_else(|| item.candidate.title.clone())
			.unwrap_or_else(|| item.candidate.id.clone());

		if seen.contains(&identity) {
			continue;
		}

		seen.push(identity);

		let line = match (item.candidate.title.as_deref(), item.candidate.url.as_deref()) {
			(Some(title), Some(url)) => format!("- {title} ({url})"),
			(Some(title), None) => format!("- {title}"),
			(None, Some(url)) => format!("- {url}"),
			(None, None) => format!("- Document {}", item.candidate.id),
		};

		out.push(line);
	}

	out
}

fn mix_label(mix: SourceMix) -> &'static str {
	match mix {
		SourceMix::VectorOnly => "vector search only",
		SourceMix::KeywordOnly => "keyword search only",
		SourceMix::Mixed => "vector and keyword search",
		SourceMix::Empty => "no sources",
	}
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	if max_chars == 0 || text.chars().count() <= max_chars {
		return text.to_string();
	}

	let mut out: String = text.chars().take(max_chars).collect();

	out.push_str("...");

	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use ora_domain::{Candidate, Intent, SourceType};

	fn ranked(id: &str, title: Option<&str>, url: Option<&str>, score: f32) -> RankedCandidate {
		RankedCandidate {
			candidate: Candidate {
				id: id.to_string(),
				content: format!("content for {id}"),
				source: SourceType::Vector,
				score,
				title: title.map(str::to_string),
				url: url.map(str::to_string),
				metadata: serde_json::Value::Null,
			},
			final_score: score,
		}
	}

	fn query(text: &str) -> Query {
		Query {
			raw: text.to_string(),
			text: text.to_string(),
			language: None,
			variants: Vec::new(),
			intent: Intent::Informational,
			context: None,
		}
	}

	#[test]
	fn attribution_lists_at_most_two_distinct_sources() {
		let items = vec![
			ranked("a", Some("First"), Some("https://example.org/a"), 0.9),
			ranked("b", Some("Second"), Some("https://example.org/b"), 0.8),
			ranked("c", Some("Third"), Some("https://example.org/c"), 0.7),
		];
		let text = compose_response("Answer.", &items, SourceMix::Mixed, 2);

		assert!(text.contains("- First (https://example.org/a)"));
		assert!(text.contains("- Second (https://example.org/b)"));
		assert!(!text.contains("Third"));
	}

	#[test]
	fn repeated_urls_count_as_one_source() {
		let items = vec![
			ranked("a", Some("Page"), Some("https://example.org/page"), 0.9),
			ranked("b", Some("Page"), Some("https://example.org/page"), 0.8),
			ranked("c", Some("Other"), None, 0.7),
		];
		let text = compose_response("Answer.", &items, SourceMix::VectorOnly, 2);

		assert_eq!(text.matches("https://example.org/page").count(), 1);
		assert!(text.contains("- Other"));
	}

	#[test]
	fn summary_line_states_count_and_origin_mix() {
		let items = vec![ranked("a", None, None, 0.9)];
		let text = compose_response("Answer.", &items, SourceMix::KeywordOnly, 2);

		assert!(text.contains("Based on 1 document (keyword search only)."));
	}

	#[test]
	fn messages_number_sources_and_carry_the_question() {
		let fused = FusedSet {
			items: vec![
				ranked("a", Some("Gydymas"), None, 0.9),
				ranked("b", None, None, 0.8),
			],
			summary: crate::fusion::FusedSummary {
				vector_count: 2,
				keyword_count: 0,
				confidence: 0.9,
				threshold_used: 0.7,
			},
		};
		let messages = build_messages(&query("Kas yra plaučių vėžys?"), &fused, 1_200);
		let user = messages[1]["content"].as_str().expect("Expected user content.");

		assert_eq!(messages.len(), 2);
		assert!(user.contains("[1] Gydymas: content for a"));
		assert!(user.contains("[2] content for b"));
		assert!(user.contains("Question: Kas yra plaučių vėžys?"));
	}

	#[test]
	fn conversation_context_is_included_when_present() {
		let mut q = query("O kaip jis gydomas?");

		q.context = Some("User previously asked about lung cancer symptoms.".to_string());

		let fused = FusedSet {
			items: vec![ranked("a", None, None, 0.9)],
			summary: crate::fusion::FusedSummary {
				vector_count: 1,
				keyword_count: 0,
				confidence: 0.9,
				threshold_used: 0.7,
			},
		};
		let messages = build_messages(&q, &fused, 1_200);
		let user = messages[1]["content"].as_str().expect("Expected user content.");

		assert!(user.contains("Conversation context:"));
		assert!(user.contains("lung cancer symptoms"));
	}

	#[test]
	fn how_to_intent_shapes_the_system_prompt() {
		let mut q = query("Kaip registruotis vizitui?");

		q.intent = Intent::HowTo;

		let fused = FusedSet {
			items: vec![ranked("a", None, None, 0.9)],
			summary: crate::fusion::FusedSummary {
				vector_count: 1,
				keyword_count: 0,
				confidence: 0.9,
				threshold_used: 0.7,
			},
		};
		let messages = build_messages(&q, &fused, 1_200);
		let system = messages[0]["content"].as_str().expect("Expected system content.");

		assert!(system.contains("ordered list of steps"));
	}

	#[test]
	fn long_excerpts_are_truncated() {
		let mut item = ranked("a", None, None, 0.9);

		item.candidate.content = "x".repeat(5_000);

		let fused = FusedSet {
			items: vec![item],
			summary: crate::fusion::FusedSummary {
				vector_count: 1,
				keyword_count: 0,
				confidence: 0.9,
				threshold_used: 0.7,
			},
		};
		let messages = build_messages(&query("q?"), &fused, 100);
		let user = messages[1]["content"].as_str().expect("Expected user content.");

		assert!(user.contains(&format!("{}...", "x".repeat(100))));
		assert!(!user.contains(&"x".repeat(200)));
	}
}
