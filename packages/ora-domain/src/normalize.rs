use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::intent::{Intent, classify_intent};
use crate::language::detect_language;

/// Leading interrogative phrases stripped when generating the bare-topic
/// variant. Longest match wins; matching is case-insensitive at a word
/// boundary.
const QUESTION_PREFIXES: &[&str] = &[
	"kas yra",
	"koks yra",
	"kokia yra",
	"kaip veikia",
	"kaip",
	"kur yra",
	"kur",
	"kada",
	"kodėl",
	"kas",
	"what is",
	"what are",
	"how do i",
	"how does",
	"how to",
	"where is",
	"where are",
	"when is",
	"when does",
	"why is",
	"who is",
];

/// Immutable per-turn query value. Built once by `normalize_query`, never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Query {
	pub raw: String,
	pub text: String,
	pub language: Option<String>,
	pub variants: Vec<String>,
	pub intent: Intent,
	pub context: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryRejectReason {
	Empty,
	TooLong,
}

pub fn normalize_query(
	raw: &str,
	context: Option<&str>,
	max_variants: usize,
	max_chars: usize,
) -> Result<Query, QueryRejectReason> {
	if raw.chars().count() > max_chars {
		return Err(QueryRejectReason::TooLong);
	}

	let text = clean_text(raw);

	if text.is_empty() {
		return Err(QueryRejectReason::Empty);
	}

	let variants = build_variants(&text, max_variants);
	let intent = classify_intent(&text);
	let language = detect_language(&text);

	Ok(Query {
		raw: raw.to_string(),
		text,
		language,
		variants,
		intent,
		context: context.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()),
	})
}

/// NFC-composes the input (repairing text mangled into base-plus-combining
/// sequences), drops zero-width and control characters, and collapses
/// whitespace runs.
pub fn clean_text(input: &str) -> String {
	let composed: String = input.nfc().collect();
	let mut cleaned = String::with_capacity(composed.len());

	for ch in composed.chars() {
		if is_zero_width(ch) {
			continue;
		}
		if ch.is_control() && !matches!(ch, '\n' | '\r' | '\t') {
			continue;
		}

		cleaned.push(ch);
	}

	cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips diacritics by decomposing to NFD and dropping combining marks.
/// Covers Lithuanian (ą č ę ė į š ų ū ž) and general Latin accents.
pub fn ascii_fold(input: &str) -> String {
	input.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

fn build_variants(text: &str, max_variants: usize) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();

	for candidate in [
		Some(ascii_fold(text)),
		strip_question_prefix(text),
		strip_question_prefix(text).map(|stripped| ascii_fold(&stripped)),
	]
	.into_iter()
	.flatten()
	{
		if out.len() >= max_variants {
			break;
		}
		if candidate == text || out.iter().any(|existing| *existing == candidate) {
			continue;
		}

		out.push(candidate);
	}

	out
}

fn strip_question_prefix(text: &str) -> Option<String> {
	let lowered = text.to_lowercase();
	let mut best: Option<usize> = None;

	for prefix in QUESTION_PREFIXES {
		if !lowered.starts_with(prefix) {
			continue;
		}

		let boundary = lowered[prefix.len()..].chars().next().map(char::is_whitespace);

		if boundary != Some(true) {
			continue;
		}
		if best.map(|len| prefix.len() > len).unwrap_or(true) {
			best = Some(prefix.len());
		}
	}

	let len = best?;

	// Case folding can shift byte offsets for exotic characters; bail out
	// rather than slice mid-character.
	if !text.is_char_boundary(len) {
		return None;
	}

	let remainder = text[len..].trim().trim_end_matches(['?', '!', '.']).trim();

	if remainder.is_empty() { None } else { Some(remainder.to_string()) }
}

fn is_zero_width(ch: char) -> bool {
	matches!(
		ch,
		'\u{00AD}' // soft hyphen
			| '\u{034F}' // combining grapheme joiner
			| '\u{061C}' // arabic letter mark
			| '\u{180E}' // mongolian vowel separator (deprecated)
			| '\u{200B}' // zero width space
			| '\u{200C}' // zero width non-joiner
			| '\u{200D}' // zero width joiner
			| '\u{2060}' // word joiner
			| '\u{FEFF}' // zero width no-break space
	)
}
