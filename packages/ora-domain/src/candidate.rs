use unicode_normalization::UnicodeNormalization;

/// Which retrieval path produced a candidate. Closed set; every decision
/// point (boost factor, attribution label, tie-break) matches exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
	Vector,
	Keyword,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Keyword => "keyword",
		}
	}

	/// Tie-break order within a fused set. Vector results rank ahead of
	/// keyword results at equal scores.
	pub fn rank_order(self) -> u8 {
		match self {
			Self::Vector => 0,
			Self::Keyword => 1,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMix {
	VectorOnly,
	KeywordOnly,
	Mixed,
	Empty,
}
impl SourceMix {
	pub fn of(vector_count: usize, keyword_count: usize) -> Self {
		match (vector_count, keyword_count) {
			(0, 0) => Self::Empty,
			(_, 0) => Self::VectorOnly,
			(0, _) => Self::KeywordOnly,
			(_, _) => Self::Mixed,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::VectorOnly => "vector_only",
			Self::KeywordOnly => "keyword_only",
			Self::Mixed => "mixed",
			Self::Empty => "empty",
		}
	}
}

/// One retrieved chunk under consideration for a response. Created by an
/// adapter, rescored by fusion, discarded after synthesis.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
	pub id: String,
	pub content: String,
	pub source: SourceType,
	pub score: f32,
	pub title: Option<String>,
	pub url: Option<String>,
	pub metadata: serde_json::Value,
}
impl Candidate {
	pub fn content_key(&self) -> String {
		content_key(&self.content)
	}
}

/// Canonical form used for cross-source dedup: NFC, lowercased, whitespace
/// collapsed to single spaces.
pub fn normalize_content(text: &str) -> String {
	let composed: String = text.nfc().collect();

	composed.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn content_key(text: &str) -> String {
	blake3::hash(normalize_content(text).as_bytes()).to_hex().to_string()
}
