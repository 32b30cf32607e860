use std::collections::HashMap;

use sqlx::Row;

use ora_domain::{Candidate, SourceType};

use crate::{Result, db::Db};

/// `ts_rank` weight vector in {D, C, B, A} order: title (A) outranks content
/// (B) 2.5 to 1, and normalization 32 maps ranks into [0, 1).
const RANK_WEIGHTS: &str = "{0.1, 0.2, 0.4, 1.0}";

/// Normalization-32 ranks (`rank / (rank + 1)`) rarely exceed 0.5 even for
/// strong matches; doubling spreads them over the same [0, 1] scale the
/// vector scores use, so one confidence threshold governs both sources.
const RANK_SCALE: f32 = 2.0;

pub struct KeywordSearchArgs<'a> {
	pub query_text: &'a str,
	pub k: u32,
	pub min_rank: f32,
	pub filters: &'a HashMap<String, String>,
}

/// Ranked full-text search over document title and content. Malformed query
/// syntax never propagates: the web-search parser is tried first, then a
/// plain token-conjunction query, then an empty result set with a warning.
pub async fn ranked_text_search(db: &Db, args: KeywordSearchArgs<'_>) -> Result<Vec<Candidate>> {
	match run_search(db, args.query_text, "websearch_to_tsquery", &args).await {
		Ok(rows) => return Ok(rows),
		Err(err) => {
			tracing::warn!(error = %err, "Web-search query parse failed; falling back to token conjunction.");
		},
	}

	let conjunction = token_conjunction(args.query_text);

	if conjunction.is_empty() {
		return Ok(Vec::new());
	}

	match run_search(db, &conjunction, "to_tsquery", &args).await {
		Ok(rows) => Ok(rows),
		Err(err) => {
			tracing::warn!(error = %err, "Token-conjunction query failed; degrading to empty result set.");

			Ok(Vec::new())
		},
	}
}

async fn run_search(
	db: &Db,
	query_text: &str,
	parser: &str,
	args: &KeywordSearchArgs<'_>,
) -> Result<Vec<Candidate>> {
	let (category, lang) = known_filters(args.filters);
	let sql = format!(
		"\
SELECT
	doc_id,
	title,
	content,
	url,
	category,
	ts_rank('{RANK_WEIGHTS}', search_tsv, query, 32) AS rank
FROM documents, {parser}('simple', $1) AS query
WHERE search_tsv @@ query
	AND ($2::text IS NULL OR category = $2)
	AND ($3::text IS NULL OR lang = $3)
	AND ts_rank('{RANK_WEIGHTS}', search_tsv, query, 32) >= $4
ORDER BY rank DESC, doc_id ASC
LIMIT $5",
	);
	let rows = sqlx::query(&sql)
		.bind(query_text)
		.bind(category)
		.bind(lang)
		.bind(args.min_rank / RANK_SCALE)
		.bind(args.k.max(1) as i64)
		.fetch_all(&db.pool)
		.await?;
	let mut out = Vec::with_capacity(rows.len());

	for row in rows {
		let doc_id: uuid::Uuid = row.try_get("doc_id")?;
		let title: Option<String> = row.try_get("title")?;
		let category: Option<String> = row.try_get("category")?;
		let rank: f32 = row.try_get("rank")?;
		let mut metadata = serde_json::Map::new();

		if let Some(category) = category {
			metadata.insert("category".to_string(), serde_json::Value::from(category));
		}

		out.push(Candidate {
			id: doc_id.to_string(),
			content: row.try_get("content")?,
			source: SourceType::Keyword,
			score: (rank * RANK_SCALE).clamp(0.0, 1.0),
			title: title.filter(|value| !value.trim().is_empty()),
			url: row.try_get::<Option<String>, _>("url")?.filter(|value| !value.trim().is_empty()),
			metadata: serde_json::Value::Object(metadata),
		});
	}

	Ok(out)
}

fn known_filters(filters: &HashMap<String, String>) -> (Option<&str>, Option<&str>) {
	for key in filters.keys() {
		if key != "category" && key != "lang" {
			tracing::warn!(filter = %key, "Ignoring unsupported keyword search filter.");
		}
	}

	(filters.get("category").map(String::as_str), filters.get("lang").map(String::as_str))
}

/// Reduces arbitrary user text to a conjunction of plain lexemes so the
/// strict `to_tsquery` parser cannot reject it.
pub fn token_conjunction(text: &str) -> String {
	let mut tokens = Vec::new();

	for raw in text.split(|ch: char| !ch.is_alphanumeric()) {
		let token = raw.trim().to_lowercase();

		if token.len() < 2 {
			continue;
		}
		if !tokens.contains(&token) {
			tokens.push(token);
		}
	}

	tokens.join(" & ")
}
