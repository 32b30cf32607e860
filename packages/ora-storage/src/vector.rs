use std::collections::HashMap;

use qdrant_client::qdrant::{
	Condition, Filter, PointId, Query, QueryPointsBuilder, ScoredPoint, Value,
	point_id::PointIdOptions, value::Kind,
};

use ora_domain::{Candidate, SourceType, content_key};

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &ora_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Filtered nearest-neighbor search. The score threshold is applied
	/// server-side; returned scores are clamped to [0, 1].
	pub async fn similarity_search(
		&self,
		vector: Vec<f32>,
		k: u32,
		score_threshold: f32,
		filters: &HashMap<String, String>,
	) -> Result<Vec<Candidate>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.score_threshold(score_threshold)
			.with_payload(true)
			.limit(k.max(1) as u64);

		if !filters.is_empty() {
			let conditions: Vec<Condition> = filters
				.iter()
				.map(|(key, value)| Condition::matches(key.clone(), value.clone()))
				.collect();

			search = search.filter(Filter::must(conditions));
		}

		let response = self.client.query(search).await?;

		Ok(response.result.iter().filter_map(point_to_candidate).collect())
	}
}

fn point_to_candidate(point: &ScoredPoint) -> Option<Candidate> {
	let content = payload_string(&point.payload, "content")?;

	if content.trim().is_empty() {
		tracing::warn!("Vector point carries empty content; skipping.");

		return None;
	}

	let id = point
		.id
		.as_ref()
		.and_then(point_id_text)
		.or_else(|| payload_string(&point.payload, "doc_id"))
		.unwrap_or_else(|| content_key(&content));
	let mut metadata = serde_json::Map::new();

	if let Some(category) = payload_string(&point.payload, "category") {
		metadata.insert("category".to_string(), serde_json::Value::from(category));
	}

	Some(Candidate {
		id,
		source: SourceType::Vector,
		score: point.score.clamp(0.0, 1.0),
		title: payload_string(&point.payload, "title").filter(|value| !value.trim().is_empty()),
		url: payload_string(&point.payload, "url").filter(|value| !value.trim().is_empty()),
		metadata: serde_json::Value::Object(metadata),
		content,
	})
}

fn point_id_text(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}
