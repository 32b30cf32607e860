use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	StaticGeneration, StaticKeywordSearch, StaticVectorSearch, make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn prioritized_url_outranks_a_higher_raw_score() {
	let mut boosted = make_candidate("boosted", SourceType::Vector, 0.4);

	boosted.url = Some("https://example.org/a".to_string());

	let plain = make_candidate("plain", SourceType::Vector, 0.55);
	let service = build_service(
		test_config(),
		Arc::new(StaticVectorSearch::new(vec![boosted, plain])),
		Arc::new(StaticKeywordSearch::new(Vec::new())),
		Arc::new(StaticGeneration { reply: "Answer.".to_string() }),
	);
	let mut req = request("Kas yra plaučių vėžys?");

	req.min_confidence = Some(0.3);
	req.prioritized_source_urls = vec!["https://example.org/a".to_string()];

	let response = service.query(req).await.expect("Expected a response.");

	// 0.4 × 1.5 = 0.6 beats 0.55 × 1.0 (title boosts apply to both).
	assert_eq!(response.attempts, 1);
	assert_eq!(response.used_documents[0].id, "boosted");
	assert!(response.response_text.contains("https://example.org/a"));
}

#[tokio::test]
async fn unmatched_prioritized_url_leaves_the_ranking_unchanged() {
	let build = |urls: Vec<String>| {
		let service = build_service(
			test_config(),
			Arc::new(StaticVectorSearch::new(vec![
				make_candidate("first", SourceType::Vector, 0.9),
				make_candidate("second", SourceType::Vector, 0.8),
			])),
			Arc::new(StaticKeywordSearch::new(Vec::new())),
			Arc::new(StaticGeneration { reply: "Answer.".to_string() }),
		);
		let mut req = request("Kas yra plaučių vėžys?");

		req.prioritized_source_urls = urls;

		(service, req)
	};
	let (service, req) = build(Vec::new());
	let without = service.query(req).await.expect("Expected a response.");
	let (service, req) = build(vec!["https://nowhere.example/".to_string()]);
	let with = service.query(req).await.expect("Expected a response.");
	let ids = |response: &ora_service::QueryResponse| {
		response.used_documents.iter().map(|doc| doc.id.clone()).collect::<Vec<_>>()
	};

	assert_eq!(ids(&without), ids(&with));
	assert_eq!(without.confidence_achieved, with.confidence_achieved);
}
