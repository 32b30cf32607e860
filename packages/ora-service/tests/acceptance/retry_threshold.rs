use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	StaticGeneration, StaticKeywordSearch, StaticVectorSearch, make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn exhausted_after_one_retry_returns_the_fixed_text() {
	let cfg = test_config();
	let insufficient = cfg.synthesis.insufficient_information_text.clone();
	// Nothing clears 0.7, and nothing clears the 0.3 floor either.
	let vector =
		Arc::new(StaticVectorSearch::new(vec![make_candidate("weak", SourceType::Vector, 0.25)]));
	let keyword = Arc::new(StaticKeywordSearch::new(Vec::new()));
	let service = build_service(
		cfg,
		vector.clone(),
		keyword.clone(),
		Arc::new(StaticGeneration { reply: "unused".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.attempts, 2);
	assert_eq!(response.response_text, insufficient);
	assert!(response.used_documents.is_empty());
	assert!((response.confidence_achieved - 0.0).abs() < f32::EPSILON);
	// One dispatch per attempt and per adapter.
	assert_eq!(vector.call_count(), 2);
	assert_eq!(keyword.call_count(), 2);

	let report = service.monitor.report();

	assert_eq!(report.low_confidence, 1);
	assert_eq!(report.failures, 0);
}

#[tokio::test]
async fn retry_at_the_floor_recovers_results() {
	// 0.5 misses the 0.7 bar but clears the 0.3 floor on the second attempt.
	let vector = Arc::new(StaticVectorSearch::new(vec![make_candidate(
		"borderline",
		SourceType::Vector,
		0.5,
	)]));
	let keyword = Arc::new(StaticKeywordSearch::new(Vec::new()));
	let service = build_service(
		test_config(),
		vector,
		keyword,
		Arc::new(StaticGeneration { reply: "Atsakymas iš žemesnio slenksčio.".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.attempts, 2);
	assert_eq!(response.used_documents.len(), 1);
	assert_eq!(response.used_documents[0].id, "borderline");
	assert!(response.response_text.contains("Atsakymas iš žemesnio slenksčio."));
}

#[tokio::test]
async fn caller_supplied_confidence_is_honored() {
	let vector = Arc::new(StaticVectorSearch::new(vec![make_candidate(
		"borderline",
		SourceType::Vector,
		0.5,
	)]));
	let keyword = Arc::new(StaticKeywordSearch::new(Vec::new()));
	let service = build_service(
		test_config(),
		vector,
		keyword,
		Arc::new(StaticGeneration { reply: "Answer.".to_string() }),
	);
	let mut req = request("Kas yra plaučių vėžys?");

	req.min_confidence = Some(0.4);

	let response = service.query(req).await.expect("Expected a response.");

	// 0.5 clears a requested 0.4 threshold on the first attempt.
	assert_eq!(response.attempts, 1);
	assert_eq!(response.used_documents.len(), 1);
}
