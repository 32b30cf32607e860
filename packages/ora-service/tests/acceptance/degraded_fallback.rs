use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	FailingKeywordSearch, FailingVectorSearch, FlakyVectorSearch, StaticGeneration,
	make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn both_adapters_failing_still_returns_a_well_formed_response() {
	let cfg = test_config();
	let insufficient = cfg.synthesis.insufficient_information_text.clone();
	let service = build_service(
		cfg,
		Arc::new(FailingVectorSearch),
		Arc::new(FailingKeywordSearch),
		Arc::new(StaticGeneration { reply: "unused".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	// Initial attempt plus the vector-only degraded attempt.
	assert_eq!(response.attempts, 2);
	assert_eq!(response.response_text, insufficient);
	assert!(response.used_documents.is_empty());

	let report = service.monitor.report();

	assert_eq!(report.errors_by_kind.get("retrieval_unavailable"), Some(&1));
	// Two failures on the full attempt, one more on the degraded attempt.
	assert_eq!(report.errors_by_kind.get("adapter_unavailable"), Some(&3));
	assert_eq!(report.low_confidence, 1);
}

#[tokio::test]
async fn degraded_vector_only_attempt_can_recover() {
	// The vector backend fails once (alongside the keyword backend), then
	// answers the degraded attempt at the floor threshold.
	let vector = Arc::new(FlakyVectorSearch::new(
		1,
		vec![make_candidate("v-backup", SourceType::Vector, 0.45)],
	));
	let service = build_service(
		test_config(),
		vector,
		Arc::new(FailingKeywordSearch),
		Arc::new(StaticGeneration { reply: "Recovered answer.".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.attempts, 2);
	assert_eq!(response.used_documents.len(), 1);
	assert_eq!(response.used_documents[0].id, "v-backup");
	assert_eq!(response.used_documents[0].source_type, SourceType::Vector);
	assert!(response.response_text.contains("Recovered answer."));
	assert!(response.response_text.contains("(vector search only)"));

	let report = service.monitor.report();

	assert_eq!(report.errors_by_kind.get("retrieval_unavailable"), Some(&1));
	assert_eq!(report.successes, 1);
}
