use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	FailingGeneration, StaticKeywordSearch, StaticVectorSearch, make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn generation_failure_degrades_to_the_insufficient_text() {
	let cfg = test_config();
	let insufficient = cfg.synthesis.insufficient_information_text.clone();
	let service = build_service(
		cfg,
		Arc::new(StaticVectorSearch::new(vec![make_candidate(
			"good",
			SourceType::Vector,
			0.9,
		)])),
		Arc::new(StaticKeywordSearch::new(Vec::new())),
		Arc::new(FailingGeneration),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	// Retrieval succeeded; only the generation step failed.
	assert_eq!(response.attempts, 1);
	assert!(response.confidence_achieved >= 0.7);
	assert_eq!(response.response_text, insufficient);
	assert!(response.used_documents.is_empty());

	let report = service.monitor.report();

	// Logged as an infrastructure failure, not as a data gap.
	assert_eq!(report.errors_by_kind.get("synthesis_failure"), Some(&1));
	assert_eq!(report.errors_by_kind.get("low_confidence"), None);
	assert_eq!(report.failures, 1);
	assert_eq!(report.low_confidence, 0);
}
