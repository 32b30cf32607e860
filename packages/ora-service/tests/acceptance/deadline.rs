use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	SlowKeywordSearch, SlowVectorSearch, StaticGeneration, make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn overall_deadline_abandons_retries_and_degrades_gracefully() {
	let mut cfg = test_config();

	// Adapters are allowed 1 s each, but the end-to-end budget is 50 ms, so
	// the gate loop is abandoned mid-attempt.
	cfg.retrieval.adapter_timeout_ms = 1_000;
	cfg.retrieval.overall_deadline_ms = 50;

	let insufficient = cfg.synthesis.insufficient_information_text.clone();
	let service = build_service(
		cfg,
		Arc::new(SlowVectorSearch {
			delay_ms: 400,
			candidates: vec![make_candidate("slow-v", SourceType::Vector, 0.9)],
		}),
		Arc::new(SlowKeywordSearch {
			delay_ms: 400,
			candidates: vec![make_candidate("slow-k", SourceType::Keyword, 0.9)],
		}),
		Arc::new(StaticGeneration { reply: "unused".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.response_text, insufficient);
	assert!(response.used_documents.is_empty());
	assert_eq!(response.attempts, 1);

	let report = service.monitor.report();

	assert_eq!(report.low_confidence, 1);
}
