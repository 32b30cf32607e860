use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	SlowVectorSearch, StaticGeneration, StaticKeywordSearch, make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn vector_timeout_leaves_keyword_results_usable() {
	let mut cfg = test_config();

	cfg.retrieval.adapter_timeout_ms = 50;

	let vector = Arc::new(SlowVectorSearch {
		delay_ms: 500,
		candidates: vec![make_candidate("too-late", SourceType::Vector, 0.9)],
	});
	let keyword = Arc::new(StaticKeywordSearch::new(vec![
		make_candidate("k1", SourceType::Keyword, 0.95),
		make_candidate("k2", SourceType::Keyword, 0.9),
		make_candidate("k3", SourceType::Keyword, 0.85),
		make_candidate("k4", SourceType::Keyword, 0.8),
		make_candidate("k5", SourceType::Keyword, 0.78),
	]));
	let service = build_service(
		cfg,
		vector,
		keyword,
		Arc::new(StaticGeneration { reply: "Keyword-grounded answer.".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.attempts, 1);
	assert_eq!(response.used_documents.len(), 5);
	assert!(
		response
			.used_documents
			.iter()
			.all(|doc| doc.source_type == SourceType::Keyword)
	);
	assert!(response.response_text.contains("(keyword search only)"));

	let report = service.monitor.report();

	assert_eq!(report.errors_by_kind.get("adapter_timeout"), Some(&1));
	assert_eq!(report.source_mix.get("keyword_only"), Some(&1));
	assert_eq!(report.total_queries, 1);
	assert_eq!(report.successes, 1);
}
