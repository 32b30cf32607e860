use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	SpyGeneration, StaticGeneration, StaticKeywordSearch, StaticVectorSearch, make_candidate,
	test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn mixed_results_cite_exactly_the_top_two_sources() {
	let vector = StaticVectorSearch::new(vec![
		make_candidate("v-top", SourceType::Vector, 0.92),
		make_candidate("v-mid", SourceType::Vector, 0.8),
	]);
	let keyword = StaticKeywordSearch::new(vec![
		make_candidate("k-top", SourceType::Keyword, 0.85),
		make_candidate("k-low", SourceType::Keyword, 0.74),
	]);
	let service = build_service(
		test_config(),
		Arc::new(vector),
		Arc::new(keyword),
		Arc::new(StaticGeneration {
			reply: "Plaučių vėžys yra piktybinis plaučių navikas.".to_string(),
		}),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.attempts, 1);
	assert!(response.confidence_achieved >= 0.7);
	assert_eq!(response.used_documents.len(), 4);
	assert!(response.response_text.contains("Plaučių vėžys yra piktybinis plaučių navikas."));
	// Attribution lists exactly the top two distinct sources by final score:
	// v-top (0.92 × 1.05) and v-mid (0.8 × 1.05) outrank the boosted-down
	// keyword results.
	assert!(response.response_text.contains("- Document v-top (https://docs.example/v-top)"));
	assert!(response.response_text.contains("- Document v-mid (https://docs.example/v-mid)"));
	assert_eq!(response.response_text.matches("- Document").count(), 2);
	assert!(response.response_text.contains("(vector and keyword search)"));
}

#[tokio::test]
async fn generation_sees_only_retrieved_excerpts_and_the_question() {
	let vector =
		StaticVectorSearch::new(vec![make_candidate("v-only", SourceType::Vector, 0.9)]);
	let keyword = StaticKeywordSearch::new(Vec::new());
	let generation = Arc::new(SpyGeneration::new("Grounded answer."));
	let service =
		build_service(test_config(), Arc::new(vector), Arc::new(keyword), generation.clone());

	service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	let prompts = generation.prompts.lock().expect("Prompt log poisoned.");
	let user = prompts[0][1]["content"].as_str().expect("Expected user content.");

	assert_eq!(prompts.len(), 1);
	assert!(user.contains("[1] Document v-only"));
	assert!(user.contains("Question: Kas yra plaučių vėžys?"));
	assert!(!user.contains("[2]"));
}

#[tokio::test]
async fn results_order_is_stable_across_runs() {
	let build = || {
		let vector = StaticVectorSearch::new(vec![
			make_candidate("alpha", SourceType::Vector, 0.8),
			make_candidate("beta", SourceType::Vector, 0.8),
		]);
		let keyword =
			StaticKeywordSearch::new(vec![make_candidate("gamma", SourceType::Keyword, 0.89)]);

		build_service(
			test_config(),
			Arc::new(vector),
			Arc::new(keyword),
			Arc::new(StaticGeneration { reply: "Answer.".to_string() }),
		)
	};
	let first = build()
		.query(request("Kas yra plaučių vėžys?"))
		.await
		.expect("Expected a response.");
	let second = build()
		.query(request("Kas yra plaučių vėžys?"))
		.await
		.expect("Expected a response.");
	let ids = |response: &ora_service::QueryResponse| {
		response.used_documents.iter().map(|doc| doc.id.clone()).collect::<Vec<_>>()
	};

	assert_eq!(ids(&first), ids(&second));
}
