use std::sync::Arc;

use ora_domain::SourceType;
use ora_testkit::{
	StaticGeneration, StaticKeywordSearch, StaticVectorSearch, make_candidate, test_config,
};

use super::{build_service, request};

#[tokio::test]
async fn cross_source_duplicate_is_listed_once_tagged_vector() {
	let shared_content =
		"Plaučių vėžys yra piktybinis navikas, prasidedantis plaučių audinyje. ".repeat(10);
	let mut vector_copy = make_candidate("v-shared", SourceType::Vector, 0.8);
	let mut keyword_copy = make_candidate("k-shared", SourceType::Keyword, 0.9);

	vector_copy.content = shared_content.clone();
	keyword_copy.content = shared_content;

	let keyword_extra = make_candidate("k-extra", SourceType::Keyword, 0.75);
	let service = build_service(
		test_config(),
		Arc::new(StaticVectorSearch::new(vec![vector_copy])),
		Arc::new(StaticKeywordSearch::new(vec![keyword_copy, keyword_extra])),
		Arc::new(StaticGeneration { reply: "Answer.".to_string() }),
	);
	let response =
		service.query(request("Kas yra plaučių vėžys?")).await.expect("Expected a response.");

	assert_eq!(response.used_documents.len(), 2);

	let shared = response
		.used_documents
		.iter()
		.find(|doc| doc.id == "v-shared")
		.expect("Expected the shared chunk to survive fusion.");

	assert_eq!(shared.source_type, SourceType::Vector);
	assert!(!response.used_documents.iter().any(|doc| doc.id == "k-shared"));
}
