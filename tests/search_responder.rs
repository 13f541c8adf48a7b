//! Search Responder integration tests
//!
//! Exercises pagination boundaries, empty-option injection, multi-field
//! isolation, computed display expressions, and the scope-lookup failure
//! path against the in-memory reference backend.

use assert_json_diff::assert_json_eq;
use relation_dropdown::backend::{record, MemoryDatabase, RelationDatabase};
use relation_dropdown::model::{ModelMeta, RelationDef, RelationKind};
use relation_dropdown::query::Filter;
use relation_dropdown::schema::{FieldDescriptor, FormSchema};
use relation_dropdown::search::{SearchRequest, SearchResponder};
use relation_dropdown::DropdownError;
use rstest::*;
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Fixtures
// =============================================================================

fn fruit_db() -> Arc<dyn RelationDatabase> {
	Arc::new(MemoryDatabase::new().table(
		"fruits",
		vec![
			record(json!({ "id": 1, "title": "Apple", "fresh": true })),
			record(json!({ "id": 2, "title": "Banana", "fresh": false })),
			record(json!({ "id": 3, "title": "Cherry", "fresh": true })),
		],
	))
}

fn fruit_meta() -> Arc<ModelMeta> {
	Arc::new(
		ModelMeta::new("Fruit", "fruits").scope("fresh", |query| {
			query
				.conditions
				.push(Filter::eq("fresh", json!(true)).into());
		}),
	)
}

fn owner_meta(fruit: Arc<ModelMeta>) -> Arc<ModelMeta> {
	Arc::new(
		ModelMeta::new("Basket", "baskets")
			.relation("fruit", RelationDef::new(RelationKind::BelongsTo, fruit)),
	)
}

fn responder(schema: FormSchema) -> SearchResponder {
	SearchResponder::new(Arc::new(schema), owner_meta(fruit_meta()), fruit_db())
}

#[fixture]
fn paged_responder() -> SearchResponder {
	responder(FormSchema::new().field(
		FieldDescriptor::dropdown("fruit")
			.name_from("title")
			.order("title asc")
			.limit(2),
	))
}

// =============================================================================
// Pagination
// =============================================================================

#[rstest]
#[tokio::test]
async fn full_first_page_signals_more_results(paged_responder: SearchResponder) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap();

	assert_json_eq!(
		page.to_json(),
		json!({
			"results": [
				{ "id": 1, "text": "Apple" },
				{ "id": 2, "text": "Banana" },
			],
			"pagination": { "more": true },
		})
	);
}

#[rstest]
#[tokio::test]
async fn short_last_page_has_no_pagination_key(paged_responder: SearchResponder) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit").page(2))
		.await
		.unwrap();

	assert_json_eq!(
		page.to_json(),
		json!({ "results": [{ "id": 3, "text": "Cherry" }] })
	);
}

#[rstest]
#[case(1, vec!["Apple", "Banana"])]
#[case(2, vec!["Cherry"])]
#[case(3, vec![])]
#[tokio::test]
async fn pages_slice_the_ordered_result_set(
	paged_responder: SearchResponder,
	#[case] page: u64,
	#[case] expected: Vec<&str>,
) {
	let result = paged_responder
		.search(&SearchRequest::new("fruit").page(page))
		.await
		.unwrap();
	let titles: Vec<_> = result.results.iter().map(|r| r.text.as_str()).collect();
	assert_eq!(titles, expected);
}

#[rstest]
#[tokio::test]
async fn extreme_page_numbers_yield_an_empty_page(paged_responder: SearchResponder) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit").page(u64::MAX))
		.await
		.unwrap();
	assert!(page.results.is_empty());
	assert!(!page.has_more);
}

#[tokio::test]
async fn no_pagination_when_everything_fits_one_page() {
	let responder = responder(
		FormSchema::new().field(FieldDescriptor::dropdown("fruit").name_from("title")),
	);
	let page = responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap();
	assert_eq!(page.results.len(), 3);
	assert!(!page.has_more);
	assert!(page.to_json().get("pagination").is_none());
}

// =============================================================================
// Search filtering
// =============================================================================

#[rstest]
#[case("cher", vec!["Cherry"])]
#[case("CHER", vec!["Cherry"])]
#[case("an", vec!["Banana"])]
#[case("zzz", vec![])]
#[tokio::test]
async fn search_is_case_insensitive_substring(
	paged_responder: SearchResponder,
	#[case] q: &str,
	#[case] expected: Vec<&str>,
) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit").query(q))
		.await
		.unwrap();
	let titles: Vec<_> = page.results.iter().map(|r| r.text.as_str()).collect();
	assert_eq!(titles, expected);
}

#[rstest]
#[tokio::test]
async fn search_matches_the_key_column_too(paged_responder: SearchResponder) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit").query("3"))
		.await
		.unwrap();
	assert_eq!(page.results.len(), 1);
	assert_eq!(page.results[0].text, "Cherry");
}

#[rstest]
#[tokio::test]
async fn empty_query_applies_no_filter(paged_responder: SearchResponder) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit").query(""))
		.await
		.unwrap();
	assert_eq!(page.results.len(), 2);
	assert!(page.has_more);
}

// =============================================================================
// Empty option injection
// =============================================================================

#[tokio::test]
async fn empty_option_leads_page_one_only() {
	let responder = responder(
		FormSchema::new().field(
			FieldDescriptor::dropdown("fruit")
				.name_from("title")
				.order("title asc")
				.limit(2)
				.empty_option("-- none --"),
		),
	);

	let first = responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap();
	assert_eq!(first.results[0].id, json!(""));
	assert_eq!(first.results[0].text, "-- none --");
	// Two records plus the injected entry
	assert_eq!(first.results.len(), 3);

	let second = responder
		.search(&SearchRequest::new("fruit").page(2))
		.await
		.unwrap();
	assert!(second.results.iter().all(|r| r.id != json!("")));
}

#[rstest]
#[tokio::test]
async fn no_empty_option_when_unconfigured(paged_responder: SearchResponder) {
	let page = paged_responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap();
	assert!(page.results.iter().all(|r| r.id != json!("")));
}

// =============================================================================
// Configuration resolution
// =============================================================================

#[tokio::test]
async fn fields_of_the_same_widget_type_stay_isolated() {
	// Two dropdowns on one form: "fruit" is scoped and tightly paginated,
	// "other" is not. Searching "other" must not inherit any of it.
	let schema = FormSchema::new()
		.field(
			FieldDescriptor::dropdown("fruit")
				.name_from("title")
				.scope("fresh")
				.limit(1),
		)
		.field(FieldDescriptor::dropdown("other").name_from("title"));
	let fruit = fruit_meta();
	let owner = Arc::new(
		ModelMeta::new("Basket", "baskets")
			.relation(
				"fruit",
				RelationDef::new(RelationKind::BelongsTo, Arc::clone(&fruit)),
			)
			.relation("other", RelationDef::new(RelationKind::BelongsTo, fruit)),
	);
	let responder = SearchResponder::new(Arc::new(schema), owner, fruit_db());

	let scoped = responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap();
	// Scope keeps fresh fruit only, limit 1
	assert_eq!(scoped.results.len(), 1);
	assert!(scoped.has_more);

	let unscoped = responder
		.search(&SearchRequest::new("other"))
		.await
		.unwrap();
	// Banana is not fresh but shows up here: the sibling's scope must not leak
	assert_eq!(unscoped.results.len(), 3);
	assert!(!unscoped.has_more);
}

#[rstest]
#[tokio::test]
async fn unknown_attribute_is_field_not_found(paged_responder: SearchResponder) {
	let err = paged_responder
		.search(&SearchRequest::new("vegetable"))
		.await
		.unwrap_err();
	assert!(matches!(err, DropdownError::FieldNotFound(name) if name == "vegetable"));
}

#[rstest]
#[tokio::test]
async fn missing_attribute_falls_back_to_the_only_dropdown(paged_responder: SearchResponder) {
	let request = SearchRequest {
		attribute: None,
		..SearchRequest::default()
	};
	let page = paged_responder.search(&request).await.unwrap();
	assert_eq!(page.results.len(), 2);
}

#[tokio::test]
async fn missing_scope_is_a_configuration_error() {
	let responder = responder(
		FormSchema::new().field(
			FieldDescriptor::dropdown("fruit")
				.name_from("title")
				.scope("withPermissions"),
		),
	);
	let err = responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap_err();

	let message = err.to_string();
	assert!(message.contains("withPermissions"), "message: {}", message);
	assert!(message.contains("Fruit"), "message: {}", message);
	assert!(message.contains("fruit"), "message: {}", message);
}

// =============================================================================
// Computed display expressions
// =============================================================================

#[tokio::test]
async fn computed_select_drives_search_and_result_text() {
	let db = Arc::new(MemoryDatabase::new().table(
		"users",
		vec![
			record(json!({ "id": 1, "selection": "Ada Lovelace - ada@example.com" })),
			record(json!({ "id": 2, "selection": "Grace Hopper - grace@example.com" })),
		],
	));
	let user = Arc::new(ModelMeta::new("User", "users"));
	let owner = Arc::new(
		ModelMeta::new("Post", "posts")
			.relation("user", RelationDef::new(RelationKind::BelongsTo, user)),
	);
	let schema = FormSchema::new().field(
		FieldDescriptor::dropdown("user")
			.select("CONCAT(first_name, ' ', last_name, ' - ', email)"),
	);
	let responder = SearchResponder::new(Arc::new(schema), owner, db);

	let page = responder
		.search(&SearchRequest::new("user").query("hopper"))
		.await
		.unwrap();
	assert_eq!(page.results.len(), 1);
	assert_eq!(page.results[0].id, json!(2));
	assert_eq!(page.results[0].text, "Grace Hopper - grace@example.com");
}

#[tokio::test]
async fn display_defaults_to_the_key_column() {
	let responder = responder(FormSchema::new().field(FieldDescriptor::dropdown("fruit")));
	let page = responder
		.search(&SearchRequest::new("fruit"))
		.await
		.unwrap();
	assert_eq!(page.results[0].text, "1");
}
