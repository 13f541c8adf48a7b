//! Form schema resolution tests
//!
//! The schema tree is the widget's only source of per-field configuration;
//! these tests pin down the recursive lookup and the per-field isolation
//! of resolved configuration values.

use relation_dropdown::config::RelationFieldConfig;
use relation_dropdown::schema::{FieldDescriptor, FormSchema, SchemaNode, WIDGET_TYPE};
use rstest::*;
use serde_json::json;

// =============================================================================
// Tree walk
// =============================================================================

#[fixture]
fn tabbed_schema() -> FormSchema {
	FormSchema::new()
		.field(FieldDescriptor::new("title", "text"))
		.container(
			"tabs",
			vec![
				SchemaNode::Container {
					name: "General".to_string(),
					children: vec![FieldDescriptor::dropdown("author")
						.name_from("name")
						.limit(5)
						.into()],
				},
				SchemaNode::Container {
					name: "Meta".to_string(),
					children: vec![FieldDescriptor::dropdown("category")
						.name_from("title")
						.limit(7)
						.into()],
				},
			],
		)
}

#[rstest]
fn lookup_descends_into_nested_containers(tabbed_schema: FormSchema) {
	let author = tabbed_schema.find_field("author", WIDGET_TYPE).unwrap();
	assert_eq!(author.limit, Some(5));
	let category = tabbed_schema.find_field("category", WIDGET_TYPE).unwrap();
	assert_eq!(category.limit, Some(7));
}

#[rstest]
fn lookup_requires_the_widget_type_to_match(tabbed_schema: FormSchema) {
	assert!(tabbed_schema.find_field("title", WIDGET_TYPE).is_none());
	assert!(tabbed_schema.find_field("title", "text").is_some());
}

#[rstest]
fn first_of_type_honors_declaration_order(tabbed_schema: FormSchema) {
	let first = tabbed_schema.first_field_of_type(WIDGET_TYPE).unwrap();
	assert_eq!(first.name, "author");
}

// =============================================================================
// Per-field configuration isolation
// =============================================================================

#[rstest]
fn configs_resolve_per_attribute(tabbed_schema: FormSchema) {
	let author = RelationFieldConfig::resolve(&tabbed_schema, "author").unwrap();
	let category = RelationFieldConfig::resolve(&tabbed_schema, "category").unwrap();

	assert_eq!(author.limit, 5);
	assert_eq!(author.name_from.as_deref(), Some("name"));
	assert_eq!(category.limit, 7);
	assert_eq!(category.name_from.as_deref(), Some("title"));
}

// =============================================================================
// Declarative schemas
// =============================================================================

#[test]
fn schemas_deserialize_from_declarative_json() {
	let schema: FormSchema = serde_json::from_value(json!({
		"nodes": [
			{ "name": "title", "type": "text" },
			{
				"name": "tabs",
				"children": [
					{
						"name": "user",
						"type": "relation-dropdown",
						"nameFrom": "email",
						"scope": "withPermissions",
						"limit": 30,
						"attributes": { "data-minimum-input-length": 3 }
					}
				]
			}
		]
	}))
	.unwrap();

	let config = RelationFieldConfig::resolve(&schema, "user").unwrap();
	assert_eq!(config.limit, 30);
	assert_eq!(config.scope.as_deref(), Some("withPermissions"));
	assert_eq!(config.min_input_length(), 3);
}
