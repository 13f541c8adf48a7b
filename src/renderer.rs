//! Field Renderer
//!
//! Runs once per form display. For singular relations the rendered field
//! carries only the currently selected option — never the full related
//! table — plus the search-widget wiring (handler identity, attribute
//! context, minimum input length, request delay). Non-singular relation
//! kinds are delegated back to the host framework's default rendering.

use crate::backend::{value_text, Record, RelationDatabase};
use crate::config::{RelationFieldConfig, ATTR_AJAX_DELAY, ATTR_MIN_INPUT_LENGTH};
use crate::error::{DropdownError, DropdownResult};
use crate::model::OwnerInstance;
use crate::query::{Filter, SelectClause, SELECTION_COLUMN};
use crate::schema::{FormSchema, WIDGET_TYPE};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Handler identity announced to the search widget via `data-handler`
pub const SEARCH_HANDLER: &str = "onRelationDropdownSearch";

/// UI type the field is switched to when the widget takes over
pub const DROPDOWN_FIELD_TYPE: &str = "dropdown";

/// A flat key/display pair
#[derive(Debug, Clone, PartialEq)]
pub struct FlatOption {
	pub id: Value,
	pub text: String,
}

/// One node of a nested option tree
#[derive(Debug, Clone, PartialEq)]
pub struct OptionNode {
	pub id: Value,
	pub text: String,
	pub children: Vec<OptionNode>,
}

/// Option set of a rendered field
///
/// Tree-structured entities render nested options so the client can show
/// ancestor/descendant structure; everything else is a flat mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOptions {
	Flat(Vec<FlatOption>),
	Nested(Vec<OptionNode>),
}

impl FieldOptions {
	pub fn is_empty(&self) -> bool {
		match self {
			FieldOptions::Flat(options) => options.is_empty(),
			FieldOptions::Nested(nodes) => nodes.is_empty(),
		}
	}
}

/// A field prepared for the host's dropdown rendering
#[derive(Debug, Clone)]
pub struct RenderedField {
	/// UI type tag, always [`DROPDOWN_FIELD_TYPE`]
	pub field_type: String,
	/// HTML attributes: handler wiring plus caller-supplied pass-throughs
	pub attributes: HashMap<String, Value>,
	pub options: FieldOptions,
}

/// Outcome of a render pass
#[derive(Debug, Clone)]
pub enum RenderOutcome {
	/// The widget took over and produced a searchable dropdown
	Rendered(RenderedField),
	/// Non-singular relation kind: host default rendering applies
	Delegated,
}

/// Renders relation dropdown fields for one form schema
pub struct FieldRenderer {
	schema: Arc<FormSchema>,
	db: Arc<dyn RelationDatabase>,
}

impl FieldRenderer {
	pub fn new(schema: Arc<FormSchema>, db: Arc<dyn RelationDatabase>) -> Self {
		Self { schema, db }
	}

	/// Render the field for `attribute` on the given owner record
	///
	/// Builds an unconstrained query over the related entity, restricted
	/// to exactly the current selection, with the configured order and
	/// scope applied, the owner's own record excluded for self-referential
	/// relations, and relation-injected pivot joins stripped.
	pub async fn render(
		&self,
		owner: &OwnerInstance,
		attribute: &str,
	) -> DropdownResult<RenderOutcome> {
		let field = self
			.schema
			.find_field(attribute, WIDGET_TYPE)
			.ok_or_else(|| DropdownError::FieldNotFound(attribute.to_string()))?;
		let config = RelationFieldConfig::from_descriptor(field);

		let relation = owner.meta.require_relation(attribute)?;
		if !relation.kind.is_singular() {
			tracing::debug!(attribute, kind = ?relation.kind, "delegating to default rendering");
			return Ok(RenderOutcome::Delegated);
		}
		let related = Arc::clone(&relation.related);

		let mut attributes = field.attributes.clone();
		attributes.insert("data-handler".to_string(), json!(SEARCH_HANDLER));
		attributes.insert(
			"data-request-data".to_string(),
			json!(format!("_attribute: '{}'", attribute)),
		);
		attributes
			.entry(ATTR_MIN_INPUT_LENGTH.to_string())
			.or_insert_with(|| json!(config.min_input_length()));
		attributes
			.entry(ATTR_AJAX_DELAY.to_string())
			.or_insert_with(|| json!(config.ajax_delay_ms()));

		let display_column = if config.select.is_some() {
			SELECTION_COLUMN.to_string()
		} else {
			config.display_column(&related.key_column).to_string()
		};

		let options = match owner.selection(attribute) {
			None => FieldOptions::Flat(Vec::new()),
			Some(selected) => {
				let mut query = relation.unconstrained_query().and_where(
					Filter::eq(related.key_column.clone(), selected.clone()).into(),
				);

				if let Some(order) = &config.order {
					query = query.order_by_raw(order.clone());
				}

				// A record of the same type cannot be related to itself
				if owner.meta.name == related.name {
					if let Some(owner_key) = &owner.key {
						query = query.and_where(
							Filter::ne(related.key_column.clone(), owner_key.clone()).into(),
						);
					}
				}

				if let Some(scope) = &config.scope {
					related.apply_scope(scope, attribute, &mut query)?;
				}

				// Even "unconstrained", belongs-to-many joins its pivot table
				query.clear_joins();

				query = query.select(match &config.select {
					Some(expr) => SelectClause::DisplayExpr {
						key_column: related.key_column.clone(),
						expr: expr.clone(),
						all_columns: related.is_tree(),
					},
					None if related.is_tree() => SelectClause::All,
					None => SelectClause::Columns(vec![
						related.key_column.clone(),
						display_column.clone(),
					]),
				});

				let records = self.db.fetch(&query).await?;
				match &related.tree {
					Some(tree) => FieldOptions::Nested(nested_options(
						&records,
						&related.key_column,
						&display_column,
						&tree.parent_column,
					)),
					None => FieldOptions::Flat(flat_options(
						&records,
						&related.key_column,
						&display_column,
					)),
				}
			}
		};

		Ok(RenderOutcome::Rendered(RenderedField {
			field_type: DROPDOWN_FIELD_TYPE.to_string(),
			attributes,
			options,
		}))
	}
}

fn flat_options(records: &[Record], key_column: &str, display_column: &str) -> Vec<FlatOption> {
	records
		.iter()
		.map(|record| FlatOption {
			id: record.get(key_column).cloned().unwrap_or(Value::Null),
			text: value_text(record.get(display_column)),
		})
		.collect()
}

/// Build a nested option tree from flat records
///
/// Roots are records whose parent is null, missing, or not part of the
/// result set; children keep record order.
fn nested_options(
	records: &[Record],
	key_column: &str,
	display_column: &str,
	parent_column: &str,
) -> Vec<OptionNode> {
	let ids: Vec<String> = records
		.iter()
		.map(|record| value_text(record.get(key_column)))
		.collect();

	let mut children_of: HashMap<String, Vec<usize>> = HashMap::new();
	let mut roots = Vec::new();
	for (index, record) in records.iter().enumerate() {
		let parent = value_text(record.get(parent_column));
		if parent.is_empty() || !ids.contains(&parent) {
			roots.push(index);
		} else {
			children_of.entry(parent).or_default().push(index);
		}
	}

	fn build(
		index: usize,
		records: &[Record],
		ids: &[String],
		children_of: &HashMap<String, Vec<usize>>,
		key_column: &str,
		display_column: &str,
	) -> OptionNode {
		let record = &records[index];
		let children = children_of
			.get(&ids[index])
			.map(|indices| {
				indices
					.iter()
					.map(|&child| {
						build(child, records, ids, children_of, key_column, display_column)
					})
					.collect()
			})
			.unwrap_or_default();
		OptionNode {
			id: record.get(key_column).cloned().unwrap_or(Value::Null),
			text: value_text(record.get(display_column)),
			children,
		}
	}

	roots
		.into_iter()
		.map(|index| build(index, records, &ids, &children_of, key_column, display_column))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::record;
	use serde_json::json;

	#[test]
	fn nested_options_attach_children_to_parents() {
		let records = vec![
			record(json!({ "id": 1, "name": "Root", "parent_id": null })),
			record(json!({ "id": 2, "name": "Child", "parent_id": 1 })),
			record(json!({ "id": 3, "name": "Grandchild", "parent_id": 2 })),
		];
		let nodes = nested_options(&records, "id", "name", "parent_id");
		assert_eq!(nodes.len(), 1);
		assert_eq!(nodes[0].text, "Root");
		assert_eq!(nodes[0].children.len(), 1);
		assert_eq!(nodes[0].children[0].children[0].text, "Grandchild");
	}

	#[test]
	fn orphaned_parent_becomes_a_root() {
		let records = vec![record(json!({ "id": 5, "name": "Lost", "parent_id": 99 }))];
		let nodes = nested_options(&records, "id", "name", "parent_id");
		assert_eq!(nodes.len(), 1);
		assert_eq!(nodes[0].text, "Lost");
	}
}
