//! Form schema tree and field lookup
//!
//! A form schema is an ordered tree: plain fields at the top level, plus
//! named containers (tabs, groups, nested sections) holding further nodes.
//! The widget never holds a per-request reference to "its" field — a form
//! may host several relation dropdowns, so every lookup walks the tree and
//! is keyed by attribute name plus widget-type tag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Widget type tag used by fields of this widget in a form schema
pub const WIDGET_TYPE: &str = "relation-dropdown";

/// One field declaration in a form schema
///
/// Carries the configuration surface consumed by the relation dropdown:
/// display column or computed display expression, named scope, raw order
/// clause, page size, clearable empty option, and pass-through HTML
/// attributes (`data-minimum-input-length`, `data-ajax--delay`).
///
/// # Examples
///
/// ```
/// use relation_dropdown::schema::FieldDescriptor;
///
/// let field = FieldDescriptor::new("user", "relation-dropdown")
///     .name_from("first_name")
///     .scope("withPermissions")
///     .limit(50);
/// assert_eq!(field.name, "user");
/// assert_eq!(field.limit, Some(50));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
	/// Attribute name (the relation attribute on the owning model)
	pub name: String,
	/// Widget type tag (`"relation-dropdown"` for this widget)
	#[serde(rename = "type")]
	pub field_type: String,
	/// Display column on the related entity
	#[serde(rename = "nameFrom", default, skip_serializing_if = "Option::is_none")]
	pub name_from: Option<String>,
	/// Computed display SQL expression; takes precedence over `name_from`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub select: Option<String>,
	/// Named filter scope on the related entity
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Raw order clause, passed through opaquely
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order: Option<String>,
	/// Search page size
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub limit: Option<u64>,
	/// Label for a clearable blank entry prepended to page 1
	#[serde(rename = "emptyOption", default, skip_serializing_if = "Option::is_none")]
	pub empty_option: Option<String>,
	/// Pass-through HTML attributes for the rendered field
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub attributes: HashMap<String, serde_json::Value>,
}

impl FieldDescriptor {
	/// Create a new field descriptor with a name and widget type tag
	pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			field_type: field_type.into(),
			name_from: None,
			select: None,
			scope: None,
			order: None,
			limit: None,
			empty_option: None,
			attributes: HashMap::new(),
		}
	}

	/// Create a relation dropdown field descriptor
	///
	/// # Examples
	///
	/// ```
	/// use relation_dropdown::schema::{FieldDescriptor, WIDGET_TYPE};
	///
	/// let field = FieldDescriptor::dropdown("category");
	/// assert_eq!(field.field_type, WIDGET_TYPE);
	/// ```
	pub fn dropdown(name: impl Into<String>) -> Self {
		Self::new(name, WIDGET_TYPE)
	}

	pub fn name_from(mut self, column: impl Into<String>) -> Self {
		self.name_from = Some(column.into());
		self
	}
	pub fn select(mut self, expr: impl Into<String>) -> Self {
		self.select = Some(expr.into());
		self
	}
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());
		self
	}
	pub fn order(mut self, order: impl Into<String>) -> Self {
		self.order = Some(order.into());
		self
	}
	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}
	pub fn empty_option(mut self, label: impl Into<String>) -> Self {
		self.empty_option = Some(label.into());
		self
	}
	pub fn attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.attributes.insert(key.into(), value);
		self
	}
}

/// One node in a form schema tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
	/// A plain field
	Field(FieldDescriptor),
	/// A named container (tab, group, section) holding further nodes
	Container {
		name: String,
		children: Vec<SchemaNode>,
	},
}

/// Ordered form schema tree
///
/// # Examples
///
/// ```
/// use relation_dropdown::schema::{FieldDescriptor, FormSchema, WIDGET_TYPE};
///
/// let schema = FormSchema::new()
///     .field(FieldDescriptor::dropdown("author").name_from("name"))
///     .container("tabs", vec![FieldDescriptor::dropdown("category").into()]);
///
/// let field = schema.find_field("category", WIDGET_TYPE).unwrap();
/// assert_eq!(field.name, "category");
/// assert!(schema.find_field("missing", WIDGET_TYPE).is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSchema {
	pub nodes: Vec<SchemaNode>,
}

impl FormSchema {
	/// Create an empty form schema
	pub fn new() -> Self {
		Self { nodes: Vec::new() }
	}

	/// Append a field at the top level
	pub fn field(mut self, field: FieldDescriptor) -> Self {
		self.nodes.push(SchemaNode::Field(field));
		self
	}

	/// Append a named container holding the given child nodes
	pub fn container(mut self, name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
		self.nodes.push(SchemaNode::Container {
			name: name.into(),
			children,
		});
		self
	}

	/// Find the first field matching both name and widget-type tag
	///
	/// Depth-first walk over the schema tree, descending into containers in
	/// declaration order. Returns `None` when no field matches — the caller
	/// decides whether that is an error.
	pub fn find_field(&self, name: &str, field_type: &str) -> Option<&FieldDescriptor> {
		Self::find_in_nodes(&self.nodes, name, field_type)
	}

	/// Find the first field carrying the given widget-type tag, regardless
	/// of name
	///
	/// Used as the fallback when a search request does not name its
	/// attribute — only unambiguous for forms with a single field of the
	/// type.
	pub fn first_field_of_type(&self, field_type: &str) -> Option<&FieldDescriptor> {
		Self::first_of_type_in_nodes(&self.nodes, field_type)
	}

	fn first_of_type_in_nodes<'a>(
		nodes: &'a [SchemaNode],
		field_type: &str,
	) -> Option<&'a FieldDescriptor> {
		for node in nodes {
			match node {
				SchemaNode::Field(field) => {
					if field.field_type == field_type {
						return Some(field);
					}
				}
				SchemaNode::Container { children, .. } => {
					if let Some(found) = Self::first_of_type_in_nodes(children, field_type) {
						return Some(found);
					}
				}
			}
		}
		None
	}

	fn find_in_nodes<'a>(
		nodes: &'a [SchemaNode],
		name: &str,
		field_type: &str,
	) -> Option<&'a FieldDescriptor> {
		for node in nodes {
			match node {
				SchemaNode::Field(field) => {
					if field.name == name && field.field_type == field_type {
						return Some(field);
					}
				}
				SchemaNode::Container { children, .. } => {
					if let Some(found) = Self::find_in_nodes(children, name, field_type) {
						return Some(found);
					}
				}
			}
		}
		None
	}
}

impl From<FieldDescriptor> for SchemaNode {
	fn from(field: FieldDescriptor) -> Self {
		SchemaNode::Field(field)
	}
}
