//! Entity metadata: relations, scopes, tree structure
//!
//! The host's ORM is an external collaborator; the widget consumes a
//! static description of each entity type. Scopes — named, reusable query
//! filters — are a capability set: a table from scope name to filter
//! function. Resolving a scope is a map lookup, and an absent key is an
//! explicit configuration error rather than a reflective dispatch failure.

use crate::error::{DropdownError, DropdownResult};
use crate::query::{JoinClause, RelationQuery};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Relation kinds understood by the widget
///
/// The renderer special-cases the singular kinds (`BelongsTo`, `HasOne`);
/// everything else is delegated to the host framework's default relation
/// rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
	BelongsTo,
	HasOne,
	HasMany,
	BelongsToMany,
}

impl RelationKind {
	/// Whether this kind holds at most one related record
	pub fn is_singular(&self) -> bool {
		matches!(self, RelationKind::BelongsTo | RelationKind::HasOne)
	}
}

/// Named filter function applied to a query plan
pub type ScopeFn = Arc<dyn Fn(&mut RelationQuery) + Send + Sync>;

/// Tree metadata for hierarchically organized entities
#[derive(Debug, Clone)]
pub struct TreeMeta {
	/// Column referencing the parent record's key
	pub parent_column: String,
}

impl Default for TreeMeta {
	fn default() -> Self {
		Self {
			parent_column: "parent_id".to_string(),
		}
	}
}

/// Pivot-table description for belongs-to-many relations
#[derive(Debug, Clone)]
pub struct PivotDef {
	pub table: String,
	pub foreign_key: String,
	pub other_key: String,
}

/// A named link from one entity type to another
#[derive(Clone)]
pub struct RelationDef {
	pub kind: RelationKind,
	pub related: Arc<ModelMeta>,
	pub pivot: Option<PivotDef>,
}

impl RelationDef {
	pub fn new(kind: RelationKind, related: Arc<ModelMeta>) -> Self {
		Self {
			kind,
			related,
			pivot: None,
		}
	}

	pub fn with_pivot(mut self, pivot: PivotDef) -> Self {
		self.pivot = Some(pivot);
		self
	}

	/// Build a query over the related table with no relation constraints
	///
	/// "No constraints" still leaves the joins the relation layer itself
	/// injects: a belongs-to-many relation joins its pivot table
	/// regardless. Callers that want the whole related table strip those
	/// with [`RelationQuery::clear_joins`].
	pub fn unconstrained_query(&self) -> RelationQuery {
		let mut query = RelationQuery::new(self.related.table.clone());
		if let Some(pivot) = &self.pivot {
			query = query.join(JoinClause {
				table: pivot.table.clone(),
				on: format!(
					"{}.{} = {}.{}",
					pivot.table, pivot.other_key, self.related.table, self.related.key_column
				),
			});
		}
		query
	}
}

impl fmt::Debug for RelationDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RelationDef")
			.field("kind", &self.kind)
			.field("related", &self.related.name)
			.field("pivot", &self.pivot)
			.finish()
	}
}

/// Static description of one entity type
///
/// # Examples
///
/// ```
/// use relation_dropdown::model::{ModelMeta, RelationDef, RelationKind};
/// use std::sync::Arc;
///
/// let user = Arc::new(ModelMeta::new("User", "users"));
/// let post = ModelMeta::new("Post", "posts")
///     .relation("author", RelationDef::new(RelationKind::BelongsTo, user));
/// assert!(post.relation_def("author").is_some());
/// assert_eq!(post.key_column, "id");
/// ```
#[derive(Clone)]
pub struct ModelMeta {
	/// Entity type name, used in error messages and self-reference checks
	pub name: String,
	pub table: String,
	pub key_column: String,
	/// Present when the entity is organized hierarchically
	pub tree: Option<TreeMeta>,
	scopes: HashMap<String, ScopeFn>,
	relations: HashMap<String, RelationDef>,
}

impl ModelMeta {
	pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table: table.into(),
			key_column: "id".to_string(),
			tree: None,
			scopes: HashMap::new(),
			relations: HashMap::new(),
		}
	}

	pub fn key_column(mut self, column: impl Into<String>) -> Self {
		self.key_column = column.into();
		self
	}

	/// Mark the entity as tree-structured
	pub fn tree(mut self, tree: TreeMeta) -> Self {
		self.tree = Some(tree);
		self
	}

	pub fn is_tree(&self) -> bool {
		self.tree.is_some()
	}

	/// Register a named scope
	///
	/// # Examples
	///
	/// ```
	/// use relation_dropdown::model::ModelMeta;
	/// use relation_dropdown::query::Filter;
	/// use serde_json::json;
	///
	/// let user = ModelMeta::new("User", "users").scope("active", |query| {
	///     query.conditions.push(Filter::eq("active", json!(true)).into());
	/// });
	/// assert!(user.scope_fn("active").is_some());
	/// ```
	pub fn scope(
		mut self,
		name: impl Into<String>,
		scope: impl Fn(&mut RelationQuery) + Send + Sync + 'static,
	) -> Self {
		self.scopes.insert(name.into(), Arc::new(scope));
		self
	}

	/// Register a relation attribute
	pub fn relation(mut self, attribute: impl Into<String>, def: RelationDef) -> Self {
		self.relations.insert(attribute.into(), def);
		self
	}

	pub fn scope_fn(&self, name: &str) -> Option<&ScopeFn> {
		self.scopes.get(name)
	}

	pub fn relation_def(&self, attribute: &str) -> Option<&RelationDef> {
		self.relations.get(attribute)
	}

	/// Look up a relation, failing with [`DropdownError::RelationNotFound`]
	pub fn require_relation(&self, attribute: &str) -> DropdownResult<&RelationDef> {
		self.relation_def(attribute)
			.ok_or_else(|| DropdownError::RelationNotFound {
				model: self.name.clone(),
				attribute: attribute.to_string(),
			})
	}

	/// Apply a named scope to a query plan
	///
	/// The scope table is the only dispatch mechanism: an absent name is a
	/// configuration error naming the entity, the scope, and the field
	/// that referenced it.
	pub fn apply_scope(
		&self,
		name: &str,
		field: &str,
		query: &mut RelationQuery,
	) -> DropdownResult<()> {
		let scope = self
			.scope_fn(name)
			.ok_or_else(|| DropdownError::ScopeNotFound {
				model: self.name.clone(),
				scope: name.to_string(),
				field: field.to_string(),
			})?;
		scope(query);
		Ok(())
	}
}

impl fmt::Debug for ModelMeta {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelMeta")
			.field("name", &self.name)
			.field("table", &self.table)
			.field("key_column", &self.key_column)
			.field("tree", &self.tree)
			.field("scopes", &self.scopes.keys().collect::<Vec<_>>())
			.field("relations", &self.relations.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// One concrete record of an owning entity, as seen at render time
///
/// Carries only what the renderer needs: the owner's type description, its
/// own key when persisted, and the currently selected related key per
/// relation attribute.
#[derive(Debug, Clone)]
pub struct OwnerInstance {
	pub meta: Arc<ModelMeta>,
	/// Primary key value; present only for persisted records
	pub key: Option<Value>,
	/// Currently selected related key, per relation attribute
	pub selections: HashMap<String, Value>,
}

impl OwnerInstance {
	/// A record that has not been persisted yet
	pub fn new(meta: Arc<ModelMeta>) -> Self {
		Self {
			meta,
			key: None,
			selections: HashMap::new(),
		}
	}

	/// A persisted record with the given key
	pub fn persisted(meta: Arc<ModelMeta>, key: Value) -> Self {
		Self {
			meta,
			key: Some(key),
			selections: HashMap::new(),
		}
	}

	/// Record the currently selected related key for an attribute
	pub fn selected(mut self, attribute: impl Into<String>, key: Value) -> Self {
		self.selections.insert(attribute.into(), key);
		self
	}

	/// Whether the record exists in the store
	pub fn exists(&self) -> bool {
		self.key.is_some()
	}

	pub fn selection(&self, attribute: &str) -> Option<&Value> {
		self.selections.get(attribute)
	}
}
