//! Typed query plan over a related entity
//!
//! The widget never talks to a database directly: it builds a
//! backend-independent plan (filters, projection, raw order clause,
//! pagination window, relation-injected joins) that the execution seam
//! interprets — rendered to SQL for a real store, or evaluated in memory
//! by the reference backend.
//!
//! Raw `order` clauses and computed `select` expressions are opaque,
//! trusted strings written by the application's form authors, never by end
//! users. They are carried through verbatim.

use serde_json::Value;

/// Alias given to a computed display expression in the result set
pub const SELECTION_COLUMN: &str = "selection";

/// What a filter applies to: a plain column or a raw trusted expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTarget {
	Column(String),
	Expr(String),
}

/// Comparison operator for a single filter
///
/// `Contains` is a case-insensitive substring match (`LIKE '%needle%'`
/// semantics with the needle's wildcard characters escaped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
	Eq,
	Ne,
	Contains,
}

/// A single filter expression
#[derive(Debug, Clone)]
pub struct Filter {
	pub target: FilterTarget,
	pub operator: FilterOperator,
	pub value: Value,
}

impl Filter {
	pub fn new(target: FilterTarget, operator: FilterOperator, value: Value) -> Self {
		Self {
			target,
			operator,
			value,
		}
	}

	/// Equality filter on a plain column
	pub fn eq(column: impl Into<String>, value: Value) -> Self {
		Self::new(FilterTarget::Column(column.into()), FilterOperator::Eq, value)
	}

	/// Inequality filter on a plain column
	pub fn ne(column: impl Into<String>, value: Value) -> Self {
		Self::new(FilterTarget::Column(column.into()), FilterOperator::Ne, value)
	}

	/// Case-insensitive substring filter
	pub fn contains(target: FilterTarget, needle: impl Into<String>) -> Self {
		Self::new(target, FilterOperator::Contains, Value::String(needle.into()))
	}
}

/// Composite filter condition supporting AND/OR logic
///
/// Search uses an OR across the key column and the display column; the
/// plan's top-level conditions are combined with AND.
#[derive(Debug, Clone)]
pub enum FilterCondition {
	Single(Filter),
	And(Vec<FilterCondition>),
	Or(Vec<FilterCondition>),
}

impl FilterCondition {
	/// OR condition across multiple filters (convenience for search)
	pub fn or_filters(filters: Vec<Filter>) -> Self {
		Self::Or(filters.into_iter().map(FilterCondition::Single).collect())
	}
}

/// Result-set projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectClause {
	/// Every column — tree entities need ancestor/descendant columns
	All,
	/// A fixed column list (typically key + display column)
	Columns(Vec<String>),
	/// A computed expression aliased to [`SELECTION_COLUMN`], next to either
	/// the key column alone or every column (tree entities keep their
	/// ancestor/descendant columns even with a computed display)
	DisplayExpr {
		key_column: String,
		expr: String,
		all_columns: bool,
	},
}

/// A join injected by the relation layer (pivot tables and the like)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
	pub table: String,
	pub on: String,
}

/// Backend-independent query plan over one table
///
/// # Examples
///
/// ```
/// use relation_dropdown::query::{Filter, RelationQuery};
/// use serde_json::json;
///
/// let query = RelationQuery::new("users")
///     .and_where(Filter::eq("id", json!(7)).into())
///     .order_by_raw("name asc")
///     .limit(20);
/// assert_eq!(query.table, "users");
/// assert_eq!(query.limit, Some(20));
/// ```
#[derive(Debug, Clone)]
pub struct RelationQuery {
	pub table: String,
	pub select: SelectClause,
	/// Top-level conditions, combined with AND
	pub conditions: Vec<FilterCondition>,
	/// Raw order clause, spliced through opaquely
	pub order: Option<String>,
	pub offset: Option<u64>,
	pub limit: Option<u64>,
	/// Joins injected by the relation layer; the renderer strips these
	pub joins: Vec<JoinClause>,
}

impl RelationQuery {
	pub fn new(table: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			select: SelectClause::All,
			conditions: Vec::new(),
			order: None,
			offset: None,
			limit: None,
			joins: Vec::new(),
		}
	}

	pub fn select(mut self, select: SelectClause) -> Self {
		self.select = select;
		self
	}

	pub fn and_where(mut self, condition: FilterCondition) -> Self {
		self.conditions.push(condition);
		self
	}

	pub fn order_by_raw(mut self, order: impl Into<String>) -> Self {
		self.order = Some(order.into());
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn join(mut self, join: JoinClause) -> Self {
		self.joins.push(join);
		self
	}

	/// Remove every relation-injected join
	///
	/// Even an "unconstrained" belongs-to-many relation joins its pivot
	/// table, which would constrain a query meant to range over the whole
	/// related table. The renderer calls this after building the relation
	/// query.
	pub fn clear_joins(&mut self) {
		self.joins.clear();
	}
}

impl From<Filter> for FilterCondition {
	fn from(filter: Filter) -> Self {
		FilterCondition::Single(filter)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn clear_joins_strips_pivot_joins() {
		let mut query = RelationQuery::new("roles").join(JoinClause {
			table: "role_user".to_string(),
			on: "role_user.role_id = roles.id".to_string(),
		});
		assert_eq!(query.joins.len(), 1);
		query.clear_joins();
		assert!(query.joins.is_empty());
	}

	#[test]
	fn conditions_accumulate() {
		let query = RelationQuery::new("users")
			.and_where(Filter::eq("id", json!(1)).into())
			.and_where(Filter::ne("id", json!(2)).into());
		assert_eq!(query.conditions.len(), 2);
	}
}
