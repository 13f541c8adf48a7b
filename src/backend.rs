//! Execution seam between the widget and the host's data layer
//!
//! The widget hands a typed [`RelationQuery`] to a [`RelationDatabase`]
//! implementation and gets rows back. Hosts back this with their own
//! store (see [`crate::sql`] for rendering a plan to SQL);
//! [`MemoryDatabase`] interprets plans directly over in-memory rows and
//! backs the test suite.

use crate::error::{DropdownError, DropdownResult};
use crate::query::{
	Filter, FilterCondition, FilterOperator, FilterTarget, RelationQuery, SelectClause,
	SELECTION_COLUMN,
};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One fetched row: column name to value
pub type Record = HashMap<String, Value>;

/// Convert a JSON object into a [`Record`]
///
/// Non-object values yield an empty record.
///
/// # Examples
///
/// ```
/// use relation_dropdown::backend::record;
/// use serde_json::json;
///
/// let row = record(json!({ "id": 1, "name": "Apple" }));
/// assert_eq!(row.get("name"), Some(&json!("Apple")));
/// ```
pub fn record(value: Value) -> Record {
	match value {
		Value::Object(map) => map.into_iter().collect(),
		_ => Record::new(),
	}
}

/// Asynchronous plan execution against the host's data store
///
/// All failures surface as [`DropdownError::Database`] and propagate
/// unhandled to the host's generic error surface.
#[async_trait]
pub trait RelationDatabase: Send + Sync {
	async fn fetch(&self, query: &RelationQuery) -> DropdownResult<Vec<Record>>;
}

/// In-memory reference backend
///
/// Interprets the typed query plan over registered rows: filters, simple
/// `column [asc|desc]` order lists, offset/limit windows, and projection.
/// It does not evaluate SQL expressions — rows are expected to carry a
/// precomputed `selection` column, and both `FilterTarget::Expr` and
/// `SelectClause::DisplayExpr` resolve against it. Joins are not
/// interpreted.
///
/// # Examples
///
/// ```
/// use relation_dropdown::backend::{record, MemoryDatabase, RelationDatabase};
/// use relation_dropdown::query::{Filter, RelationQuery};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let db = MemoryDatabase::new().table("users", vec![
///     record(json!({ "id": 1, "name": "Alice" })),
///     record(json!({ "id": 2, "name": "Bob" })),
/// ]);
///
/// let query = RelationQuery::new("users").and_where(Filter::eq("id", json!(2)).into());
/// let rows = db.fetch(&query).await.unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].get("name"), Some(&json!("Bob")));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
	tables: HashMap<String, Vec<Record>>,
}

impl MemoryDatabase {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register the rows of a table
	pub fn table(mut self, name: impl Into<String>, rows: Vec<Record>) -> Self {
		self.tables.insert(name.into(), rows);
		self
	}
}

#[async_trait]
impl RelationDatabase for MemoryDatabase {
	async fn fetch(&self, query: &RelationQuery) -> DropdownResult<Vec<Record>> {
		let rows = self
			.tables
			.get(&query.table)
			.ok_or_else(|| DropdownError::Database(format!("unknown table '{}'", query.table)))?;

		tracing::debug!(
			table = %query.table,
			conditions = query.conditions.len(),
			"evaluating relation query in memory"
		);

		let mut matched: Vec<&Record> = rows
			.iter()
			.filter(|row| {
				query
					.conditions
					.iter()
					.all(|condition| matches_condition(row, condition))
			})
			.collect();

		if let Some(order) = &query.order {
			let clauses = parse_order(order);
			matched.sort_by(|a, b| compare_rows(a, b, &clauses));
		}

		let offset = query.offset.unwrap_or(0) as usize;
		let iter = matched.into_iter().skip(offset);
		let windowed: Vec<&Record> = match query.limit {
			Some(limit) => iter.take(limit as usize).collect(),
			None => iter.collect(),
		};

		Ok(windowed
			.into_iter()
			.map(|row| project(row, &query.select))
			.collect())
	}
}

fn matches_condition(row: &Record, condition: &FilterCondition) -> bool {
	match condition {
		FilterCondition::Single(filter) => matches_filter(row, filter),
		FilterCondition::And(children) => children.iter().all(|c| matches_condition(row, c)),
		FilterCondition::Or(children) => children.iter().any(|c| matches_condition(row, c)),
	}
}

fn matches_filter(row: &Record, filter: &Filter) -> bool {
	let cell = match &filter.target {
		FilterTarget::Column(column) => row.get(column),
		FilterTarget::Expr(_) => row.get(SELECTION_COLUMN),
	};
	match filter.operator {
		FilterOperator::Eq => values_equal(cell, &filter.value),
		FilterOperator::Ne => !values_equal(cell, &filter.value),
		FilterOperator::Contains => {
			let needle = value_text(Some(&filter.value)).to_lowercase();
			value_text(cell).to_lowercase().contains(&needle)
		}
	}
}

fn values_equal(cell: Option<&Value>, expected: &Value) -> bool {
	match (cell, expected) {
		(None, Value::Null) => true,
		(Some(Value::Null), Value::Null) => true,
		(Some(actual), expected) => {
			actual == expected || value_text(Some(actual)) == value_text(Some(expected))
		}
		(None, _) => false,
	}
}

/// Scalar text of a cell, without JSON string quoting
pub(crate) fn value_text(value: Option<&Value>) -> String {
	match value {
		Some(Value::String(s)) => s.clone(),
		Some(Value::Null) | None => String::new(),
		Some(other) => other.to_string(),
	}
}

struct OrderClause {
	column: String,
	descending: bool,
}

fn parse_order(order: &str) -> Vec<OrderClause> {
	order
		.split(',')
		.filter_map(|clause| {
			let mut parts = clause.split_whitespace();
			let column = parts.next()?.to_string();
			let descending = parts
				.next()
				.is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
			Some(OrderClause { column, descending })
		})
		.collect()
}

fn compare_rows(a: &Record, b: &Record, clauses: &[OrderClause]) -> Ordering {
	for clause in clauses {
		let ordering = compare_values(a.get(&clause.column), b.get(&clause.column));
		let ordering = if clause.descending {
			ordering.reverse()
		} else {
			ordering
		};
		if ordering != Ordering::Equal {
			return ordering;
		}
	}
	Ordering::Equal
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
	match (a, b) {
		(Some(Value::Number(x)), Some(Value::Number(y))) => x
			.as_f64()
			.partial_cmp(&y.as_f64())
			.unwrap_or(Ordering::Equal),
		(x, y) => value_text(x).cmp(&value_text(y)),
	}
}

fn project(row: &Record, select: &SelectClause) -> Record {
	match select {
		SelectClause::All => row.clone(),
		SelectClause::Columns(columns) => columns
			.iter()
			.filter_map(|column| row.get(column).map(|v| (column.clone(), v.clone())))
			.collect(),
		SelectClause::DisplayExpr {
			key_column,
			all_columns,
			..
		} => {
			if *all_columns {
				row.clone()
			} else {
				[key_column.as_str(), SELECTION_COLUMN]
					.iter()
					.filter_map(|column| {
						row.get(*column).map(|v| (column.to_string(), v.clone()))
					})
					.collect()
			}
		}
	}
}
