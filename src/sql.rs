//! SQL rendering of a query plan
//!
//! Renders a [`RelationQuery`] to SQL text for hosts that execute against
//! a real store. Identifiers and raw configuration strings (order clauses,
//! computed select expressions) pass through unquoted — they come from the
//! application's form authors, not end users. Search needles are escaped
//! for both string literals and `LIKE` wildcards.

use crate::query::{
	Filter, FilterCondition, FilterOperator, FilterTarget, RelationQuery, SelectClause,
	SELECTION_COLUMN,
};
use sea_query::{
	Alias, Asterisk, Cond, Expr, JoinType, MysqlQueryBuilder, PostgresQueryBuilder, Query,
};
use serde_json::Value;

/// Supported database dialects for query generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatabaseDialect {
	/// MySQL dialect (uses backticks for identifier quoting)
	#[default]
	MySQL,
	/// PostgreSQL dialect (uses double quotes for identifier quoting)
	PostgreSQL,
}

/// Render a query plan to SQL text
///
/// # Examples
///
/// ```
/// use relation_dropdown::query::{Filter, RelationQuery, SelectClause};
/// use relation_dropdown::sql::{to_sql, DatabaseDialect};
/// use serde_json::json;
///
/// let query = RelationQuery::new("users")
///     .select(SelectClause::Columns(vec!["id".into(), "name".into()]))
///     .and_where(Filter::eq("id", json!(7)).into())
///     .order_by_raw("name asc")
///     .limit(20);
///
/// let sql = to_sql(&query, DatabaseDialect::MySQL);
/// assert!(sql.contains("id = 7"));
/// assert!(sql.contains("ORDER BY name asc"));
/// assert!(sql.contains("LIMIT 20"));
/// ```
pub fn to_sql(query: &RelationQuery, dialect: DatabaseDialect) -> String {
	let mut stmt = Query::select();
	stmt.from(Alias::new(query.table.as_str()));

	match &query.select {
		SelectClause::All => {
			stmt.column(Asterisk);
		}
		SelectClause::Columns(columns) => {
			for column in columns {
				stmt.column(Alias::new(column.as_str()));
			}
		}
		SelectClause::DisplayExpr {
			key_column,
			expr,
			all_columns,
		} => {
			if *all_columns {
				stmt.column(Asterisk);
			} else {
				stmt.column(Alias::new(key_column.as_str()));
			}
			// Raw trusted expression, aliased to the virtual selection column
			stmt.expr(Expr::cust(format!("{} AS {}", expr, SELECTION_COLUMN)));
		}
	}

	for join in &query.joins {
		stmt.join(
			JoinType::InnerJoin,
			Alias::new(join.table.as_str()),
			Expr::cust(join.on.clone()),
		);
	}

	if !query.conditions.is_empty() {
		let mut cond = Cond::all();
		for condition in &query.conditions {
			cond = cond.add(condition_to_cond(condition));
		}
		stmt.cond_where(cond);
	}

	let mut sql = match dialect {
		DatabaseDialect::MySQL => stmt.to_string(MysqlQueryBuilder),
		DatabaseDialect::PostgreSQL => stmt.to_string(PostgresQueryBuilder),
	};

	// Raw order must land before the pagination window, so both are
	// appended as text rather than fed through the builder.
	if let Some(order) = &query.order {
		sql.push_str(&format!(" ORDER BY {}", order));
	}
	if let Some(limit) = query.limit {
		sql.push_str(&format!(" LIMIT {}", limit));
	}
	if let Some(offset) = query.offset {
		sql.push_str(&format!(" OFFSET {}", offset));
	}

	sql
}

fn condition_to_cond(condition: &FilterCondition) -> Cond {
	match condition {
		FilterCondition::Single(filter) => Cond::all().add(Expr::cust(filter_sql(filter))),
		FilterCondition::And(children) => children
			.iter()
			.fold(Cond::all(), |cond, child| cond.add(condition_to_cond(child))),
		FilterCondition::Or(children) => children
			.iter()
			.fold(Cond::any(), |cond, child| cond.add(condition_to_cond(child))),
	}
}

fn filter_sql(filter: &Filter) -> String {
	let target = match &filter.target {
		FilterTarget::Column(column) => column.clone(),
		FilterTarget::Expr(expr) => format!("({})", expr),
	};
	match filter.operator {
		FilterOperator::Eq => match &filter.value {
			Value::Null => format!("{} IS NULL", target),
			value => format!("{} = {}", target, value_literal(value)),
		},
		FilterOperator::Ne => match &filter.value {
			Value::Null => format!("{} IS NOT NULL", target),
			value => format!("{} <> {}", target, value_literal(value)),
		},
		FilterOperator::Contains => {
			let needle = match &filter.value {
				Value::String(s) => s.clone(),
				value => value.to_string(),
			};
			format!(
				"LOWER({}) LIKE '%{}%'",
				target,
				escape_like_pattern(&needle.to_lowercase())
			)
		}
	}
}

fn value_literal(value: &Value) -> String {
	match value {
		Value::String(s) => format!("'{}'", escape_string(s)),
		Value::Bool(true) => "TRUE".to_string(),
		Value::Bool(false) => "FALSE".to_string(),
		Value::Number(n) => n.to_string(),
		other => format!("'{}'", escape_string(&other.to_string())),
	}
}

fn escape_string(value: &str) -> String {
	value.replace('\'', "''")
}

/// Escape special characters in LIKE patterns
///
/// Escapes `%`, `_`, and `\` which have special meanings in SQL LIKE
/// patterns, plus the quote character for the surrounding literal.
fn escape_like_pattern(pattern: &str) -> String {
	escape_string(pattern)
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_")
}
