//! Search Responder
//!
//! Answers the widget's asynchronous search requests: one invocation per
//! keystroke or scroll-append. Each request resolves its own field
//! configuration from the form schema by attribute name — a form may host
//! several relation dropdowns, and concurrent searches against distinct
//! fields must not see each other's scope, order, limit, or display
//! configuration.

use crate::backend::{value_text, RelationDatabase};
use crate::config::RelationFieldConfig;
use crate::error::{DropdownError, DropdownResult};
use crate::model::ModelMeta;
use crate::query::{
	Filter, FilterCondition, FilterTarget, RelationQuery, SelectClause, SELECTION_COLUMN,
};
use crate::schema::{FormSchema, WIDGET_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// One incoming search request
///
/// `request_type` distinguishes fresh queries from scroll-appends
/// (`"query"` vs `"query:append"`); it is informational and never
/// branched on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
	/// Free-text search string; empty or absent means no filter
	#[serde(default)]
	pub q: Option<String>,
	/// Name of the relation field being searched; required when several
	/// dropdown fields share one form
	#[serde(rename = "_attribute", default)]
	pub attribute: Option<String>,
	/// 1-based page number, default 1
	#[serde(default)]
	pub page: Option<u64>,
	#[serde(rename = "_type", default)]
	pub request_type: Option<String>,
}

impl SearchRequest {
	pub fn new(attribute: impl Into<String>) -> Self {
		Self {
			attribute: Some(attribute.into()),
			..Self::default()
		}
	}

	pub fn query(mut self, q: impl Into<String>) -> Self {
		self.q = Some(q.into());
		self
	}

	pub fn page(mut self, page: u64) -> Self {
		self.page = Some(page);
		self
	}

	/// Build a request from raw string parameters, as handed over by hosts
	/// that do not deserialize request bodies themselves
	///
	/// # Examples
	///
	/// ```
	/// use relation_dropdown::search::SearchRequest;
	/// use std::collections::HashMap;
	///
	/// let mut params = HashMap::new();
	/// params.insert("q".to_string(), "ali".to_string());
	/// params.insert("_attribute".to_string(), "user".to_string());
	/// params.insert("page".to_string(), "2".to_string());
	///
	/// let request = SearchRequest::from_params(&params);
	/// assert_eq!(request.q.as_deref(), Some("ali"));
	/// assert_eq!(request.page, Some(2));
	/// ```
	pub fn from_params(params: &HashMap<String, String>) -> Self {
		Self {
			q: params.get("q").cloned(),
			attribute: params.get("_attribute").cloned(),
			page: params.get("page").and_then(|page| page.parse().ok()),
			request_type: params.get("_type").cloned(),
		}
	}
}

/// One search result entry
///
/// `text` may carry markup when a computed display expression produces it;
/// no escaping happens here — that is the rendering client's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub id: Value,
	pub text: String,
}

/// One page of search results
///
/// `has_more` is an approximation: true iff the page came back full. A
/// page boundary that falls exactly on the last record produces one empty
/// trailing page.
#[derive(Debug, Clone)]
pub struct ResultPage {
	pub results: Vec<SearchResult>,
	pub has_more: bool,
}

impl ResultPage {
	/// Serialize to the widget's wire shape
	///
	/// `pagination` is present only when more results are available.
	pub fn to_json(&self) -> Value {
		let mut response = json!({ "results": self.results });
		if self.has_more {
			response["pagination"] = json!({ "more": true });
		}
		response
	}
}

/// Wire form of a result page
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub results: Vec<SearchResult>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
	pub more: bool,
}

impl From<ResultPage> for SearchResponse {
	fn from(page: ResultPage) -> Self {
		Self {
			results: page.results,
			pagination: page.has_more.then_some(Pagination { more: true }),
		}
	}
}

/// Answers search requests for the relation dropdowns of one form
pub struct SearchResponder {
	schema: Arc<FormSchema>,
	owner: Arc<ModelMeta>,
	db: Arc<dyn RelationDatabase>,
}

impl SearchResponder {
	pub fn new(
		schema: Arc<FormSchema>,
		owner: Arc<ModelMeta>,
		db: Arc<dyn RelationDatabase>,
	) -> Self {
		Self { schema, owner, db }
	}

	/// Run one search request
	///
	/// Resolves the field configuration from the form schema, builds a
	/// filtered/ordered/scoped query over the related entity, paginates
	/// it, and maps the records to result entries. An empty result set is
	/// not an error; a scope that the related entity does not implement
	/// is.
	pub async fn search(&self, request: &SearchRequest) -> DropdownResult<ResultPage> {
		let field = match request.attribute.as_deref() {
			Some(attribute) => self
				.schema
				.find_field(attribute, WIDGET_TYPE)
				.ok_or_else(|| DropdownError::FieldNotFound(attribute.to_string()))?,
			// No attribute named: unambiguous only with a single dropdown
			None => self
				.schema
				.first_field_of_type(WIDGET_TYPE)
				.ok_or_else(|| DropdownError::FieldNotFound("_attribute".to_string()))?,
		};
		let config = RelationFieldConfig::from_descriptor(field);

		let relation = self.owner.require_relation(&config.attribute)?;
		let related = Arc::clone(&relation.related);
		let key_column = related.key_column.clone();
		let display_column = config.display_column(&key_column).to_string();

		let mut query = RelationQuery::new(related.table.clone());
		if let Some(order) = &config.order {
			query = query.order_by_raw(order.clone());
		}
		if let Some(scope) = &config.scope {
			related.apply_scope(scope, &config.attribute, &mut query)?;
		}

		if let Some(q) = request.q.as_deref().filter(|q| !q.is_empty()) {
			let display_target = match &config.select {
				Some(expr) => FilterTarget::Expr(expr.clone()),
				None => FilterTarget::Column(display_column.clone()),
			};
			query = query.and_where(FilterCondition::or_filters(vec![
				Filter::contains(FilterTarget::Column(key_column.clone()), q),
				Filter::contains(display_target, q),
			]));
		}

		// page is request-supplied; saturate instead of overflowing
		let page = request.page.unwrap_or(1).max(1);
		query = query
			.offset(page.saturating_sub(1).saturating_mul(config.limit))
			.limit(config.limit)
			.select(match &config.select {
				Some(expr) => SelectClause::DisplayExpr {
					key_column: key_column.clone(),
					expr: expr.clone(),
					all_columns: false,
				},
				None if display_column == key_column => {
					SelectClause::Columns(vec![key_column.clone()])
				}
				None => SelectClause::Columns(vec![key_column.clone(), display_column.clone()]),
			});

		tracing::debug!(
			attribute = %config.attribute,
			table = %related.table,
			page,
			limit = config.limit,
			"running relation dropdown search"
		);

		let records = self.db.fetch(&query).await?;
		let count = records.len() as u64;

		let text_column = if config.select.is_some() {
			SELECTION_COLUMN
		} else {
			display_column.as_str()
		};
		let mut results: Vec<SearchResult> = records
			.iter()
			.map(|record| SearchResult {
				id: record.get(&key_column).cloned().unwrap_or(Value::Null),
				text: value_text(record.get(text_column)),
			})
			.collect();

		// The clearable blank entry only leads the first page
		if page == 1 {
			if let Some(label) = &config.empty_option {
				results.insert(
					0,
					SearchResult {
						id: json!(""),
						text: label.clone(),
					},
				);
			}
		}

		Ok(ResultPage {
			results,
			has_more: count == config.limit,
		})
	}
}
