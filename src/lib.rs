//! Searchable relation dropdown form field
//!
//! A form-field widget for database relations with hundreds or thousands
//! of records: instead of rendering every related record as a select
//! option, the field renders only the current selection and loads search
//! results dynamically, paginated as the user scrolls.
//!
//! Two cooperating parts make up the widget:
//!
//! - [`renderer::FieldRenderer`] runs once per form display. For singular
//!   relations (belongs-to, has-one) it restricts the option set to the
//!   currently selected record and wires up the search widget (handler
//!   identity, attribute context, minimum input length, request delay).
//!   Other relation kinds delegate to the host's default rendering.
//! - [`search::SearchResponder`] runs once per keystroke or scroll. It
//!   resolves the field configuration from the form schema by attribute
//!   name, builds a filtered/ordered/scoped query over the related
//!   entity, paginates it, and returns a result list plus a
//!   "more results available" flag.
//!
//! Field configuration mirrors the declarative form-schema surface:
//!
//! ```yaml
//! user:
//!     type: relation-dropdown
//!     nameFrom: first_name
//!     # or select: CONCAT(first_name, ' ', last_name, ' - ', email)
//!     scope: withPermissions
//!     attributes:
//!         data-minimum-input-length: 3
//!         data-ajax--delay: 300
//! ```
//!
//! Search uses `LIKE '%keyword%'` semantics across the key and display
//! columns. This cannot use indexes and implies a table scan — acceptable
//! for backend forms, worth knowing about for very large tables.
//!
//! # Example
//!
//! ```
//! use relation_dropdown::backend::{record, MemoryDatabase};
//! use relation_dropdown::model::{ModelMeta, RelationDef, RelationKind};
//! use relation_dropdown::schema::{FieldDescriptor, FormSchema};
//! use relation_dropdown::search::{SearchRequest, SearchResponder};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let schema = Arc::new(
//!     FormSchema::new().field(FieldDescriptor::dropdown("author").name_from("name")),
//! );
//! let author = Arc::new(ModelMeta::new("Author", "authors"));
//! let post = Arc::new(
//!     ModelMeta::new("Post", "posts")
//!         .relation("author", RelationDef::new(RelationKind::BelongsTo, author)),
//! );
//! let db = Arc::new(MemoryDatabase::new().table(
//!     "authors",
//!     vec![record(json!({ "id": 1, "name": "Ursula K. Le Guin" }))],
//! ));
//!
//! let responder = SearchResponder::new(schema, post, db);
//! let page = responder
//!     .search(&SearchRequest::new("author").query("guin"))
//!     .await
//!     .unwrap();
//! assert_eq!(page.results[0].text, "Ursula K. Le Guin");
//! # });
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod renderer;
pub mod schema;
pub mod search;
pub mod sql;

pub use backend::{record, MemoryDatabase, Record, RelationDatabase};
pub use config::{
	RelationFieldConfig, DEFAULT_AJAX_DELAY_MS, DEFAULT_MIN_INPUT_LENGTH, DEFAULT_SEARCH_LIMIT,
};
pub use error::{DropdownError, DropdownResult};
pub use model::{ModelMeta, OwnerInstance, PivotDef, RelationDef, RelationKind, TreeMeta};
pub use query::{
	Filter, FilterCondition, FilterOperator, FilterTarget, RelationQuery, SelectClause,
	SELECTION_COLUMN,
};
pub use renderer::{
	FieldOptions, FieldRenderer, RenderOutcome, RenderedField, DROPDOWN_FIELD_TYPE, SEARCH_HANDLER,
};
pub use schema::{FieldDescriptor, FormSchema, SchemaNode, WIDGET_TYPE};
pub use search::{
	Pagination, ResultPage, SearchRequest, SearchResponder, SearchResponse, SearchResult,
};
pub use sql::{to_sql, DatabaseDialect};
