//! Relation field configuration resolution
//!
//! Configuration is resolved fresh per request by scanning the owning
//! form's schema for the descriptor matching the requested attribute name
//! and this widget's type tag. Nothing is cached between requests:
//! concurrent searches against distinct dropdown fields on one form must
//! not see each other's configuration.

use crate::error::{DropdownError, DropdownResult};
use crate::schema::{FieldDescriptor, FormSchema, WIDGET_TYPE};

/// Default number of records per search result page
pub const DEFAULT_SEARCH_LIMIT: u64 = 20;

/// Default minimum input length before the client starts searching
pub const DEFAULT_MIN_INPUT_LENGTH: u32 = 1;

/// Default client-side delay before a search request fires, in milliseconds
pub const DEFAULT_AJAX_DELAY_MS: u32 = 300;

/// Attribute key carrying the minimum input length
pub const ATTR_MIN_INPUT_LENGTH: &str = "data-minimum-input-length";

/// Attribute key carrying the request delay
pub const ATTR_AJAX_DELAY: &str = "data-ajax--delay";

/// Resolved configuration for one relation dropdown field
///
/// `min_input_length` and `ajax_delay_ms` keep their caller-supplied
/// values as `Option` so the renderer can tell "caller set this" apart
/// from "apply the default"; the accessor methods fold in the defaults.
#[derive(Debug, Clone)]
pub struct RelationFieldConfig {
	/// Relation attribute name on the owning model
	pub attribute: String,
	/// Display column on the related entity
	pub name_from: Option<String>,
	/// Computed display expression; takes precedence over `name_from`
	pub select: Option<String>,
	/// Named filter scope on the related entity
	pub scope: Option<String>,
	/// Raw order clause
	pub order: Option<String>,
	/// Search page size
	pub limit: u64,
	/// Label for a clearable blank entry on page 1
	pub empty_option: Option<String>,
	min_input_length: Option<u32>,
	ajax_delay_ms: Option<u32>,
}

impl RelationFieldConfig {
	/// Resolve the configuration for `attribute` from a form schema
	///
	/// Scans the full schema tree for the first field whose name matches
	/// `attribute` and whose type tag matches this widget. Fails with
	/// [`DropdownError::FieldNotFound`] when no such field exists.
	///
	/// # Examples
	///
	/// ```
	/// use relation_dropdown::config::RelationFieldConfig;
	/// use relation_dropdown::schema::{FieldDescriptor, FormSchema};
	///
	/// let schema = FormSchema::new()
	///     .field(FieldDescriptor::dropdown("user").name_from("email").limit(50));
	///
	/// let config = RelationFieldConfig::resolve(&schema, "user").unwrap();
	/// assert_eq!(config.limit, 50);
	/// assert_eq!(config.name_from.as_deref(), Some("email"));
	/// assert_eq!(config.min_input_length(), 1);
	/// ```
	pub fn resolve(schema: &FormSchema, attribute: &str) -> DropdownResult<Self> {
		let field = schema
			.find_field(attribute, WIDGET_TYPE)
			.ok_or_else(|| DropdownError::FieldNotFound(attribute.to_string()))?;
		Ok(Self::from_descriptor(field))
	}

	/// Build a configuration from an already-located field descriptor
	pub fn from_descriptor(field: &FieldDescriptor) -> Self {
		Self {
			attribute: field.name.clone(),
			name_from: field.name_from.clone(),
			select: field.select.clone(),
			scope: field.scope.clone(),
			order: field.order.clone(),
			limit: field.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
			empty_option: field.empty_option.clone(),
			min_input_length: attr_u32(field, ATTR_MIN_INPUT_LENGTH),
			ajax_delay_ms: attr_u32(field, ATTR_AJAX_DELAY),
		}
	}

	/// Minimum input length, defaulting to [`DEFAULT_MIN_INPUT_LENGTH`]
	pub fn min_input_length(&self) -> u32 {
		self.min_input_length.unwrap_or(DEFAULT_MIN_INPUT_LENGTH)
	}

	/// Whether the caller set the minimum input length explicitly
	pub fn has_min_input_length(&self) -> bool {
		self.min_input_length.is_some()
	}

	/// Request delay in milliseconds, defaulting to [`DEFAULT_AJAX_DELAY_MS`]
	pub fn ajax_delay_ms(&self) -> u32 {
		self.ajax_delay_ms.unwrap_or(DEFAULT_AJAX_DELAY_MS)
	}

	/// Whether the caller set the request delay explicitly
	pub fn has_ajax_delay(&self) -> bool {
		self.ajax_delay_ms.is_some()
	}

	/// Display column used for search and result text
	///
	/// Falls back to the related entity's key column when neither
	/// `name_from` nor `select` is configured.
	pub fn display_column<'a>(&'a self, key_column: &'a str) -> &'a str {
		self.name_from.as_deref().unwrap_or(key_column)
	}
}

fn attr_u32(field: &FieldDescriptor, key: &str) -> Option<u32> {
	let value = field.attributes.get(key)?;
	match value {
		serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
		serde_json::Value::String(s) => s.parse().ok(),
		_ => None,
	}
}
