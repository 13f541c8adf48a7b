//! Error types for the relation dropdown widget

use thiserror::Error;

/// Widget error type
///
/// Configuration mistakes (a scope referenced in the form schema but not
/// implemented on the related entity, an attribute that is not a relation)
/// are terminal for the request and carry enough context to point the form
/// author at the offending declaration. Data-store failures are passed
/// through opaquely for the host's generic error surface.
#[derive(Debug, Error)]
pub enum DropdownError {
	/// Scope referenced in the field configuration but absent on the entity
	#[error("Model '{model}' has no scope named '{scope}' (referenced by field '{field}')")]
	ScopeNotFound {
		model: String,
		scope: String,
		field: String,
	},

	/// No field with the given name and widget type in the form schema
	#[error("Field '{0}' was not found in the form schema")]
	FieldNotFound(String),

	/// Attribute is not a configured relation on the owning model
	#[error("Attribute '{attribute}' is not a relation on model '{model}'")]
	RelationNotFound { model: String, attribute: String },

	/// Data-store failure, propagated from the execution backend
	#[error("Database error: {0}")]
	Database(String),
}

/// Result type for widget operations
pub type DropdownResult<T> = Result<T, DropdownError>;
