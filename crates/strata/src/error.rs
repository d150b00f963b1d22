//! Error types for strata

use thiserror::Error;

/// Result type alias for strata operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement compilation and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// The reflected type is neither a struct nor a pointer to a struct
    #[error("invalid model type: only structs or single-level pointers to structs are supported")]
    InvalidModelType,

    /// A field name that does not exist on the model
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// A column name that does not exist on the model
    #[error("invalid column: {0}")]
    InvalidColumn(String),

    /// Malformed `key=value` pair in an `orm` field tag
    #[error("invalid tag pair: {0:?}")]
    InvalidTag(String),

    /// A registration option that cannot be applied
    #[error("invalid model option: {0}")]
    InvalidModelOption(String),

    /// An expression kind that is not allowed at this position
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// INSERT with no rows
    #[error("insert requires at least one row")]
    EmptyInsertRow,

    /// UPDATE with no assignments
    #[error("update requires at least one assignment")]
    EmptyUpdateAssignment,

    /// A SET item that cannot be compiled
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    /// HAVING without GROUP BY
    #[error("HAVING clause requires GROUP BY")]
    HavingWithoutGroupBy,

    /// Upsert shape not supported by the dialect
    #[error("on conflict not supported: {0}")]
    UnsupportedOnConflict(String),

    /// A single-row query returned nothing
    #[error("no eligible row")]
    NoEligibleRow,

    /// DELETE rejected because it carries no WHERE clause
    #[error("unsafe delete: DELETE without WHERE clause")]
    UnsafeDelete,

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Error reported by a driver implementation
    #[error("Driver error: {0}")]
    Driver(String),

    /// A transaction body failed and the following rollback failed too
    #[error("{source}; rollback failed: {rollback}")]
    Rollback {
        source: Box<OrmError>,
        rollback: Box<OrmError>,
    },

    /// Query execution error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>) -> Self {
        Self::InvalidField(field.into())
    }

    /// Create an invalid column error
    pub fn invalid_column(column: impl Into<String>) -> Self {
        Self::InvalidColumn(column.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Combine a failed transaction body with the error of its rollback
    pub fn rollback(source: OrmError, rollback: OrmError) -> Self {
        Self::Rollback {
            source: Box::new(source),
            rollback: Box::new(rollback),
        }
    }

    /// Check if this is a "no eligible row" error
    pub fn is_no_eligible_row(&self) -> bool {
        matches!(self, Self::NoEligibleRow)
    }

    /// Check if this is an unsafe delete rejection
    pub fn is_unsafe_delete(&self) -> bool {
        matches!(self, Self::UnsafeDelete)
    }

    /// Check if this error came from a failed rollback
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_error_keeps_both_causes() {
        let err = OrmError::rollback(OrmError::NoEligibleRow, OrmError::driver("conn closed"));
        assert!(err.is_rollback());
        let text = err.to_string();
        assert!(text.contains("no eligible row"));
        assert!(text.contains("conn closed"));
    }

    #[test]
    fn decode_error_names_column() {
        let err = OrmError::decode("age", "out of range");
        assert_eq!(
            err.to_string(),
            "Decode error on column 'age': out of range"
        );
    }
}
