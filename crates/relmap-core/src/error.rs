//! Error types for relmap operations.

use std::fmt;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for all relmap operations.
#[derive(Debug)]
pub enum Error {
    /// The active dialect lacks a SQL capability a strategy requires.
    ///
    /// Raised once at strategy construction, never at execution time.
    Capability(CapabilityError),
    /// A statement's target entity does not match the component it was
    /// handed to. Raised at handler-build time, before any SQL executes.
    Mismatch(MismatchError),
    /// The code path exists but its behavior is not yet specified.
    Unimplemented(&'static str),
    /// Query execution errors reported by the connection.
    Query(QueryError),
    /// Type conversion errors while reading result values.
    Type(TypeError),
    /// Operation was cancelled via asupersync.
    Cancelled,
    /// Custom error with message.
    Custom(String),
}

/// A missing dialect capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityError {
    /// The dialect that was probed.
    pub dialect: &'static str,
    /// The capability it lacks, e.g. `"non-query CTE"`.
    pub capability: &'static str,
}

/// A target-entity mismatch between a statement and a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchError {
    /// Entity the component was configured for.
    pub expected: String,
    /// Entity the statement actually targets.
    pub actual: String,
}

/// Query execution errors.
#[derive(Debug)]
pub struct QueryError {
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Type conversion errors.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Create a capability error for the given dialect/capability pair.
    pub fn capability(dialect: &'static str, capability: &'static str) -> Self {
        Error::Capability(CapabilityError {
            dialect,
            capability,
        })
    }

    /// Create a target-entity mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::Mismatch(MismatchError {
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    /// Create a query error with just a message.
    pub fn query(message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            sql: None,
            message: message.into(),
            source: None,
        })
    }

    /// Create a query error carrying the offending SQL.
    pub fn query_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Error::Query(QueryError {
            sql: Some(sql.into()),
            message: message.into(),
            source: None,
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Capability(e) => write!(
                f,
                "dialect {} does not support {}",
                e.dialect, e.capability
            ),
            Error::Mismatch(e) => write!(
                f,
                "statement targets entity {} but component is configured for {}",
                e.actual, e.expected
            ),
            Error::Unimplemented(what) => write!(f, "{what} is not yet implemented"),
            Error::Query(e) => match &e.sql {
                Some(sql) => write!(f, "query failed: {} (sql: {})", e.message, sql),
                None => write!(f, "query failed: {}", e.message),
            },
            Error::Type(e) => match &e.column {
                Some(col) => write!(
                    f,
                    "expected {} but found {} in column {}",
                    e.expected, e.actual, col
                ),
                None => write!(f, "expected {} but found {}", e.expected, e.actual),
            },
            Error::Cancelled => write!(f, "operation cancelled"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|s| s as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_display_names_dialect_and_capability() {
        let err = Error::capability("mysql", "non-query CTE");
        assert_eq!(err.to_string(), "dialect mysql does not support non-query CTE");
    }

    #[test]
    fn mismatch_display_names_both_entities() {
        let err = Error::mismatch("Person", "Order");
        let text = err.to_string();
        assert!(text.contains("Order"));
        assert!(text.contains("Person"));
    }

    #[test]
    fn unimplemented_display() {
        assert_eq!(
            Error::Unimplemented("CTE-based bulk update").to_string(),
            "CTE-based bulk update is not yet implemented"
        );
    }
}
