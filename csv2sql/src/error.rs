//! Error types for csv2sql.
//!
//! Every failure the library can report is a variant of [`Csv2SqlError`].
//! Interpretation errors are raised while compiling predicate expressions,
//! before any row is read. Type-inference errors are raised while streaming
//! rows and abort the whole column-set decision.

use std::convert::Infallible;

use thiserror::Error;

/// The main error type for csv2sql.
#[derive(Error, Debug)]
pub enum Csv2SqlError {
    /// A predicate expression or type pattern is malformed.
    #[error("Interpretation error: {0}")]
    Interpretation(String),

    /// Type inference could not assign a type to a column.
    #[error("Type inference error: {0}")]
    TypeInference(String),

    /// A row is too short to supply a value for a column under inference.
    #[error("Type inference error: row {row} has {fields} fields, no value for column {column}")]
    MissingField {
        /// 0-based row number, excluding the header
        row: usize,
        /// Number of fields the row actually has
        fields: usize,
        /// 0-based column index that was requested
        column: usize,
    },

    /// The input has no header row.
    #[error("Input is empty: a header row is required")]
    EmptyInput,

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while reading or writing delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from serialization/deserialization of pattern documents.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),

    /// An error with the operation it interrupted.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Csv2SqlError>,
    },
}

/// A type alias for `Result<T, Csv2SqlError>`.
///
/// # Examples
///
/// ```rust
/// use csv2sql::error::{Csv2SqlError, Result};
///
/// fn pick_type() -> Result<&'static str> {
///     Err(Csv2SqlError::type_inference("no matching pattern for value `x`"))
/// }
///
/// assert!(pick_type().is_err());
/// ```
pub type Result<T> = std::result::Result<T, Csv2SqlError>;

impl Csv2SqlError {
    /// Creates a new interpretation error.
    pub fn interpretation(message: impl Into<String>) -> Self {
        Self::Interpretation(message.into())
    }

    /// Creates a new type-inference error.
    pub fn type_inference(message: impl Into<String>) -> Self {
        Self::TypeInference(message.into())
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns the error underneath any added context.
    pub fn root(&self) -> &Csv2SqlError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true for errors raised while compiling predicate expressions.
    pub fn is_interpretation(&self) -> bool {
        matches!(self.root(), Self::Interpretation(_))
    }

    /// Returns true for errors raised while streaming values into inferrers.
    pub fn is_type_inference(&self) -> bool {
        matches!(
            self.root(),
            Self::TypeInference(_) | Self::MissingField { .. }
        )
    }
}

impl From<serde_json::Error> for Csv2SqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Csv2SqlError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<Infallible> for Csv2SqlError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<Csv2SqlError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            Csv2SqlError::Interpretation(inner) => {
                Csv2SqlError::Interpretation(format!("{}: {inner}", f()))
            }
            Csv2SqlError::TypeInference(inner) => {
                Csv2SqlError::TypeInference(format!("{}: {inner}", f()))
            }
            Csv2SqlError::Configuration(inner) => {
                Csv2SqlError::Configuration(format!("{}: {inner}", f()))
            }
            Csv2SqlError::Serialization(inner) => {
                Csv2SqlError::Serialization(format!("{}: {inner}", f()))
            }
            Csv2SqlError::Internal(inner) => Csv2SqlError::Internal(format!("{}: {inner}", f())),
            Csv2SqlError::Io(inner) => {
                Csv2SqlError::Io(std::io::Error::new(inner.kind(), format!("{}: {inner}", f())))
            }
            other => Csv2SqlError::Context {
                context: f(),
                source: Box::new(other),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpretation_error() {
        let err = Csv2SqlError::interpretation("Predicate type `foo` is invalid");
        assert_eq!(
            err.to_string(),
            "Interpretation error: Predicate type `foo` is invalid"
        );
        assert!(err.is_interpretation());
        assert!(!err.is_type_inference());
    }

    #[test]
    fn test_missing_field() {
        let err = Csv2SqlError::MissingField {
            row: 3,
            fields: 1,
            column: 2,
        };
        assert_eq!(
            err.to_string(),
            "Type inference error: row 3 has 1 fields, no value for column 2"
        );
        assert!(err.is_type_inference());
    }

    #[test]
    fn test_context_keeps_category() {
        let result: Result<()> = Err(Csv2SqlError::interpretation("bad regex"));
        let err = result.context("pattern #2").unwrap_err();
        assert!(err.is_interpretation());
        assert_eq!(err.to_string(), "Interpretation error: pattern #2: bad regex");
    }

    #[test]
    fn test_context_wraps_io() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let err = result.context("opening patterns.yml").unwrap_err();
        assert_eq!(err.to_string(), "IO error: opening patterns.yml: no such file");
        match err {
            Csv2SqlError::Io(inner) => assert_eq!(inner.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected an IO error, got {other:?}"),
        }
    }

    #[test]
    fn test_context_keeps_serialization_category() {
        let result: Result<()> = Err(Csv2SqlError::Serialization("bad indentation".to_string()));
        let err = result.context("reading patterns.yml").unwrap_err();
        assert!(matches!(err, Csv2SqlError::Serialization(_)));
        assert_eq!(
            err.to_string(),
            "Serialization error: reading patterns.yml: bad indentation"
        );
    }

    #[test]
    fn test_context_wraps_other_errors() {
        let result: Result<()> = Err(Csv2SqlError::MissingField {
            row: 0,
            fields: 1,
            column: 1,
        });
        let err = result.context("deciding types").unwrap_err();
        assert!(err.is_type_inference());
        assert!(matches!(err.root(), Csv2SqlError::MissingField { .. }));
        assert!(err.to_string().starts_with("deciding types: Type inference error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
