//! Per-column type inferrer.

use tracing::debug;

use crate::error::{Csv2SqlError, Result};
use crate::logging::{truncate_field, DEFAULT_MAX_FIELD_LENGTH};

use super::pattern::TypePattern;

/// Null value used when the caller does not configure one.
pub const DEFAULT_NULL_VALUE: &str = "";

/// Infers the type of one column while reading its values.
///
/// The inferrer holds a cursor into an ordered pattern list. Reading a value
/// moves the cursor forward until a pattern accepts the value; it never moves
/// back, so the inferred type only gets more general as values arrive.
#[derive(Debug, Clone)]
pub struct TypeInferrer<'a> {
    patterns: &'a [TypePattern],
    null_value: &'a str,
    cursor: usize,
}

impl<'a> TypeInferrer<'a> {
    /// Creates an inferrer positioned on the first pattern.
    pub fn new(patterns: &'a [TypePattern], null_value: &'a str) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Csv2SqlError::type_inference("empty pattern list"));
        }
        Ok(Self {
            patterns,
            null_value,
            cursor: 0,
        })
    }

    /// Reads a value, skipping patterns that reject it.
    ///
    /// Null values are ignored. Running out of patterns is an error.
    pub fn read_item(&mut self, item: &str) -> Result<()> {
        if item == self.null_value {
            return Ok(());
        }

        while !self.patterns[self.cursor].accepts(item) {
            if self.cursor + 1 == self.patterns.len() {
                return Err(Csv2SqlError::type_inference(format!(
                    "no matching pattern for value `{item}`"
                )));
            }
            self.cursor += 1;
            debug!(
                value = %truncate_field(item, DEFAULT_MAX_FIELD_LENGTH),
                typename = self.type_name(),
                "Advanced type pattern"
            );
        }
        Ok(())
    }

    /// Type name of the pattern under the cursor.
    pub fn type_name(&self) -> &'a str {
        self.patterns[self.cursor].typename()
    }

    /// Position of the cursor in the pattern list.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PredicateExpr;
    use crate::inference::Predicate;

    fn equals(value: &str) -> Predicate {
        Predicate::compile(&PredicateExpr::new("match", format!("^{value}$"))).unwrap()
    }

    fn patterns() -> Vec<TypePattern> {
        vec![
            TypePattern::new("type1", equals("1")),
            TypePattern::new("type2", equals("2")),
        ]
    }

    fn infer(items: &[&str]) -> Result<String> {
        let patterns = patterns();
        let mut inferrer = TypeInferrer::new(&patterns, DEFAULT_NULL_VALUE)?;
        for item in items {
            inferrer.read_item(item)?;
        }
        Ok(inferrer.type_name().to_string())
    }

    #[test]
    fn test_no_items_keeps_first_pattern() {
        assert_eq!(infer(&[]).unwrap(), "type1");
    }

    #[test]
    fn test_advances_to_matching_pattern() {
        assert_eq!(infer(&["1", "2"]).unwrap(), "type2");
        assert_eq!(infer(&["2"]).unwrap(), "type2");
    }

    #[test]
    fn test_null_is_skipped() {
        assert_eq!(infer(&["", "1", ""]).unwrap(), "type1");
    }

    #[test]
    fn test_unmatched_value() {
        let err = infer(&["0"]).unwrap_err();
        assert!(err.is_type_inference());
        assert!(err.to_string().contains("no matching pattern for value `0`"));
    }

    #[test]
    fn test_cursor_never_moves_back() {
        // "1" would match type1, but type1 was already left behind.
        let err = infer(&["2", "1"]).unwrap_err();
        assert!(err.is_type_inference());
    }

    #[test]
    fn test_custom_null_value() {
        let patterns = patterns();
        let mut inferrer = TypeInferrer::new(&patterns, "NULL").unwrap();
        inferrer.read_item("NULL").unwrap();
        assert_eq!(inferrer.position(), 0);
        // The empty string is an ordinary value once another null is configured.
        assert!(inferrer.read_item("").is_err());
    }

    #[test]
    fn test_empty_pattern_list() {
        let err = TypeInferrer::new(&[], DEFAULT_NULL_VALUE).unwrap_err();
        assert!(err.is_type_inference());
        assert!(err.to_string().contains("empty pattern list"));
    }
}
