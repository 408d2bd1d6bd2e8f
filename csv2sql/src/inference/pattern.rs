//! Type-pattern compiler.

use crate::document::TypePatternSpec;
use crate::error::{Csv2SqlError, ErrorContext, Result};

use super::predicate::Predicate;

/// A compiled type pattern: a type name guarded by a predicate.
#[derive(Debug, Clone)]
pub struct TypePattern {
    typename: String,
    predicate: Predicate,
}

impl TypePattern {
    pub fn new(typename: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            typename: typename.into(),
            predicate,
        }
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    /// Returns true if the pattern's predicate accepts `value`.
    pub fn accepts(&self, value: &str) -> bool {
        self.predicate.test(value)
    }
}

/// Compiles a pattern document into type patterns, keeping the order.
///
/// Duplicated type names and patterns that can never be reached are left
/// as they are.
pub fn compile_patterns(specs: &[TypePatternSpec]) -> Result<Vec<TypePattern>> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let typename = spec.typename.clone().ok_or_else(|| {
                Csv2SqlError::interpretation(format!(
                    "Type pattern #{index} must specify `typename`"
                ))
            })?;
            let expr = spec.predicate.as_ref().ok_or_else(|| {
                Csv2SqlError::interpretation(format!(
                    "Type pattern `{typename}` must specify `predicate`"
                ))
            })?;
            let predicate = Predicate::compile(expr)
                .with_context(|| format!("in type pattern `{typename}`"))?;
            Ok(TypePattern::new(typename, predicate))
        })
        .collect()
}
