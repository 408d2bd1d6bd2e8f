//! Pattern documents: the serializable form of type patterns.
//!
//! A pattern document is an ordered list of `{typename, predicate}` items.
//! Each predicate is a nested `{type, args}` expression. List order and field
//! order are preserved on both load and dump, since the order of patterns is
//! their priority.
//!
//! ```yaml
//! - typename: INTEGER
//!   predicate:
//!     type: all-of
//!     args:
//!     - type: compatible
//!       args: int
//!     - type: not
//!       args:
//!       - type: match
//!         args: ^0[0-9]+
//! - typename: TEXT
//!   predicate:
//!     type: any
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::Result;

/// A predicate expression as written in a pattern document.
///
/// Both fields are optional at the document level so that a missing `type`
/// surfaces as an interpretation error when the expression is compiled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredicateExpr {
    /// Predicate kind, e.g. `compatible` or `all-of`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Kind-specific arguments; a single value stands for a one-element list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Argument>,
}

impl PredicateExpr {
    /// Creates an expression of the given kind with arguments.
    pub fn new(kind: impl Into<String>, args: impl Into<Argument>) -> Self {
        Self {
            kind: Some(kind.into()),
            args: Some(args.into()),
        }
    }

    /// Creates an expression of the given kind without arguments.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            args: None,
        }
    }
}

/// An argument of a predicate expression.
///
/// Integer literals that do not fit in an `i64` are kept as their decimal
/// digits, so bounds such as `NUMERIC(38)` limits compare exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    /// A list of arguments
    List(Vec<Argument>),
    /// A nested predicate expression
    Expr(Box<PredicateExpr>),
    /// An integer literal
    Integer(i64),
    /// An integer literal outside the `i64` range, as decimal digits
    BigInteger(String),
    /// A floating point literal
    Float(f64),
    /// A string literal
    Text(String),
}

impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ArgumentVisitor)
    }
}

struct ArgumentVisitor;

impl<'de> Visitor<'de> for ArgumentVisitor {
    type Value = Argument;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a predicate, a list of arguments, a number or a string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Argument, E> {
        Ok(Argument::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Argument, E> {
        Ok(i64::try_from(value)
            .map(Argument::Integer)
            .unwrap_or_else(|_| Argument::BigInteger(value.to_string())))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> std::result::Result<Argument, E> {
        Ok(i64::try_from(value)
            .map(Argument::Integer)
            .unwrap_or_else(|_| Argument::BigInteger(value.to_string())))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> std::result::Result<Argument, E> {
        Ok(i64::try_from(value)
            .map(Argument::Integer)
            .unwrap_or_else(|_| Argument::BigInteger(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Argument, E> {
        Ok(Argument::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Argument, E> {
        Ok(Argument::Text(value.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> std::result::Result<Argument, A::Error> {
        Vec::<Argument>::deserialize(SeqAccessDeserializer::new(seq)).map(Argument::List)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<Argument, A::Error> {
        PredicateExpr::deserialize(MapAccessDeserializer::new(map))
            .map(|expr| Argument::Expr(Box::new(expr)))
    }
}

impl Argument {
    /// Normalizes the argument into a list; scalars become one-element lists.
    pub fn into_list(self) -> Vec<Argument> {
        match self {
            Argument::List(items) => items,
            other => vec![other],
        }
    }

    /// Returns a short description of the argument kind for error messages.
    pub fn describe(&self) -> String {
        match self {
            Argument::Expr(expr) => format!(
                "predicate `{}`",
                expr.kind.as_deref().unwrap_or("<missing type>")
            ),
            Argument::List(items) => format!("list of {} items", items.len()),
            Argument::Integer(value) => value.to_string(),
            Argument::BigInteger(digits) => digits.clone(),
            Argument::Float(value) => value.to_string(),
            Argument::Text(value) => format!("\"{value}\""),
        }
    }
}

impl From<PredicateExpr> for Argument {
    fn from(expr: PredicateExpr) -> Self {
        Argument::Expr(Box::new(expr))
    }
}

impl From<Vec<PredicateExpr>> for Argument {
    fn from(exprs: Vec<PredicateExpr>) -> Self {
        Argument::List(exprs.into_iter().map(Argument::from).collect())
    }
}

impl From<Vec<Argument>> for Argument {
    fn from(items: Vec<Argument>) -> Self {
        Argument::List(items)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Integer(value)
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Argument::Float(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Text(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Text(value)
    }
}

/// One entry of a pattern document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypePatternSpec {
    /// SQL type name emitted when this pattern is selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typename: Option<String>,
    /// Predicate every non-null value of the column must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<PredicateExpr>,
}

impl TypePatternSpec {
    /// Creates a pattern entry.
    pub fn new(typename: impl Into<String>, predicate: PredicateExpr) -> Self {
        Self {
            typename: Some(typename.into()),
            predicate: Some(predicate),
        }
    }
}

/// Format of a pattern document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Picks the format from a file extension; anything but `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Reads a pattern document from a reader.
pub fn read_patterns<R: Read>(reader: R, format: DocumentFormat) -> Result<Vec<TypePatternSpec>> {
    let patterns = match format {
        DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
        DocumentFormat::Json => serde_json::from_reader(reader)?,
    };
    Ok(patterns)
}

/// Loads a pattern document from a file.
pub fn load_patterns(path: &Path) -> Result<Vec<TypePatternSpec>> {
    info!(path = %path.display(), "The pattern file will be used");
    let file = File::open(path)?;
    read_patterns(BufReader::new(file), DocumentFormat::from_path(path))
}

/// Writes a pattern document.
pub fn write_patterns<W: Write>(
    writer: W,
    patterns: &[TypePatternSpec],
    format: DocumentFormat,
) -> Result<()> {
    match format {
        DocumentFormat::Yaml => serde_yaml::to_writer(writer, patterns)?,
        DocumentFormat::Json => serde_json::to_writer_pretty(writer, patterns)?,
    }
    Ok(())
}
