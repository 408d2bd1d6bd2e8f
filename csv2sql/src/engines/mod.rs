//! Query engines: SQL dialects the converter can render.
//!
//! An engine supplies its default type pattern and writes the two statement
//! groups of a dump: the schema (`CREATE TABLE`) and the data load.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::document::TypePatternSpec;
use crate::error::{Csv2SqlError, Result};

pub mod postgresql;

pub use postgresql::PostgreSql;

/// Row stream consumed by [`QueryEngine::write_insert_statement`].
pub type RowIter<'a> = dyn Iterator<Item = Result<Vec<String>>> + 'a;

/// A SQL dialect.
pub trait QueryEngine: Send + Sync {
    /// Name used to select the engine on the command line.
    fn name(&self) -> &'static str;

    /// Returns a fresh copy of the engine's default type pattern.
    fn type_patterns(&self) -> Vec<TypePatternSpec>;

    /// Writes the table definition for `columns`, given as `(name, type)` pairs.
    ///
    /// With `rebuild`, the definition is preceded by a statement dropping any
    /// existing table.
    fn write_schema_statement(
        &self,
        out: &mut dyn Write,
        table_name: &str,
        columns: &[(String, String)],
        rebuild: bool,
    ) -> Result<()>;

    /// Writes the statements loading `rows` into the table.
    ///
    /// With `rebuild`, the load is preceded by a statement emptying the table.
    fn write_insert_statement(
        &self,
        out: &mut dyn Write,
        table_name: &str,
        rows: &mut RowIter<'_>,
        null_value: &str,
        rebuild: bool,
    ) -> Result<()>;
}

/// Engines selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// PostgreSQL, loaded through `psql`
    #[default]
    Psql,
}

impl EngineKind {
    /// Every engine name, in the order they are listed to users.
    pub const NAMES: &'static [&'static str] = &["psql"];

    /// Returns the engine implementation.
    pub fn engine(self) -> &'static dyn QueryEngine {
        match self {
            EngineKind::Psql => &PostgreSql,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.engine().name()
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = Csv2SqlError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "psql" => Ok(EngineKind::Psql),
            other => Err(Csv2SqlError::configuration(format!(
                "Unknown query engine `{other}`, expected one of: {}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}
