//! Prelude for commonly used types and traits in csv2sql.

pub use crate::document::{DocumentFormat, PredicateExpr, TypePatternSpec};
pub use crate::engines::{EngineKind, QueryEngine};
pub use crate::error::{Csv2SqlError, ErrorContext, Result};
pub use crate::inference::{compile_patterns, decide_types, DecideOptions, TypePattern};
pub use crate::logging::LogConfig;
pub use crate::pipeline::{dump_all, dump_data, dump_patterns, dump_schema, DumpConfig};
pub use crate::sources::{RewindOptions, RewindableLines};
