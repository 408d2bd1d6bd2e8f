//! # csv2sql - CSV to SQL dumps
//!
//! csv2sql turns delimited text into SQL statements: a `CREATE TABLE` whose
//! column types are inferred from the data, and a bulk load of the rows.
//!
//! ## Quick Start
//!
//! ```rust
//! use csv2sql::prelude::*;
//!
//! # fn main() -> csv2sql::error::Result<()> {
//! let config = DumpConfig::builder("users")
//!     .rebuild(true)
//!     .column_type(0, "BIGINT")
//!     .build()?;
//!
//! let input = "id,name,score\n1,alice,0.5\n2,bob,\n";
//! let mut out = Vec::new();
//! let columns = dump_all(&config, input.as_bytes(), &mut out)?;
//!
//! assert_eq!(columns[0], ("id".to_string(), "BIGINT".to_string()));
//! assert_eq!(columns[1].1, "VARCHAR(255)");
//! assert_eq!(columns[2].1, "DOUBLE PRECISION");
//! # Ok(())
//! # }
//! ```
//!
//! ## Type inference
//!
//! Column types come from a *type pattern*: an ordered list of SQL type names,
//! each guarded by a predicate over the text of a value. For every column,
//! inference keeps a cursor on the first pattern that accepted all values seen
//! so far, and only ever moves it forward. Patterns are plain documents (YAML
//! or JSON), so a pattern can be dumped, edited and fed back:
//!
//! ```yaml
//! - typename: INTEGER
//!   predicate:
//!     type: compatible
//!     args: int
//! - typename: TEXT
//!   predicate:
//!     type: any
//! ```
//!
//! Predicate kinds are `compatible` (`int` or `float`), `less-than`,
//! `less-than-or-equal-to`, `greater-than`, `greater-than-or-equal-to`,
//! `shorter-than`, `match`, `all-of`, `any-of`, `not` and `any`.
//!
//! ## Architecture
//!
//! - **`document`**: serializable pattern documents
//! - **`inference`**: predicate compiler, per-column inferrer, column-set decider
//! - **`sources`**: delimited reader and the rewindable line buffer
//! - **`engines`**: SQL dialects (PostgreSQL)
//! - **`pipeline`**: the schema, data, all and pattern dumps
//! - **`logging`**: structured logging setup

pub mod document;
pub mod engines;
pub mod error;
pub mod inference;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod sources;
