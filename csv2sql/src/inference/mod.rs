//! Type-pattern inference engine.
//!
//! A type pattern is an ordered list of `(type name, predicate)` pairs, most
//! specific first, with a catch-all last. Inference walks each column's
//! values through the list and settles on the first pattern that accepts all
//! of them:
//!
//! - [`predicate`]: compiles predicate expressions into [`Predicate`] values
//! - [`pattern`]: compiles a pattern document into [`TypePattern`]s
//! - [`inferrer`]: the per-column cursor over the patterns
//! - [`decider`]: runs one inferrer per column across all rows
//!
//! # Example
//!
//! ```rust
//! use csv2sql::document::{PredicateExpr, TypePatternSpec};
//! use csv2sql::inference::{compile_patterns, TypeInferrer};
//!
//! let patterns = compile_patterns(&[
//!     TypePatternSpec::new("INTEGER", PredicateExpr::new("compatible", "int")),
//!     TypePatternSpec::new("TEXT", PredicateExpr::bare("any")),
//! ])
//! .unwrap();
//!
//! let mut inferrer = TypeInferrer::new(&patterns, "").unwrap();
//! inferrer.read_item("42").unwrap();
//! assert_eq!(inferrer.type_name(), "INTEGER");
//! inferrer.read_item("forty-two").unwrap();
//! assert_eq!(inferrer.type_name(), "TEXT");
//! ```

pub mod decider;
pub mod inferrer;
pub mod pattern;
pub mod predicate;

pub use decider::{decide_types, try_decide_types, DecideOptions, DecideOptionsBuilder};
pub use inferrer::{TypeInferrer, DEFAULT_NULL_VALUE};
pub use pattern::{compile_patterns, TypePattern};
pub use predicate::{Comparison, NumericKind, Predicate};
