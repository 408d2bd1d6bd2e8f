//! Predicate language interpreter.
//!
//! [`Predicate::compile`] turns a [`PredicateExpr`] document into a compiled
//! [`Predicate`], validating every argument up front. Compiled predicates are
//! immutable and can be shared freely between columns.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

use crate::document::{Argument, PredicateExpr};
use crate::error::{Csv2SqlError, Result};

static INTEGER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[+-]?[0-9]+$").expect("Hard-coded regex pattern should be valid")
});

/// Numeric kinds understood by the `compatible` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    Float,
}

impl NumericKind {
    const NAMES: [&'static str; 2] = ["int", "float"];

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(NumericKind::Int),
            "float" => Some(NumericKind::Float),
            _ => None,
        }
    }

    /// Returns true if `value` can be cast to this kind.
    ///
    /// Integers of any length are accepted, leading zeros included.
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            NumericKind::Int => INTEGER_LITERAL.is_match(value),
            NumericKind::Float => value.parse::<f64>().is_ok(),
        }
    }
}

/// Comparison operator of the bound predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
}

impl Comparison {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "less-than" => Some(Comparison::LessThan),
            "less-than-or-equal-to" => Some(Comparison::LessThanOrEqualTo),
            "greater-than" => Some(Comparison::GreaterThan),
            "greater-than-or-equal-to" => Some(Comparison::GreaterThanOrEqualTo),
            _ => None,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqualTo => ordering != Ordering::Greater,
            Comparison::GreaterThan => ordering == Ordering::Greater,
            Comparison::GreaterThanOrEqualTo => ordering != Ordering::Less,
        }
    }
}

/// A compiled predicate over a single text value.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Value can be cast to the numeric kind
    Compatible(NumericKind),
    /// Value is a decimal literal that compares against `bound` as `op` says
    Compare { op: Comparison, bound: BigDecimal },
    /// Value has fewer characters than the limit
    ShorterThan(usize),
    /// Regex is found somewhere in the value
    Match(Regex),
    AllOf(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
    Not(Box<Predicate>),
    Any,
}

impl Predicate {
    /// Compiles a predicate expression.
    ///
    /// A single non-list argument is treated as a one-element argument list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use csv2sql::document::PredicateExpr;
    /// use csv2sql::inference::Predicate;
    ///
    /// let predicate = Predicate::compile(&PredicateExpr::new("shorter-than", 5_i64)).unwrap();
    /// assert!(predicate.test("psql"));
    /// assert!(!predicate.test("mysql"));
    /// ```
    pub fn compile(expr: &PredicateExpr) -> Result<Self> {
        let kind = expr
            .kind
            .as_deref()
            .ok_or_else(|| Csv2SqlError::interpretation("Predicate type must be specified"))?;
        let args = expr.args.clone().map(Argument::into_list).unwrap_or_default();

        if let Some(op) = Comparison::from_name(kind) {
            return compile_compare(kind, op, &args);
        }

        match kind {
            "compatible" => compile_compatible(&args),
            "shorter-than" => compile_shorter_than(&args),
            "match" => compile_match(&args),
            "all-of" => Ok(Predicate::AllOf(compile_children(kind, &args)?)),
            "any-of" => Ok(Predicate::AnyOf(compile_children(kind, &args)?)),
            "not" => {
                let child = single_arg(kind, &args)?;
                Ok(Predicate::Not(Box::new(compile_child(kind, child)?)))
            }
            "any" => {
                if !args.is_empty() {
                    return Err(Csv2SqlError::interpretation(format!(
                        "Any predicate takes no argument, given {}",
                        args.len()
                    )));
                }
                Ok(Predicate::Any)
            }
            other => Err(Csv2SqlError::interpretation(format!(
                "Predicate type `{other}` is invalid"
            ))),
        }
    }

    /// Evaluates the predicate against a value.
    pub fn test(&self, value: &str) -> bool {
        match self {
            Predicate::Compatible(kind) => kind.accepts(value),
            Predicate::Compare { op, bound } => parse_decimal(value.trim())
                .map(|decimal| op.holds(compare_decimals(&decimal, bound)))
                .unwrap_or(false),
            Predicate::ShorterThan(limit) => value.chars().count() < *limit,
            Predicate::Match(regex) => regex.is_match(value),
            Predicate::AllOf(children) => children.iter().all(|child| child.test(value)),
            Predicate::AnyOf(children) => children.iter().any(|child| child.test(value)),
            Predicate::Not(child) => !child.test(value),
            Predicate::Any => true,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compatible(NumericKind::Int) => write!(f, "compatible(int)"),
            Predicate::Compatible(NumericKind::Float) => write!(f, "compatible(float)"),
            Predicate::Compare { op, bound } => {
                let name = match op {
                    Comparison::LessThan => "less-than",
                    Comparison::LessThanOrEqualTo => "less-than-or-equal-to",
                    Comparison::GreaterThan => "greater-than",
                    Comparison::GreaterThanOrEqualTo => "greater-than-or-equal-to",
                };
                write!(f, "{name}({bound})")
            }
            Predicate::ShorterThan(limit) => write!(f, "shorter-than({limit})"),
            Predicate::Match(regex) => write!(f, "match({})", regex.as_str()),
            Predicate::AllOf(children) => write_children(f, "all-of", children),
            Predicate::AnyOf(children) => write_children(f, "any-of", children),
            Predicate::Not(child) => write!(f, "not({child})"),
            Predicate::Any => write!(f, "any()"),
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, name: &str, children: &[Predicate]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (index, child) in children.iter().enumerate() {
        if index != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

fn single_arg<'a>(kind: &str, args: &'a [Argument]) -> Result<&'a Argument> {
    match args {
        [arg] => Ok(arg),
        _ => Err(Csv2SqlError::interpretation(format!(
            "Predicate `{kind}` takes only 1 argument, given {}",
            args.len()
        ))),
    }
}

fn compile_compatible(args: &[Argument]) -> Result<Predicate> {
    let arg = single_arg("compatible", args)?;
    let kind = match arg {
        Argument::Text(name) => NumericKind::from_name(name),
        _ => None,
    };
    kind.map(Predicate::Compatible).ok_or_else(|| {
        Csv2SqlError::interpretation(format!(
            "Predicate `compatible` takes one of ({}), given {}",
            NumericKind::NAMES.join("|"),
            arg.describe()
        ))
    })
}

fn compile_compare(kind: &str, op: Comparison, args: &[Argument]) -> Result<Predicate> {
    let arg = single_arg(kind, args)?;
    let bound = match arg {
        Argument::Integer(value) => Some(BigDecimal::from(*value)),
        Argument::BigInteger(digits) => parse_decimal(digits),
        Argument::Float(value) => parse_decimal(&value.to_string()),
        Argument::Text(value) => parse_decimal(value.trim()),
        _ => None,
    };
    let bound = bound.ok_or_else(|| {
        Csv2SqlError::interpretation(format!(
            "Predicate `{kind}` takes only a decimal argument, given {}",
            arg.describe()
        ))
    })?;
    Ok(Predicate::Compare { op, bound })
}

fn compile_shorter_than(args: &[Argument]) -> Result<Predicate> {
    let arg = single_arg("shorter-than", args)?;
    let limit = match arg {
        Argument::Integer(value) => usize::try_from(*value).ok(),
        Argument::Text(value) => value.trim().parse::<usize>().ok(),
        _ => None,
    };
    limit.map(Predicate::ShorterThan).ok_or_else(|| {
        Csv2SqlError::interpretation(format!(
            "Predicate `shorter-than` takes only a non-negative integer argument, given {}",
            arg.describe()
        ))
    })
}

fn compile_match(args: &[Argument]) -> Result<Predicate> {
    let arg = single_arg("match", args)?;
    let Argument::Text(pattern) = arg else {
        return Err(Csv2SqlError::interpretation(format!(
            "Predicate `match` takes only a regex string, given {}",
            arg.describe()
        )));
    };
    let regex = Regex::new(pattern).map_err(|e| {
        Csv2SqlError::interpretation(format!(
            "Predicate `match` was given an invalid regex \"{pattern}\": {e}"
        ))
    })?;
    Ok(Predicate::Match(regex))
}

fn compile_children(kind: &str, args: &[Argument]) -> Result<Vec<Predicate>> {
    args.iter().map(|arg| compile_child(kind, arg)).collect()
}

fn compile_child(kind: &str, arg: &Argument) -> Result<Predicate> {
    match arg {
        Argument::Expr(expr) => Predicate::compile(expr),
        other => Err(Csv2SqlError::interpretation(format!(
            "Predicate `{kind}` takes only predicate arguments, given {}",
            other.describe()
        ))),
    }
}

/// Parses an arbitrary-precision decimal literal, with or without an exponent.
fn parse_decimal(value: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(value).ok()
}

/// Compares two decimals exactly.
///
/// Signs and orders of magnitude are compared first, so a literal such as
/// `1e999999999` is never expanded into its digits.
fn compare_decimals(left: &BigDecimal, right: &BigDecimal) -> Ordering {
    let (left_digits, left_scale) = left.as_bigint_and_exponent();
    let (right_digits, right_scale) = right.as_bigint_and_exponent();

    let sign = left_digits.sign().cmp(&right_digits.sign());
    if sign != Ordering::Equal || left_digits.sign() == Sign::NoSign {
        return sign;
    }

    let magnitude =
        leading_position(&left_digits, left_scale).cmp(&leading_position(&right_digits, right_scale));
    let magnitude = match left_digits.sign() {
        Sign::Minus => magnitude.reverse(),
        _ => magnitude,
    };
    if magnitude != Ordering::Equal {
        return magnitude;
    }
    left.cmp(right)
}

/// Position of the most significant digit of `digits * 10^-scale`.
fn leading_position(digits: &BigInt, scale: i64) -> i128 {
    let length = digits.magnitude().to_str_radix(10).len();
    i128::try_from(length)
        .unwrap_or(i128::MAX)
        .saturating_sub(i128::from(scale))
}
