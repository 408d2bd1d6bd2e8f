//! Column-set type decider.

use std::collections::BTreeMap;
use std::convert::Infallible;

use tracing::{debug, instrument};

use crate::error::{Csv2SqlError, ErrorContext, Result};

use super::inferrer::{TypeInferrer, DEFAULT_NULL_VALUE};
use super::pattern::TypePattern;

/// Options for [`decide_types`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecideOptions {
    /// Value treated as NULL and skipped by inference (default: empty string)
    pub null_value: String,
    /// Fixed type names by 0-based column index; these columns are not inferred
    pub index_types: BTreeMap<usize, String>,
}

impl Default for DecideOptions {
    fn default() -> Self {
        Self {
            null_value: DEFAULT_NULL_VALUE.to_string(),
            index_types: BTreeMap::new(),
        }
    }
}

impl DecideOptions {
    /// Create a new builder for DecideOptions
    pub fn builder() -> DecideOptionsBuilder {
        DecideOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for DecideOptions
#[derive(Debug, Default)]
pub struct DecideOptionsBuilder {
    options: DecideOptions,
}

impl DecideOptionsBuilder {
    /// Set the value treated as NULL
    pub fn null_value(mut self, null_value: impl Into<String>) -> Self {
        self.options.null_value = null_value.into();
        self
    }

    /// Fix the type of a column, given its 0-based index
    pub fn column_type(mut self, index: usize, typename: impl Into<String>) -> Self {
        self.options.index_types.insert(index, typename.into());
        self
    }

    /// Fix the types of several columns at once
    pub fn column_types<I, S>(mut self, index_types: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        self.options
            .index_types
            .extend(index_types.into_iter().map(|(index, typename)| (index, typename.into())));
        self
    }

    /// Build the DecideOptions
    pub fn build(self) -> DecideOptions {
        self.options
    }
}

/// Decides one type name per column from the rows.
///
/// Each column that has no fixed type gets its own inferrer, fed the column's
/// value of every row in order. The result is ordered by column index.
///
/// # Examples
///
/// ```rust
/// use csv2sql::engines::postgresql;
/// use csv2sql::inference::{compile_patterns, decide_types, DecideOptions};
///
/// let patterns = compile_patterns(&postgresql::type_patterns()).unwrap();
/// let rows = vec![vec!["k1", "0"], vec!["k2", "1"]];
/// let types = decide_types(&patterns, rows, &["key", "v1"], &DecideOptions::default()).unwrap();
/// assert_eq!(types, vec!["VARCHAR(255)", "INTEGER"]);
/// ```
pub fn decide_types<I, R, S, N>(
    patterns: &[TypePattern],
    rows: I,
    column_names: &[N],
    options: &DecideOptions,
) -> Result<Vec<String>>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
    N: AsRef<str>,
{
    try_decide_types(
        patterns,
        rows.into_iter().map(Ok::<R, Infallible>),
        column_names,
        options,
    )
}

/// Like [`decide_types`], for row sources that can fail while reading.
///
/// The first read error aborts the decision and is returned as is.
#[instrument(skip_all, fields(columns = column_names.len()))]
pub fn try_decide_types<I, R, S, N, E>(
    patterns: &[TypePattern],
    rows: I,
    column_names: &[N],
    options: &DecideOptions,
) -> Result<Vec<String>>
where
    I: IntoIterator<Item = std::result::Result<R, E>>,
    R: AsRef<[S]>,
    S: AsRef<str>,
    N: AsRef<str>,
    Csv2SqlError: From<E>,
{
    let mut inferrers = (0..column_names.len())
        .filter(|index| !options.index_types.contains_key(index))
        .map(|index| -> Result<_> {
            Ok((index, TypeInferrer::new(patterns, &options.null_value)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut row_count = 0;
    for (row_number, row) in rows.into_iter().enumerate() {
        let row = row?;
        let fields = row.as_ref();
        for (index, inferrer) in inferrers.iter_mut() {
            let value = fields
                .get(*index)
                .ok_or_else(|| Csv2SqlError::MissingField {
                    row: row_number,
                    fields: fields.len(),
                    column: *index,
                })?;
            inferrer.read_item(value.as_ref()).with_context(|| {
                format!("column {index} ({})", column_names[*index].as_ref())
            })?;
        }
        row_count += 1;
    }
    debug!(rows = row_count, "Read rows for type inference");

    let mut inferred = inferrers.into_iter();
    let mut next_inferred = inferred.next();
    let mut type_names = Vec::with_capacity(column_names.len());
    for index in 0..column_names.len() {
        if let Some(typename) = options.index_types.get(&index) {
            type_names.push(typename.clone());
            continue;
        }
        match next_inferred.take() {
            Some((inferred_index, inferrer)) if inferred_index == index => {
                type_names.push(inferrer.type_name().to_string());
                next_inferred = inferred.next();
            }
            _ => {
                return Err(Csv2SqlError::Internal(format!(
                    "no inferrer for column {index}"
                )))
            }
        }
    }
    Ok(type_names)
}
