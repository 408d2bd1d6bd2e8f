//! PostgreSQL dialect, loaded with `psql`.
//!
//! Data is loaded with `COPY ... FROM STDIN ... CSV`, so the dump streams rows
//! as CSV between the `COPY` statement and the `\.` end marker.

use std::io::Write;

use csv::{Terminator, WriterBuilder};
use tracing::debug;

use crate::document::{PredicateExpr, TypePatternSpec};
use crate::error::Result;

use super::{QueryEngine, RowIter};

const LINE_TERMINATOR: &str = "\n";

/// Line ending the `COPY` data stream.
const END_OF_DATA: &str = "\\.";

/// The PostgreSQL engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSql;

/// Returns the default PostgreSQL type pattern.
///
/// Integers with a leading zero are kept as text, since the zero would be lost
/// on load. Integers outside the `INTEGER` range fall through to
/// `DOUBLE PRECISION`.
///
/// ```rust
/// use csv2sql::engines::postgresql;
///
/// let names: Vec<_> = postgresql::type_patterns()
///     .into_iter()
///     .filter_map(|pattern| pattern.typename)
///     .collect();
/// assert_eq!(names, vec!["INTEGER", "DOUBLE PRECISION", "VARCHAR(255)", "TEXT"]);
/// ```
pub fn type_patterns() -> Vec<TypePatternSpec> {
    let no_leading_zero =
        || PredicateExpr::new("not", vec![PredicateExpr::new("match", "^0[0-9]+")]);
    vec![
        TypePatternSpec::new(
            "INTEGER",
            PredicateExpr::new(
                "all-of",
                vec![
                    PredicateExpr::new("compatible", "int"),
                    no_leading_zero(),
                    PredicateExpr::new("greater-than-or-equal-to", i64::from(i32::MIN)),
                    PredicateExpr::new("less-than-or-equal-to", i64::from(i32::MAX)),
                ],
            ),
        ),
        TypePatternSpec::new(
            "DOUBLE PRECISION",
            PredicateExpr::new(
                "all-of",
                vec![PredicateExpr::new("compatible", "float"), no_leading_zero()],
            ),
        ),
        TypePatternSpec::new("VARCHAR(255)", PredicateExpr::new("shorter-than", 255_i64)),
        TypePatternSpec::new("TEXT", PredicateExpr::bare("any")),
    ]
}

/// Quotes an identifier, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn is_end_of_data(row: &[String]) -> bool {
    matches!(row, [field] if field == END_OF_DATA)
}

impl QueryEngine for PostgreSql {
    fn name(&self) -> &'static str {
        "psql"
    }

    fn type_patterns(&self) -> Vec<TypePatternSpec> {
        type_patterns()
    }

    fn write_schema_statement(
        &self,
        out: &mut dyn Write,
        table_name: &str,
        columns: &[(String, String)],
        rebuild: bool,
    ) -> Result<()> {
        if rebuild {
            write!(out, "DROP TABLE IF EXISTS {table_name};{LINE_TERMINATOR}")?;
        }

        write!(out, "CREATE TABLE {table_name} ({LINE_TERMINATOR}")?;
        for (index, (column_name, type_name)) in columns.iter().enumerate() {
            if index != 0 {
                write!(out, ",{LINE_TERMINATOR}")?;
            }
            write!(out, "  {} {type_name}", quote_identifier(column_name))?;
        }
        write!(out, "{LINE_TERMINATOR});{LINE_TERMINATOR}")?;
        Ok(())
    }

    fn write_insert_statement(
        &self,
        out: &mut dyn Write,
        table_name: &str,
        rows: &mut RowIter<'_>,
        null_value: &str,
        rebuild: bool,
    ) -> Result<()> {
        if rebuild {
            write!(out, "TRUNCATE TABLE {table_name};{LINE_TERMINATOR}")?;
        }
        write!(
            out,
            "COPY {table_name} FROM STDIN WITH NULL {} CSV;{LINE_TERMINATOR}",
            quote_literal(null_value)
        )?;

        let builder = {
            let mut builder = WriterBuilder::new();
            builder.terminator(Terminator::Any(b'\n')).flexible(true);
            builder
        };

        let mut writer = builder.from_writer(out);
        let mut row_count = 0usize;
        for row in rows {
            let row = row?;
            if is_end_of_data(&row) {
                // A bare `\.` line would end the COPY stream early.
                let out = writer.into_inner().map_err(|e| e.into_error())?;
                write!(out, "\"{END_OF_DATA}\"{LINE_TERMINATOR}")?;
                writer = builder.from_writer(out);
            } else {
                writer.write_record(&row)?;
            }
            row_count += 1;
        }
        let out = writer.into_inner().map_err(|e| e.into_error())?;
        write!(out, "{END_OF_DATA}{LINE_TERMINATOR}")?;
        debug!(rows = row_count, table = table_name, "Wrote COPY data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::compile_patterns;

    fn rows(data: &[&[&str]]) -> Vec<Result<Vec<String>>> {
        data.iter()
            .map(|row| Ok(row.iter().map(|field| field.to_string()).collect()))
            .collect()
    }

    fn schema(columns: &[(&str, &str)], rebuild: bool) -> String {
        let columns: Vec<(String, String)> = columns
            .iter()
            .map(|(name, typename)| (name.to_string(), typename.to_string()))
            .collect();
        let mut out = Vec::new();
        PostgreSql
            .write_schema_statement(&mut out, "users", &columns, rebuild)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn insert(data: &[&[&str]], null_value: &str, rebuild: bool) -> String {
        let mut out = Vec::new();
        let mut rows = rows(data).into_iter();
        PostgreSql
            .write_insert_statement(&mut out, "users", &mut rows, null_value, rebuild)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_default_patterns_compile() {
        let patterns = compile_patterns(&type_patterns()).unwrap();
        let accepting = |value: &str| {
            patterns
                .iter()
                .find(|pattern| pattern.accepts(value))
                .map(|pattern| pattern.typename().to_string())
                .unwrap()
        };
        assert_eq!(accepting("0"), "INTEGER");
        assert_eq!(accepting("-2147483648"), "INTEGER");
        assert_eq!(accepting("2147483647"), "INTEGER");
        assert_eq!(accepting("2147483648"), "DOUBLE PRECISION");
        assert_eq!(accepting("1.5"), "DOUBLE PRECISION");
        assert_eq!(accepting("007"), "VARCHAR(255)");
        assert_eq!(accepting("k1"), "VARCHAR(255)");
        assert_eq!(accepting(&"x".repeat(255)), "TEXT");
    }

    #[test]
    fn test_type_patterns_are_fresh_copies() {
        let mut first = type_patterns();
        first[0].typename = Some("BIGINT".to_string());
        assert_eq!(type_patterns()[0].typename.as_deref(), Some("INTEGER"));
    }

    #[test]
    fn test_schema_statement() {
        assert_eq!(
            schema(&[("id", "INTEGER"), ("name", "TEXT")], false),
            "CREATE TABLE users (\n  \"id\" INTEGER,\n  \"name\" TEXT\n);\n"
        );
    }

    #[test]
    fn test_schema_statement_with_rebuild() {
        assert_eq!(
            schema(&[("id", "INTEGER")], true),
            "DROP TABLE IF EXISTS users;\nCREATE TABLE users (\n  \"id\" INTEGER\n);\n"
        );
    }

    #[test]
    fn test_schema_quotes_column_names() {
        let sql = schema(&[("say \"hi\"", "TEXT")], false);
        assert!(sql.contains("  \"say \"\"hi\"\"\" TEXT"), "{sql}");
    }

    #[test]
    fn test_insert_statement() {
        assert_eq!(
            insert(&[&["k1", "0"], &["k2", "a,b"]], "", false),
            "COPY users FROM STDIN WITH NULL '' CSV;\nk1,0\nk2,\"a,b\"\n\\.\n"
        );
    }

    #[test]
    fn test_insert_statement_with_rebuild_and_null() {
        assert_eq!(
            insert(&[&["1"]], "it's null", true),
            "TRUNCATE TABLE users;\nCOPY users FROM STDIN WITH NULL 'it''s null' CSV;\n1\n\\.\n"
        );
    }

    #[test]
    fn test_insert_escapes_end_of_data_row() {
        assert_eq!(
            insert(&[&["a"], &["\\."], &["b", "\\."]], "", false),
            "COPY users FROM STDIN WITH NULL '' CSV;\na\n\"\\.\"\nb,\\.\n\\.\n"
        );
    }

    #[test]
    fn test_insert_quotes_embedded_newlines_and_quotes() {
        let sql = insert(&[&["line1\nline2", "say \"hi\""]], "", false);
        assert!(
            sql.contains("\"line1\nline2\",\"say \"\"hi\"\"\"\n"),
            "{sql}"
        );
    }

    #[test]
    fn test_insert_propagates_row_errors() {
        let mut out = Vec::new();
        let mut rows = vec![
            Ok(vec!["1".to_string()]),
            Err(crate::error::Csv2SqlError::type_inference("boom")),
        ]
        .into_iter();
        let err = PostgreSql
            .write_insert_statement(&mut out, "users", &mut rows, "", false)
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
