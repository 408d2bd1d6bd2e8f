//! Dump operations wiring the reader, the type decider and an engine.
//!
//! Four dumps are available:
//!
//! - [`dump_schema`]: infer column types from a prefix of the input and write
//!   the table definition
//! - [`dump_data`]: write the statements loading every row
//! - [`dump_all`]: both, reading the input only once
//! - [`dump_patterns`]: write the type pattern that inference would use
//!
//! # Example
//!
//! ```rust
//! use csv2sql::pipeline::{dump_all, DumpConfig};
//!
//! let config = DumpConfig::builder("scores").build().unwrap();
//! let mut out = Vec::new();
//! dump_all(&config, "key,v1\nk1,0\nk2,1\n".as_bytes(), &mut out).unwrap();
//!
//! let sql = String::from_utf8(out).unwrap();
//! assert!(sql.starts_with("CREATE TABLE scores (\n  \"key\" VARCHAR(255),\n  \"v1\" INTEGER\n);\n"));
//! assert!(sql.ends_with("COPY scores FROM STDIN WITH NULL '' CSV;\nk1,0\nk2,1\n\\.\n"));
//! ```

use std::collections::BTreeMap;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::document::{self, DocumentFormat, TypePatternSpec};
use crate::engines::EngineKind;
use crate::error::{Csv2SqlError, ErrorContext, Result};
use crate::inference::{compile_patterns, try_decide_types, DecideOptions, DEFAULT_NULL_VALUE};
use crate::log_progress;
use crate::logging::LogConfig;
use crate::sources::{DelimitedReader, LinesReader, RewindOptions, RewindableLines, DEFAULT_DELIMITER};

/// Rows read for type inference when the caller does not say otherwise.
pub const DEFAULT_LINES_FOR_INFERENCE: usize = 1000;

/// Configuration shared by the dump operations.
#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Name of the target table, written as is
    pub table_name: String,
    /// Field delimiter of the input
    pub delimiter: u8,
    /// Value standing for NULL, both for inference and in the load statement
    pub null_value: String,
    /// Drop or empty the table before creating or loading it
    pub rebuild: bool,
    /// Fixed column types by 0-based index
    pub index_types: BTreeMap<usize, String>,
    /// Rows read for type inference; 0 reads the whole input
    pub lines_for_inference: usize,
    /// Pattern document replacing the engine's default pattern
    pub pattern_file: Option<PathBuf>,
    /// Target SQL dialect
    pub engine: EngineKind,
    /// Buffering of the input while [`dump_all`] reads it twice
    pub rewind: RewindOptions,
    /// Progress logging
    pub log: LogConfig,
}

impl DumpConfig {
    /// Create a new builder for DumpConfig
    pub fn builder(table_name: impl Into<String>) -> DumpConfigBuilder {
        DumpConfigBuilder {
            config: DumpConfig {
                table_name: table_name.into(),
                delimiter: DEFAULT_DELIMITER,
                null_value: DEFAULT_NULL_VALUE.to_string(),
                rebuild: false,
                index_types: BTreeMap::new(),
                lines_for_inference: DEFAULT_LINES_FOR_INFERENCE,
                pattern_file: None,
                engine: EngineKind::default(),
                rewind: RewindOptions::default(),
                log: LogConfig::default(),
            },
        }
    }

    /// Options for the type decider.
    pub fn decide_options(&self) -> DecideOptions {
        DecideOptions::builder()
            .null_value(self.null_value.clone())
            .column_types(self.index_types.clone())
            .build()
    }
}

/// Builder for DumpConfig
#[derive(Debug)]
pub struct DumpConfigBuilder {
    config: DumpConfig,
}

impl DumpConfigBuilder {
    /// Set the input delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Set the value treated as NULL
    pub fn null_value(mut self, null_value: impl Into<String>) -> Self {
        self.config.null_value = null_value.into();
        self
    }

    /// Drop or empty the table first
    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.config.rebuild = rebuild;
        self
    }

    /// Fix the type of a column, given its 0-based index
    pub fn column_type(mut self, index: usize, typename: impl Into<String>) -> Self {
        self.config.index_types.insert(index, typename.into());
        self
    }

    /// Fix the types of several columns at once
    pub fn column_types<I, S>(mut self, index_types: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        self.config
            .index_types
            .extend(index_types.into_iter().map(|(index, typename)| (index, typename.into())));
        self
    }

    /// Set the number of rows read for inference; 0 reads everything
    pub fn lines_for_inference(mut self, lines: usize) -> Self {
        self.config.lines_for_inference = lines;
        self
    }

    /// Use a pattern document instead of the engine's default pattern
    pub fn pattern_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pattern_file = Some(path.into());
        self
    }

    /// Set the target engine
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.config.engine = engine;
        self
    }

    /// Set the rewind buffer options
    pub fn rewind(mut self, rewind: RewindOptions) -> Self {
        self.config.rewind = rewind;
        self
    }

    /// Set the progress logging options
    pub fn log(mut self, log: LogConfig) -> Self {
        self.config.log = log;
        self
    }

    /// Build the DumpConfig
    pub fn build(self) -> Result<DumpConfig> {
        let config = self.config;
        if config.table_name.is_empty() {
            return Err(Csv2SqlError::configuration("Table name must not be empty"));
        }
        if matches!(config.delimiter, b'"' | b'\n' | b'\r') {
            return Err(Csv2SqlError::configuration(format!(
                "Delimiter {:?} cannot be used",
                char::from(config.delimiter)
            )));
        }
        Ok(config)
    }
}

/// Returns the pattern document inference uses under `config`.
pub fn resolve_patterns(config: &DumpConfig) -> Result<Vec<TypePatternSpec>> {
    match &config.pattern_file {
        Some(path) => document::load_patterns(path)
            .with_context(|| format!("reading pattern file {}", path.display())),
        None => Ok(config.engine.engine().type_patterns()),
    }
}

/// Writes the pattern inference would use, as YAML.
#[instrument(skip_all, fields(engine = %config.engine))]
pub fn dump_patterns<W: Write>(config: &DumpConfig, mut out: W) -> Result<()> {
    let patterns = resolve_patterns(config)?;
    document::write_patterns(&mut out, &patterns, DocumentFormat::Yaml)?;
    out.flush()?;
    Ok(())
}

/// Infers column types and writes the table definition.
///
/// Returns the `(column name, type name)` pairs that were written.
#[instrument(skip_all, fields(table = %config.table_name))]
pub fn dump_schema<R: Read, W: Write>(
    config: &DumpConfig,
    input: R,
    mut out: W,
) -> Result<Vec<(String, String)>> {
    let mut reader = DelimitedReader::new(input, config.delimiter);
    let column_names = reader.read_header()?;
    log_progress!(
        config.log,
        columns = %config.log.summarize(&column_names),
        "Column names are identified"
    );

    let limit = match config.lines_for_inference {
        0 => usize::MAX,
        lines => {
            log_progress!(config.log, lines, "Records will be used for type inference");
            lines
        }
    };

    let patterns = compile_patterns(&resolve_patterns(config)?)?;
    let type_names = try_decide_types(
        &patterns,
        reader.rows().take(limit),
        &column_names,
        &config.decide_options(),
    )?;
    log_progress!(
        config.log,
        types = %config.log.summarize(&type_names),
        "Column types are decided"
    );

    let columns: Vec<(String, String)> = column_names.into_iter().zip(type_names).collect();
    config.engine.engine().write_schema_statement(
        &mut out,
        &config.table_name,
        &columns,
        config.rebuild,
    )?;
    out.flush()?;
    Ok(columns)
}

/// Writes the statements loading every row after the header.
#[instrument(skip_all, fields(table = %config.table_name))]
pub fn dump_data<R: Read, W: Write>(config: &DumpConfig, input: R, out: W) -> Result<()> {
    write_data(config, input, out, config.rebuild)
}

fn write_data<R: Read, W: Write>(
    config: &DumpConfig,
    input: R,
    mut out: W,
    rebuild: bool,
) -> Result<()> {
    let mut reader = DelimitedReader::new(input, config.delimiter);
    let header = reader.read_header()?;
    debug!(columns = header.len(), "Skipped the header");

    let mut rows = reader.rows();
    config.engine.engine().write_insert_statement(
        &mut out,
        &config.table_name,
        &mut rows,
        &config.null_value,
        rebuild,
    )?;
    out.flush()?;
    Ok(())
}

/// Writes the table definition followed by the data load.
///
/// The input is read once: lines consumed by inference are buffered and
/// replayed for the data load. The data load never rebuilds, since the table
/// was just created.
#[instrument(skip_all, fields(table = %config.table_name))]
pub fn dump_all<R: BufRead, W: Write>(
    config: &DumpConfig,
    input: R,
    mut out: W,
) -> Result<Vec<(String, String)>> {
    let mut lines = RewindableLines::with_options(input, config.rewind);
    let columns = dump_schema(config, LinesReader::new(&mut lines), &mut out)?;
    if lines.is_spilled() {
        debug!("Inference read past the in-memory buffer");
    }

    lines.rewind()?;
    write_data(config, LinesReader::new(lines.freeze()), &mut out, false)?;
    Ok(columns)
}
