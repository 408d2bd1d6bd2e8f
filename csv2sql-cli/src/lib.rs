//! Command line interface for csv2sql.
//!
//! Argument definitions live here so that they can be tested without spawning
//! the binary.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use csv2sql::engines::EngineKind;
use csv2sql::logging::setup::LoggingConfig;
use csv2sql::logging::LogConfig;
use csv2sql::pipeline::{self, DumpConfig, DEFAULT_LINES_FOR_INFERENCE};
use csv2sql::sources::parse_delimiter;
use tracing::{info, Level};

/// Convert CSV data into an SQL dump.
#[derive(Parser, Debug)]
#[command(
    name = "csv2sql",
    author,
    version,
    about,
    long_about = None,
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print version
    #[arg(
        short = 'v',
        long,
        action = ArgAction::Version,
        value_parser = clap::value_parser!(bool)
    )]
    version: (),

    /// Log format written to stderr
    #[arg(
        long,
        value_enum,
        env = "CSV2SQL_LOG_FORMAT",
        default_value_t = LogFormat::Text,
        global = true
    )]
    pub log_format: LogFormat,

    /// Log filter directives, e.g. `csv2sql=trace`; `RUST_LOG` still wins
    #[arg(long, value_name = "FILTER", env = "CSV2SQL_LOG", global = true)]
    pub log_filter: Option<String>,

    /// Log debug details, including type pattern cursor moves
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log warnings and errors only
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// What to dump.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// All queries: the schema followed by the data
    All(SchemaArgs),
    /// Schema queries
    Schema(SchemaArgs),
    /// Data-insertion queries
    Data(DataArgs),
    /// Type-inference patterns
    Pattern(PatternArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Input file [default: stdin]
    #[arg(short, long, value_name = "PATH")]
    pub in_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output file [default: stdout]
    #[arg(short, long, value_name = "PATH")]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EngineArgs {
    /// Query engine
    #[arg(
        short,
        long,
        value_name = "ENGINE",
        default_value = "psql",
        value_parser = PossibleValuesParser::new(EngineKind::NAMES.iter().copied())
            .try_map(|name| name.parse::<EngineKind>())
    )]
    pub query_engine: EngineKind,
}

#[derive(Args, Debug)]
pub struct CsvArgs {
    /// Input delimiter; `\t` stands for tab
    #[arg(short, long, value_name = "STR", default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Null string
    #[arg(short, long, value_name = "STR", default_value = "")]
    pub null: String,
}

#[derive(Args, Debug)]
pub struct PatternFileArgs {
    /// Type inference pattern file (YAML, or JSON with a .json extension)
    #[arg(short, long, value_name = "PATH")]
    pub pattern_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
    #[command(flatten)]
    pub csv: CsvArgs,

    /// Table name
    pub table_name: String,

    /// Rebuild the table by a query such as "DROP TABLE IF EXISTS"
    #[arg(short, long)]
    pub rebuild: bool,

    /// Set a column type, skipping inference for that column. For example,
    /// `-t "2:VARCHAR(255)"` sets the type of the 2nd column. Can be repeated.
    #[arg(short = 't', long = "column-type", value_name = "IDX:TYPE", value_parser = parse_column_type)]
    pub column_types: Vec<(usize, String)>,

    /// Number of records used to identify column types; 0 uses the whole input
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_LINES_FOR_INFERENCE)]
    pub lines_for_inference: usize,

    #[command(flatten)]
    pub patterns: PatternFileArgs,
}

#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
    #[command(flatten)]
    pub csv: CsvArgs,

    /// Table name
    pub table_name: String,

    /// Rebuild the table by a query such as "TRUNCATE TABLE"
    #[arg(short, long)]
    pub rebuild: bool,
}

#[derive(Args, Debug)]
pub struct PatternArgs {
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
    #[command(flatten)]
    pub patterns: PatternFileArgs,
}

/// Parses a `IDX:TYPE` column type, turning the 1-based index 0-based.
///
/// The type name may itself contain `:`.
pub fn parse_column_type(text: &str) -> std::result::Result<(usize, String), String> {
    let (index, typename) = text
        .split_once(':')
        .ok_or_else(|| format!("Column type must be specified as \"IDX:TYPE\": {text}"))?;
    let index: i64 = index
        .trim()
        .parse()
        .map_err(|_| format!("Column index must be a number: {index}"))?;
    if index < 1 {
        return Err(format!("Column index must be a positive number: {index}"));
    }
    let index = usize::try_from(index - 1)
        .map_err(|_| format!("Column index is out of range: {index}"))?;
    Ok((index, typename.to_string()))
}

impl Cli {
    /// Logging configuration selected by the global flags.
    pub fn logging_config(&self) -> LoggingConfig {
        let mut config = if self.verbose {
            LoggingConfig::development()
        } else if self.quiet {
            LoggingConfig::default().with_crate_level(Level::WARN)
        } else {
            LoggingConfig::default()
        };
        config = config.with_json_format(self.log_format == LogFormat::Json);
        if let Some(filter) = &self.log_filter {
            config = config.with_env_filter(filter.as_str());
        }
        config
    }

    /// Progress logging of the dump operations.
    pub fn log_config(&self) -> LogConfig {
        if self.verbose {
            LogConfig::verbose()
        } else if self.quiet {
            LogConfig::quiet()
        } else {
            LogConfig::default()
        }
    }
}

impl SchemaArgs {
    fn dump_config(&self, log: LogConfig) -> Result<DumpConfig> {
        let mut builder = DumpConfig::builder(self.table_name.as_str())
            .log(log)
            .delimiter(self.csv.delimiter)
            .null_value(self.csv.null.as_str())
            .rebuild(self.rebuild)
            .column_types(self.column_types.iter().cloned())
            .lines_for_inference(self.lines_for_inference)
            .engine(self.engine.query_engine);
        if let Some(path) = &self.patterns.pattern_file {
            builder = builder.pattern_file(path);
        }
        builder.build().context("Invalid schema options")
    }
}

impl DataArgs {
    fn dump_config(&self, log: LogConfig) -> Result<DumpConfig> {
        DumpConfig::builder(self.table_name.as_str())
            .log(log)
            .delimiter(self.csv.delimiter)
            .null_value(self.csv.null.as_str())
            .rebuild(self.rebuild)
            .engine(self.engine.query_engine)
            .build()
            .context("Invalid data options")
    }
}

impl PatternArgs {
    fn dump_config(&self, log: LogConfig) -> Result<DumpConfig> {
        let mut builder = DumpConfig::builder("patterns")
            .log(log)
            .engine(self.engine.query_engine);
        if let Some(path) = &self.patterns.pattern_file {
            builder = builder.pattern_file(path);
        }
        builder.build().context("Invalid pattern options")
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Runs a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let log = cli.log_config();
    match cli.command {
        Command::All(args) => {
            let config = args.dump_config(log)?;
            let input = open_input(args.input.in_file.as_deref())?;
            let output = open_output(args.output.out_file.as_deref())?;
            let columns =
                pipeline::dump_all(&config, input, output).context("Failed to dump all queries")?;
            info!(columns = columns.len(), table = %config.table_name, "Dump finished");
        }
        Command::Schema(args) => {
            let config = args.dump_config(log)?;
            let input = open_input(args.input.in_file.as_deref())?;
            let output = open_output(args.output.out_file.as_deref())?;
            pipeline::dump_schema(&config, input, output).context("Failed to dump the schema")?;
        }
        Command::Data(args) => {
            let config = args.dump_config(log)?;
            let input = open_input(args.input.in_file.as_deref())?;
            let output = open_output(args.output.out_file.as_deref())?;
            pipeline::dump_data(&config, input, output).context("Failed to dump the data")?;
        }
        Command::Pattern(args) => {
            let config = args.dump_config(log)?;
            let output = open_output(args.output.out_file.as_deref())?;
            pipeline::dump_patterns(&config, output).context("Failed to dump the patterns")?;
        }
    }
    Ok(())
}
