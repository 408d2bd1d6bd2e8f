use std::fs;

use clap::error::ErrorKind;
use clap::Parser;
use csv2sql::engines::EngineKind;
use csv2sql_cli::{run, Cli, Command, LogFormat};
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("csv2sql").chain(args.iter().copied())).unwrap()
}

fn parse_err(args: &[&str]) -> String {
    Cli::try_parse_from(std::iter::once("csv2sql").chain(args.iter().copied()))
        .unwrap_err()
        .to_string()
}

#[test]
fn test_schema_accepts_every_schema_option() {
    let cli = parse(&[
        "schema",
        "-i",
        "in.csv",
        "-o",
        "out.sql",
        "-q",
        "psql",
        "-d",
        "\\t",
        "-n",
        "NULL",
        "-r",
        "-t",
        "2:VARCHAR(10)",
        "-t",
        "1:a:b",
        "--lines-for-inference",
        "0",
        "-p",
        "patterns.yml",
        "users",
    ]);
    let Command::Schema(args) = cli.command else {
        panic!("expected the schema command");
    };
    assert_eq!(args.input.in_file.unwrap().to_str(), Some("in.csv"));
    assert_eq!(args.output.out_file.unwrap().to_str(), Some("out.sql"));
    assert_eq!(args.engine.query_engine, EngineKind::Psql);
    assert_eq!(args.csv.delimiter, b'\t');
    assert_eq!(args.csv.null, "NULL");
    assert!(args.rebuild);
    assert_eq!(
        args.column_types,
        vec![(1, "VARCHAR(10)".to_string()), (0, "a:b".to_string())]
    );
    assert_eq!(args.lines_for_inference, 0);
    assert_eq!(
        args.patterns.pattern_file.unwrap().to_str(),
        Some("patterns.yml")
    );
    assert_eq!(args.table_name, "users");
}

#[test]
fn test_all_defaults() {
    let cli = parse(&["all", "users"]);
    assert_eq!(cli.log_format, LogFormat::Text);
    assert!(!cli.verbose);
    let Command::All(args) = cli.command else {
        panic!("expected the all command");
    };
    assert!(args.input.in_file.is_none());
    assert!(args.output.out_file.is_none());
    assert_eq!(args.csv.delimiter, b',');
    assert_eq!(args.csv.null, "");
    assert!(!args.rebuild);
    assert!(args.column_types.is_empty());
    assert_eq!(args.lines_for_inference, 1000);
    assert!(args.patterns.pattern_file.is_none());
}

#[test]
fn test_data_accepts_insertion_options_only() {
    let cli = parse(&["data", "-r", "-n", "N", "-d", ";", "users"]);
    let Command::Data(args) = cli.command else {
        panic!("expected the data command");
    };
    assert!(args.rebuild);
    assert_eq!(args.csv.delimiter, b';');
    assert_eq!(args.csv.null, "N");

    assert!(Cli::try_parse_from(["csv2sql", "data", "-t", "1:TEXT", "users"]).is_err());
    assert!(Cli::try_parse_from(["csv2sql", "data", "-p", "p.yml", "users"]).is_err());
}

#[test]
fn test_pattern_options() {
    let cli = parse(&["pattern", "-p", "p.yml", "-o", "out.yml"]);
    let Command::Pattern(args) = cli.command else {
        panic!("expected the pattern command");
    };
    assert_eq!(args.patterns.pattern_file.unwrap().to_str(), Some("p.yml"));

    assert!(Cli::try_parse_from(["csv2sql", "pattern", "users"]).is_err());
}

#[test]
fn test_invalid_arguments() {
    assert!(parse_err(&["schema", "-t", "1-type", "users"]).contains("IDX:TYPE"));
    assert!(parse_err(&["schema", "-t", "0:type", "users"]).contains("positive"));
    assert!(parse_err(&["schema", "-q", "mysql", "users"]).contains("mysql"));
    assert!(parse_err(&["schema", "-d", ";;", "users"]).contains("single byte"));
    assert!(Cli::try_parse_from(["csv2sql", "schema"]).is_err());
}

#[test]
fn test_log_format_flag() {
    let cli = parse(&["all", "--log-format", "json", "users"]);
    assert_eq!(cli.log_format, LogFormat::Json);
    assert!(cli.logging_config().json_format);
}

#[test]
fn test_short_v_prints_version() {
    for flag in ["-v", "--version"] {
        let err = Cli::try_parse_from(["csv2sql", flag]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion, "{flag}");
    }
}

#[test]
fn test_verbosity_flags() {
    let cli = parse(&["all", "--verbose", "users"]);
    assert!(cli.verbose);
    assert_eq!(cli.logging_config().env_filter(), "debug,csv2sql=debug,csv2sql_cli=debug");

    let cli = parse(&["--quiet", "all", "users"]);
    assert!(cli.quiet);
    assert_eq!(cli.logging_config().env_filter(), "warn,csv2sql=warn,csv2sql_cli=warn");

    let err = Cli::try_parse_from(["csv2sql", "all", "--verbose", "--quiet", "users"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn test_log_filter_overrides_levels() {
    let cli = parse(&["all", "--log-filter", "csv2sql=trace", "users"]);
    assert_eq!(cli.logging_config().env_filter(), "csv2sql=trace");
}

fn write_input(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("input.csv");
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_run_all() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "key,v1\nk1,0\nk2,1\n");
    let output = dir.path().join("out.sql");

    run(parse(&[
        "all",
        "-r",
        "-i",
        &input,
        "-o",
        output.to_str().unwrap(),
        "t",
    ]))
    .unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "DROP TABLE IF EXISTS t;\n\
         CREATE TABLE t (\n  \"key\" VARCHAR(255),\n  \"v1\" INTEGER\n);\n\
         COPY t FROM STDIN WITH NULL '' CSV;\nk1,0\nk2,1\n\\.\n"
    );
}

#[test]
fn test_run_schema_with_column_type() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a,b\n1,x\n");
    let output = dir.path().join("out.sql");

    run(parse(&[
        "schema",
        "-t",
        "2:CHAR(1)",
        "-i",
        &input,
        "-o",
        output.to_str().unwrap(),
        "t",
    ]))
    .unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "CREATE TABLE t (\n  \"a\" INTEGER,\n  \"b\" CHAR(1)\n);\n"
    );
}

#[test]
fn test_run_pattern_then_reuse_it() {
    let dir = TempDir::new().unwrap();
    let patterns = dir.path().join("patterns.yml");
    run(parse(&["pattern", "-o", patterns.to_str().unwrap()])).unwrap();
    assert!(fs::read_to_string(&patterns)
        .unwrap()
        .contains("typename: DOUBLE PRECISION"));

    let input = write_input(&dir, "a\n1.5\n");
    let output = dir.path().join("out.sql");
    run(parse(&[
        "schema",
        "-p",
        patterns.to_str().unwrap(),
        "-i",
        &input,
        "-o",
        output.to_str().unwrap(),
        "t",
    ]))
    .unwrap();
    assert!(fs::read_to_string(&output)
        .unwrap()
        .contains("\"a\" DOUBLE PRECISION"));
}

#[test]
fn test_run_reports_missing_input() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.csv");
    let err = run(parse(&["data", "-i", missing.to_str().unwrap(), "t"])).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to open input file"));
}

#[test]
fn test_run_reports_inference_failure() {
    let dir = TempDir::new().unwrap();
    let patterns = dir.path().join("patterns.yml");
    fs::write(
        &patterns,
        "- typename: INT\n  predicate:\n    type: compatible\n    args: int\n",
    )
    .unwrap();
    let input = write_input(&dir, "a\n1\nx\n");
    let output = dir.path().join("out.sql");

    let err = run(parse(&[
        "schema",
        "-p",
        patterns.to_str().unwrap(),
        "-i",
        &input,
        "-o",
        output.to_str().unwrap(),
        "t",
    ]))
    .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to dump the schema"), "{message}");
    assert!(message.contains("no matching pattern for value `x`"), "{message}");
}
