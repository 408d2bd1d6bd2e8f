//! Delimited text input.

use std::io::Read;

use csv::StringRecord;

use crate::error::{Csv2SqlError, Result};

/// Delimiter used when the caller does not configure one.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Reads delimited rows as vectors of strings.
///
/// Headers are handled by the caller through [`DelimitedReader::read_header`],
/// and rows may have varying field counts.
pub struct DelimitedReader<R> {
    reader: csv::Reader<R>,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(input: R, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        Self { reader }
    }

    /// Reads the first row as column names.
    pub fn read_header(&mut self) -> Result<Vec<String>> {
        let mut record = StringRecord::new();
        if !self.reader.read_record(&mut record)? {
            return Err(Csv2SqlError::EmptyInput);
        }
        Ok(record_to_row(&record))
    }

    /// Returns the remaining rows.
    pub fn rows(self) -> impl Iterator<Item = Result<Vec<String>>> {
        self.reader
            .into_records()
            .map(|record| -> Result<Vec<String>> { Ok(record_to_row(&record?)) })
    }
}

fn record_to_row(record: &StringRecord) -> Vec<String> {
    record.iter().map(str::to_owned).collect()
}

/// Parses a delimiter given as text.
///
/// The delimiter must be a single byte; `\t` is accepted as an escape for tab.
pub fn parse_delimiter(text: &str) -> Result<u8> {
    match text.as_bytes() {
        [byte] => Ok(*byte),
        br"\t" => Ok(b'\t'),
        _ => Err(Csv2SqlError::configuration(format!(
            "Delimiter must be a single byte character, given \"{text}\""
        ))),
    }
}
