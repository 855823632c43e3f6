//! Intermediate rows produced while reading CSV.

use crate::csv::config::CsvConfig;
use crate::error::{ParseError, fields};
use crate::form::FormInput;
use ::csv::StringRecord;
use itertools::Itertools;

/// One data row, with cells already keyed by form key.
#[derive(Debug, Clone)]
pub(crate) struct RawCsvRow {
    /// Non-empty cells keyed by form key, or by header for unmapped columns
    pub(crate) input: FormInput,
    /// Line number for error reporting
    pub(crate) line_number: usize,
}

impl RawCsvRow {
    /// Map a CSV record onto form keys.
    pub(crate) fn from_record(
        headers: &[String],
        record: &StringRecord,
        config: &CsvConfig,
        line_number: usize,
    ) -> Result<Self, ParseError> {
        if record.len() > headers.len() && !config.flexible {
            return Err(ParseError::at_line(
                line_number,
                format!(
                    "Record has more fields ({}) than headers ({})",
                    record.len(),
                    headers.len()
                ),
            ));
        }

        let mut input = FormInput::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            let value = if config.trim { value.trim() } else { value };
            if value.is_empty() {
                continue;
            }

            match config.key_for_header(header) {
                Some(fields::AUTHORS) => {
                    input.set(fields::AUTHORS, join_authors(value, config.author_separator));
                }
                Some(key) => {
                    input.set(key, value);
                }
                None => {
                    input.set(header.clone(), value);
                }
            }
        }

        Ok(Self { input, line_number })
    }

    pub(crate) fn has_content(&self) -> bool {
        self.input.iter().any(|(_, value)| !value.trim().is_empty())
    }
}

/// Rewrite `separator`-delimited authors as the comma-separated list the form uses.
fn join_authors(value: &str, separator: char) -> String {
    value
        .split(separator)
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .join(", ")
}
