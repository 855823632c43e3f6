//! Batch input from CSV.
//!
//! Each data row becomes a [`FormInput`], with columns mapped to form keys through
//! configurable header aliases. Rows can then be validated and formatted one by
//! one, exactly as if they had been typed into the form.
//!
//! # Example
//!
//! ```
//! use citeform::csv::CsvParser;
//!
//! let input = "Type,Author,Title,Year,Publisher\nbook,Ivan Franko,Zakhar Berkut,1883,Zoria";
//!
//! let rows = CsvParser::new().parse(input).unwrap();
//! assert_eq!(rows[0].get("sourceType"), Some("book"));
//! assert_eq!(rows[0].get("publisher"), Some("Zoria"));
//! ```

mod config;
mod parse;
mod structure;

use crate::SourceRecord;
use crate::error::ParseError;
use crate::form::{FormInput, ValidationConfig};
pub use config::CsvConfig;
use parse::csv_parse;
use tracing::debug;

/// Parser for CSV source lists with configurable column mappings.
///
/// # Features
///
/// - Case-insensitive header aliases for every form key
/// - Several authors per cell, separated by `;` by default
/// - Unmapped columns kept under their header name
/// - Optional detection of the delimiter and header row
/// - Errors carry the line number of the offending row
///
/// # Examples
///
/// With custom configuration:
/// ```
/// use citeform::csv::{CsvParser, CsvConfig};
///
/// let mut config = CsvConfig::new();
/// config.set_delimiter(b';');
///
/// let parser = CsvParser::with_config(config);
/// let rows = parser.parse("Title;Year\nKobzar;1840").unwrap();
/// assert_eq!(rows[0].get("year"), Some("1840"));
/// ```
#[derive(Debug, Clone)]
pub struct CsvParser {
    config: CsvConfig,
    auto_detect: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvParser {
    /// Creates a new CSV parser with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CsvConfig::new(),
            auto_detect: false,
        }
    }

    /// Creates a new CSV parser with custom configuration
    #[must_use]
    pub fn with_config(config: CsvConfig) -> Self {
        Self {
            config,
            auto_detect: false,
        }
    }

    /// Creates a new CSV parser that detects the delimiter and header row
    #[must_use]
    pub fn with_auto_detection() -> Self {
        Self {
            config: CsvConfig::new(),
            auto_detect: true,
        }
    }

    /// Sets the configuration for this parser
    pub fn set_config(&mut self, config: CsvConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Gets a reference to the current configuration
    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Gets a mutable reference to the current configuration
    pub fn config_mut(&mut self) -> &mut CsvConfig {
        &mut self.config
    }

    /// Enables or disables automatic format detection
    pub fn set_auto_detection(&mut self, enabled: bool) -> &mut Self {
        self.auto_detect = enabled;
        self
    }

    fn effective_config(&self, input: &str) -> CsvConfig {
        let mut config = self.config.clone();

        if self.auto_detect {
            let delimiter = parse::detect_csv_delimiter(input);
            let has_header = parse::detect_csv_headers(input, &config, delimiter);
            debug!(delimiter = %(delimiter as char), has_header, "detected CSV format");

            config.set_delimiter(delimiter);
            config.set_has_header(has_header);
        }

        config
    }

    /// Parses CSV text into one [`FormInput`] per data row.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] with the line number of the first malformed row,
    /// or without a position when the configuration itself is invalid.
    pub fn parse(&self, input: &str) -> Result<Vec<FormInput>, ParseError> {
        let config = self.effective_config(input);
        Ok(csv_parse(input, &config)?
            .into_iter()
            .map(|row| row.input)
            .collect())
    }

    /// Parses and validates every row.
    ///
    /// # Errors
    ///
    /// Besides malformed CSV, the first row that fails validation is reported
    /// with its line number and the validation message.
    pub fn parse_records(
        &self,
        input: &str,
        validation: &ValidationConfig,
    ) -> Result<Vec<SourceRecord>, ParseError> {
        let config = self.effective_config(input);
        csv_parse(input, &config)?
            .into_iter()
            .map(|row| {
                row.input
                    .validate(validation)
                    .map_err(|err| ParseError::at_line(row.line_number, err.to_string()))
            })
            .collect()
    }
}
