//! Error types for citation operations.
//!
//! This module defines a structured error hierarchy. [`CitationError`] is what the
//! public entry points return; the narrower types describe what went wrong while
//! validating form input, formatting a single style, reading CSV or talking to the
//! storage backend.

use crate::CitationStyle;
use thiserror::Error;

/// Form field keys, shared by validation, CSV mapping and error reporting.
pub mod fields {
    pub const SOURCE_TYPE: &str = "sourceType";
    pub const AUTHORS: &str = "authors";
    pub const TITLE: &str = "title";
    pub const YEAR: &str = "year";
    pub const DOI: &str = "doi";
    pub const JOURNAL: &str = "journal";
    pub const VOLUME: &str = "volume";
    pub const ISSUE: &str = "issue";
    pub const PAGES: &str = "pages";
    pub const PUBLISHER: &str = "publisher";
    pub const LOCATION: &str = "location";
    pub const CONFERENCE_NAME: &str = "conferenceName";
    pub const CONFERENCE_LOCATION: &str = "conferenceLocation";
    pub const CONFERENCE_DATE: &str = "conferenceDate";
    pub const URL: &str = "url";
    pub const ACCESS_DATE: &str = "accessDate";
    pub const INSTITUTION: &str = "institution";
    pub const THESIS_TYPE: &str = "thesisType";
    pub const ISBN: &str = "isbn";
    pub const ISSN: &str = "issn";
    pub const EDITION: &str = "edition";
    pub const LANGUAGE: &str = "language";
}

/// Top-level error type for citation operations.
#[derive(Error, Debug)]
pub enum CitationError {
    #[error(
        "Unknown source type \"{0}\" (expected article, book, conference, webpage or thesis)"
    )]
    InvalidSourceType(String),

    #[error("Unknown citation style \"{0}\"")]
    UnknownStyle(String),

    #[error("Please select at least one citation style")]
    NoStyleSelected,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Problems with user input, found before a record reaches the formatter.
///
/// The display text of each variant is written for the person filling in the form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{message}")]
    MissingValue {
        field: &'static str,
        message: &'static str,
    },

    #[error("The year of publication must be between {min} and {max}")]
    YearOutOfRange { value: String, min: i32, max: i32 },

    #[error("Invalid URL format. Example of correct format: https://example.com")]
    InvalidUrl { value: String },

    #[error("DOI has an invalid format. Use 10.xxxx/xxxxx or https://doi.org/10.xxxx/xxxxx")]
    InvalidDoi { value: String },

    #[error("Bad value for {field}: \"{value}\" ({reason})")]
    BadValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    /// The form key the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingValue { field, .. } => field,
            ValidationError::YearOutOfRange { .. } => fields::YEAR,
            ValidationError::InvalidUrl { .. } => fields::URL,
            ValidationError::InvalidDoi { .. } => fields::DOI,
            ValidationError::BadValue { field, .. } => field,
        }
    }
}

/// Failure of a single style formatter.
///
/// These never escape [`crate::format::Formatter`]; they are logged and the
/// affected style falls back to a bare citation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Missing value for {field}")]
    MissingValue { field: &'static str },

    #[error("{style} formatter produced an empty citation")]
    Empty { style: CitationStyle },

    #[error("{style} formatter panicked: {message}")]
    Panicked {
        style: CitationStyle,
        message: String,
    },
}

/// Parse error for tabular input, with line information when available.
#[derive(Error, Debug)]
#[error("Error in CSV input{}: {message}",
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {} column {}", l, c),
        (Some(l), None) => format!(" at line {}", l),
        (None, Some(c)) => format!(" at column {}", c),
        (None, None) => String::new(),
    }
)]
pub struct ParseError {
    /// Line number where the error occurred (1-based, None if not available)
    pub line: Option<usize>,
    /// Column number where the error occurred (1-based, None if not available)
    pub column: Option<usize>,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    /// Create a new ParseError.
    pub fn new(line: Option<usize>, column: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a ParseError with just line information.
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Self::new(Some(line), None, message)
    }

    /// Create a ParseError with line and column information.
    pub fn at_position(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(Some(line), Some(column), message)
    }

    /// Create a ParseError without position information.
    pub fn without_position(message: impl Into<String>) -> Self {
        Self::new(None, None, message)
    }
}

/// Errors raised by a [`crate::storage::KeyValueStore`] or while encoding stored data.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage is not available: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("Stored data under {key} is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

// Conversion implementations for external error types

#[cfg(feature = "csv")]
impl From<::csv::Error> for ParseError {
    fn from(err: ::csv::Error) -> Self {
        let (line, column) = if let Some(position) = err.position() {
            (
                Some(position.line() as usize),
                Some(position.byte() as usize),
            )
        } else {
            (None, None)
        };

        ParseError::new(line, column, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::at_line(42, "Record has more fields than headers");

        let display = format!("{}", error);
        assert!(display.contains("line 42"));
        assert!(display.contains("CSV input"));
        assert!(display.contains("Record has more fields than headers"));
    }

    #[test]
    fn test_parse_error_with_position() {
        let error = ParseError::at_position(10, 25, "unexpected quote");
        assert!(format!("{}", error).contains("line 10 column 25"));
    }

    #[test]
    fn test_parse_error_without_position() {
        let display = format!("{}", ParseError::without_position("No headers found"));
        assert_eq!(display, "Error in CSV input: No headers found");
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::MissingValue {
            field: fields::AUTHORS,
            message: "Please specify the authors of the publication",
        };
        assert_eq!(
            format!("{}", error),
            "Please specify the authors of the publication"
        );
        assert_eq!(error.field(), "authors");

        let error = ValidationError::YearOutOfRange {
            value: "1700".to_string(),
            min: 1800,
            max: 2031,
        };
        assert_eq!(
            format!("{}", error),
            "The year of publication must be between 1800 and 2031"
        );
        assert_eq!(error.field(), "year");
    }

    #[test]
    fn test_format_error_display() {
        let error = FormatError::Empty {
            style: CitationStyle::Apa,
        };
        assert_eq!(format!("{}", error), "apa formatter produced an empty citation");
    }

    #[test]
    fn test_citation_error_wraps_validation() {
        let error: CitationError = ValidationError::InvalidUrl {
            value: "example".to_string(),
        }
        .into();
        assert!(matches!(error, CitationError::Validation(_)));
        assert_eq!(
            error.to_string(),
            "Invalid URL format. Example of correct format: https://example.com"
        );
    }

    #[cfg(feature = "csv")]
    #[test]
    fn test_csv_error_conversion() {
        let csv_content = "invalid,csv\nwith,extra,field";
        let mut reader = ::csv::Reader::from_reader(csv_content.as_bytes());
        let result = reader.records().next();

        if let Some(Err(csv_err)) = result {
            let parse_err: ParseError = csv_err.into();
            assert!(parse_err.line.is_some());
        }
    }
}
