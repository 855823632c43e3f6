//! CSV format parsing implementation.
//!
//! This module handles the low-level reading of CSV text into keyed rows.

use crate::csv::config::CsvConfig;
use crate::csv::structure::RawCsvRow;
use crate::error::ParseError;
use ::csv::{ReaderBuilder, Trim};
use tracing::debug;

/// Parse CSV text into rows keyed by form key.
pub(crate) fn csv_parse(text: &str, config: &CsvConfig) -> Result<Vec<RawCsvRow>, ParseError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    config.validate()?;

    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.has_header)
        .quote(config.quote)
        .trim(if config.trim { Trim::All } else { Trim::None })
        .flexible(config.flexible)
        .from_reader(text.as_bytes());

    let first = reader
        .headers()
        .map_err(|e| ParseError::at_line(1, format!("Header parsing error: {}", e)))?;
    let headers: Vec<String> = if config.has_header {
        first.iter().map(String::from).collect()
    } else {
        (0..first.len()).map(|i| format!("Column{}", i + 1)).collect()
    };

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::without_position("No headers found in CSV"));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(ParseError::from)?;
        let line_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 1);

        let row = RawCsvRow::from_record(&headers, &record, config, line_number)?;
        if row.has_content() {
            rows.push(row);
        } else if !config.flexible {
            return Err(ParseError::at_line(
                line_number,
                "Record contains no meaningful content",
            ));
        }
    }

    debug!(rows = rows.len(), "parsed CSV input");
    Ok(rows)
}

/// Detect CSV delimiter by analyzing the content.
pub(crate) fn detect_csv_delimiter(content: &str) -> u8 {
    let delimiters = [b',', b';', b'\t', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(5).collect();

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delimiter in &delimiters {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| line.split(delimiter as char).count())
            .collect();

        let consistent = counts.windows(2).all(|pair| pair[0] == pair[1]);
        let score: usize = counts.iter().sum();

        if consistent && score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}

/// Detect whether the first line is a header row.
///
/// The first line is a header when at least half of its cells name known
/// columns and the second line names fewer of them. Cell values such as
/// "conference" or "no" are also column aliases, so a single hit is not
/// enough. Failing that, the first line counts as a header when it is mostly
/// words and the second is mostly short or numeric values.
pub(crate) fn detect_csv_headers(content: &str, config: &CsvConfig, delimiter: u8) -> bool {
    let lines: Vec<&str> = content.lines().take(2).collect();
    let Some(first) = lines.first() else {
        return true;
    };

    let alias_hits = |fields: &[&str]| {
        fields
            .iter()
            .filter(|field| config.key_for_header(field.trim_matches('"')).is_some())
            .count()
    };

    let first_fields: Vec<&str> = first.split(delimiter as char).collect();
    let first_hits = alias_hits(&first_fields);
    let mostly_aliases = first_hits * 2 >= first_fields.len();

    let Some(second) = lines.get(1) else {
        return first_hits > 0 && mostly_aliases;
    };
    let second_fields: Vec<&str> = second.split(delimiter as char).collect();

    if first_hits > 0 && mostly_aliases && first_hits > alias_hits(&second_fields) {
        return true;
    }

    let first_text_ratio = first_fields
        .iter()
        .filter(|f| f.trim().parse::<f64>().is_err() && f.trim().len() > 3)
        .count() as f64
        / first_fields.len().max(1) as f64;

    let second_data_ratio = second_fields
        .iter()
        .filter(|f| !f.trim().is_empty())
        .filter(|f| f.trim().parse::<f64>().is_ok() || f.trim().len() <= 3)
        .count() as f64
        / second_fields.len().max(1) as f64;

    first_text_ratio > 0.5 && second_data_ratio > 0.3
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[test]
    fn test_csv_parse_basic() {
        let input = "Title,Author,Year\nTest Article,Smith J,2023";
        let rows = csv_parse(input, &CsvConfig::new()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].input.get("title"), Some("Test Article"));
        assert_eq!(rows[0].input.get("authors"), Some("Smith J"));
        assert_eq!(rows[0].line_number, 2);
    }

    #[test]
    fn test_csv_parse_no_headers() {
        let mut config = CsvConfig::new();
        config.set_has_header(false);

        let rows = csv_parse("Test Article,Smith J,2023", &config).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].input.get("Column1"), Some("Test Article"));
        assert_eq!(rows[0].line_number, 1);
    }

    #[test]
    fn test_csv_parse_empty_input() {
        assert!(csv_parse("  \n", &CsvConfig::new()).unwrap().is_empty());
    }

    #[test]
    fn test_csv_parse_blank_row_is_an_error() {
        let input = "Title,Author,Year\nA,B,2020\n,,";
        let err = csv_parse(input, &CsvConfig::new()).unwrap_err();
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_csv_parse_flexible_mode() {
        let input = "Title,Author\nTest Article,Smith J,Extra Field\n,";
        let mut config = CsvConfig::new();
        config.set_flexible(true);

        let rows = csv_parse(input, &config).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_csv_parse_malformed_strict() {
        let input = "Title,Author\nTest Article,Smith J,Extra Field";
        let err = csv_parse(input, &CsvConfig::new()).unwrap_err();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_csv_parse_with_quotes() {
        let input = "Title,Author,Year\n\"Test Article with, comma\",\"Smith, John\",2023";
        let rows = csv_parse(input, &CsvConfig::new()).unwrap();

        assert_eq!(rows[0].input.get("title"), Some("Test Article with, comma"));
        assert_eq!(rows[0].input.get("authors"), Some("Smith, John"));
    }

    #[test]
    fn test_csv_parse_invalid_config() {
        let mut config = CsvConfig::new();
        config.set_delimiter(b'\r');

        let err = csv_parse("Title\nA", &config).unwrap_err();
        assert!(err.message.contains("Invalid CSV configuration"));
        assert_eq!(err.line, None);
    }

    #[rstest]
    #[case("a,b,c\n1,2,3", b',')]
    #[case("a;b;c\n1;2;3", b';')]
    #[case("a\tb\tc\n1\t2\t3", b'\t')]
    #[case("a|b|c\n1|2|3", b'|')]
    #[case("a,b;c\n1,2;3", b',')]
    #[case("", b',')]
    fn test_detect_csv_delimiter(#[case] input: &str, #[case] expected: u8) {
        assert_eq!(detect_csv_delimiter(input), expected);
    }

    #[rstest]
    #[case("Title,Author\nTest,Smith", true)]
    #[case("Test Article,Smith\nAnother,Jones", false)]
    #[case("type,publisher\nbook,Zoria", true)]
    #[case("Year,Volume\n2023,10", true)]
    #[case("123,456\n789,012", false)]
    #[case("conference,John Smith,Paper one,2020\nconference,Jane Doe,Paper two,2021", false)]
    #[case("no,Jane Doe,Minutes,2021\nbook,John Smith,Notes,2020", false)]
    #[case("Type,Author,Title,Year,Notes\nconference,Jane Doe,A talk,2021,x", true)]
    fn test_detect_csv_headers(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(detect_csv_headers(input, &CsvConfig::new(), b','), expected);
    }
}
