use crate::regex::Regex;
use chrono::NaiveDate;
use std::sync::LazyLock;

static DOI_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(?:dx\.)?doi\.org/(.+)$").unwrap());

static DOI_PATTERN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:https?://)?(?:dx\.)?doi\.org/|doi:\s*)?10\.\d{4,9}/\S+$").unwrap()
});

/// Returns the trimmed value, or `None` when it is missing or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whether the input looks like a DOI, bare or behind a resolver prefix.
///
/// Accepted: `10.1000/xyz`, `doi:10.1000/xyz`, `https://doi.org/10.1000/xyz`.
pub fn is_valid_doi(doi_str: &str) -> bool {
    DOI_PATTERN_REGEX.is_match(doi_str.trim())
}

/// Formats a DOI string by removing URL and `doi:` prefixes and `[doi]` suffixes.
///
/// Case is preserved, so the result can be shown back to the user as typed.
///
/// # Arguments
///
/// * `doi_str` - The DOI string to format
pub fn format_doi(doi_str: &str) -> Option<String> {
    let doi = doi_str
        .trim()
        .trim_end_matches("[doi]")
        .trim()
        .replace(|c: char| c.is_whitespace(), "");

    if let Some(captures) = DOI_URL_REGEX.captures(&doi) {
        return Some(captures[1].to_string());
    }

    // Find the first occurrence of "10." which typically starts a DOI
    doi.find("10.").map(|pos| doi[pos..].to_string())
}

/// Parses a form year value, accepting surrounding whitespace.
pub(crate) fn parse_year(year_str: &str) -> Option<i32> {
    year_str.trim().parse::<i32>().ok()
}

/// Parses an ISO `YYYY-MM-DD` date as submitted by a date input.
pub(crate) fn parse_iso_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_doi() {
        let test_cases = vec![
            ("10.1000/test", Some("10.1000/test".to_string())),
            ("10.1000/test [doi]", Some("10.1000/test".to_string())),
            (
                "https://doi.org/10.1000/test",
                Some("10.1000/test".to_string()),
            ),
            (
                "http://dx.doi.org/10.1000/test",
                Some("10.1000/test".to_string()),
            ),
            (
                " https://doi.org/10.1000/test ",
                Some("10.1000/test".to_string()),
            ),
            ("doi:10.1000/test", Some("10.1000/test".to_string())),
            ("DOI: 10.1000/ABC", Some("10.1000/ABC".to_string())),
            (
                "HTTPS://DOI.ORG/10.1000/Test",
                Some("10.1000/Test".to_string()),
            ),
            ("", None),
            ("invalid", None),
        ];

        for (input, expected) in test_cases {
            assert_eq!(format_doi(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_is_valid_doi() {
        assert!(is_valid_doi("10.1038/nature12373"));
        assert!(is_valid_doi("https://doi.org/10.1038/nature12373"));
        assert!(is_valid_doi("doi: 10.1038/nature12373"));
        assert!(is_valid_doi(" 10.1000/182 "));
        assert!(!is_valid_doi("10.10/short-registrant"));
        assert!(!is_valid_doi("nature12373"));
        assert!(!is_valid_doi("10.1038/has space"));
        assert!(!is_valid_doi(""));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(" 2023 "), Some(2023));
        assert_eq!(parse_year("20x3"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2024-04-05"),
            NaiveDate::from_ymd_opt(2024, 4, 5)
        );
        assert_eq!(parse_iso_date("05.04.2024"), None);
        assert_eq!(parse_iso_date("2024-02-30"), None);
    }
}
