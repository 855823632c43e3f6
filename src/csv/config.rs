//! CSV header mapping definitions and configuration.
//!
//! Column headers are mapped onto form keys, so a spreadsheet row becomes the
//! same [`FormInput`](crate::form::FormInput) a citation form would submit.

use crate::error::{ParseError, fields};
use std::collections::HashMap;

/// Default header aliases for each form key
pub(crate) const DEFAULT_HEADERS: &[(&str, &[&str])] = &[
    (fields::SOURCE_TYPE, &["sourcetype", "source type", "type", "kind"]),
    (fields::AUTHORS, &["author", "authors", "creator", "creators"]),
    (fields::TITLE, &["title", "article title", "publication title"]),
    (fields::YEAR, &["year", "publication year", "pub year"]),
    (fields::DOI, &["doi", "digital object identifier"]),
    (fields::JOURNAL, &["journal", "journal title", "source title"]),
    (fields::VOLUME, &["volume", "vol"]),
    (fields::ISSUE, &["issue", "number", "no"]),
    (fields::PAGES, &["pages", "page numbers", "page range"]),
    (fields::PUBLISHER, &["publisher"]),
    (fields::LOCATION, &["location", "place", "city"]),
    (
        fields::CONFERENCE_NAME,
        &["conferencename", "conference name", "conference"],
    ),
    (
        fields::CONFERENCE_LOCATION,
        &["conferencelocation", "conference location"],
    ),
    (fields::CONFERENCE_DATE, &["conferencedate", "conference date"]),
    (fields::URL, &["url", "link", "web link"]),
    (fields::ACCESS_DATE, &["accessdate", "access date", "accessed"]),
    (fields::INSTITUTION, &["institution", "university"]),
    (fields::THESIS_TYPE, &["thesistype", "thesis type", "degree"]),
    (fields::ISBN, &["isbn"]),
    (fields::ISSN, &["issn"]),
    (fields::EDITION, &["edition"]),
    (fields::LANGUAGE, &["language", "lang"]),
];

/// Configuration for CSV parsing with custom header mappings.
///
/// Headers are matched against the aliases of each form key, ignoring case
/// and surrounding whitespace, so "Source Type", "type" and "KIND" all land
/// in `sourceType`.
///
/// # Examples
///
/// ```
/// use citeform::csv::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_header_mapping("title", vec!["Article Name".to_string()]);
/// config.set_delimiter(b';');
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Aliases per form key
    pub(crate) header_map: HashMap<String, Vec<String>>,
    /// Lowercased alias to form key
    alias_index: HashMap<String, String>,
    pub(crate) delimiter: u8,
    pub(crate) has_header: bool,
    pub(crate) quote: u8,
    pub(crate) trim: bool,
    /// Tolerate ragged rows and blank rows
    pub(crate) flexible: bool,
    /// Separator between authors inside the author column
    pub(crate) author_separator: char,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a configuration with the default aliases, `,` delimiter and a header row
    #[must_use]
    pub fn new() -> Self {
        let header_map = DEFAULT_HEADERS
            .iter()
            .map(|(key, aliases)| {
                let aliases = aliases.iter().map(|alias| alias.to_string()).collect();
                (key.to_string(), aliases)
            })
            .collect();

        let mut config = Self {
            header_map,
            alias_index: HashMap::new(),
            delimiter: b',',
            has_header: true,
            quote: b'"',
            trim: true,
            flexible: false,
            author_separator: ';',
        };
        config.index_aliases();
        config
    }

    fn index_aliases(&mut self) {
        self.alias_index = self
            .header_map
            .iter()
            .flat_map(|(key, aliases)| {
                aliases
                    .iter()
                    .map(move |alias| (alias.trim().to_lowercase(), key.clone()))
            })
            .collect();
    }

    /// Replaces the aliases for a form key
    pub fn set_header_mapping(&mut self, key: &str, aliases: Vec<String>) -> &mut Self {
        self.header_map.insert(key.to_string(), aliases);
        self.index_aliases();
        self
    }

    /// Adds aliases to a form key, keeping the existing ones
    pub fn add_header_aliases(&mut self, key: &str, aliases: Vec<String>) -> &mut Self {
        self.header_map
            .entry(key.to_string())
            .or_default()
            .extend(aliases);
        self.index_aliases();
        self
    }

    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    pub fn set_has_header(&mut self, has_header: bool) -> &mut Self {
        self.has_header = has_header;
        self
    }

    pub fn set_quote(&mut self, quote: u8) -> &mut Self {
        self.quote = quote;
        self
    }

    /// Sets whether cells are trimmed before mapping
    pub fn set_trim(&mut self, trim: bool) -> &mut Self {
        self.trim = trim;
        self
    }

    /// Sets whether ragged and blank rows are tolerated
    pub fn set_flexible(&mut self, flexible: bool) -> &mut Self {
        self.flexible = flexible;
        self
    }

    /// Sets the character separating several authors in one cell
    pub fn set_author_separator(&mut self, separator: char) -> &mut Self {
        self.author_separator = separator;
        self
    }

    /// Finds the form key for a header
    pub(crate) fn key_for_header(&self, header: &str) -> Option<&str> {
        self.alias_index
            .get(&header.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Checks that the configuration can be used for parsing.
    ///
    /// # Errors
    ///
    /// Fails when there are no mappings, a key or alias is blank, one alias
    /// names two form keys, or the delimiter is a newline or the quote character.
    pub fn validate(&self) -> Result<(), ParseError> {
        let invalid = |reason: String| {
            ParseError::without_position(format!("Invalid CSV configuration: {reason}"))
        };

        if matches!(self.delimiter, b'\n' | b'\r') {
            return Err(invalid("delimiter cannot be a line break".to_string()));
        }
        if self.delimiter == self.quote {
            return Err(invalid("delimiter and quote character must differ".to_string()));
        }
        if self.header_map.is_empty() {
            return Err(invalid("no header mappings".to_string()));
        }

        let mut owners: HashMap<String, &str> = HashMap::new();
        for (key, aliases) in &self.header_map {
            if key.trim().is_empty() || aliases.is_empty() {
                return Err(invalid(format!("form key '{key}' needs a name and an alias")));
            }
            for alias in aliases {
                if alias.trim().is_empty() {
                    return Err(invalid(format!("blank alias for '{key}'")));
                }
                if let Some(other) = owners.insert(alias.trim().to_lowercase(), key)
                    && other != key.as_str()
                {
                    return Err(invalid(format!(
                        "alias '{alias}' maps to both '{other}' and '{key}'"
                    )));
                }
            }
        }

        Ok(())
    }
}
