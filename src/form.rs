//! Form input and validation.
//!
//! A [`FormInput`] is the flat set of key/value pairs a citation form submits.
//! [`FormInput::validate`] checks it the way the form does before generating a
//! citation and produces a [`SourceRecord`]. [`SourceRecord::from_form`] is the
//! lenient conversion used for drafts, which are allowed to be incomplete.

use crate::error::{CitationError, ValidationError, fields};
use crate::utils::{format_doi, is_valid_doi, non_blank, parse_iso_date, parse_year};
use crate::{SourceRecord, SourceType, ThesisType};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use url::Url;

/// Raw form values keyed by form field name (`authors`, `sourceType`, `accessDate`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInput {
    values: BTreeMap<String, String>,
}

impl FormInput {
    /// Creates an empty form input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// The trimmed value for `key`, or `None` if it is missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        non_blank(self.values.get(key).map(String::as_str))
    }

    /// Removes a value, returning it.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Iterate over all stored pairs, blank ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate the input and build a [`SourceRecord`] from it.
    ///
    /// Checks run in the order the form reports them: DOI, then authors, title,
    /// year and its range, the essential field of the source type, URL, access
    /// date and thesis type. The first failure is returned.
    ///
    /// A DOI that matches the DOI pattern is stored without its resolver prefix.
    /// With DOI checking off, any other value is kept as typed.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] whose message can be shown to the user as is.
    pub fn validate(&self, config: &ValidationConfig) -> Result<SourceRecord, ValidationError> {
        if config.check_doi
            && let Some(doi) = self.get(fields::DOI)
            && !is_valid_doi(doi)
        {
            return Err(ValidationError::InvalidDoi {
                value: doi.to_string(),
            });
        }

        let source_type = match self.get(fields::SOURCE_TYPE) {
            Some(name) => name.parse::<SourceType>().map_err(|_| ValidationError::BadValue {
                field: fields::SOURCE_TYPE,
                value: name.to_string(),
                reason: "expected article, book, conference, webpage or thesis".to_string(),
            })?,
            None => SourceType::default(),
        };

        self.require(fields::AUTHORS, "Please specify the authors of the publication")?;
        self.require(fields::TITLE, "Please specify the full title of the publication")?;
        let year = self.require(fields::YEAR, "Please specify the year of publication")?;

        let (min, max) = (config.min_year, config.max_year());
        match parse_year(year) {
            Some(value) if (min..=max).contains(&value) => {}
            _ => {
                return Err(ValidationError::YearOutOfRange {
                    value: year.to_string(),
                    min,
                    max,
                });
            }
        }

        let (essential, message) = essential_field(source_type);
        self.require(essential, message)?;

        if let Some(url) = self.get(fields::URL)
            && !is_absolute_url(url)
        {
            return Err(ValidationError::InvalidUrl {
                value: url.to_string(),
            });
        }

        if let Some(date) = self.get(fields::ACCESS_DATE)
            && parse_iso_date(date).is_none()
        {
            return Err(ValidationError::BadValue {
                field: fields::ACCESS_DATE,
                value: date.to_string(),
                reason: "expected a date as YYYY-MM-DD".to_string(),
            });
        }

        if let Some(thesis_type) = self.get(fields::THESIS_TYPE) {
            thesis_type.parse::<ThesisType>()?;
        }

        let mut record = SourceRecord::from_fields(self, source_type);
        record.doi = record.doi.map(|doi| {
            if is_valid_doi(&doi) {
                format_doi(&doi).unwrap_or(doi)
            } else {
                doi
            }
        });
        debug!(source_type = %source_type, "form input validated");
        Ok(record)
    }

    fn require(&self, key: &'static str, message: &'static str) -> Result<&str, ValidationError> {
        self.get(key)
            .ok_or(ValidationError::MissingValue { field: key, message })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for FormInput {
    fn from(values: HashMap<String, String>) -> Self {
        values.into_iter().collect()
    }
}

/// The field each source type cannot do without, with the message shown when it is empty.
fn essential_field(source_type: SourceType) -> (&'static str, &'static str) {
    match source_type {
        SourceType::Article => (
            fields::JOURNAL,
            "For an article, please specify the name of the scientific journal",
        ),
        SourceType::Book => (
            fields::PUBLISHER,
            "For a book, please specify the name of the publisher",
        ),
        SourceType::Conference => (
            fields::CONFERENCE_NAME,
            "For conference materials, please specify the name of the conference",
        ),
        SourceType::Webpage => (
            fields::URL,
            "For a webpage, please specify the full URL address",
        ),
        SourceType::Thesis => (
            fields::INSTITUTION,
            "For a thesis, please specify the name of the scientific institution",
        ),
    }
}

fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| url.has_host() || url.scheme() == "file")
}

impl SourceRecord {
    /// Build a record from form input without validating it.
    ///
    /// Unparseable years, dates and thesis types are dropped rather than
    /// reported, so any saved draft can be turned into a record.
    ///
    /// # Errors
    ///
    /// Returns [`CitationError::InvalidSourceType`] if `sourceType` names an
    /// unknown source type. A missing `sourceType` means `article`.
    pub fn from_form(input: &FormInput) -> Result<Self, CitationError> {
        let source_type = input
            .get(fields::SOURCE_TYPE)
            .map(str::parse::<SourceType>)
            .transpose()?
            .unwrap_or_default();
        Ok(Self::from_fields(input, source_type))
    }

    fn from_fields(input: &FormInput, source_type: SourceType) -> Self {
        let text = |key: &str| input.get(key).map(String::from);

        Self {
            source_type,
            authors: text(fields::AUTHORS),
            title: text(fields::TITLE),
            year: input.get(fields::YEAR).and_then(parse_year),
            doi: text(fields::DOI),
            journal: text(fields::JOURNAL),
            volume: text(fields::VOLUME),
            issue: text(fields::ISSUE),
            pages: text(fields::PAGES),
            publisher: text(fields::PUBLISHER),
            location: text(fields::LOCATION),
            conference_name: text(fields::CONFERENCE_NAME),
            conference_location: text(fields::CONFERENCE_LOCATION),
            conference_date: text(fields::CONFERENCE_DATE),
            url: text(fields::URL),
            access_date: input.get(fields::ACCESS_DATE).and_then(parse_iso_date),
            institution: text(fields::INSTITUTION),
            thesis_type: input
                .get(fields::THESIS_TYPE)
                .and_then(|value| value.parse().ok()),
            isbn: text(fields::ISBN),
            issn: text(fields::ISSN),
            edition: text(fields::EDITION),
            language: text(fields::LANGUAGE),
        }
    }
}

/// Configuration for form validation.
///
/// # Examples
///
/// ```
/// use citeform::form::ValidationConfig;
///
/// let mut config = ValidationConfig::new();
/// config.set_reference_year(2025).set_future_years(2);
/// assert_eq!(config.max_year(), 2027);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Earliest accepted publication year
    pub(crate) min_year: i32,
    /// How many years past the reference year are accepted
    pub(crate) future_years: i32,
    /// Year to validate against; the current local year when unset
    pub(crate) reference_year: Option<i32>,
    /// Whether DOIs are checked against the DOI pattern
    pub(crate) check_doi: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationConfig {
    /// Creates a configuration accepting years from 1800 to five years from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_year: 1800,
            future_years: 5,
            reference_year: None,
            check_doi: true,
        }
    }

    /// Sets the earliest accepted year
    pub fn set_min_year(&mut self, year: i32) -> &mut Self {
        self.min_year = year;
        self
    }

    /// Sets how many years into the future are accepted
    pub fn set_future_years(&mut self, years: i32) -> &mut Self {
        self.future_years = years;
        self
    }

    /// Pins the year the future window is counted from
    pub fn set_reference_year(&mut self, year: i32) -> &mut Self {
        self.reference_year = Some(year);
        self
    }

    /// Sets whether DOIs are checked
    pub fn set_check_doi(&mut self, check: bool) -> &mut Self {
        self.check_doi = check;
        self
    }

    /// The latest accepted publication year.
    pub fn max_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
            + self.future_years
    }
}
