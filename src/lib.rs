//! A library for turning bibliographic source descriptions into formatted citations.
//!
//! `citeform` takes the data a user enters about a publication (an article, a book,
//! a conference paper, a webpage or a thesis) and renders it in three citation styles:
//!
//! - **DSTU 8302:2015**, the Ukrainian national standard for bibliographic description
//! - **APA** (7th edition)
//! - **IEEE**
//!
//! # Features
//!
//! - `csv` - Read batches of source descriptions from CSV (enabled by default)
//! - `regex` - Use the `regex` crate for DOI and URL checks (enabled by default)
//! - `lite` - Use `regex-lite` instead, for smaller binaries
//!
//! ```toml
//! [dependencies]
//! citeform = { version = "0.1", default-features = false, features = ["lite"] }
//! ```
//!
//! # Key Characteristics
//!
//! - **Field requirements**: [`fields::resolve`] decides which form fields apply to a
//!   source type and which of them the selected styles require.
//! - **Never-empty output**: [`format::format_citations`] always produces a string per
//!   style. Missing authors, title or year degrade to placeholder text, and a fault in
//!   one style's formatter only affects that style.
//! - **Extensible styles**: each style is a [`format::StyleFormatter`] registered on a
//!   [`format::Formatter`].
//!
//! # Basic Usage
//!
//! ```rust
//! use citeform::{SourceRecord, SourceType, CitationStyle};
//! use citeform::format::format_citations;
//!
//! let record = SourceRecord {
//!     source_type: SourceType::Article,
//!     authors: Some("Jane Doe".to_string()),
//!     title: Some("A Study".to_string()),
//!     year: Some(2020),
//!     journal: Some("Nature".to_string()),
//!     ..Default::default()
//! };
//!
//! let citations = format_citations(&record);
//! assert_eq!(citations.get(CitationStyle::Dstu), Some("Jane Doe. A Study. _Nature_. 2020"));
//! assert_eq!(citations.get(CitationStyle::Apa), Some("Jane Doe (2020). A Study. _Nature_"));
//! assert_eq!(citations.get(CitationStyle::Ieee), Some("J. Doe, \"A Study\", in _Nature_, 2020"));
//! ```
//!
//! # From Form Input
//!
//! Raw form values are validated into a [`SourceRecord`] before formatting:
//!
//! ```rust
//! use citeform::form::{FormInput, ValidationConfig};
//!
//! let mut input = FormInput::new();
//! input
//!     .set("sourceType", "book")
//!     .set("authors", "Ivan Franko")
//!     .set("title", "Zakhar Berkut")
//!     .set("year", "1883")
//!     .set("location", "Lviv")
//!     .set("publisher", "Zoria");
//!
//! let record = input.validate(&ValidationConfig::new()).unwrap();
//! let citations = citeform::format::format_citations(&record);
//! assert_eq!(
//!     citations.get(citeform::CitationStyle::Dstu),
//!     Some("Ivan Franko. Zakhar Berkut. Lviv: Zoria. 1883")
//! );
//! ```
//!
//! # Field Requirements
//!
//! ```rust
//! use citeform::{CitationStyle, SourceType, StyleSet};
//! use citeform::fields::{resolve, FieldId};
//!
//! let styles = StyleSet::from([CitationStyle::Dstu]);
//! let resolution = resolve(SourceType::Thesis, &styles);
//!
//! assert!(resolution.is_required(FieldId::Institution));
//! assert!(resolution.is_required(FieldId::ThesisType));
//! assert!(!resolution.is_applicable(FieldId::Journal));
//! ```
//!
//! # Submitting a Form
//!
//! [`service::CitationService`] runs the whole workflow: validation, formatting of the
//! selected styles, and saving the draft and result to a [`storage::KeyValueStore`].
//!
//! ```rust
//! use citeform::{CitationService, CitationStyle, FormInput, LogNotifier, MemoryStore, StyleSet};
//!
//! let mut service = CitationService::new(MemoryStore::new(), LogNotifier);
//! let input: FormInput = [
//!     ("sourceType", "webpage"),
//!     ("authors", "Jane Doe"),
//!     ("title", "Release notes"),
//!     ("year", "2024"),
//!     ("url", "https://example.com/notes"),
//!     ("accessDate", "2024-04-05"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let citations = service
//!     .submit(&input, &StyleSet::from([CitationStyle::Apa]))
//!     .unwrap();
//! assert_eq!(
//!     citations.get(CitationStyle::Apa),
//!     Some("Jane Doe (2024). Release notes. Retrieved April 5, 2024 from https://example.com/notes")
//! );
//! assert_eq!(service.history().len(), 1);
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`CitationError`] or one of the narrower error types in
//! [`error`]. Formatting itself never fails.
//!
//! # Thread Safety
//!
//! The rule table and the default formatter are immutable statics, so resolving and
//! formatting can run from any number of threads without locking.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

#[cfg(feature = "csv")]
pub mod csv;
pub mod error;
pub mod fields;
pub mod form;
pub mod format;
pub mod service;
pub mod storage;

// Reexports
#[cfg(feature = "csv")]
pub use csv::CsvParser;
pub use error::{CitationError, FormatError, ParseError, StorageError, ValidationError};
pub use fields::{FieldId, Resolution, resolve};
pub use form::{FormInput, ValidationConfig};
pub use format::{Formatter, StyleFormatter, format_citations};
pub use service::{CitationService, LogNotifier, Notifier, Severity};
pub use storage::{CitationStore, KeyValueStore, MemoryStore};

mod regex;
mod utils;

/// The category of a cited work.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Scientific article in a journal or periodical.
    #[default]
    Article,
    /// Book, monograph, or other non-periodical publication.
    Book,
    /// Conference proceedings or a paper in a collection of works.
    Conference,
    /// Web page or other online resource.
    Webpage,
    /// Thesis or dissertation.
    Thesis,
}

impl SourceType {
    /// Every source type, in form order.
    pub const ALL: [SourceType; 5] = [
        SourceType::Article,
        SourceType::Book,
        SourceType::Conference,
        SourceType::Webpage,
        SourceType::Thesis,
    ];

    /// The lowercase name used in form input and serialized data.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Article => "article",
            SourceType::Book => "book",
            SourceType::Conference => "conference",
            SourceType::Webpage => "webpage",
            SourceType::Thesis => "thesis",
        }
    }

    /// Short description of what belongs to this source type.
    pub fn description(&self) -> &'static str {
        match self {
            SourceType::Article => "Scientific article in a journal or periodical",
            SourceType::Book => "Book, monograph, or other non-periodical publication",
            SourceType::Conference => {
                "Conference proceedings, abstracts, or collection of scientific works"
            }
            SourceType::Webpage => "Web page, online resource, or electronic source",
            SourceType::Thesis => "Thesis, dissertation, or other qualification research work",
        }
    }

    /// Placeholder text for the title field.
    pub fn title_placeholder(&self) -> &'static str {
        match self {
            SourceType::Article => "Article title",
            SourceType::Book => "Book title",
            SourceType::Conference => "Conference paper title",
            SourceType::Webpage => "Webpage title",
            SourceType::Thesis => "Thesis title",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = CitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|source_type| source_type.as_str() == s.trim())
            .ok_or_else(|| CitationError::InvalidSourceType(s.to_string()))
    }
}

/// A citation style the library can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum CitationStyle {
    /// DSTU 8302:2015.
    Dstu,
    /// APA, 7th edition.
    Apa,
    /// IEEE.
    Ieee,
}

impl CitationStyle {
    /// Every built-in style.
    pub const ALL: [CitationStyle; 3] = [CitationStyle::Dstu, CitationStyle::Apa, CitationStyle::Ieee];

    /// The lowercase key used in form input and serialized data.
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Dstu => "dstu",
            CitationStyle::Apa => "apa",
            CitationStyle::Ieee => "ieee",
        }
    }

    /// Human readable name of the style.
    pub fn display_name(&self) -> &'static str {
        match self {
            CitationStyle::Dstu => "DSTU 8302:2015",
            CitationStyle::Apa => "APA (7th Edition)",
            CitationStyle::Ieee => "IEEE",
        }
    }

    /// One-line description of where the style is used.
    pub fn description(&self) -> &'static str {
        match self {
            CitationStyle::Dstu => "Ukrainian national standard for bibliographic description",
            CitationStyle::Apa => {
                "American Psychological Association style, widely used in social sciences"
            }
            CitationStyle::Ieee => {
                "Institute of Electrical and Electronics Engineers style, used in technical publications"
            }
        }
    }
}

impl std::fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CitationStyle {
    type Err = CitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        CitationStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == key)
            .ok_or_else(|| CitationError::UnknownStyle(s.to_string()))
    }
}

/// A set of selected citation styles, iterated in declaration order.
pub type StyleSet = BTreeSet<CitationStyle>;

/// Kind of qualification work a thesis was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThesisType {
    #[serde(rename = "PhD")]
    PhD,
    #[serde(rename = "masters")]
    Masters,
    #[serde(rename = "bachelors")]
    Bachelors,
    #[serde(rename = "doctoral")]
    Doctoral,
}

impl ThesisType {
    pub const ALL: [ThesisType; 4] = [
        ThesisType::PhD,
        ThesisType::Masters,
        ThesisType::Bachelors,
        ThesisType::Doctoral,
    ];

    /// The form value for this thesis type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThesisType::PhD => "PhD",
            ThesisType::Masters => "masters",
            ThesisType::Bachelors => "bachelors",
            ThesisType::Doctoral => "doctoral",
        }
    }

    /// Label shown in a thesis type picker.
    pub fn label(&self) -> &'static str {
        match self {
            ThesisType::PhD => "Doctor of Philosophy thesis",
            ThesisType::Masters => "Master's thesis",
            ThesisType::Bachelors => "Bachelor's thesis",
            ThesisType::Doctoral => "Doctoral dissertation",
        }
    }
}

impl FromStr for ThesisType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThesisType::ALL
            .into_iter()
            .find(|thesis_type| thesis_type.as_str() == s.trim())
            .ok_or_else(|| ValidationError::BadValue {
                field: error::fields::THESIS_TYPE,
                value: s.to_string(),
                reason: "expected one of PhD, masters, bachelors, doctoral".to_string(),
            })
    }
}

/// Description of a single cited work, as entered by the user.
///
/// Only `source_type` is structurally required. The formatter treats a missing
/// `authors`, `title` or `year` as a reason to degrade rather than to fail, and
/// blank strings count as missing everywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Category of the work
    pub source_type: SourceType,
    /// Comma-separated author names, e.g. "John Smith, Jane Doe"
    pub authors: Option<String>,
    /// Title of the work
    pub title: Option<String>,
    /// Year of publication
    pub year: Option<i32>,
    /// Digital Object Identifier, without a resolver prefix
    pub doi: Option<String>,
    /// Journal name
    pub journal: Option<String>,
    /// Volume number
    pub volume: Option<String>,
    /// Issue number
    pub issue: Option<String>,
    /// Page range
    pub pages: Option<String>,
    /// Publisher name
    pub publisher: Option<String>,
    /// Place of publication
    pub location: Option<String>,
    /// Name of the conference
    pub conference_name: Option<String>,
    /// Where the conference took place
    pub conference_location: Option<String>,
    /// When the conference took place, free text
    pub conference_date: Option<String>,
    /// Address of an online resource
    pub url: Option<String>,
    /// Date the online resource was accessed
    pub access_date: Option<chrono::NaiveDate>,
    /// Institution a thesis was defended at
    pub institution: Option<String>,
    /// Kind of thesis
    pub thesis_type: Option<ThesisType>,
    /// ISBN of a book
    pub isbn: Option<String>,
    /// ISSN of a journal
    pub issn: Option<String>,
    /// Edition of a book
    pub edition: Option<String>,
    /// Language of the work
    pub language: Option<String>,
}

impl SourceRecord {
    /// Create an empty record of the given source type.
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            ..Default::default()
        }
    }

    /// Whether authors, title and year are all present.
    pub fn has_required_fields(&self) -> bool {
        utils::non_blank(self.authors.as_deref()).is_some()
            && utils::non_blank(self.title.as_deref()).is_some()
            && self.year.is_some()
    }
}

/// The rendered citation for each requested style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormattedCitation {
    citations: BTreeMap<CitationStyle, String>,
}

impl FormattedCitation {
    /// Create an empty set of citations.
    pub fn new() -> Self {
        Self::default()
    }

    /// The citation rendered for `style`, if it was requested.
    pub fn get(&self, style: CitationStyle) -> Option<&str> {
        self.citations.get(&style).map(String::as_str)
    }

    /// Iterate over `(style, citation)` pairs in style order.
    pub fn iter(&self) -> impl Iterator<Item = (CitationStyle, &str)> {
        self.citations
            .iter()
            .map(|(style, citation)| (*style, citation.as_str()))
    }

    /// The styles present in this result.
    pub fn styles(&self) -> StyleSet {
        self.citations.keys().copied().collect()
    }

    /// Number of rendered styles.
    pub fn len(&self) -> usize {
        self.citations.len()
    }

    /// Whether no style was rendered.
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    pub(crate) fn insert(&mut self, style: CitationStyle, citation: String) {
        self.citations.insert(style, citation);
    }
}
