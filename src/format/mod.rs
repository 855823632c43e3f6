//! Citation formatting.
//!
//! A [`Formatter`] holds one [`StyleFormatter`] per citation style and renders a
//! [`SourceRecord`] with each of them. Formatting never fails as a whole:
//!
//! - If authors, title or year are missing, every style returns its degraded
//!   form, e.g. `"Author not specified. A Study. Year not specified."`, so the
//!   user always gets something to copy.
//! - If one style's formatter returns an error, produces an empty string or
//!   panics, that style alone falls back to `"<authors>. <title>. <year>."`.
//!
//! # Example
//!
//! ```
//! use citeform::{CitationStyle, SourceRecord, SourceType};
//! use citeform::format::Formatter;
//!
//! let record = SourceRecord {
//!     source_type: SourceType::Webpage,
//!     authors: Some("Tim Berners-Lee".to_string()),
//!     title: Some("Information Management: A Proposal".to_string()),
//!     year: Some(1989),
//!     url: Some("https://www.w3.org/History/1989/proposal.html".to_string()),
//!     ..Default::default()
//! };
//!
//! let citations = Formatter::standard().format(&record);
//! assert_eq!(
//!     citations.get(CitationStyle::Ieee),
//!     Some("T. Berners-Lee, \"Information Management: A Proposal\", Online, \
//!           Available: https://www.w3.org/History/1989/proposal.html, 1989")
//! );
//! ```

mod apa;
mod dstu;
mod ieee;

pub use apa::Apa;
pub use dstu::Dstu;
pub use ieee::{Ieee, ieee_authors};

use crate::error::{FormatError, fields};
use crate::utils::non_blank;
use crate::{CitationStyle, FormattedCitation, SourceRecord, SourceType, StyleSet, ThesisType};
use chrono::NaiveDate;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;
use tracing::{debug, error, warn};

pub(crate) const AUTHOR_PLACEHOLDER: &str = "Author not specified";
pub(crate) const TITLE_PLACEHOLDER: &str = "Title not specified";
pub(crate) const YEAR_PLACEHOLDER: &str = "Year not specified";
pub(crate) const NO_DATE: &str = "n.d.";

static STANDARD: LazyLock<Formatter> = LazyLock::new(Formatter::standard);

/// Renders a [`SourceRecord`] in one citation style.
///
/// Implementations should be pure: the same record must always give the same
/// string. Adding a style to the library means implementing this trait and
/// registering the implementation with [`Formatter::with_style`].
pub trait StyleFormatter: Send + Sync {
    /// The style this formatter renders.
    fn style(&self) -> CitationStyle;

    /// Render a record that has authors, title and year.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when the record cannot be rendered. The caller
    /// replaces the output with a bare fallback citation.
    fn format(&self, record: &SourceRecord) -> Result<String, FormatError>;

    /// Minimal citation used when authors, title or year are missing.
    fn degraded(&self, record: &SourceRecord) -> String {
        let parts = Placeholders::new(record);
        format!("{}. {}. {}.", parts.authors, parts.title, parts.year_or(YEAR_PLACEHOLDER))
    }
}

/// A set of style formatters, applied in style order.
pub struct Formatter {
    styles: Vec<Box<dyn StyleFormatter>>,
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("styles", &self.styles())
            .finish()
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::standard()
    }
}

impl Formatter {
    /// Creates a formatter with no styles registered.
    #[must_use]
    pub fn empty() -> Self {
        Self { styles: Vec::new() }
    }

    /// Creates a formatter with the DSTU, APA and IEEE styles.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_style(Dstu)
            .with_style(Apa)
            .with_style(Ieee)
    }

    /// Registers a style formatter, replacing any formatter for the same style.
    #[must_use]
    pub fn with_style<F: StyleFormatter + 'static>(mut self, formatter: F) -> Self {
        let style = formatter.style();
        self.styles.retain(|existing| existing.style() != style);
        self.styles.push(Box::new(formatter));
        self.styles.sort_by_key(|f| f.style());
        self
    }

    /// The registered styles.
    pub fn styles(&self) -> StyleSet {
        self.styles.iter().map(|f| f.style()).collect()
    }

    /// Render the record in every registered style.
    pub fn format(&self, record: &SourceRecord) -> FormattedCitation {
        self.render_where(record, |_| true)
    }

    /// Render the record in the selected styles that are registered.
    pub fn format_styles(&self, record: &SourceRecord, selected: &StyleSet) -> FormattedCitation {
        self.render_where(record, |style| selected.contains(&style))
    }

    fn render_where<P>(&self, record: &SourceRecord, mut wanted: P) -> FormattedCitation
    where
        P: FnMut(CitationStyle) -> bool,
    {
        let complete = record.has_required_fields();
        if !complete {
            debug!(
                source_type = %record.source_type,
                "authors, title or year missing; using degraded citations"
            );
        }

        let mut citations = FormattedCitation::new();
        for formatter in self.styles.iter().filter(|f| wanted(f.style())) {
            let text = if complete {
                render(formatter.as_ref(), record)
            } else {
                formatter.degraded(record)
            };
            citations.insert(formatter.style(), text);
        }
        citations
    }
}

/// Render a record in DSTU, APA and IEEE.
pub fn format_citations(record: &SourceRecord) -> FormattedCitation {
    STANDARD.format(record)
}

/// Render a record in the selected built-in styles.
pub fn format_citation_styles(record: &SourceRecord, selected: &StyleSet) -> FormattedCitation {
    STANDARD.format_styles(record, selected)
}

/// Run one style formatter, isolating its failures from the other styles.
fn render(formatter: &dyn StyleFormatter, record: &SourceRecord) -> String {
    let style = formatter.style();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| formatter.format(record)))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(%style, %message, "style formatter panicked");
            Err(FormatError::Panicked { style, message })
        })
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(FormatError::Empty { style })
            } else {
                Ok(text)
            }
        });

    match outcome {
        Ok(text) => text,
        Err(err) => {
            warn!(%style, error = %err, "falling back to bare citation");
            bare_fallback(record)
        }
    }
}

/// `"<authors>. <title>. <year>."`, used when a style formatter fails.
pub(crate) fn bare_fallback(record: &SourceRecord) -> String {
    let parts = Placeholders::new(record);
    format!("{}. {}. {}.", parts.authors, parts.title, parts.year_or(YEAR_PLACEHOLDER))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Authors, title and year with placeholder text for whatever is missing.
pub(crate) struct Placeholders<'a> {
    pub(crate) authors: &'a str,
    pub(crate) title: &'a str,
    year: Option<i32>,
}

impl<'a> Placeholders<'a> {
    pub(crate) fn new(record: &'a SourceRecord) -> Self {
        Self {
            authors: non_blank(record.authors.as_deref()).unwrap_or(AUTHOR_PLACEHOLDER),
            title: non_blank(record.title.as_deref()).unwrap_or(TITLE_PLACEHOLDER),
            year: record.year,
        }
    }

    pub(crate) fn year_or(&self, placeholder: &str) -> String {
        self.year
            .map(|year| year.to_string())
            .unwrap_or_else(|| placeholder.to_string())
    }
}

/// Borrowed view of a complete record, with blank values already filtered out.
pub(crate) struct RecordView<'a> {
    pub(crate) source_type: SourceType,
    pub(crate) authors: &'a str,
    pub(crate) title: &'a str,
    pub(crate) year: i32,
    pub(crate) doi: Option<&'a str>,
    pub(crate) journal: Option<&'a str>,
    pub(crate) volume: Option<&'a str>,
    pub(crate) issue: Option<&'a str>,
    pub(crate) pages: Option<&'a str>,
    pub(crate) publisher: Option<&'a str>,
    pub(crate) location: Option<&'a str>,
    pub(crate) conference_name: Option<&'a str>,
    pub(crate) url: Option<&'a str>,
    pub(crate) access_date: Option<NaiveDate>,
    pub(crate) institution: Option<&'a str>,
    pub(crate) thesis_type: Option<ThesisType>,
}

impl<'a> RecordView<'a> {
    pub(crate) fn new(record: &'a SourceRecord) -> Result<Self, FormatError> {
        let text = |value: &'a Option<String>| non_blank(value.as_deref());

        Ok(Self {
            source_type: record.source_type,
            authors: text(&record.authors).ok_or(FormatError::MissingValue {
                field: fields::AUTHORS,
            })?,
            title: text(&record.title).ok_or(FormatError::MissingValue {
                field: fields::TITLE,
            })?,
            year: record.year.ok_or(FormatError::MissingValue {
                field: fields::YEAR,
            })?,
            doi: text(&record.doi),
            journal: text(&record.journal),
            volume: text(&record.volume),
            issue: text(&record.issue),
            pages: text(&record.pages),
            publisher: text(&record.publisher),
            location: text(&record.location),
            conference_name: text(&record.conference_name),
            url: text(&record.url),
            access_date: record.access_date,
            institution: text(&record.institution),
            thesis_type: record.thesis_type,
        })
    }
}
