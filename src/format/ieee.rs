//! IEEE reference entries.
//!
//! Authors are rewritten with initials first ("John Smith" becomes "J. Smith").
//! This assumes "Given Family" order. A single-token name passes through as
//! typed, and names in other orders get a best-effort result.

use super::{NO_DATE, Placeholders, RecordView, StyleFormatter};
use crate::error::FormatError;
use crate::{CitationStyle, SourceRecord, SourceType, ThesisType};
use compact_str::CompactString;
use itertools::Itertools;
use std::borrow::Cow;

/// Formatter for IEEE style.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ieee;

impl StyleFormatter for Ieee {
    fn style(&self) -> CitationStyle {
        CitationStyle::Ieee
    }

    fn format(&self, record: &SourceRecord) -> Result<String, FormatError> {
        let r = RecordView::new(record)?;
        let mut elements = vec![format!("{}, \"{}\"", ieee_authors(r.authors), r.title)];

        match r.source_type {
            SourceType::Article => {
                if let Some(journal) = r.journal {
                    elements.push(format!("in _{journal}_"));
                }
            }
            SourceType::Book => {
                elements.push("book".to_string());
                if let Some(publisher) = r.publisher {
                    match r.location {
                        Some(location) => elements.push(format!("{location}: {publisher}")),
                        None => elements.push(publisher.to_string()),
                    }
                }
            }
            SourceType::Conference => {
                if let Some(name) = r.conference_name {
                    elements.push(format!("in {name}"));
                }
                if let Some(location) = r.location {
                    elements.push(location.to_string());
                }
            }
            SourceType::Webpage => {
                elements.push("Online".to_string());
                if let Some(url) = r.url {
                    elements.push(format!("Available: {url}"));
                }
                if let Some(date) = r.access_date {
                    elements.push(format!("Accessed: {}", date.format("%b %-d, %Y")));
                }
            }
            SourceType::Thesis => {
                elements.push(thesis_label(r.thesis_type).to_string());
                if let Some(institution) = r.institution {
                    elements.push(institution.to_string());
                }
            }
        }

        if let Some(volume) = r.volume {
            elements.push(format!("vol. {volume}"));
        }
        if let Some(issue) = r.issue {
            elements.push(format!("no. {issue}"));
        }
        if let Some(pages) = r.pages {
            elements.push(format!("pp. {pages}"));
        }
        elements.push(r.year.to_string());

        let mut citation = elements.join(", ");
        if let Some(doi) = r.doi {
            citation.push_str(&format!(". doi: {doi}"));
        }

        Ok(citation)
    }

    fn degraded(&self, record: &SourceRecord) -> String {
        let parts = Placeholders::new(record);
        let mut citation = format!(
            "{}, \"{}\", {}",
            parts.authors,
            parts.title,
            parts.year_or(NO_DATE)
        );
        if !citation.ends_with('.') {
            citation.push('.');
        }
        citation
    }
}

/// Rewrite a comma-separated author list with initials before surnames.
///
/// ```
/// use citeform::format::ieee_authors;
///
/// assert_eq!(ieee_authors("John Smith"), "J. Smith");
/// assert_eq!(ieee_authors("Mary Ann Evans, Prince"), "M. A. Evans, Prince");
/// ```
pub fn ieee_authors(authors: &str) -> String {
    authors
        .split(',')
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .map(abbreviate_author)
        .join(", ")
}

/// The last whitespace token is the surname; every token before it becomes an initial.
fn abbreviate_author(author: &str) -> Cow<'_, str> {
    let tokens: Vec<&str> = author.split_whitespace().collect();
    match tokens.split_last() {
        Some((surname, given)) if !given.is_empty() => {
            Cow::Owned(format!("{} {}", initials(given), surname))
        }
        _ => Cow::Borrowed(author),
    }
}

fn initials(given: &[&str]) -> CompactString {
    let mut out = CompactString::default();
    for name in given {
        if let Some(first) = name.chars().next() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push(first);
            out.push('.');
        }
    }
    out
}

fn thesis_label(thesis_type: Option<ThesisType>) -> &'static str {
    match thesis_type {
        Some(ThesisType::PhD) => "Ph.D. dissertation",
        Some(ThesisType::Masters) => "M.S. thesis",
        Some(ThesisType::Bachelors) => "B.S. thesis",
        Some(ThesisType::Doctoral) => "Doctoral dissertation",
        None => "dissertation",
    }
}
