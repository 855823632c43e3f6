//! DSTU 8302:2015 bibliographic description.
//!
//! Elements are joined with `". "` in a fixed order: authors, title, the
//! source-specific block, place and publisher, year, pages, DOI.

use super::{RecordView, StyleFormatter};
use crate::error::FormatError;
use crate::{CitationStyle, SourceRecord, SourceType, ThesisType};
use itertools::Itertools;

/// Formatter for the Ukrainian national standard.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dstu;

impl StyleFormatter for Dstu {
    fn style(&self) -> CitationStyle {
        CitationStyle::Dstu
    }

    fn format(&self, record: &SourceRecord) -> Result<String, FormatError> {
        let r = RecordView::new(record)?;
        let mut elements = vec![r.authors.to_string(), r.title.to_string()];

        match r.source_type {
            SourceType::Article => {
                if let Some(journal) = r.journal {
                    elements.push(format!("_{journal}_"));
                }
                match (r.volume, r.issue) {
                    (Some(volume), Some(issue)) => elements.push(format!("{volume}({issue})")),
                    (Some(volume), None) => elements.push(volume.to_string()),
                    (None, Some(issue)) => elements.push(format!("No. {issue}")),
                    (None, None) => {}
                }
            }
            SourceType::Book => {
                if let Some(volume) = r.volume {
                    elements.push(format!("Vol. {volume}"));
                }
            }
            SourceType::Conference => {
                if let Some(name) = r.conference_name {
                    elements.push(format!("Conference proceedings \"{name}\""));
                }
            }
            SourceType::Webpage => {
                elements.push("[Electronic resource]".to_string());
                if let Some(url) = r.url {
                    elements.push(format!("URL: {url}"));
                }
                if let Some(date) = r.access_date {
                    elements.push(format!("access date: {}", date.format("%d.%m.%Y")));
                }
            }
            SourceType::Thesis => {
                elements.push(thesis_label(r.thesis_type).to_string());
                if let Some(institution) = r.institution {
                    elements.push(institution.to_string());
                }
            }
        }

        if r.location.is_some() || r.publisher.is_some() {
            elements.push([r.location, r.publisher].into_iter().flatten().join(": "));
        }

        elements.push(r.year.to_string());

        if let Some(pages) = r.pages {
            elements.push(format!("P. {pages}"));
        }
        if let Some(doi) = r.doi {
            elements.push(format!("DOI: {doi}"));
        }

        Ok(elements.into_iter().filter(|e| !e.is_empty()).join(". "))
    }
}

fn thesis_label(thesis_type: Option<ThesisType>) -> &'static str {
    match thesis_type {
        Some(ThesisType::PhD) => "PhD thesis",
        Some(ThesisType::Masters) => "Master's thesis",
        Some(ThesisType::Bachelors) => "Bachelor's thesis",
        Some(ThesisType::Doctoral) => "Doctoral thesis",
        None => "Thesis",
    }
}
