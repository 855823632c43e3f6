//! APA (7th edition) reference list entries.

use super::{NO_DATE, Placeholders, RecordView, StyleFormatter};
use crate::error::FormatError;
use crate::{CitationStyle, SourceRecord, SourceType, ThesisType};

/// Formatter for APA style.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apa;

impl StyleFormatter for Apa {
    fn style(&self) -> CitationStyle {
        CitationStyle::Apa
    }

    fn format(&self, record: &SourceRecord) -> Result<String, FormatError> {
        let r = RecordView::new(record)?;
        let mut citation = format!("{} ({}). {}", r.authors, r.year, r.title);

        match r.source_type {
            SourceType::Article => {
                if let Some(journal) = r.journal {
                    citation.push_str(&format!(". _{journal}_"));
                }
                if let Some(volume) = r.volume {
                    citation.push_str(&format!(", {volume}"));
                }
                if let Some(issue) = r.issue {
                    citation.push_str(&format!("({issue})"));
                }
                if let Some(pages) = r.pages {
                    citation.push_str(&format!(", {pages}"));
                }
            }
            SourceType::Book => {
                if let Some(publisher) = r.publisher {
                    match r.location {
                        Some(location) => citation.push_str(&format!(". {location}: {publisher}")),
                        None => citation.push_str(&format!(". {publisher}")),
                    }
                }
            }
            SourceType::Conference => {
                if let Some(name) = r.conference_name {
                    citation.push_str(&format!(". In {name}"));
                }
                if let Some(location) = r.location {
                    citation.push_str(&format!(", {location}"));
                }
                if let Some(pages) = r.pages {
                    citation.push_str(&format!(" (pp. {pages})"));
                }
            }
            SourceType::Webpage => {
                citation.push_str(". Retrieved");
                if let Some(date) = r.access_date {
                    citation.push_str(&format!(" {}", date.format("%B %-d, %Y")));
                }
                if let Some(url) = r.url {
                    citation.push_str(&format!(" from {url}"));
                }
            }
            SourceType::Thesis => {
                citation.push_str(&format!(" [{}", thesis_label(r.thesis_type)));
                if let Some(institution) = r.institution {
                    citation.push_str(&format!(", {institution}"));
                }
                citation.push(']');
            }
        }

        if let Some(doi) = r.doi {
            citation.push_str(&format!(". https://doi.org/{doi}"));
        }

        Ok(citation)
    }

    fn degraded(&self, record: &SourceRecord) -> String {
        let parts = Placeholders::new(record);
        format!("{} ({}). {}.", parts.authors, parts.year_or(NO_DATE), parts.title)
    }
}

fn thesis_label(thesis_type: Option<ThesisType>) -> &'static str {
    match thesis_type {
        Some(ThesisType::PhD | ThesisType::Doctoral) => "Doctoral dissertation",
        Some(ThesisType::Masters) => "Master's thesis",
        Some(ThesisType::Bachelors) => "Bachelor's thesis",
        None => "Dissertation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn record(source_type: SourceType) -> SourceRecord {
        SourceRecord {
            source_type,
            authors: Some("Smith, J.".to_string()),
            title: Some("Deep learning for citation parsing".to_string()),
            year: Some(2021),
            ..Default::default()
        }
    }

    #[test]
    fn test_article_with_doi() {
        let record = SourceRecord {
            journal: Some("Journal of Documentation".to_string()),
            volume: Some("77".to_string()),
            issue: Some("4".to_string()),
            pages: Some("901-920".to_string()),
            doi: Some("10.1108/JD-01-2021-0001".to_string()),
            ..record(SourceType::Article)
        };
        assert_eq!(
            Apa.format(&record).unwrap(),
            "Smith, J. (2021). Deep learning for citation parsing. _Journal of Documentation_, 77(4), 901-920. https://doi.org/10.1108/JD-01-2021-0001"
        );
    }

    #[rstest]
    #[case(Some("77"), None, ", 77")]
    #[case(None, Some("4"), "(4)")]
    #[case(None, None, "")]
    fn test_article_volume_issue_independent(
        #[case] volume: Option<&str>,
        #[case] issue: Option<&str>,
        #[case] suffix: &str,
    ) {
        let record = SourceRecord {
            journal: Some("JDoc".to_string()),
            volume: volume.map(String::from),
            issue: issue.map(String::from),
            ..record(SourceType::Article)
        };
        assert_eq!(
            Apa.format(&record).unwrap(),
            format!("Smith, J. (2021). Deep learning for citation parsing. _JDoc_{suffix}")
        );
    }

    #[rstest]
    #[case(Some("London"), Some("Facet"), ". London: Facet")]
    #[case(None, Some("Facet"), ". Facet")]
    #[case(Some("London"), None, "")]
    fn test_book_publisher(
        #[case] location: Option<&str>,
        #[case] publisher: Option<&str>,
        #[case] suffix: &str,
    ) {
        let record = SourceRecord {
            location: location.map(String::from),
            publisher: publisher.map(String::from),
            ..record(SourceType::Book)
        };
        assert_eq!(
            Apa.format(&record).unwrap(),
            format!("Smith, J. (2021). Deep learning for citation parsing{suffix}")
        );
    }

    #[test]
    fn test_conference() {
        let record = SourceRecord {
            conference_name: Some("Proceedings of JCDL".to_string()),
            location: Some("Urbana".to_string()),
            pages: Some("10-19".to_string()),
            ..record(SourceType::Conference)
        };
        assert_eq!(
            Apa.format(&record).unwrap(),
            "Smith, J. (2021). Deep learning for citation parsing. In Proceedings of JCDL, Urbana (pp. 10-19)"
        );
    }

    #[test]
    fn test_webpage_long_date() {
        let record = SourceRecord {
            url: Some("https://example.org/post".to_string()),
            access_date: NaiveDate::from_ymd_opt(2024, 4, 5),
            ..record(SourceType::Webpage)
        };
        assert_eq!(
            Apa.format(&record).unwrap(),
            "Smith, J. (2021). Deep learning for citation parsing. Retrieved April 5, 2024 from https://example.org/post"
        );
    }

    #[test]
    fn test_webpage_without_date_or_url() {
        assert_eq!(
            Apa.format(&record(SourceType::Webpage)).unwrap(),
            "Smith, J. (2021). Deep learning for citation parsing. Retrieved"
        );
    }

    #[rstest]
    #[case(Some(ThesisType::PhD), "Doctoral dissertation")]
    #[case(Some(ThesisType::Doctoral), "Doctoral dissertation")]
    #[case(Some(ThesisType::Masters), "Master's thesis")]
    #[case(Some(ThesisType::Bachelors), "Bachelor's thesis")]
    #[case(None, "Dissertation")]
    fn test_thesis(#[case] thesis_type: Option<ThesisType>, #[case] label: &str) {
        let record = SourceRecord {
            thesis_type,
            institution: Some("MIT".to_string()),
            ..record(SourceType::Thesis)
        };
        assert_eq!(
            Apa.format(&record).unwrap(),
            format!("Smith, J. (2021). Deep learning for citation parsing [{label}, MIT]")
        );
    }

    #[test]
    fn test_degraded_uses_no_date() {
        let record = SourceRecord {
            year: None,
            ..record(SourceType::Article)
        };
        assert_eq!(
            Apa.degraded(&record),
            "Smith, J. (n.d.). Deep learning for citation parsing."
        );
    }
}
