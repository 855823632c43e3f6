//! Field applicability and requirement rules.
//!
//! Which form fields make sense for a source type, and which of them must be
//! filled in, is decided by a static rule table ([`FIELD_RULES`]). Each rule
//! lists, per [`Scope`], the citation styles that need the field. Resolving the
//! table against a source type and the user's style selection gives a
//! [`Resolution`] that a form can use to show, hide, mark and order its fields.
//!
//! # Example
//!
//! ```
//! use citeform::{CitationStyle, SourceType, StyleSet};
//! use citeform::fields::{resolve, FieldId};
//!
//! let styles = StyleSet::from([CitationStyle::Apa]);
//! let resolution = resolve(SourceType::Conference, &styles);
//!
//! // Location is required by APA for conference papers...
//! assert!(resolution.is_required(FieldId::Location));
//! // ...but the URL only matters to IEEE there.
//! assert!(resolution.is_applicable(FieldId::Url));
//! assert!(!resolution.is_required(FieldId::Url));
//! ```

use crate::error::fields as keys;
use crate::{CitationError, CitationStyle, SourceType, StyleSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Identifier of a form field governed by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Authors,
    Title,
    Year,
    Doi,
    Journal,
    Issue,
    Volume,
    Pages,
    Publisher,
    Location,
    ConferenceName,
    Url,
    AccessDate,
    Institution,
    ThesisType,
    Edition,
    Isbn,
    ConferenceLocation,
    ConferenceDate,
    Issn,
    Language,
}

impl FieldId {
    /// Fields that are required whatever the source type or style selection.
    pub const INITIAL: [FieldId; 3] = [FieldId::Authors, FieldId::Title, FieldId::Year];

    /// The form key of this field.
    pub fn key(&self) -> &'static str {
        match self {
            FieldId::Authors => keys::AUTHORS,
            FieldId::Title => keys::TITLE,
            FieldId::Year => keys::YEAR,
            FieldId::Doi => keys::DOI,
            FieldId::Journal => keys::JOURNAL,
            FieldId::Issue => keys::ISSUE,
            FieldId::Volume => keys::VOLUME,
            FieldId::Pages => keys::PAGES,
            FieldId::Publisher => keys::PUBLISHER,
            FieldId::Location => keys::LOCATION,
            FieldId::ConferenceName => keys::CONFERENCE_NAME,
            FieldId::Url => keys::URL,
            FieldId::AccessDate => keys::ACCESS_DATE,
            FieldId::Institution => keys::INSTITUTION,
            FieldId::ThesisType => keys::THESIS_TYPE,
            FieldId::Edition => keys::EDITION,
            FieldId::Isbn => keys::ISBN,
            FieldId::ConferenceLocation => keys::CONFERENCE_LOCATION,
            FieldId::ConferenceDate => keys::CONFERENCE_DATE,
            FieldId::Issn => keys::ISSN,
            FieldId::Language => keys::LANGUAGE,
        }
    }

    /// Whether this is one of the always-required fields.
    pub fn is_initial(&self) -> bool {
        FieldId::INITIAL.contains(self)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELD_RULES
            .iter()
            .map(|rule| rule.field)
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("unknown field \"{s}\""))
    }
}

/// Which source types a rule entry covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every source type.
    All,
    /// A single source type.
    Only(SourceType),
}

/// Requirement rule for one field.
///
/// `scopes` pairs a [`Scope`] with the styles that need the field within it. A
/// field is applicable to a source type when one of its scopes covers it.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: FieldId,
    pub scopes: &'static [(Scope, &'static [CitationStyle])],
}

impl FieldRule {
    /// Whether the field means anything for `source_type`.
    pub fn applies_to(&self, source_type: SourceType) -> bool {
        self.scopes
            .iter()
            .any(|(scope, _)| *scope == Scope::All || *scope == Scope::Only(source_type))
    }

    /// Union of the styles needing this field under `All` and under `source_type`.
    pub fn required_styles(&self, source_type: SourceType) -> StyleSet {
        self.scopes
            .iter()
            .filter(|(scope, _)| *scope == Scope::All || *scope == Scope::Only(source_type))
            .flat_map(|(_, styles)| styles.iter().copied())
            .collect()
    }
}

const EVERY_STYLE: &[CitationStyle] = &[CitationStyle::Dstu, CitationStyle::Apa, CitationStyle::Ieee];
const DSTU_APA: &[CitationStyle] = &[CitationStyle::Dstu, CitationStyle::Apa];
const APA_IEEE: &[CitationStyle] = &[CitationStyle::Apa, CitationStyle::Ieee];
const DSTU: &[CitationStyle] = &[CitationStyle::Dstu];
const IEEE: &[CitationStyle] = &[CitationStyle::Ieee];

use Scope::{All, Only};
use SourceType::{Article, Book, Conference, Thesis, Webpage};

/// The requirement table, in presentation order.
///
/// Schema: `field → [(scope, styles that require the field in that scope)]`.
pub static FIELD_RULES: &[FieldRule] = &[
    // Core fields needed for any citation
    FieldRule { field: FieldId::Authors, scopes: &[(All, EVERY_STYLE)] },
    FieldRule { field: FieldId::Title, scopes: &[(All, EVERY_STYLE)] },
    FieldRule { field: FieldId::Year, scopes: &[(All, EVERY_STYLE)] },
    FieldRule { field: FieldId::Doi, scopes: &[(All, EVERY_STYLE)] },
    // Source-specific essentials
    FieldRule { field: FieldId::Journal, scopes: &[(Only(Article), EVERY_STYLE)] },
    FieldRule {
        field: FieldId::Issue,
        scopes: &[(Only(Article), EVERY_STYLE), (Only(Conference), EVERY_STYLE)],
    },
    FieldRule {
        field: FieldId::Volume,
        scopes: &[(Only(Article), EVERY_STYLE), (Only(Book), EVERY_STYLE)],
    },
    FieldRule {
        field: FieldId::Pages,
        scopes: &[
            (Only(Article), EVERY_STYLE),
            (Only(Book), EVERY_STYLE),
            (Only(Conference), EVERY_STYLE),
        ],
    },
    FieldRule {
        field: FieldId::Publisher,
        scopes: &[(Only(Book), EVERY_STYLE), (Only(Conference), DSTU_APA)],
    },
    FieldRule {
        field: FieldId::Location,
        scopes: &[(Only(Book), DSTU_APA), (Only(Conference), DSTU_APA)],
    },
    FieldRule { field: FieldId::ConferenceName, scopes: &[(Only(Conference), EVERY_STYLE)] },
    FieldRule {
        field: FieldId::Url,
        scopes: &[
            (Only(Webpage), EVERY_STYLE),
            (Only(Article), APA_IEEE),
            (Only(Conference), IEEE),
        ],
    },
    FieldRule { field: FieldId::AccessDate, scopes: &[(Only(Webpage), EVERY_STYLE)] },
    FieldRule { field: FieldId::Institution, scopes: &[(Only(Thesis), EVERY_STYLE)] },
    FieldRule { field: FieldId::ThesisType, scopes: &[(Only(Thesis), EVERY_STYLE)] },
    // Additional fields
    FieldRule { field: FieldId::Edition, scopes: &[(Only(Book), EVERY_STYLE)] },
    FieldRule { field: FieldId::Isbn, scopes: &[(Only(Book), EVERY_STYLE)] },
    FieldRule { field: FieldId::ConferenceLocation, scopes: &[(Only(Conference), EVERY_STYLE)] },
    FieldRule { field: FieldId::ConferenceDate, scopes: &[(Only(Conference), EVERY_STYLE)] },
    FieldRule { field: FieldId::Issn, scopes: &[(Only(Article), EVERY_STYLE)] },
    FieldRule {
        field: FieldId::Language,
        scopes: &[
            (Only(Article), DSTU),
            (Only(Book), DSTU),
            (Only(Conference), DSTU),
            (Only(Thesis), DSTU),
        ],
    },
];

/// Look up the rule for a field.
pub fn rule_for(field: FieldId) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|rule| rule.field == field)
}

/// Outcome of resolving one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecision {
    /// The field means something for the source type.
    pub applicable: bool,
    /// At least one selected style needs it, or it is an initial field.
    pub required: bool,
    /// The selected styles that need it.
    pub required_by_styles: StyleSet,
}

impl FieldDecision {
    fn not_applicable() -> Self {
        Self::default()
    }
}

/// Decisions for every field of the rule table, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    source_type: SourceType,
    selected_styles: StyleSet,
    decisions: Vec<(FieldId, FieldDecision)>,
}

impl Resolution {
    /// The source type this resolution was computed for.
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// The style selection this resolution was computed for.
    pub fn selected_styles(&self) -> &StyleSet {
        &self.selected_styles
    }

    /// Iterate over all decisions in table order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldDecision)> {
        self.decisions
            .iter()
            .map(|(field, decision)| (*field, decision))
    }

    pub fn decision(&self, field: FieldId) -> Option<&FieldDecision> {
        self.decisions
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, decision)| decision)
    }

    pub fn is_applicable(&self, field: FieldId) -> bool {
        self.decision(field).is_some_and(|d| d.applicable)
    }

    pub fn is_required(&self, field: FieldId) -> bool {
        self.decision(field).is_some_and(|d| d.required)
    }

    /// Applicable fields that must be filled in, in table order.
    pub fn required_fields(&self) -> Vec<FieldId> {
        self.iter()
            .filter(|(_, d)| d.applicable && d.required)
            .map(|(field, _)| field)
            .collect()
    }

    /// Applicable fields in presentation order: required first, then optional.
    ///
    /// Both groups keep the table order.
    pub fn presentation_order(&self) -> Vec<FieldId> {
        let (required, optional): (Vec<_>, Vec<_>) = self
            .iter()
            .filter(|(_, d)| d.applicable)
            .partition(|(_, d)| d.required);

        required
            .into_iter()
            .chain(optional)
            .map(|(field, _)| field)
            .collect()
    }

    /// Explanation of why a field is required, naming the styles that need it.
    ///
    /// Returns `None` for fields that are not required by any selected style.
    pub fn required_hint(&self, field: FieldId) -> Option<String> {
        let decision = self.decision(field)?;
        if !decision.required || decision.required_by_styles.is_empty() {
            return None;
        }
        Some(format!(
            "This field is required for styles: {}",
            decision
                .required_by_styles
                .iter()
                .map(CitationStyle::display_name)
                .join(", ")
        ))
    }
}

/// Resolve the rule table for a source type and a style selection.
///
/// An empty selection is not an error: it yields a resolution in which no field
/// is applicable or required, and callers are expected to ask the user to pick a
/// style first.
pub fn resolve(source_type: SourceType, selected_styles: &StyleSet) -> Resolution {
    let decisions = FIELD_RULES
        .iter()
        .map(|rule| (rule.field, decide(rule, source_type, selected_styles)))
        .collect::<Vec<_>>();

    debug!(
        source_type = %source_type,
        styles = %selected_styles.iter().join(","),
        required = decisions.iter().filter(|(_, d)| d.required).count(),
        "resolved field requirements"
    );

    Resolution {
        source_type,
        selected_styles: selected_styles.clone(),
        decisions,
    }
}

/// Like [`resolve`], taking the source type by its form name.
///
/// # Errors
///
/// Returns [`CitationError::InvalidSourceType`] if the name is not one of
/// `article`, `book`, `conference`, `webpage` or `thesis`.
pub fn resolve_named(
    source_type: &str,
    selected_styles: &StyleSet,
) -> Result<Resolution, CitationError> {
    let source_type = SourceType::from_str(source_type)?;
    Ok(resolve(source_type, selected_styles))
}

fn decide(rule: &FieldRule, source_type: SourceType, selected: &StyleSet) -> FieldDecision {
    if selected.is_empty() || !rule.applies_to(source_type) {
        return FieldDecision::not_applicable();
    }

    let required_by_styles: StyleSet = rule
        .required_styles(source_type)
        .intersection(selected)
        .copied()
        .collect();

    FieldDecision {
        applicable: true,
        required: rule.field.is_initial() || !required_by_styles.is_empty(),
        required_by_styles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn styles(list: &[CitationStyle]) -> StyleSet {
        list.iter().copied().collect()
    }

    /// Every non-empty subset of the built-in styles.
    fn style_subsets() -> Vec<StyleSet> {
        (1..=CitationStyle::ALL.len())
            .flat_map(|k| CitationStyle::ALL.into_iter().combinations(k))
            .map(|subset| subset.into_iter().collect())
            .collect()
    }

    #[test]
    fn test_style_subsets_cover_seven_combinations() {
        assert_eq!(style_subsets().len(), 7);
    }

    #[test]
    fn test_initial_fields_always_required() {
        for source_type in SourceType::ALL {
            for selected in style_subsets() {
                let resolution = resolve(source_type, &selected);
                for field in FieldId::INITIAL {
                    assert!(
                        resolution.is_required(field),
                        "{field} not required for {source_type} with {selected:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_all_scoped_fields_applicable_everywhere() {
        let selected = styles(&[CitationStyle::Ieee]);
        for source_type in SourceType::ALL {
            let resolution = resolve(source_type, &selected);
            for field in [FieldId::Authors, FieldId::Title, FieldId::Year, FieldId::Doi] {
                assert!(resolution.is_applicable(field));
            }
        }
    }

    #[rstest]
    #[case(SourceType::Article, FieldId::Institution)]
    #[case(SourceType::Book, FieldId::Journal)]
    #[case(SourceType::Webpage, FieldId::Pages)]
    #[case(SourceType::Thesis, FieldId::Publisher)]
    #[case(SourceType::Webpage, FieldId::Language)]
    fn test_unscoped_field_not_applicable(#[case] source_type: SourceType, #[case] field: FieldId) {
        let resolution = resolve(source_type, &styles(&CitationStyle::ALL));
        assert_eq!(
            resolution.decision(field),
            Some(&FieldDecision {
                applicable: false,
                required: false,
                required_by_styles: StyleSet::new(),
            })
        );
    }

    #[test]
    fn test_thesis_dstu_requires_institution_and_type() {
        let resolution = resolve(SourceType::Thesis, &styles(&[CitationStyle::Dstu]));
        assert!(resolution.is_required(FieldId::Institution));
        assert!(resolution.is_required(FieldId::ThesisType));
        assert_eq!(
            resolution.decision(FieldId::Institution).unwrap().required_by_styles,
            styles(&[CitationStyle::Dstu])
        );
    }

    #[rstest]
    #[case(&[CitationStyle::Ieee], false)]
    #[case(&[CitationStyle::Dstu], true)]
    #[case(&[CitationStyle::Apa, CitationStyle::Ieee], true)]
    fn test_conference_location_depends_on_style(
        #[case] selected: &[CitationStyle],
        #[case] required: bool,
    ) {
        let resolution = resolve(SourceType::Conference, &styles(selected));
        assert!(resolution.is_applicable(FieldId::Location));
        assert_eq!(resolution.is_required(FieldId::Location), required);
    }

    #[test]
    fn test_required_by_styles_is_intersection() {
        let resolution = resolve(
            SourceType::Article,
            &styles(&[CitationStyle::Dstu, CitationStyle::Apa]),
        );
        let url = resolution.decision(FieldId::Url).unwrap();
        assert!(url.applicable);
        assert!(url.required);
        assert_eq!(url.required_by_styles, styles(&[CitationStyle::Apa]));
    }

    #[test]
    fn test_empty_selection_yields_empty_decisions() {
        let resolution = resolve(SourceType::Book, &StyleSet::new());
        assert!(resolution.iter().all(|(_, d)| *d == FieldDecision::default()));
        assert!(resolution.presentation_order().is_empty());
    }

    #[test]
    fn test_presentation_order_required_first() {
        let resolution = resolve(SourceType::Conference, &styles(&[CitationStyle::Ieee]));
        assert_eq!(
            resolution.presentation_order(),
            vec![
                FieldId::Authors,
                FieldId::Title,
                FieldId::Year,
                FieldId::Doi,
                FieldId::Issue,
                FieldId::Pages,
                FieldId::ConferenceName,
                FieldId::Url,
                FieldId::ConferenceLocation,
                FieldId::ConferenceDate,
                // optional for IEEE
                FieldId::Publisher,
                FieldId::Location,
                FieldId::Language,
            ]
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let selected = styles(&[CitationStyle::Apa]);
        assert_eq!(
            resolve(SourceType::Webpage, &selected),
            resolve(SourceType::Webpage, &selected)
        );
    }

    #[test]
    fn test_resolve_named_rejects_unknown_source_type() {
        let selected = styles(&[CitationStyle::Apa]);
        assert!(resolve_named("thesis", &selected).is_ok());
        assert!(matches!(
            resolve_named("patent", &selected),
            Err(CitationError::InvalidSourceType(name)) if name == "patent"
        ));
    }

    #[test]
    fn test_required_hint_names_styles() {
        let resolution = resolve(
            SourceType::Book,
            &styles(&[CitationStyle::Dstu, CitationStyle::Ieee]),
        );
        assert_eq!(
            resolution.required_hint(FieldId::Location).as_deref(),
            Some("This field is required for styles: DSTU 8302:2015")
        );
        assert_eq!(
            resolution.required_hint(FieldId::Publisher).as_deref(),
            Some("This field is required for styles: DSTU 8302:2015, IEEE")
        );
        assert_eq!(resolution.required_hint(FieldId::Journal), None);
    }

    #[test]
    fn test_every_field_has_one_rule() {
        let fields: Vec<_> = FIELD_RULES.iter().map(|rule| rule.field).collect();
        assert_eq!(fields.iter().unique().count(), fields.len());
        for field in &fields {
            assert_eq!(field.key().parse::<FieldId>().unwrap(), *field);
            assert!(rule_for(*field).is_some());
        }
    }
}
