//! Form submission workflow.
//!
//! [`CitationService`] ties validation, formatting and persistence together the
//! way a citation form uses them, reporting to the user through a [`Notifier`].

use crate::error::CitationError;
use crate::fields::{Resolution, resolve};
use crate::form::{FormInput, ValidationConfig};
use crate::format::Formatter;
use crate::storage::{CitationStore, HistoryEntry, KeyValueStore};
use crate::{FormattedCitation, SourceType, StyleSet};
use std::fmt;
use tracing::{debug, info, warn};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        })
    }
}

/// Receives messages meant for the user.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

impl<F> Notifier for F
where
    F: Fn(&str, Severity),
{
    fn notify(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}

/// Notifier that forwards messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => warn!(%severity, "{message}"),
            Severity::Success | Severity::Info => info!(%severity, "{message}"),
        }
    }
}

/// Validates, formats and stores citation form submissions.
#[derive(Debug)]
pub struct CitationService<S, N> {
    store: CitationStore<S>,
    notifier: N,
    validation: ValidationConfig,
    formatter: Formatter,
}

impl<S: KeyValueStore, N: Notifier> CitationService<S, N> {
    /// Creates a service with default validation and the standard styles.
    pub fn new(backend: S, notifier: N) -> Self {
        Self {
            store: CitationStore::new(backend),
            notifier,
            validation: ValidationConfig::default(),
            formatter: Formatter::standard(),
        }
    }

    #[must_use]
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn store(&self) -> &CitationStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CitationStore<S> {
        &mut self.store
    }

    /// Generate citations for a submitted form.
    ///
    /// The form is validated, saved as a draft and formatted in each selected
    /// style; the result is saved to the history. Storage failures are logged
    /// and do not fail the submission.
    ///
    /// # Errors
    ///
    /// [`CitationError::NoStyleSelected`] when `styles` is empty, and
    /// [`CitationError::Validation`] when the form is incomplete or malformed.
    /// Either way the user is notified with the error message.
    pub fn submit(
        &mut self,
        input: &FormInput,
        styles: &StyleSet,
    ) -> Result<FormattedCitation, CitationError> {
        if styles.is_empty() {
            return Err(self.reject(CitationError::NoStyleSelected));
        }

        let record = match input.validate(&self.validation) {
            Ok(record) => record,
            Err(err) => return Err(self.reject(err.into())),
        };

        if let Err(err) = self.store.save_draft(input) {
            warn!(error = %err, "failed to save draft");
        }

        let citations = self.formatter.format_styles(&record, styles);
        debug!(styles = citations.len(), "citations generated");

        if let Err(err) = self.store.save_result(&citations) {
            warn!(error = %err, "failed to save citations");
        }

        Ok(citations)
    }

    /// Which fields to show and require for the current selection.
    ///
    /// With no style selected the user is reminded to pick one.
    pub fn field_layout(&self, source_type: SourceType, styles: &StyleSet) -> Resolution {
        if styles.is_empty() {
            self.notifier
                .notify(&CitationError::NoStyleSelected.to_string(), Severity::Info);
        }
        resolve(source_type, styles)
    }

    /// The draft saved by the last submission, if any.
    pub fn restore_draft(&self) -> Option<FormInput> {
        self.store.load_draft()
    }

    /// Saved results, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.load_history()
    }

    /// Restore data from a backup, telling the user how it went.
    pub fn import_backup(&mut self, json: &str) -> bool {
        let restored = self.store.import_all(json);
        if restored {
            self.notifier.notify("Saved data restored", Severity::Success);
        } else {
            self.notifier
                .notify("Could not restore saved data from this file", Severity::Error);
        }
        restored
    }

    fn reject(&self, err: CitationError) -> CitationError {
        self.notifier.notify(&err.to_string(), Severity::Error);
        err
    }
}
