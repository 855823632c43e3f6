//! Persistence of drafts, results and citation history.
//!
//! [`CitationStore`] keeps its data as JSON strings in any [`KeyValueStore`].
//! Reads never fail: a missing or corrupt entry is logged and treated as absent.

use crate::FormattedCitation;
use crate::error::StorageError;
use crate::form::FormInput;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Keys under which [`CitationStore`] writes its entries.
pub mod keys {
    pub const FORM_DATA: &str = "citationFormData";
    pub const CITATIONS: &str = "citationResults";
    pub const RECENT_CITATIONS: &str = "recentCitations";
    pub const LAST_UPDATED: &str = "dataLastUpdated";
}

/// How many results the history keeps before dropping the oldest.
pub const MAX_RECENT_CITATIONS: usize = 20;

/// A string key/value backend, such as browser local storage or a file.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory [`KeyValueStore`], optionally limited to a number of bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes once keys and values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(quota) = self.quota
            && self.used_without(key) + key.len() + value.len() > quota
        {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One saved result in the citation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub data: FormattedCitation,
}

/// Everything the store holds, as written by [`CitationStore::export_all`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default)]
    pub form_data: Option<FormInput>,
    #[serde(default)]
    pub citations: Option<FormattedCitation>,
    #[serde(default)]
    pub recent_citations: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub last_updated: Option<i64>,
}

/// Saves drafts and results on top of a [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct CitationStore<S> {
    backend: S,
}

impl<S: KeyValueStore> CitationStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Save the form as a draft.
    pub fn save_draft(&mut self, input: &FormInput) -> Result<(), StorageError> {
        self.write(keys::FORM_DATA, input)?;
        self.touch()
    }

    /// The saved draft, if there is a readable one.
    pub fn load_draft(&self) -> Option<FormInput> {
        self.read(keys::FORM_DATA)
    }

    /// Save a result and push it onto the history.
    pub fn save_result(&mut self, citations: &FormattedCitation) -> Result<(), StorageError> {
        self.write(keys::CITATIONS, citations)?;

        let mut history = self.load_history();
        history.insert(
            0,
            HistoryEntry {
                timestamp: now_millis(),
                data: citations.clone(),
            },
        );
        history.truncate(MAX_RECENT_CITATIONS);
        self.write(keys::RECENT_CITATIONS, &history)?;

        self.touch()
    }

    /// The most recently saved result.
    pub fn load_result(&self) -> Option<FormattedCitation> {
        self.read(keys::CITATIONS)
    }

    /// Saved results, newest first.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.read(keys::RECENT_CITATIONS).unwrap_or_default()
    }

    /// When any entry was last written, in milliseconds since the Unix epoch.
    pub fn last_updated(&self) -> Option<i64> {
        let raw = self.raw(keys::LAST_UPDATED)?;
        raw.trim().parse().ok()
    }

    /// Remove the draft, the result and the history.
    ///
    /// The last-updated timestamp is bumped rather than removed.
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        for key in [keys::FORM_DATA, keys::CITATIONS, keys::RECENT_CITATIONS] {
            self.backend.remove(key)?;
        }
        self.touch()
    }

    /// Everything in the store as pretty-printed JSON.
    pub fn export_all(&self) -> Result<String, StorageError> {
        let backup = Backup {
            form_data: self.load_draft(),
            citations: self.load_result(),
            recent_citations: Some(self.load_history()),
            last_updated: self.last_updated(),
        };
        Ok(serde_json::to_string_pretty(&backup)?)
    }

    /// Restore from JSON written by [`export_all`](Self::export_all).
    ///
    /// Only the parts present in the backup are written; a history longer than
    /// [`MAX_RECENT_CITATIONS`] is cut down. Returns `false` if the input is not a
    /// valid backup or could not be written.
    pub fn import_all(&mut self, json: &str) -> bool {
        let backup: Backup = match serde_json::from_str(json) {
            Ok(backup) => backup,
            Err(err) => {
                warn!(error = %err, "rejected malformed backup");
                return false;
            }
        };

        match self.restore(backup) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to restore backup");
                false
            }
        }
    }

    fn restore(&mut self, backup: Backup) -> Result<(), StorageError> {
        if let Some(form_data) = &backup.form_data {
            self.write(keys::FORM_DATA, form_data)?;
        }
        if let Some(citations) = &backup.citations {
            self.write(keys::CITATIONS, citations)?;
        }
        if let Some(mut history) = backup.recent_citations {
            history.truncate(MAX_RECENT_CITATIONS);
            self.write(keys::RECENT_CITATIONS, &history)?;
        }
        self.touch()
    }

    fn touch(&mut self) -> Result<(), StorageError> {
        self.backend
            .set(keys::LAST_UPDATED, now_millis().to_string())
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        debug!(key, bytes = json.len(), "writing stored entry");
        self.backend.set(key, json)
    }

    fn raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "failed to read stored entry");
                None
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                let err = StorageError::Malformed {
                    key: key.to_string(),
                    source,
                };
                warn!(error = %err, "ignoring stored entry");
                None
            }
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CitationStyle;
    use pretty_assertions::assert_eq;

    fn citations(text: &str) -> FormattedCitation {
        let mut citations = FormattedCitation::new();
        citations.insert(CitationStyle::Apa, text.to_string());
        citations
    }

    fn draft() -> FormInput {
        FormInput::from_iter([("authors", "Jane Doe"), ("title", "A Study")])
    }

    /// Backend whose every operation fails.
    struct Broken;

    impl KeyValueStore for Broken {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    #[test]
    fn test_draft_round_trip() {
        let mut store = CitationStore::new(MemoryStore::new());
        assert_eq!(store.load_draft(), None);
        assert_eq!(store.last_updated(), None);

        store.save_draft(&draft()).unwrap();
        assert_eq!(store.load_draft(), Some(draft()));
        assert!(store.last_updated().is_some());
    }

    #[test]
    fn test_history_is_newest_first_and_capped() {
        let mut store = CitationStore::new(MemoryStore::new());
        for i in 0..25 {
            store.save_result(&citations(&format!("citation {i}"))).unwrap();
        }

        let history = store.load_history();
        assert_eq!(history.len(), MAX_RECENT_CITATIONS);
        assert_eq!(history[0].data, citations("citation 24"));
        assert_eq!(history[19].data, citations("citation 5"));
        assert_eq!(store.load_result(), Some(citations("citation 24")));
    }

    #[test]
    fn test_corrupt_entries_read_as_absent() {
        let mut backend = MemoryStore::new();
        backend.set(keys::FORM_DATA, "{not json".to_string()).unwrap();
        backend.set(keys::RECENT_CITATIONS, "42".to_string()).unwrap();
        backend.set(keys::LAST_UPDATED, "yesterday".to_string()).unwrap();

        let store = CitationStore::new(backend);
        assert_eq!(store.load_draft(), None);
        assert!(store.load_history().is_empty());
        assert_eq!(store.last_updated(), None);
    }

    #[test]
    fn test_clear_all_keeps_timestamp() {
        let mut store = CitationStore::new(MemoryStore::new());
        store.save_draft(&draft()).unwrap();
        store.save_result(&citations("x")).unwrap();

        store.clear_all().unwrap();
        assert_eq!(store.load_draft(), None);
        assert_eq!(store.load_result(), None);
        assert!(store.load_history().is_empty());
        assert!(store.last_updated().is_some());
    }

    #[test]
    fn test_export_then_import_into_empty_store() {
        let mut source = CitationStore::new(MemoryStore::new());
        source.save_draft(&draft()).unwrap();
        source.save_result(&citations("Doe (2020). A Study.")).unwrap();

        let json = source.export_all().unwrap();
        assert!(json.contains("\"formData\""));
        assert!(json.contains("\"recentCitations\""));

        let mut target = CitationStore::new(MemoryStore::new());
        assert!(target.import_all(&json));
        assert_eq!(target.load_draft(), Some(draft()));
        assert_eq!(target.load_result(), source.load_result());
        assert_eq!(target.load_history(), source.load_history());
    }

    #[test]
    fn test_import_only_present_parts() {
        let mut store = CitationStore::new(MemoryStore::new());
        store.save_draft(&draft()).unwrap();

        assert!(store.import_all(r#"{"citations": {"ieee": "J. Doe, \"A Study\", 2020"}}"#));
        assert_eq!(store.load_draft(), Some(draft()));
        assert_eq!(
            store.load_result().unwrap().get(CitationStyle::Ieee),
            Some("J. Doe, \"A Study\", 2020")
        );
    }

    #[test]
    fn test_import_truncates_history() {
        let entries: Vec<HistoryEntry> = (0..30)
            .map(|i| HistoryEntry {
                timestamp: i,
                data: citations("x"),
            })
            .collect();
        let json = serde_json::json!({ "recentCitations": entries }).to_string();

        let mut store = CitationStore::new(MemoryStore::new());
        assert!(store.import_all(&json));
        assert_eq!(store.load_history().len(), MAX_RECENT_CITATIONS);
    }

    #[test]
    fn test_import_rejects_malformed() {
        let mut store = CitationStore::new(MemoryStore::new());
        assert!(!store.import_all("not json"));
        assert!(!store.import_all(r#"{"recentCitations": "none"}"#));
        assert_eq!(store.last_updated(), None);
    }

    #[test]
    fn test_quota_exceeded() {
        let mut store = CitationStore::new(MemoryStore::with_quota(16));
        let err = store.save_draft(&draft()).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(!store.import_all(&serde_json::json!({ "formData": draft() }).to_string()));
    }

    #[test]
    fn test_unavailable_backend() {
        let mut store = CitationStore::new(Broken);
        assert_eq!(store.load_draft(), None);
        assert!(store.load_history().is_empty());
        assert!(matches!(
            store.save_draft(&draft()),
            Err(StorageError::Unavailable(_))
        ));
    }
}
