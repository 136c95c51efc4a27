use super::Memo;
use crate::document::RawDocument;
use crate::error::Error;
use crate::fs::FileSystem;
use crate::pointer;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use url::Url;

/// Capability to retrieve the text of a document by location (a path or URI)
#[cfg_attr(test, mockall::automock)]
pub trait DocumentFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the document cannot be retrieved.
    fn fetch(&self, location: &str) -> Result<String, Error>;
}

/// Fetches local paths and `file://` URIs
#[derive(Debug, Default)]
pub struct FileFetcher<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> FileFetcher<F> {
    pub const fn new(fs: F) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem + Send + Sync> DocumentFetcher for FileFetcher<F> {
    fn fetch(&self, location: &str) -> Result<String, Error> {
        let path = if pointer::has_scheme(location) {
            let url = Url::parse(location).map_err(|e| Error::fetch_failed(location, e))?;
            if url.scheme() != "file" {
                return Err(Error::fetch_failed(
                    location,
                    format!("'{}' URIs need a fetcher that supports them", url.scheme()),
                ));
            }
            url.to_file_path()
                .map_err(|()| Error::fetch_failed(location, "not a valid file path"))?
        } else {
            PathBuf::from(location)
        };
        Ok(self.fs.read_to_string(&path)?)
    }
}

type SharedTarget = Arc<dyn Any + Send + Sync>;
type Slots<K, V> = Mutex<HashMap<K, Arc<Memo<Result<V, String>>>>>;

/// Documents and parsed pointer targets shared by every resolution of one build.
///
/// Each external document is fetched at most once and each target is parsed at most
/// once per `(location, type)`, however many pointers reach it and from however many
/// threads. The map locks are only held to find a slot; fetching and parsing happen
/// outside them.
#[derive(Default)]
pub struct DocumentStore {
    documents: Slots<String, Arc<RawDocument>>,
    targets: Slots<(String, TypeId), SharedTarget>,
    fetches: AtomicUsize,
}

fn slot<K: Eq + Hash, V>(slots: &Slots<K, V>, key: K) -> Arc<Memo<Result<V, String>>> {
    let mut map = slots.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(map.entry(key).or_default())
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already loaded document so it is never fetched
    pub fn insert(&self, document: Arc<RawDocument>) {
        let location = document.location().to_string();
        slot(&self.documents, location).get_or_init(|| Ok(document));
    }

    /// The document at `location`, fetched and parsed on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if no fetcher is available or fetching or parsing failed. A
    /// failure is remembered and returned to later callers without fetching again.
    pub fn document(
        &self,
        location: &str,
        fetcher: Option<&dyn DocumentFetcher>,
    ) -> Result<Arc<RawDocument>, Error> {
        let slot = slot(&self.documents, location.to_string());
        let result = slot.get_or_init(|| {
            let Some(fetcher) = fetcher else {
                return Err("no document fetcher is configured".to_string());
            };
            self.fetches.fetch_add(1, Ordering::SeqCst);
            debug!(target: "refscope::reference", location, "fetching external document");
            let content = fetcher.fetch(location).map_err(|e| e.to_string())?;
            RawDocument::parse(location, &content)
                .map(Arc::new)
                .map_err(|e| e.to_string())
        });
        result
            .clone()
            .map_err(|reason| Error::fetch_failed(location, reason))
    }

    /// Documents loaded so far, root included
    #[must_use]
    pub fn documents(&self) -> Vec<Arc<RawDocument>> {
        let map = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let mut documents: Vec<_> = map
            .values()
            .filter_map(|slot| slot.get().and_then(|result| result.as_ref().ok()).cloned())
            .collect();
        documents.sort_by(|a, b| a.location().cmp(b.location()));
        documents
    }

    /// Number of fetches performed
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// The typed object at `location`, parsed from `value` on first use
    pub(crate) fn target<T>(&self, location: &str, value: &Value) -> Result<Arc<T>, String>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let slot = slot(&self.targets, (location.to_string(), TypeId::of::<T>()));
        let parsed = slot.get_or_init(|| {
            serde_json::from_value::<T>(value.clone())
                .map(|object| Arc::new(object) as SharedTarget)
                .map_err(|e| e.to_string())
        });
        match parsed {
            Ok(shared) => Arc::clone(shared)
                .downcast::<T>()
                .map_err(|_| format!("cached target at '{location}' has an unexpected type")),
            Err(reason) => Err(reason.clone()),
        }
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("fetches", &self.fetch_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OsFileSystem;

    #[test]
    fn test_document_is_fetched_once() {
        let mut fetcher = MockDocumentFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok("openapi: 3.1.0\n".to_string()));
        let store = DocumentStore::new();
        let first = store.document("common.yaml", Some(&fetcher)).unwrap();
        let second = store.document("common.yaml", Some(&fetcher)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn test_failed_fetch_is_remembered() {
        let mut fetcher = MockDocumentFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|location| Err(Error::fetch_failed(location, "offline")));
        let store = DocumentStore::new();
        assert!(store.document("https://example.com/a.yaml", Some(&fetcher)).is_err());
        let err = store
            .document("https://example.com/a.yaml", Some(&fetcher))
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn test_inserted_document_needs_no_fetcher() {
        let store = DocumentStore::new();
        store.insert(Arc::new(RawDocument::new("api.json", serde_json::json!({}))));
        assert!(store.document("api.json", None).is_ok());
        assert!(store.document("other.json", None).is_err());
    }

    #[test]
    fn test_targets_are_shared() {
        let store = DocumentStore::new();
        let value = serde_json::json!({"type": "string"});
        let a = store
            .target::<crate::document::Schema>("a.json#/S", &value)
            .unwrap();
        let b = store
            .target::<crate::document::Schema>("a.json#/S", &value)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_file_fetcher_rejects_http() {
        let fetcher = FileFetcher::new(OsFileSystem);
        let err = fetcher.fetch("https://example.com/a.yaml").unwrap_err();
        assert!(err.to_string().contains("'https' URIs"));
    }
}
