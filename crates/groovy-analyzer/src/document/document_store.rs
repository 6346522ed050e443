use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use super::Document;

/// The set of documents the editor currently has open, keyed by URI.
///
/// Compilation, navigation, and diagnostics all read snapshots from here
/// rather than holding text themselves, so an in-flight query keeps working
/// on the text it started with while the editor keeps typing. A `DashMap`
/// carries the concurrency; callers never lock.
#[derive(Debug, Default)]
pub struct DocumentStore {
    open_documents: DashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened document.
    pub fn open(&self, uri: Url, text: String, version: i32) {
        self.open_documents
            .insert(uri.clone(), Document::new(uri, text, version));
    }

    /// Install a full replacement text, as delivered by full-content sync.
    /// An untracked URI is treated as a late open rather than dropped.
    pub fn update(&self, uri: Url, text: String, version: i32) {
        match self.open_documents.get_mut(&uri) {
            Some(mut document) => document.set_content(text, version),
            None => self.open(uri, text, version),
        }
    }

    /// Stop tracking a closed document.
    pub fn close(&self, uri: &Url) {
        self.open_documents.remove(uri);
    }

    /// Snapshot of the document, if the URI is open.
    pub fn get(&self, uri: &Url) -> Option<Document> {
        self.open_documents.get(uri).map(|entry| entry.clone())
    }

    /// The current text alone, for queries that only need to compile.
    pub fn get_content(&self, uri: &Url) -> Option<String> {
        self.open_documents.get(uri).map(|entry| entry.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///store.groovy").unwrap()
    }

    #[test]
    fn open_update_close_lifecycle() {
        let store = DocumentStore::new();
        assert!(store.get_content(&uri()).is_none());

        store.open(uri(), "v1".into(), 1);
        assert_eq!(store.get_content(&uri()).as_deref(), Some("v1"));

        store.update(uri(), "v2".into(), 2);
        let snapshot = store.get(&uri()).unwrap();
        assert_eq!(snapshot.text, "v2");
        assert_eq!(snapshot.version, 2);

        store.close(&uri());
        assert!(store.get_content(&uri()).is_none());
    }

    #[test]
    fn update_of_untracked_document_opens_it() {
        let store = DocumentStore::new();
        store.update(uri(), "hello".into(), 3);
        let snapshot = store.get(&uri()).unwrap();
        assert_eq!(snapshot.text, "hello");
        assert_eq!(snapshot.version, 3);
    }

    #[test]
    fn snapshots_are_detached_from_later_edits() {
        let store = DocumentStore::new();
        store.open(uri(), "before".into(), 1);
        let snapshot = store.get(&uri()).unwrap();

        store.update(uri(), "after".into(), 2);
        assert_eq!(snapshot.text, "before", "snapshot is a copy, not a view");
        assert_eq!(store.get_content(&uri()).as_deref(), Some("after"));
    }
}
