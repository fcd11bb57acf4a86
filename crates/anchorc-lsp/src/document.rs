//! Open-document tracking.
//!
//! The server only supports full-document sync: every `didChange`
//! replaces the whole body with the last content change in the batch,
//! never incremental ranges — an edit just triggers a full
//! re-lex/re-parse/re-analyze anyway, so there is nothing to gain from
//! tracking incremental deltas.

use std::collections::HashMap;

use lsp_types::Uri;

pub struct Document {
    pub text: String,
    pub version: i32,
}

#[derive(Default)]
pub struct DocumentManager {
    documents: HashMap<Uri, Document>,
}

impl DocumentManager {
    pub fn new() -> Self {
        DocumentManager::default()
    }

    pub fn open(&mut self, uri: Uri, text: String, version: i32) {
        self.documents.insert(uri, Document { text, version });
    }

    /// Replaces the tracked text with the last change in `changes`,
    /// discarding any earlier entries in the batch.
    pub fn change(&mut self, uri: &Uri, changes: Vec<lsp_types::TextDocumentContentChangeEvent>, version: i32) {
        let Some(last) = changes.into_iter().last() else { return };
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.text = last.text;
            doc.version = version;
        }
    }

    pub fn close(&mut self, uri: &Uri) {
        self.documents.remove(uri);
    }

    pub fn get(&self, uri: &Uri) -> Option<&Document> {
        self.documents.get(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn change_keeps_only_the_last_event_in_the_batch() {
        let mut manager = DocumentManager::new();
        let u = uri("file:///tmp/main.anc");
        manager.open(u.clone(), "first".to_string(), 1);

        manager.change(
            &u,
            vec![
                lsp_types::TextDocumentContentChangeEvent { range: None, range_length: None, text: "second".to_string() },
                lsp_types::TextDocumentContentChangeEvent { range: None, range_length: None, text: "third".to_string() },
            ],
            2,
        );

        assert_eq!(manager.get(&u).unwrap().text, "third");
        assert_eq!(manager.get(&u).unwrap().version, 2);
    }

    #[test]
    fn close_removes_the_document() {
        let mut manager = DocumentManager::new();
        let u = uri("file:///tmp/main.anc");
        manager.open(u.clone(), "x".to_string(), 1);
        manager.close(&u);
        assert!(manager.get(&u).is_none());
    }
}
