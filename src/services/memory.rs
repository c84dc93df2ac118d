//! In-memory persistence, used by the server by default and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{DocumentRecord, MessageRecord, MessageStore, ServiceError, SessionRecord};
use crate::core::now_ms;

#[derive(Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<String, DocumentRecord>>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
    /// Insertion order is chronological, which is what message listing wants.
    messages: RwLock<Vec<MessageRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create_document(&self, doc_text: String) -> Result<DocumentRecord, ServiceError> {
        let record = DocumentRecord {
            id: Uuid::new_v4().to_string(),
            created_at: now_ms(),
            doc_text,
        };
        self.documents.write().insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>, ServiceError> {
        Ok(self.documents.read().get(id).cloned())
    }

    async fn create_session(
        &self,
        user_id: String,
        document_id: String,
    ) -> Result<SessionRecord, ServiceError> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id,
            document_id,
            created_at: now_ms(),
        };
        self.sessions.write().insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, ServiceError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn save_message(
        &self,
        document_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<MessageRecord, ServiceError> {
        let record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            created_at: now_ms(),
            sender: sender.to_string(),
            text: text.to_string(),
        };
        self.messages.write().push(record.clone());
        Ok(record)
    }

    async fn messages_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<MessageRecord>, ServiceError> {
        Ok(self
            .messages
            .read()
            .iter()
            .filter(|m| m.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_roundtrip() {
        let store = InMemoryStore::new();
        let doc = store.create_document("hello docs".into()).await.unwrap();
        let loaded = store.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.doc_text, "hello docs");
        assert!(store.get_document("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_messages_are_scoped_and_ordered() {
        let store = InMemoryStore::new();
        store.save_message("doc-1", "user", "first").await.unwrap();
        store.save_message("doc-2", "critic", "other doc").await.unwrap();
        store.save_message("doc-1", "critic", "second").await.unwrap();

        let messages = store.messages_for_document("doc-1").await.unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_session_links_user_to_document() {
        let store = InMemoryStore::new();
        let session = store
            .create_session("user-1".into(), "doc-1".into())
            .await
            .unwrap();
        let loaded = store.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.document_id, "doc-1");
    }
}
