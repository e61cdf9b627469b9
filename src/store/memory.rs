use async_trait::async_trait;
use chrono::Utc;
use std::error::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ ConversationStore, StoreError };
use crate::models::chat::{ Conversation, NewConversation };

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<Vec<Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: &str, apply: F) -> Result<(), Box<dyn Error + Send + Sync>>
        where F: FnOnce(&mut Conversation)
    {
        let mut guard = self.conversations.write().await;
        let conversation = guard
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply(conversation);
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn insert(
        &self,
        conversation: NewConversation
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let stored = Conversation {
            id: Uuid::new_v4().to_string(),
            messages: conversation.messages,
            timestamp: Utc::now(),
            embedding: Vec::new(),
            is_student_response: conversation.is_student_response,
            evaluation: None,
        };
        self.conversations.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>> {
        Ok(self.conversations.read().await.clone())
    }

    async fn set_evaluation(
        &self,
        id: &str,
        evaluation: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.update(id, |c| {
            c.evaluation = Some(evaluation.to_string());
        }).await
    }

    async fn set_embedding(
        &self,
        id: &str,
        embedding: &[f32]
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.update(id, |c| {
            c.embedding = embedding.to_vec();
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;

    fn new_conversation(text: &str, student: bool) -> NewConversation {
        NewConversation {
            messages: vec![ChatMessage::user(text)],
            is_student_response: student,
        }
    }

    #[tokio::test]
    async fn insert_starts_without_derived_fields() {
        let store = MemoryConversationStore::new();
        let saved = store.insert(new_conversation("cells divide", true)).await.unwrap();
        assert!(saved.embedding.is_empty());
        assert!(saved.evaluation.is_none());
        assert!(Uuid::parse_str(&saved.id).is_ok());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = MemoryConversationStore::new();
        let a = store.insert(new_conversation("a", true)).await.unwrap();
        let b = store.insert(new_conversation("b", false)).await.unwrap();
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn updates_touch_a_single_field() {
        let store = MemoryConversationStore::new();
        let a = store.insert(new_conversation("a", true)).await.unwrap();
        let b = store.insert(new_conversation("b", true)).await.unwrap();

        store.set_evaluation(&a.id, "Pass").await.unwrap();
        store.set_embedding(&b.id, &[0.1, 0.2]).await.unwrap();

        let pending_eval = store.pending_evaluation().await.unwrap();
        assert_eq!(pending_eval.len(), 1);
        assert_eq!(pending_eval[0].id, b.id);
        assert!(pending_eval[0].evaluation.is_none());

        let pending_emb = store.pending_embedding().await.unwrap();
        assert_eq!(pending_emb.len(), 1);
        assert_eq!(pending_emb[0].id, a.id);
        assert_eq!(pending_emb[0].evaluation.as_deref(), Some("Pass"));

        let embedded = store.with_embeddings().await.unwrap();
        assert_eq!(embedded[0].embedding, vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryConversationStore::new();
        let err = store.set_evaluation("missing", "Pass").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
