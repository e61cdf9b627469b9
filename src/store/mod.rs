mod memory;
mod redis;

pub use self::memory::MemoryConversationStore;
pub use self::redis::RedisConversationStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::cli::Args;
use crate::models::chat::{ Conversation, NewConversation };

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("conversation '{0}' not found")]
    NotFound(String),
    #[error("conversation '{id}' is malformed: {reason}")]
    Corrupt {
        id: String,
        reason: String,
    },
}

/// Persistence for conversations. Updates touch exactly one field of one
/// document; nothing is ever deleted.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn insert(
        &self,
        conversation: NewConversation
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>>;

    /// All conversations in insertion order.
    async fn list(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>>;

    async fn set_evaluation(
        &self,
        id: &str,
        evaluation: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn set_embedding(
        &self,
        id: &str,
        embedding: &[f32]
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn count(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.list().await?.len())
    }

    async fn pending_evaluation(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>> {
        Ok(
            self
                .list().await?
                .into_iter()
                .filter(|c| c.needs_evaluation())
                .collect()
        )
    }

    async fn pending_embedding(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>> {
        Ok(
            self
                .list().await?
                .into_iter()
                .filter(|c| c.needs_embedding())
                .collect()
        )
    }

    async fn with_embeddings(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>> {
        Ok(
            self
                .list().await?
                .into_iter()
                .filter(|c| !c.embedding.is_empty())
                .collect()
        )
    }
}

pub fn create_conversation_store(
    args: &Args
) -> Result<Arc<dyn ConversationStore>, Box<dyn Error + Send + Sync>> {
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let store = RedisConversationStore::new(&args.store_host, &args.store_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryConversationStore::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported conversation store type: {}", args.store_type)
                    )
                )
            ),
    }
}

pub fn initialize_conversation_store(
    args: &Args
) -> Result<Arc<dyn ConversationStore>, Box<dyn Error + Send + Sync>> {
    info!("Conversations will be stored in: {} at {}", args.store_type, args.store_host);
    create_conversation_store(args)
}
