use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use log::error;
use redis::{ AsyncCommands, Client };
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::{ ConversationStore, StoreError };
use crate::models::chat::{ ChatMessage, Conversation, NewConversation };

const FIELD_MESSAGES: &str = "messages";
const FIELD_TIMESTAMP: &str = "timestamp";
const FIELD_EMBEDDING: &str = "embedding";
const FIELD_IS_STUDENT: &str = "is_student_response";
const FIELD_EVALUATION: &str = "evaluation";

/// One hash per conversation plus a sorted set ordering ids by insertion.
/// Index scores come from an `INCR` counter, so two saves in the same
/// millisecond still list in the order they were made. `HSET` on a single
/// field keeps updates field-atomic.
pub struct RedisConversationStore {
    client: Client,
    key_prefix: String,
}

impl RedisConversationStore {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    fn index_key(&self) -> String {
        format!("{}index", self.key_prefix)
    }

    fn seq_key(&self) -> String {
        format!("{}seq", self.key_prefix)
    }

    /// Writes the hash and its index entry in one MULTI/EXEC block.
    fn insert_pipeline(&self, id: &str, fields: &[(&'static str, String)], seq: i64) -> redis::Pipeline {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset_multiple(self.key(id), fields)
            .ignore()
            .zadd(self.index_key(), id, seq)
            .ignore();
        pipe
    }

    async fn set_field(
        &self,
        id: &str,
        field: &str,
        value: String
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let key = self.key(id);
        let exists: bool = conn.exists(&key).await?;
        if !exists {
            return Err(Box::new(StoreError::NotFound(id.to_string())));
        }
        let _: i64 = conn.hset(&key, field, value).await?;
        Ok(())
    }
}

pub(crate) fn conversation_to_fields(
    conversation: &Conversation
) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    let mut fields = vec![
        (FIELD_MESSAGES, serde_json::to_string(&conversation.messages)?),
        (FIELD_TIMESTAMP, conversation.timestamp.to_rfc3339()),
        (FIELD_EMBEDDING, serde_json::to_string(&conversation.embedding)?),
        (FIELD_IS_STUDENT, conversation.is_student_response.to_string())
    ];
    if let Some(evaluation) = &conversation.evaluation {
        fields.push((FIELD_EVALUATION, evaluation.clone()));
    }
    Ok(fields)
}

pub(crate) fn conversation_from_fields(
    id: &str,
    fields: &HashMap<String, String>
) -> Result<Conversation, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt { id: id.to_string(), reason };
    let field = |name: &str| {
        fields.get(name).ok_or_else(|| corrupt(format!("missing field '{}'", name)))
    };

    let messages: Vec<ChatMessage> = serde_json
        ::from_str(field(FIELD_MESSAGES)?)
        .map_err(|e| corrupt(e.to_string()))?;
    let timestamp = DateTime::parse_from_rfc3339(field(FIELD_TIMESTAMP)?)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    let embedding: Vec<f32> = match fields.get(FIELD_EMBEDDING) {
        Some(raw) => serde_json::from_str(raw).map_err(|e| corrupt(e.to_string()))?,
        None => Vec::new(),
    };
    let is_student_response = field(FIELD_IS_STUDENT)?
        .parse::<bool>()
        .map_err(|e| corrupt(e.to_string()))?;
    let evaluation = fields.get(FIELD_EVALUATION).filter(|e| !e.is_empty()).cloned();

    Ok(Conversation {
        id: id.to_string(),
        messages,
        timestamp,
        embedding,
        is_student_response,
        evaluation,
    })
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn insert(
        &self,
        conversation: NewConversation
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let stored = Conversation {
            id: Uuid::new_v4().to_string(),
            messages: conversation.messages,
            timestamp: Utc::now(),
            embedding: Vec::new(),
            is_student_response: conversation.is_student_response,
            evaluation: None,
        };

        let fields = conversation_to_fields(&stored)?;
        let seq: i64 = conn.incr(self.seq_key(), 1).await?;
        let _: () = self.insert_pipeline(&stored.id, &fields, seq).query_async(&mut conn).await?;

        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let ids: Vec<String> = conn.zrange(self.index_key(), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(self.key(id));
        }
        let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut conversations = Vec::with_capacity(ids.len());
        for (id, fields) in ids.iter().zip(rows) {
            if fields.is_empty() {
                continue;
            }
            match conversation_from_fields(id, &fields) {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => error!("Skipping stored conversation: {}", e),
            }
        }
        Ok(conversations)
    }

    async fn count(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let n: usize = conn.zcard(self.index_key()).await?;
        Ok(n)
    }

    async fn set_evaluation(
        &self,
        id: &str,
        evaluation: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.set_field(id, FIELD_EVALUATION, evaluation.to_string()).await
    }

    async fn set_embedding(
        &self,
        id: &str,
        embedding: &[f32]
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.set_field(id, FIELD_EMBEDDING, serde_json::to_string(embedding)?).await
    }
}
