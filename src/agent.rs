use log::info;
use std::error::Error;
use std::sync::Arc;

use crate::cli::Args;
use crate::config::prompt::{ self, tutor_messages, PromptConfig };
use crate::jobs::{ embedding::run_embedding_batch, evaluation::run_evaluation_batch, BatchReport };
use crate::llm::{ LlmConfig, LlmType };
use crate::llm::chat::{ ChatClient, CompletionOptions, new_client as new_chat_client };
use crate::llm::embedding::{ EmbeddingClient, new_client as new_embedding_client };
use crate::models::chat::{ ChatMessage, Conversation, NewConversation };
use crate::models::review::{ FlaggedPoint, ProjectedPoint, Projection };
use crate::projection::{ self, proximity::{ flag_points, PlotArea, ProximityConfig } };
use crate::store::{ initialize_conversation_store, ConversationStore };

fn non_empty(key: &str) -> Option<String> {
    Some(key.to_string()).filter(|k| !k.trim().is_empty())
}

/// Wires the model clients, the conversation store and the prompts together
/// behind the operations exposed over HTTP.
#[derive(Clone)]
pub struct EllaAgent {
    chat_client: Arc<dyn ChatClient>,
    evaluation_client: Arc<dyn ChatClient>,
    embedding_client: Arc<dyn EmbeddingClient>,
    store: Arc<dyn ConversationStore>,
    prompt_config: Arc<PromptConfig>,
    proximity: ProximityConfig,
    plot_area: PlotArea,
}

impl EllaAgent {
    fn initialize_llm_clients(
        args: &Args
    ) -> Result<
        (Arc<dyn ChatClient>, Arc<dyn ChatClient>, Arc<dyn EmbeddingClient>),
        Box<dyn Error + Send + Sync>
    > {
        let chat_llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            api_key: non_empty(&args.chat_api_key),
            completion_model: args.chat_model.clone(),
            embedding_model: None,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, URL={:?}",
            chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url()
        );

        let evaluation_config = LlmConfig {
            completion_model: args.evaluation_model.clone().or_else(|| args.chat_model.clone()),
            ..chat_config
        };
        let evaluation_client = new_chat_client(&evaluation_config)?;
        info!(
            "Evaluation client configured: Type={}, Model={}",
            chat_llm_type,
            evaluation_client.get_model()
        );

        let embedding_llm_type: LlmType = args.embedding_llm_type.parse()?;
        let embedding_config = LlmConfig {
            llm_type: embedding_llm_type,
            base_url: args.embedding_base_url.clone(),
            api_key: non_empty(&args.embedding_api_key),
            embedding_model: args.embedding_model.clone(),
            completion_model: None,
        };
        let embedding_client = new_embedding_client(&embedding_config)?;
        info!(
            "Embedding client configured: Type={}, Model={:?}",
            embedding_llm_type,
            embedding_config.embedding_model.as_deref().unwrap_or("adapter default")
        );

        Ok((chat_client, evaluation_client, embedding_client))
    }

    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let (chat_client, evaluation_client, embedding_client) = Self::initialize_llm_clients(args)?;
        let store = initialize_conversation_store(args)?;
        let prompt_config = prompt::load_prompts(&args.prompts_path)?;

        Ok(Self {
            chat_client,
            evaluation_client,
            embedding_client,
            store,
            prompt_config,
            proximity: ProximityConfig::new(args.buffer_radius),
            plot_area: PlotArea::default(),
        })
    }

    /// Builds an agent from already constructed parts. The same client
    /// serves tutor replies and evaluations.
    pub fn from_parts(
        chat_client: Arc<dyn ChatClient>,
        embedding_client: Arc<dyn EmbeddingClient>,
        store: Arc<dyn ConversationStore>,
        prompt_config: Arc<PromptConfig>,
        proximity: ProximityConfig
    ) -> Self {
        Self {
            evaluation_client: Arc::clone(&chat_client),
            chat_client,
            embedding_client,
            store,
            prompt_config,
            proximity,
            plot_area: PlotArea::default(),
        }
    }

    pub fn proximity(&self) -> &ProximityConfig {
        &self.proximity
    }

    /// Returns the tutor persona's reply to the transcript so far.
    pub async fn chat_turn(
        &self,
        transcript: &[ChatMessage]
    ) -> Result<ChatMessage, Box<dyn Error + Send + Sync>> {
        let messages = tutor_messages(&self.prompt_config, transcript);
        let reply = self.chat_client.complete(&messages, &CompletionOptions::tutor()).await?;
        Ok(ChatMessage::assistant(reply.response))
    }

    pub async fn save_conversation(
        &self,
        conversation: NewConversation
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let saved = self.store.insert(conversation).await?;
        info!(
            "Saved conversation {} ({} messages, student: {})",
            saved.id,
            saved.messages.len(),
            saved.is_student_response
        );
        Ok(saved)
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, Box<dyn Error + Send + Sync>> {
        self.store.list().await
    }

    pub async fn evaluate_pending(&self) -> Result<BatchReport, Box<dyn Error + Send + Sync>> {
        run_evaluation_batch(
            self.store.as_ref(),
            self.evaluation_client.as_ref(),
            &self.prompt_config
        ).await
    }

    pub async fn embed_pending(&self) -> Result<BatchReport, Box<dyn Error + Send + Sync>> {
        run_embedding_batch(self.store.as_ref(), self.embedding_client.as_ref()).await
    }

    /// Projects the stored embeddings. Fails with
    /// [`projection::ProjectionError`] when no conversation has an embedding.
    pub async fn projection(
        &self,
        buffer_radius: Option<f64>
    ) -> Result<Projection, Box<dyn Error + Send + Sync>> {
        let radius = match buffer_radius {
            Some(r) => ProximityConfig::new(r).default_radius,
            None => self.proximity.default_radius,
        };
        let conversations = self.store.with_embeddings().await?;
        Ok(projection::project(&conversations, radius)?)
    }

    pub fn flag(&self, points: &[ProjectedPoint]) -> Vec<FlaggedPoint> {
        flag_points(points, &self.plot_area, &self.proximity)
    }
}
