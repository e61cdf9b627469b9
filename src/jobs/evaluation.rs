use log::{ error, info };
use std::error::Error;

use super::BatchReport;
use crate::config::prompt::{ evaluation_messages, PromptConfig, NO_EVALUATION };
use crate::llm::chat::{ ChatClient, CompletionOptions };
use crate::store::ConversationStore;

/// Grades every conversation that has no evaluation yet.
///
/// Only the store scan can fail the batch; per-conversation errors are
/// counted in the report.
pub async fn run_evaluation_batch(
    store: &dyn ConversationStore,
    client: &dyn ChatClient,
    prompts: &PromptConfig
) -> Result<BatchReport, Box<dyn Error + Send + Sync>> {
    let total = store.count().await?;
    info!("Total conversations in the store: {}", total);

    let pending = store.pending_evaluation().await?;
    info!("Found {} conversations to evaluate", pending.len());

    let options = CompletionOptions::evaluation();
    let mut report = BatchReport::default();

    for conversation in pending {
        info!("Evaluating conversation: {}", conversation.id);
        let messages = evaluation_messages(prompts, &conversation.messages);

        let outcome = match client.complete(&messages, &options).await {
            Ok(reply) => {
                let evaluation = if reply.response.trim().is_empty() {
                    NO_EVALUATION.to_string()
                } else {
                    reply.response
                };
                store.set_evaluation(&conversation.id, &evaluation).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            error!("Error evaluating conversation {}: {}", conversation.id, e);
        }
        report.record(outcome.is_ok());
    }

    info!("Successfully evaluated {} conversations", report.succeeded);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::ScriptedChat;
    use crate::models::chat::{ ChatMessage, NewConversation, Role };
    use crate::store::MemoryConversationStore;

    async fn seed(store: &MemoryConversationStore, texts: &[&str]) -> Vec<String> {
        let mut ids = Vec::new();
        for text in texts {
            let saved = store
                .insert(NewConversation {
                    messages: vec![ChatMessage::user(*text), ChatMessage::assistant("Why?")],
                    is_student_response: true,
                }).await
                .unwrap();
            ids.push(saved.id);
        }
        ids
    }

    #[tokio::test]
    async fn evaluates_all_pending_conversations() {
        let store = MemoryConversationStore::new();
        seed(&store, &["one", "two"]).await;
        let chat = ScriptedChat::new("Pass. Clear explanation.");

        let report = run_evaluation_batch(&store, &chat, &PromptConfig::default()).await.unwrap();
        assert_eq!(report, BatchReport { processed: 2, succeeded: 2, failed: 0 });
        assert!(store.pending_evaluation().await.unwrap().is_empty());

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][1].content, "user: one\nassistant: Why?");
    }

    #[tokio::test]
    async fn failures_are_skipped_and_left_pending() {
        let store = MemoryConversationStore::new();
        let ids = seed(&store, &["good", "broken", "fine"]).await;
        let mut chat = ScriptedChat::new("Fail. Too vague.");
        chat.fail_on = Some("broken".into());

        let report = run_evaluation_batch(&store, &chat, &PromptConfig::default()).await.unwrap();
        assert_eq!(report, BatchReport { processed: 3, succeeded: 2, failed: 1 });

        let pending = store.pending_evaluation().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, ids[1]);
    }

    #[tokio::test]
    async fn empty_reply_stores_placeholder() {
        let store = MemoryConversationStore::new();
        seed(&store, &["one"]).await;
        let chat = ScriptedChat::new("   ");

        run_evaluation_batch(&store, &chat, &PromptConfig::default()).await.unwrap();
        let all = store.list().await.unwrap();
        assert_eq!(all[0].evaluation.as_deref(), Some(NO_EVALUATION));
    }

    #[tokio::test]
    async fn evaluated_conversations_are_not_revisited() {
        let store = MemoryConversationStore::new();
        let ids = seed(&store, &["one", "two"]).await;
        store.set_evaluation(&ids[0], "Pass").await.unwrap();
        let chat = ScriptedChat::new("Fail");

        let report = run_evaluation_batch(&store, &chat, &PromptConfig::default()).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(store.list().await.unwrap()[0].evaluation.as_deref(), Some("Pass"));
    }
}
