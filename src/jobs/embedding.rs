use log::{ error, info };
use std::error::Error;

use super::BatchReport;
use crate::config::prompt::embedding_text;
use crate::llm::embedding::EmbeddingClient;
use crate::store::ConversationStore;

/// Embeds every conversation whose embedding is still empty.
pub async fn run_embedding_batch(
    store: &dyn ConversationStore,
    client: &dyn EmbeddingClient
) -> Result<BatchReport, Box<dyn Error + Send + Sync>> {
    let total = store.count().await?;
    info!("Total conversations in the store: {}", total);

    let pending = store.pending_embedding().await?;
    info!("Found {} conversations without embeddings", pending.len());

    let mut report = BatchReport::default();
    for conversation in pending {
        let text = embedding_text(&conversation.messages);

        let outcome: Result<(), Box<dyn Error + Send + Sync>> = match client.embed(&text).await {
            Ok(resp) if resp.embedding.is_empty() => {
                Err("embedding model returned an empty vector".into())
            }
            Ok(resp) => store.set_embedding(&conversation.id, &resp.embedding).await,
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(()) => info!("Stored embedding for conversation {}", conversation.id),
            Err(e) => error!("Error embedding conversation {}: {}", conversation.id, e),
        }
        report.record(outcome.is_ok());
    }

    info!(
        "Embedding batch finished: {} stored, {} failed",
        report.succeeded,
        report.failed
    );
    Ok(report)
}
