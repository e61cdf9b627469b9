//! Sequential batch scans over the conversation store. Each job fetches the
//! documents missing its field, calls one external API per document and
//! writes that field back. A failing item is logged and left untouched.

pub mod embedding;
pub mod evaluation;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, ok: bool) {
        self.processed += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::error::Error as StdError;
    use std::sync::Mutex;

    use crate::llm::chat::{ ChatClient, CompletionOptions, CompletionResponse };
    use crate::llm::embedding::{ EmbeddingClient, EmbeddingResponse };
    use crate::models::chat::ChatMessage;

    /// Replies with `reply`, or fails when the last message contains `fail_on`.
    pub struct ScriptedChat {
        pub reply: String,
        pub fail_on: Option<String>,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        pub fn new(reply: &str) -> Self {
            Self { reply: reply.to_string(), fail_on: None, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            if let Some(marker) = &self.fail_on {
                if last.contains(marker.as_str()) {
                    return Err("upstream unavailable".into());
                }
            }
            Ok(CompletionResponse { response: self.reply.clone() })
        }

        fn get_model(&self) -> String {
            "scripted".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    /// Embeds text as `[len, word count, 1]`, failing on texts containing `fail_on`.
    pub struct LengthEmbedder {
        pub fail_on: Option<String>,
    }

    #[async_trait]
    impl EmbeddingClient for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<EmbeddingResponse, Box<dyn StdError + Send + Sync>> {
            if let Some(marker) = &self.fail_on {
                if text.contains(marker.as_str()) {
                    return Err("model loading".into());
                }
            }
            let words = text.split_whitespace().count() as f32;
            Ok(EmbeddingResponse { embedding: vec![text.len() as f32, words, 1.0] })
        }
    }
}
