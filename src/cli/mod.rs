use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Conversation Store Args ---
    /// Conversation store type (redis, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "redis")]
    pub store_type: String,

    /// Conversation store connection string (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORE_HOST", default_value = "redis://127.0.0.1:6379")]
    pub store_host: String,

    /// Prefix for conversation keys in Redis.
    #[arg(long, env = "STORE_PREFIX", default_value = "ella:conversations:")]
    pub store_prefix: String,

    // --- Chat LLM Provider Args ---
    /// LLM provider for the tutor persona (groq, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "groq")]
    pub chat_llm_type: String,

    /// Completion endpoint URL. Adapters pick their own default when unset.
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// API key for the chat provider.
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model used for tutor replies (e.g., llama-3.2-1b-preview)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    // --- Evaluation LLM Args (Optional) ---
    /// Model used by the evaluation batch job. Defaults to CHAT_MODEL.
    /// The evaluation job always uses the chat provider and key.
    #[arg(long, env = "EVALUATION_MODEL")]
    pub evaluation_model: Option<String>,

    // --- Embedding Provider Args ---
    /// Embedding provider (huggingface, openai, ollama)
    #[arg(long, env = "EMBEDDING_LLM_TYPE", default_value = "huggingface")]
    pub embedding_llm_type: String,

    /// Base URL for the embedding provider API.
    #[arg(long, env = "EMBEDDING_BASE_URL")]
    pub embedding_base_url: Option<String>,

    /// API key for the embedding provider.
    #[arg(long, env = "EMBEDDING_API_KEY", default_value = "")]
    pub embedding_api_key: String,

    /// Embedding model (e.g., sentence-transformers/all-MiniLM-L6-v2)
    #[arg(long, env = "EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    // --- General App Args ---
    /// Path to the prompt configuration file.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    /// Default buffer radius (pixels) around AI-generated points on the review plot.
    #[arg(long, env = "BUFFER_RADIUS", default_value = "90")]
    pub buffer_radius: f64,

    /// Chat turns allowed per second across all clients.
    #[arg(long, env = "CHAT_RATE_LIMIT", default_value = "10")]
    pub chat_rate_limit: u32,

    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// Certificate and key paths when TLS is enabled and both are set.
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        if !self.enable_tls {
            return None;
        }
        match (self.tls_cert_path.as_deref(), self.tls_key_path.as_deref()) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let args = Args::parse_from(["ella-review"]);
        assert_eq!(args.chat_llm_type, "groq");
        assert_eq!(args.embedding_llm_type, "huggingface");
        assert_eq!(args.buffer_radius, 90.0);
        assert!(args.tls_paths().is_none());
    }

    #[test]
    fn tls_requires_flag_and_both_paths() {
        let args = Args::parse_from([
            "ella-review",
            "--enable-tls",
            "--tls-cert-path",
            "cert.pem",
        ]);
        assert!(args.tls_paths().is_none());

        let args = Args::parse_from([
            "ella-review",
            "--enable-tls",
            "--tls-cert-path",
            "cert.pem",
            "--tls-key-path",
            "key.pem",
        ]);
        assert_eq!(args.tls_paths(), Some(("cert.pem", "key.pem")));
    }
}
