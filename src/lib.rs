pub mod agent;
pub mod cli;
pub mod config;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod projection;
pub mod server;
pub mod store;

use agent::EllaAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Conversation Store Type: {}", args.store_type);
    info!("Conversation Store Host: {}", args.store_host);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Evaluation Model: {}", args.evaluation_model.as_deref().unwrap_or("same as chat"));
    info!("Embedding LLM Type: {}", args.embedding_llm_type);
    info!("Prompts Path: {}", args.prompts_path);
    info!("Buffer Radius: {}", args.buffer_radius);
    info!("Chat Rate Limit: {}/s", args.chat_rate_limit);
    info!("TLS Enabled: {}", args.tls_paths().is_some());
    info!("-------------------------");

    let agent = Arc::new(EllaAgent::new(&args)?);
    let server = Server::new(args.server_addr.clone(), agent, args);
    server.run().await?;

    Ok(())
}
