pub mod api;

use crate::agent::EllaAgent;
use crate::cli::Args;
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<EllaAgent>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<EllaAgent>, args: Args) -> Self {
        Self { addr, agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let state = api::AppState::new(Arc::clone(&self.agent), self.args.chat_rate_limit);
        let app = api::router(state);

        if let Some((cert_path, key_path)) = self.args.tls_paths() {
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;
            info!("Starting HTTPS server on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Starting HTTP server on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
