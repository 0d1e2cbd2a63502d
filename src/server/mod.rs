pub mod api;

use crate::agent::ServiceAgent;
use crate::cli::Args;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use log::{ info, error };

pub struct Server {
    addr: String,
    agent: Arc<ServiceAgent>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<ServiceAgent>, args: Args) -> Self {
        Self { addr, agent, args }
    }

    fn tls_paths(&self) -> Result<Option<(&str, &str)>, Box<dyn Error + Send + Sync>> {
        if !self.args.enable_tls {
            info!("TLS not enabled. Running plain HTTP server.");
            return Ok(None);
        }
        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => Ok(Some((cert_path.as_str(), key_path.as_str()))),
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>().map_err(|e|
            format!("Invalid server address '{}': {}", self.addr, e)
        )?;
        let state = api::AppState::new(
            Arc::clone(&self.agent),
            self.args.prompts_path.clone(),
            self.args.requests_per_second
        );
        let app = api::router(state);

        match self.tls_paths()? {
            Some((cert_path, key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                // Both ring and aws-lc-rs are compiled in, so rustls needs an explicit provider.
                let _ = rustls::crypto::ring::default_provider().install_default();
                let tls_config = axum_server::tls_rustls::RustlsConfig
                    ::from_pem_file(cert_path, key_path).await
                    .map_err(|e| format!("Failed to load TLS certificate/key: {}", e))?;

                info!("HTTPS server listening on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            None => {
                let listener = tokio::net::TcpListener
                    ::bind(addr).await
                    .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
                info!("HTTP server listening on: http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }
}
