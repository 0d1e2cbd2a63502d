pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod directory;
pub mod ui;

use agent::ServiceAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model);
    info!(
        "Analysis LLM Type: {}",
        args.analysis_llm_type.as_deref().unwrap_or(&args.chat_llm_type)
    );
    info!("Analysis Model: {}", args.analysis_model);
    info!("API Key Configured: {}", args.resolved_chat_api_key().is_some());
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("builtin"));
    info!("Directory Path: {}", args.directory_path.as_deref().unwrap_or("builtin"));
    info!("Requests Per Second: {}", args.requests_per_second);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(ServiceAgent::new(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
