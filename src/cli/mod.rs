use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Home-repair concierge: landing page, chat widget and conversation endpoint", long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for the scripted conversation (openai, groq, deepseek, xai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider. Falls back to OPENAI_API_KEY when empty.
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for the scripted conversation reply
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4-turbo-preview")]
    pub chat_model: String,

    // --- Analysis LLM Provider Args (Optional) ---
    /// Type of LLM provider for conversation analysis. Defaults to CHAT_LLM_TYPE if not set.
    #[arg(long, env = "ANALYSIS_LLM_TYPE")]
    pub analysis_llm_type: Option<String>,

    /// Base URL for the analysis provider API. Defaults to CHAT_BASE_URL if not set.
    #[arg(long, env = "ANALYSIS_BASE_URL")]
    pub analysis_base_url: Option<String>,

    /// API Key for the analysis provider. Defaults to the chat key if not set.
    #[arg(long, env = "ANALYSIS_API_KEY", hide_env_values = true)]
    pub analysis_api_key: Option<String>,

    /// Model name for the JSON conversation analysis
    #[arg(long, env = "ANALYSIS_MODEL", default_value = "gpt-4o-mini")]
    pub analysis_model: String,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Optional path to a prompt file overriding the builtin system and analysis prompts.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Optional path to a JSON list of businesses replacing the builtin directory.
    #[arg(long, env = "DIRECTORY_PATH")]
    pub directory_path: Option<String>,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Global limit of inbound requests per second.
    #[arg(long, env = "REQUESTS_PER_SECOND", default_value = "10")]
    pub requests_per_second: u32,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// The chat key, or OPENAI_API_KEY when none was given.
    pub fn resolved_chat_api_key(&self) -> Option<String> {
        Some(self.chat_api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn resolved_analysis_api_key(&self) -> Option<String> {
        self.analysis_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.resolved_chat_api_key())
    }
}
