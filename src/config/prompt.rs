use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::info;
use thiserror::Error;

use crate::models::analysis::ConversationStage;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant for a home services platform. Your goal is to help users find the right service providers for their home maintenance needs.

Follow these steps:
1. First understand the user's problem in detail
2. Ask relevant follow-up questions about the specific issue to better understand the problem
3. Once you understand the problem, ask for their zip code
4. Then ask about their preferred timing for the service
5. Finally, recommend relevant service providers

Guidelines:
- Be concise but friendly
- Ask only one question at a time
- Focus on getting specific details about the problem
- If the user's message isn't clear, ask for clarification
- Don't make assumptions about the problem
- Always collect zip code and timing preferences before giving recommendations

Current conversation stage will be provided in conversationStage variable:
- \"initial\" - Understanding the problem
- \"details\" - Getting specific details
- \"location\" - Asking for zip code
- \"timing\" - Asking for preferred timing
- \"recommendation\" - Providing recommendations";

pub const DEFAULT_ANALYSIS_PROMPT: &str =
    "Analyze the conversation and return a JSON object with the following fields:
- stage: conversation stage (\"initial\", \"details\", \"location\", \"timing\", \"recommendation\")
- needsZipCode: boolean indicating if we still need the zip code
- needsTiming: boolean indicating if we still need timing preference
- problemType: the type of problem (if identified)
- zipCode: the zip code (if provided)
- timing: the timing preference (if provided)

Base this on the full conversation history provided.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' is empty")]
    EmptyTemplate(&'static str),
    #[error("Prompt file '{path}' IO error: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Prompt file '{path}' JSON parsing error: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_analysis_prompt() -> String {
    DEFAULT_ANALYSIS_PROMPT.to_string()
}

/// Instructions for the two upstream calls. A prompt file may override either one.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_analysis_prompt")]
    pub analysis_prompt: String,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            analysis_prompt: default_analysis_prompt(),
            last_loaded: None,
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_prompt.trim().is_empty() {
            return Err(PromptError::EmptyTemplate("system_prompt"));
        }
        if self.analysis_prompt.trim().is_empty() {
            return Err(PromptError::EmptyTemplate("analysis_prompt"));
        }
        Ok(())
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let display = path.as_ref().display().to_string();
    let io_err = |source| PromptError::Io { path: display.clone(), source };

    let modified = fs::metadata(&path).and_then(|m| m.modified()).map_err(io_err)?;
    let file_content = fs::read_to_string(&path).map_err(io_err)?;
    let mut config: PromptConfig = serde_json
        ::from_str(&file_content)
        .map_err(|source| PromptError::Json { path: display.clone(), source })?;
    config.validate()?;
    config.last_loaded = Some(modified);
    info!("Loaded prompts from {}", display);
    Ok(Arc::new(config))
}

/// Builtin prompts unless a prompt file is configured.
pub fn load_prompts_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => load_prompts(p),
        None => Ok(Arc::new(PromptConfig::default())),
    }
}

pub fn reload_prompts_if_changed<P: AsRef<Path>>(
    path: P,
    current_config: &Arc<PromptConfig>
) -> Result<Option<Arc<PromptConfig>>, PromptError> {
    let metadata = fs::metadata(&path).map_err(|source| PromptError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })?;

    if let Ok(modified) = metadata.modified() {
        match current_config.last_loaded {
            Some(last_loaded) if modified <= last_loaded => {}
            Some(_) => {
                info!("Prompts file changed, reloading...");
                return load_prompts(path).map(Some);
            }
            None => {
                info!("No last_loaded timestamp, reloading prompts...");
                return load_prompts(path).map(Some);
            }
        }
    }
    Ok(None)
}

/// Scripted-conversation instruction with the current stage appended.
pub fn get_scripted_prompt(config: &PromptConfig, stage: ConversationStage) -> String {
    format!("{}\nCurrent conversation stage: {}", config.system_prompt, stage)
}

pub fn get_analysis_prompt(config: &PromptConfig) -> &str {
    &config.analysis_prompt
}
