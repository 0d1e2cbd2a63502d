pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::sync::Arc;
use super::{ LlmConfig, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use crate::models::chat::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// The provider must answer with a single JSON object.
    JsonObject,
}

/// A system instruction followed by the role-tagged conversation history.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    pub fn text(system_prompt: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: messages.to_vec(),
            response_format: ResponseFormat::Text,
        }
    }

    pub fn json(system_prompt: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            response_format: ResponseFormat::JsonObject,
            ..Self::text(system_prompt, messages)
        }
    }

    pub(crate) fn wire_messages(&self) -> Vec<WireMessage> {
        let mut wire = Vec::with_capacity(self.messages.len() + 1);
        wire.push(WireMessage {
            role: "system".to_string(),
            content: self.system_prompt.clone(),
        });
        wire.extend(
            self.messages.iter().map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
        );
        wire
    }
}

/// `{role, content}` pair shared by the OpenAI and Ollama chat protocols.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct WireMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI | LlmType::DeepSeek | LlmType::XAI | LlmType::Groq => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
