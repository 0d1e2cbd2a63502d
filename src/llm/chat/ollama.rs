use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use std::error::Error as StdError;
use super::{ ChatClient, CompletionRequest, CompletionResponse, ResponseFormat, WireMessage };
use crate::llm::LlmConfig;
use log::debug;

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: WireMessage,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>) -> Self {
        let model = completion_model.unwrap_or_else(|| "cogito:3b".to_string());
        let url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| crate::llm::LlmType::Ollama.default_base_url().into());

        Self {
            http: HttpClient::new(),
            base_url: url,
            completion_model: model,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.llm_type != crate::llm::LlmType::Ollama {
            return Err("Invalid config type for OllamaClient".into());
        }

        Ok(Self::new(config.base_url.clone(), config.completion_model.clone()))
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(
        &self,
        request: &CompletionRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let req = ChatRequest {
            model: self.completion_model.clone(),
            messages: request.wire_messages(),
            stream: false,
            format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some("json"),
            },
        };
        debug!("POST {} (model={})", url, self.completion_model);

        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<ChatResponse>().await?;
        Ok(CompletionResponse { response: data.message.content })
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
