use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, CompletionRequest, CompletionResponse, ResponseFormat, WireMessage };
use crate::llm::{ LlmConfig, LlmType };

const CHAT_COMPLETIONS_ROUTE: &str = "/v1/chat/completions";

/// Chat-completions adapter for OpenAI and the providers that mirror its API.
pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e|
                        format!("Invalid API key format: {}", e)
                    )?
                );
            }
            None => warn!("No API key configured for {}; upstream calls will be rejected.", base_url),
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            model,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if !config.llm_type.is_openai_compatible() {
            return Err(format!("Invalid config type for OpenAIChatClient: {}", config.llm_type).into());
        }
        let model = config.completion_model
            .clone()
            .unwrap_or_else(|| default_model(config.llm_type).to_string());
        let base_url = config.base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| config.llm_type.default_base_url().to_string());

        Self::new(config.api_key.clone(), model, base_url)
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}{}", base, CHAT_COMPLETIONS_ROUTE)
        }
    }
}

fn default_model(llm_type: LlmType) -> &'static str {
    match llm_type {
        LlmType::DeepSeek => "deepseek-chat",
        LlmType::XAI => "grok-2-latest",
        LlmType::Groq => "llama-3.1-8b-instant",
        _ => "gpt-4o-mini",
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        request: &CompletionRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = self.endpoint();
        let req = OpenAIChatRequest {
            model: self.model.clone(),
            messages: request.wire_messages(),
            response_format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(ResponseFormatBody { format_type: "json_object" }),
            },
        };
        debug!("POST {} (model={}, messages={})", url, self.model, req.messages.len());

        let resp = self.http.post(&url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIResponse>()
            .await?;

        let content = resp.choices
            .into_iter()
            .next()
            .ok_or_else(|| "No response from chat completions API".to_string())?
            .message.content
            .ok_or_else(|| "Chat completions API returned no content".to_string())?;

        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
