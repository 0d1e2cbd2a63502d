use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use thiserror::Error;
use url::Url;

use crate::models::chat::{ ChatReply, ChatRequest, ErrorReply, Message };

pub const CHAT_ROUTE: &str = "/api/chat";

#[derive(Debug, Error)]
pub enum ChatApiError {
    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Server responded with {status}: {error}")]
    Server {
        status: u16,
        error: String,
    },
}

/// Sends the whole history and returns the assistant's reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, messages: &[Message]) -> Result<String, ChatApiError>;
}

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    http: HttpClient,
    chat_url: Url,
}

impl ChatApiClient {
    pub fn new(endpoint: &str) -> Result<Self, ChatApiError> {
        let invalid = |source| ChatApiError::InvalidEndpoint { url: endpoint.to_string(), source };
        let base = Url::parse(endpoint).map_err(invalid)?;
        let chat_url = base.join(CHAT_ROUTE).map_err(invalid)?;
        Ok(Self { http: HttpClient::new(), chat_url })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }
}

#[async_trait]
impl ChatTransport for ChatApiClient {
    async fn send(&self, messages: &[Message]) -> Result<String, ChatApiError> {
        let body = ChatRequest { messages: messages.to_vec() };
        debug!("POST {} with {} messages", self.chat_url, body.messages.len());

        let resp = self.http.post(self.chat_url.clone()).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let error = resp
                .json::<ErrorReply>().await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(ChatApiError::Server { status: status.as_u16(), error });
        }

        Ok(resp.json::<ChatReply>().await?.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_route_replaces_any_path() {
        let client = ChatApiClient::new("http://127.0.0.1:4000/landing").unwrap();
        assert_eq!(client.chat_url().as_str(), "http://127.0.0.1:4000/api/chat");
    }

    #[test]
    fn rejects_relative_endpoints() {
        assert!(matches!(ChatApiClient::new("localhost"), Err(ChatApiError::InvalidEndpoint { .. })));
    }
}
