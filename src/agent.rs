use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig, PromptError };
use crate::directory::ServiceDirectory;
use crate::directory::recommend::build_recommendation;
use crate::llm::{ LlmConfig, LlmType };
use crate::llm::chat::{ ChatClient, CompletionRequest, new_client as new_chat_client };
use crate::models::analysis::{ ConversationAnalysis, ConversationStage };
use crate::models::chat::Message;

use log::{ debug, info };
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Upstream(#[source] Box<dyn Error + Send + Sync>),
    #[error("Conversation analysis was not valid JSON: {0}")]
    MalformedAnalysis(#[from] serde_json::Error),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Directory listing built locally from the collected fields.
    Recommendation,
    /// Next scripted question produced by the chat model.
    Question,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub message: String,
    pub kind: ReplyKind,
    pub stage: ConversationStage,
}

/// Drives one user turn: analyse the full history, then recommend or ask the next question.
#[derive(Clone)]
pub struct ServiceAgent {
    chat_client: Arc<dyn ChatClient>,
    analysis_client: Arc<dyn ChatClient>,
    prompt_config: Arc<RwLock<Arc<PromptConfig>>>,
    directory: Arc<ServiceDirectory>,
}

impl ServiceAgent {
    fn initialize_llm_clients(
        args: &Args
    ) -> Result<(Arc<dyn ChatClient>, Arc<dyn ChatClient>), Box<dyn Error + Send + Sync>> {
        let chat_llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            api_key: args.resolved_chat_api_key(),
            completion_model: Some(args.chat_model.clone()),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        let analysis_llm_type: LlmType = match &args.analysis_llm_type {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => chat_llm_type,
        };
        let analysis_config = LlmConfig {
            llm_type: analysis_llm_type,
            base_url: args.analysis_base_url.clone().or_else(|| args.chat_base_url.clone()),
            api_key: args.resolved_analysis_api_key(),
            completion_model: Some(args.analysis_model.clone()),
        };
        let analysis_client = new_chat_client(&analysis_config)?;
        info!(
            "Analysis client configured: Type={}, Model={}, BaseURL={}",
            analysis_llm_type,
            analysis_client.get_model(),
            analysis_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        Ok((chat_client, analysis_client))
    }

    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let (chat_client, analysis_client) = Self::initialize_llm_clients(args)?;
        let prompt_config = prompt::load_prompts_or_default(args.prompts_path.as_deref())?;
        let directory = ServiceDirectory::from_optional_path(args.directory_path.as_deref())?;
        info!("Service directory holds {} businesses", directory.len());

        Ok(Self::with_clients(chat_client, analysis_client, prompt_config, directory))
    }

    pub fn with_clients(
        chat_client: Arc<dyn ChatClient>,
        analysis_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        directory: ServiceDirectory
    ) -> Self {
        Self {
            chat_client,
            analysis_client,
            prompt_config: Arc::new(RwLock::new(prompt_config)),
            directory: Arc::new(directory),
        }
    }

    pub fn directory(&self) -> &ServiceDirectory {
        &self.directory
    }

    pub async fn prompts(&self) -> Arc<PromptConfig> {
        Arc::clone(&*self.prompt_config.read().await)
    }

    pub async fn analyze_conversation(
        &self,
        messages: &[Message]
    ) -> Result<ConversationAnalysis, AgentError> {
        let prompts = self.prompts().await;
        let request = CompletionRequest::json(prompt::get_analysis_prompt(&prompts), messages);
        let raw = self.analysis_client.complete(&request).await.map_err(AgentError::Upstream)?;
        debug!("Conversation analysis: {}", raw.response);
        Ok(ConversationAnalysis::from_json(&raw.response)?)
    }

    pub async fn process_messages(&self, messages: &[Message]) -> Result<AgentReply, AgentError> {
        let analysis = self.analyze_conversation(messages).await?;

        if let Some(request) = analysis.recommendation_request() {
            info!(
                "Recommending providers for '{}' in {} ({})",
                request.problem_type,
                request.zip_code,
                request.timing
            );
            return Ok(AgentReply {
                message: build_recommendation(&self.directory, &request),
                kind: ReplyKind::Recommendation,
                stage: analysis.stage,
            });
        }

        let prompts = self.prompts().await;
        let system_prompt = prompt::get_scripted_prompt(&prompts, analysis.stage);
        let completion = self.chat_client
            .complete(&CompletionRequest::text(system_prompt, messages)).await
            .map_err(AgentError::Upstream)?;

        Ok(AgentReply {
            message: completion.response,
            kind: ReplyKind::Question,
            stage: analysis.stage,
        })
    }

    /// Swaps in the prompt file when it changed on disk. Returns whether anything was reloaded.
    pub async fn reload_prompts_if_changed(&self, path: &str) -> Result<bool, AgentError> {
        let mut guard = self.prompt_config.write().await;
        match prompt::reload_prompts_if_changed(path, &guard)? {
            Some(new_config) => {
                *guard = new_config;
                info!("Prompts successfully reloaded from {}", path);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::chat::{ CompletionResponse, ResponseFormat };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned completions and records every request it receives.
    pub(crate) struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, String>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect()
                ),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            request: &CompletionRequest
        ) -> Result<CompletionResponse, Box<dyn Error + Send + Sync>> {
            self.requests.lock().unwrap().push(request.clone());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(response)) => Ok(CompletionResponse { response }),
                Some(Err(e)) => Err(e.into()),
                None => Err("no scripted reply left".into()),
            }
        }

        fn get_model(&self) -> String {
            "scripted".to_string()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent(chat: &Arc<ScriptedClient>, analysis: &Arc<ScriptedClient>) -> ServiceAgent {
        ServiceAgent::with_clients(
            chat.clone(),
            analysis.clone(),
            Arc::new(PromptConfig::default()),
            ServiceDirectory::builtin()
        )
    }

    #[tokio::test]
    async fn empty_history_asks_the_first_question() {
        let analysis = ScriptedClient::new(vec![Ok(r#"{"stage":"initial","needsZipCode":true,"needsTiming":true}"#)]);
        let chat = ScriptedClient::new(vec![Ok("What seems to be the problem?")]);

        let reply = agent(&chat, &analysis).process_messages(&[]).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::Question);
        assert_eq!(reply.message, "What seems to be the problem?");
        assert_eq!(chat.request_count(), 1);
        let sent = chat.requests.lock().unwrap()[0].clone();
        assert!(sent.messages.is_empty());
        assert_eq!(sent.response_format, ResponseFormat::Text);
        assert!(sent.system_prompt.ends_with("Current conversation stage: initial"));
    }

    #[tokio::test]
    async fn missing_field_takes_the_question_path() {
        let analyses = [
            r#"{"stage":"timing","problemType":"washer","zipCode":"94110"}"#,
            r#"{"stage":"location","problemType":"washer","timing":"today"}"#,
            r#"{"stage":"details","zipCode":"94110","timing":"today"}"#,
        ];
        for raw in analyses {
            let analysis = ScriptedClient::new(vec![Ok(raw)]);
            let chat = ScriptedClient::new(vec![Ok("next question")]);
            let history = vec![Message::user("my washer is broken")];

            let reply = agent(&chat, &analysis).process_messages(&history).await.unwrap();

            assert_eq!(reply.kind, ReplyKind::Question, "for {}", raw);
            assert_eq!(chat.request_count(), 1);
            assert_eq!(chat.requests.lock().unwrap()[0].messages, history);
        }
    }

    #[tokio::test]
    async fn complete_analysis_recommends_without_a_second_call() {
        let analysis = ScriptedClient::new(vec![
            Ok(r#"{"stage":"recommendation","problemType":"refrigerator not cooling","zipCode":"94110","timing":"this evening"}"#),
        ]);
        let chat = ScriptedClient::new(vec![]);

        let reply = agent(&chat, &analysis)
            .process_messages(&[Message::user("fridge is warm"), Message::assistant("Zip?"), Message::user("94110, tonight")]).await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::Recommendation);
        assert_eq!(chat.request_count(), 0);
        for needle in ["Quick Fix Appliances", "(555) 123-4567", "$80-120", "Expert Home Services", "$90-130"] {
            assert!(reply.message.contains(needle), "missing {}", needle);
        }
        assert!(!reply.message.contains("Pro Appliance Repair"));

        let sent = analysis.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.response_format, ResponseFormat::JsonObject);
        assert_eq!(sent.messages.len(), 3);
    }

    #[tokio::test]
    async fn recommendation_lists_at_most_three_blocks() {
        let analysis = ScriptedClient::new(vec![
            Ok(r#"{"stage":"recommendation","problemType":"washer and dryer","zipCode":10001,"timing":"asap"}"#),
        ]);
        let chat = ScriptedClient::new(vec![]);

        let reply = agent(&chat, &analysis).process_messages(&[Message::user("hi")]).await.unwrap();

        assert_eq!(reply.message.matches("Phone:").count(), 3);
        assert!(reply.message.contains("issue in 10001 for asap"));
    }

    #[tokio::test]
    async fn loosely_labelled_analysis_still_drives_the_turn() {
        for raw in [
            r#"{"stage":"Recommendation","problemType":"washer","zipCode":"94110","timing":"today"}"#,
            r#"{"stage":"completed","problemType":"washer","zipCode":"94110","timing":"today"}"#,
        ] {
            let analysis = ScriptedClient::new(vec![Ok(raw)]);
            let chat = ScriptedClient::new(vec![]);
            let reply = agent(&chat, &analysis).process_messages(&[Message::user("washer")]).await.unwrap();
            assert_eq!(reply.kind, ReplyKind::Recommendation, "for {}", raw);
        }

        let analysis = ScriptedClient::new(vec![Ok(r#"{"stage":"details","needsZipCode":"true"}"#)]);
        let chat = ScriptedClient::new(vec![Ok("What's your zip code?")]);
        let reply = agent(&chat, &analysis).process_messages(&[Message::user("washer")]).await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Question);
        assert_eq!(reply.stage, ConversationStage::Details);
    }

    #[tokio::test]
    async fn upstream_and_parse_failures_surface_as_errors() {
        let analysis = ScriptedClient::new(vec![Err("401 Unauthorized")]);
        let chat = ScriptedClient::new(vec![]);
        let err = agent(&chat, &analysis).process_messages(&[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Upstream(_)));

        let analysis = ScriptedClient::new(vec![Ok("I think you are at the timing stage")]);
        let err = agent(&chat, &analysis).process_messages(&[]).await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedAnalysis(_)));

        let analysis = ScriptedClient::new(vec![Ok(r#"{"stage":"details"}"#)]);
        let chat = ScriptedClient::new(vec![Err("rate limited")]);
        let err = agent(&chat, &analysis).process_messages(&[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Upstream(_)));
    }

    #[tokio::test]
    async fn reload_swaps_prompts_for_later_turns() {
        let path = std::env::temp_dir().join(format!("agent-prompts-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"system_prompt": "Only ask about plumbing."}"#).unwrap();

        let analysis = ScriptedClient::new(vec![Ok(r#"{"stage":"details"}"#)]);
        let chat = ScriptedClient::new(vec![Ok("Which pipe?")]);
        let agent = agent(&chat, &analysis);

        assert!(agent.reload_prompts_if_changed(path.to_str().unwrap()).await.unwrap());
        assert!(!agent.reload_prompts_if_changed(path.to_str().unwrap()).await.unwrap());
        agent.process_messages(&[Message::user("leak")]).await.unwrap();

        let sent = chat.requests.lock().unwrap()[0].system_prompt.clone();
        assert_eq!(sent, "Only ask about plumbing.\nCurrent conversation stage: details");
        std::fs::remove_file(&path).unwrap();
    }
}
