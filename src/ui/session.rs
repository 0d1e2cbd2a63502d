use log::error;
use std::sync::Arc;

use super::client::{ ChatApiError, ChatTransport };
use super::parser::{ parse_reply, ParsedBusiness };
use crate::models::chat::Message;

pub const GREETING: &str = "How can I help you? Describe your problem and we'll fix it!";
pub const APOLOGY: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or a request was already in flight.
    Ignored,
    Replied,
    Failed,
}

/// Client-side state of one chat widget: history, loading flag and current cards.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    messages: Vec<Message>,
    is_loading: bool,
    businesses: Vec<ParsedBusiness>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            messages: vec![Message::assistant(GREETING)],
            is_loading: false,
            businesses: Vec::new(),
        }
    }

    pub fn transport(&self) -> Arc<dyn ChatTransport> {
        Arc::clone(&self.transport)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn businesses(&self) -> &[ParsedBusiness] {
        &self.businesses
    }

    /// Appends the user turn and returns the history to send, or `None` when the input is ignored.
    pub fn submit(&mut self, input: &str) -> Option<Vec<Message>> {
        if input.trim().is_empty() || self.is_loading {
            return None;
        }
        self.messages.push(Message::user(input));
        self.is_loading = true;
        Some(self.messages.clone())
    }

    /// Records the outcome of the request started by [`ChatSession::submit`].
    pub fn finish(&mut self, result: Result<String, ChatApiError>) -> SendOutcome {
        let outcome = match result {
            Ok(reply) => {
                self.businesses = parse_reply(&reply);
                self.messages.push(Message::assistant(reply));
                SendOutcome::Replied
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                self.messages.push(Message::assistant(APOLOGY));
                SendOutcome::Failed
            }
        };
        self.is_loading = false;
        outcome
    }

    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let Some(history) = self.submit(input) else {
            return SendOutcome::Ignored;
        };
        let result = self.transport.send(&history).await;
        self.finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeTransport {
        replies: Mutex<Vec<Result<String, ChatApiError>>>,
        seen: Mutex<Vec<usize>>,
    }

    impl FakeTransport {
        fn new(replies: Vec<Result<String, ChatApiError>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies), seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn send(&self, messages: &[Message]) -> Result<String, ChatApiError> {
            self.seen.lock().unwrap().push(messages.len());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn server_error() -> ChatApiError {
        ChatApiError::Server { status: 500, error: "Internal server error".into() }
    }

    #[tokio::test]
    async fn starts_with_greeting_and_sends_full_history() {
        let transport = FakeTransport::new(vec![Ok("What appliance is it?".into())]);
        let mut session = ChatSession::new(transport.clone());
        assert_eq!(session.messages(), &[Message::assistant(GREETING)]);

        assert_eq!(session.send("my washer leaks").await, SendOutcome::Replied);

        assert_eq!(*transport.seen.lock().unwrap(), vec![2]);
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[2], Message::assistant("What appliance is it?"));
        assert!(session.businesses().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn recommendation_reply_fills_cards_and_next_reply_clears_them() {
        let recommendation = "Here you go:\n\nQuick Fix Appliances\nRating: 4.8/5\nEstimated Price: $80-120\nAvailable: Today, 2-4 PM\nPhone: (555) 123-4567";
        let transport = FakeTransport::new(vec![Ok(recommendation.into()), Ok("Anything else?".into())]);
        let mut session = ChatSession::new(transport);

        session.send("washer, 94110, today").await;
        assert_eq!(session.businesses().len(), 1);
        assert_eq!(session.businesses()[0].phone.as_deref(), Some("(555) 123-4567"));

        session.send("thanks").await;
        assert!(session.businesses().is_empty());
    }

    #[tokio::test]
    async fn failure_appends_apology_and_keeps_cards() {
        let recommendation = "A\nRating: 4/5\nPhone: 1";
        let transport = FakeTransport::new(vec![Ok(recommendation.into()), Err(server_error())]);
        let mut session = ChatSession::new(transport);

        session.send("first").await;
        assert_eq!(session.send("second").await, SendOutcome::Failed);

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, APOLOGY);
        assert_eq!(session.businesses().len(), 1);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn ignores_blank_input_and_sends_while_loading() {
        let transport = FakeTransport::new(vec![]);
        let mut session = ChatSession::new(transport.clone());
        assert_eq!(session.send("   ").await, SendOutcome::Ignored);

        assert!(session.submit("first").is_some());
        assert!(session.is_loading());
        assert!(session.submit("second").is_none());
        assert_eq!(session.messages().len(), 2);

        session.finish(Ok("ok".into()));
        assert!(session.submit("third").is_some());
        assert!(transport.seen.lock().unwrap().is_empty());
    }
}
