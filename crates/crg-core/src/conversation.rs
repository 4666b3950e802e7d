//! Conversation state machine for the compliance chat.
//!
//! A send cycle is strictly ordered: append user message, append typing
//! placeholder, await the gateway, then swap the placeholder for the reply (or
//! the fallback error text). Every request is tagged with the context
//! generation it was issued in; a context switch bumps the generation, so a
//! late reply for the old context is dropped instead of landing in the new
//! stream.

use thiserror::Error;

use crate::context::ChatContext;
use crate::error::GatewayError;
use crate::gateway::{ChatGateway, ChatReply};
use crate::state::{HistoryTurn, Message};

/// Shown in place of an answer when the chat gateway fails.
pub const FALLBACK_ERROR_TEXT: &str = "An error occurred while connecting to the regulatory database.";

/// Everything the chat gateway needs for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub generation: u64,
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("a response is still pending")]
    InFlight,
    #[error("no jurisdiction selected")]
    NoJurisdiction,
}

/// Outcome of feeding a gateway result back into the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The context changed while the request was in flight.
    Stale,
}

#[derive(Debug, Clone)]
struct PendingSend {
    generation: u64,
    typing_id: String,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    context: ChatContext,
    messages: Vec<Message>,
    generation: u64,
    pending: Option<PendingSend>,
    next_id: u64,
}

impl Conversation {
    pub fn new(context: ChatContext) -> Self {
        let mut conversation = Self {
            context,
            messages: Vec::new(),
            generation: 0,
            pending: None,
            next_id: 1,
        };
        conversation.reset();
        conversation
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while a send is outstanding; input submission is disabled.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Switch to a new context. The stream is discarded and reseeded only when
    /// the mode or the selected country actually changes.
    pub fn set_context(&mut self, context: ChatContext) -> bool {
        if context == self.context {
            return false;
        }
        tracing::info!(from = ?self.context, to = ?context, "conversation context changed");
        self.context = context;
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.messages = self.context.welcome().into_iter().collect();
    }

    fn allocate_id(&mut self, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    /// Start a send cycle and return the request to hand to the gateway.
    pub fn begin_send(&mut self, text: &str) -> Result<ChatRequest, SendRejected> {
        if text.trim().is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.pending.is_some() {
            return Err(SendRejected::InFlight);
        }
        if self.context.needs_country() {
            return Err(SendRejected::NoJurisdiction);
        }

        // History is the stream as it stood before this turn; the new text
        // travels separately.
        let history: Vec<HistoryTurn> = self
            .messages
            .iter()
            .filter(|m| !m.is_typing())
            .map(|m| HistoryTurn {
                role: m.role,
                text: m.text_content().to_string(),
            })
            .collect();

        let user_id = self.allocate_id("msg");
        self.messages.push(Message::user(user_id, text));

        let typing_id = self.allocate_id("typing");
        self.messages.push(Message::typing(typing_id.clone()));

        self.pending = Some(PendingSend {
            generation: self.generation,
            typing_id,
        });

        tracing::debug!(
            generation = self.generation,
            history = history.len(),
            jurisdiction = ?self.context.jurisdiction(),
            "chat send started"
        );

        Ok(ChatRequest {
            generation: self.generation,
            message: text.to_string(),
            history,
            jurisdiction: self.context.jurisdiction().map(str::to_string),
        })
    }

    /// Resolve the in-flight send with the gateway's result.
    pub fn complete(&mut self, generation: u64, result: Result<ChatReply, GatewayError>) -> Completion {
        let pending = match &self.pending {
            Some(p) if p.generation == generation => p.clone(),
            _ => {
                tracing::debug!(generation, current = self.generation, "dropping stale chat reply");
                return Completion::Stale;
            }
        };
        self.pending = None;
        self.messages.retain(|m| m.id != pending.typing_id);

        let reply = match result {
            Ok(reply) => {
                let id = self.allocate_id("msg");
                Message::model(id, reply.text, reply.sources)
            }
            Err(e) => {
                tracing::error!("chat gateway failed: {}", e);
                let id = self.allocate_id("error");
                Message::model(id, FALLBACK_ERROR_TEXT, Vec::new())
            }
        };
        self.messages.push(reply);
        Completion::Applied
    }

    /// Run a whole send cycle against `gateway`.
    pub async fn send(&mut self, gateway: &dyn ChatGateway, text: &str) -> Result<Completion, SendRejected> {
        let request = self.begin_send(text)?;
        let result = gateway.send(&request).await;
        Ok(self.complete(request.generation, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Role, Source};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingGateway {
        reply: ChatReply,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl RecordingGateway {
        fn new(text: &str) -> Self {
            Self {
                reply: ChatReply {
                    text: text.to_string(),
                    sources: vec![Source {
                        title: "Regulator".to_string(),
                        uri: "https://example.gov".to_string(),
                    }],
                },
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> ChatRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ChatGateway for RecordingGateway {
        async fn send(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl ChatGateway for FailingGateway {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, GatewayError> {
            Err(GatewayError::Status(500, "boom".to_string()))
        }
    }

    #[test]
    fn test_new_global_conversation_is_seeded() {
        let convo = Conversation::new(ChatContext::Global);
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0].id, "welcome-global");
        assert_eq!(convo.messages()[0].role, Role::Model);
    }

    #[test]
    fn test_switch_to_country_without_selection_is_empty() {
        let mut convo = Conversation::new(ChatContext::Global);
        assert!(convo.set_context(ChatContext::Country(None)));
        assert!(convo.messages().is_empty());
        assert_eq!(convo.begin_send("hello"), Err(SendRejected::NoJurisdiction));
    }

    #[test]
    fn test_switch_to_country_seeds_country_welcome() {
        let mut convo = Conversation::new(ChatContext::Global);
        convo.set_context(ChatContext::country("Singapore"));
        assert_eq!(convo.messages().len(), 1);
        assert!(convo.messages()[0].text_content().contains("Singapore"));
    }

    #[test]
    fn test_same_context_does_not_reset() {
        let mut convo = Conversation::new(ChatContext::country("Malta"));
        convo.begin_send("hi").unwrap();
        let before = convo.messages().len();
        assert!(!convo.set_context(ChatContext::country("Malta")));
        assert_eq!(convo.messages().len(), before);
        assert!(convo.is_loading());
    }

    #[test]
    fn test_begin_send_appends_user_and_placeholder() {
        let mut convo = Conversation::new(ChatContext::Global);
        let request = convo.begin_send("What is MiCA?").unwrap();

        let msgs = convo.messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[1].text_content(), "What is MiCA?");
        assert!(msgs[2].is_typing());
        assert!(convo.is_loading());

        // history is the stream before this turn
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].role, Role::Model);
        assert_eq!(request.message, "What is MiCA?");
        assert_eq!(request.jurisdiction, None);
    }

    #[test]
    fn test_rejects_overlapping_and_blank_sends() {
        let mut convo = Conversation::new(ChatContext::Global);
        assert_eq!(convo.begin_send("   "), Err(SendRejected::Empty));
        convo.begin_send("first").unwrap();
        assert_eq!(convo.begin_send("second"), Err(SendRejected::InFlight));
    }

    #[tokio::test]
    async fn test_successful_send_adds_exactly_two_messages() {
        let gateway = RecordingGateway::new("You need a licence.");
        let mut convo = Conversation::new(ChatContext::Global);
        let before: Vec<_> = convo.messages().to_vec();

        let outcome = convo.send(&gateway, "Do I need a licence?").await.unwrap();
        assert_eq!(outcome, Completion::Applied);

        let msgs = convo.messages();
        assert_eq!(msgs.len(), before.len() + 2);
        assert_eq!(&msgs[..before.len()], before.as_slice());
        assert_eq!(msgs[before.len()].role, Role::User);
        assert_eq!(msgs[before.len() + 1].role, Role::Model);
        assert_eq!(msgs[before.len() + 1].text_content(), "You need a licence.");
        assert_eq!(msgs[before.len() + 1].sources().len(), 1);
        assert!(msgs.iter().all(|m| !m.is_typing()));
        assert!(!convo.is_loading());
    }

    #[tokio::test]
    async fn test_failed_send_uses_fallback_text() {
        let mut convo = Conversation::new(ChatContext::Global);
        let before = convo.messages().len();

        convo.send(&FailingGateway, "Hello?").await.unwrap();

        let msgs = convo.messages();
        assert_eq!(msgs.len(), before + 2);
        assert_eq!(msgs[before].role, Role::User);
        assert_eq!(msgs[before + 1].text_content(), FALLBACK_ERROR_TEXT);
        assert!(msgs[before + 1].sources().is_empty());
        assert!(msgs.iter().all(|m| !m.is_typing()));
        assert!(!convo.is_loading());
    }

    #[tokio::test]
    async fn test_country_send_passes_jurisdiction() {
        let gateway = RecordingGateway::new("MAS licensing applies.");
        let mut convo = Conversation::new(ChatContext::Global);
        convo.set_context(ChatContext::country("Singapore"));
        assert!(convo.messages()[0].text_content().contains("Singapore"));

        convo.send(&gateway, "What license do I need?").await.unwrap();

        let request = gateway.last();
        assert_eq!(request.jurisdiction.as_deref(), Some("Singapore"));
        assert_eq!(request.message, "What license do I need?");
    }

    #[tokio::test]
    async fn test_history_accumulates_turns() {
        let gateway = RecordingGateway::new("answer");
        let mut convo = Conversation::new(ChatContext::Global);
        convo.send(&gateway, "one").await.unwrap();
        convo.send(&gateway, "two").await.unwrap();

        let history = gateway.last().history;
        let roles: Vec<Role> = history.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(history[1].text, "one");
    }

    #[test]
    fn test_reply_after_context_switch_is_stale() {
        let mut convo = Conversation::new(ChatContext::Global);
        let request = convo.begin_send("question").unwrap();

        convo.set_context(ChatContext::country("Japan"));
        assert!(!convo.is_loading());

        let outcome = convo.complete(
            request.generation,
            Ok(ChatReply {
                text: "late".to_string(),
                sources: Vec::new(),
            }),
        );
        assert_eq!(outcome, Completion::Stale);
        assert_eq!(convo.messages().len(), 1);
        assert!(convo.messages()[0].text_content().contains("Japan"));
    }
}
