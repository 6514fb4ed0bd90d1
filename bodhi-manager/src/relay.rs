//! Chat relay between the widget and the upstream model

use std::sync::Arc;

use bodhi_core::session::{Persona, SessionLimits, SessionManager};
use bodhi_providers::{GenerationParams, LLMProvider, LLMResponse, Message};
use thiserror::Error;
use tracing::{debug, error, info};

/// Session used when the caller does not send one
pub const DEFAULT_SESSION_ID: &str = "default";

/// Errors surfaced to HTTP callers; upstream detail is only logged
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    #[error("No message provided")]
    EmptyInput,

    #[error("Sorry, I encountered an error. Please try again.")]
    UpstreamFailure,
}

/// Forwards user messages to the provider with per-session context
pub struct ChatRelay {
    provider: Arc<dyn LLMProvider>,
    sessions: SessionManager,
    params: GenerationParams,
}

impl ChatRelay {
    pub fn new(provider: Arc<dyn LLMProvider>, persona: Persona, params: GenerationParams) -> Self {
        Self::with_limits(provider, persona, params, SessionLimits::default())
    }

    pub fn with_limits(
        provider: Arc<dyn LLMProvider>,
        persona: Persona,
        params: GenerationParams,
        limits: SessionLimits,
    ) -> Self {
        Self {
            provider,
            sessions: SessionManager::with_limits(persona, limits),
            params,
        }
    }

    /// Send one user message and return the trimmed model reply.
    ///
    /// The session lock is held across the upstream call, so requests on the
    /// same session complete in order. The exchange is recorded only when the
    /// upstream call succeeds; a session whose first call fails is dropped.
    pub async fn handle(&self, session_id: &str, user_message: &str) -> Result<String, RelayError> {
        if user_message.trim().is_empty() {
            return Err(RelayError::EmptyInput);
        }

        let handle = self.sessions.get_or_create(session_id);
        let mut session = handle.lock().await;

        let mut messages: Vec<Message> = session.history().iter().map(Message::from).collect();
        messages.push(Message::user(user_message));

        debug!(
            session = %session_id,
            turns = messages.len(),
            "Forwarding message upstream"
        );

        let reply = self
            .provider
            .chat(messages, None, &self.params)
            .await
            .and_then(LLMResponse::into_text);

        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                error!(session = %session_id, "Upstream request failed: {}", e);
                drop(session);
                drop(handle);
                self.sessions.discard_if_unused(session_id);
                return Err(RelayError::UpstreamFailure);
            }
        };

        session.add_exchange(user_message, text.clone());
        info!(
            session = %session_id,
            exchange_turns = session.exchange_turns(),
            sessions = self.session_count(),
            "Reply generated"
        );

        Ok(text.trim().to_string())
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bodhi_providers::{ProviderError, ProviderResult};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays canned replies and records every request's history
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<ProviderResult<String>>>,
        calls: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn with(replies: Vec<ProviderResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn chat(
            &self,
            messages: Vec<Message>,
            _model: Option<String>,
            _params: &GenerationParams,
        ) -> ProviderResult<LLMResponse> {
            self.calls.lock().unwrap().push(messages);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::ApiError("no reply scripted".into())))?;
            Ok(LLMResponse {
                content: Some(reply),
                finish_reason: "STOP".to_string(),
                usage: HashMap::new(),
            })
        }

        fn get_default_model(&self) -> String {
            "scripted".to_string()
        }
    }

    fn relay(provider: Arc<ScriptedProvider>) -> ChatRelay {
        ChatRelay::new(
            provider,
            Persona::new("instruction", "ack"),
            GenerationParams::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_touching_sessions() {
        let provider = ScriptedProvider::with(vec![]);
        let relay = relay(provider.clone());

        assert_eq!(relay.handle("s", "").await, Err(RelayError::EmptyInput));
        assert_eq!(relay.handle("s", " \n\t").await, Err(RelayError::EmptyInput));
        assert_eq!(relay.session_count(), 0);
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_is_trimmed_and_history_grows() {
        let provider = ScriptedProvider::with(vec![
            Ok("  Namaste!  \n".to_string()),
            Ok("Open 5AM-9PM".to_string()),
        ]);
        let relay = relay(provider.clone());

        assert_eq!(relay.handle("s", "Hello").await.unwrap(), "Namaste!");
        assert_eq!(relay.handle("s", "Hours?").await.unwrap(), "Open 5AM-9PM");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].len(), 3);
        assert_eq!(calls[0][0], Message::user("instruction"));
        assert_eq!(calls[0][1], Message::assistant("ack"));
        assert_eq!(calls[0][2], Message::user("Hello"));

        assert_eq!(calls[1].len(), 5);
        assert_eq!(calls[1][3], Message::assistant("  Namaste!  \n"));
        assert_eq!(calls[1][4], Message::user("Hours?"));
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_session_unchanged() {
        let provider = ScriptedProvider::with(vec![
            Ok("Namaste".to_string()),
            Err(ProviderError::ApiError("HTTP 500: boom".to_string())),
        ]);
        let relay = relay(provider);

        relay.handle("s", "Hello").await.unwrap();
        assert_eq!(relay.handle("s", "Hours?").await, Err(RelayError::UpstreamFailure));

        assert_eq!(relay.session_count(), 1);
        let handle = relay.sessions.get_or_create("s");
        assert_eq!(handle.lock().await.exchange_turns(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_request_does_not_keep_session() {
        let provider = ScriptedProvider::with(vec![]);
        let relay = relay(provider);

        for i in 0..5000 {
            let id = format!("id-{i}");
            assert_eq!(relay.handle(&id, "hi").await, Err(RelayError::UpstreamFailure));
        }

        assert_eq!(relay.session_count(), 0);
    }

    #[tokio::test]
    async fn test_session_count_respects_cap() {
        let replies = (0..20).map(|i| Ok(format!("reply {i}"))).collect();
        let provider = ScriptedProvider::with(replies);
        let relay = ChatRelay::with_limits(
            provider,
            Persona::new("instruction", "ack"),
            GenerationParams::default(),
            SessionLimits {
                max_sessions: 5,
                idle_timeout: std::time::Duration::from_secs(3600),
            },
        );

        for i in 0..20 {
            relay.handle(&format!("id-{i}"), "hi").await.unwrap();
        }

        assert_eq!(relay.session_count(), 5);
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_an_empty_success() {
        let provider = ScriptedProvider::with(vec![Ok(" \n ".to_string())]);
        let relay = relay(provider);

        assert_eq!(relay.handle("s", "Hello").await.unwrap(), "");
        assert_eq!(relay.session_count(), 1);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_history() {
        let provider = ScriptedProvider::with(vec![Ok("to a".to_string()), Ok("to b".to_string())]);
        let relay = relay(provider.clone());

        relay.handle("a", "from a").await.unwrap();
        relay.handle("b", "from b").await.unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[1].len(), 3);
        assert!(calls[1].iter().all(|m| m.content != "from a"));
        assert_eq!(relay.session_count(), 2);
    }
}
