use log::{ error, info };
use std::sync::Arc;

use crate::error::RelayError;
use crate::history::ConversationStore;
use crate::llm::chat::ChatClient;
use crate::models::chat::Role;
use crate::models::response::ResponseEnvelope;
use crate::normalize::normalize;

/// Orchestrates one request-response exchange: resolve the conversation,
/// append the user message, run the completion over the full history,
/// record the raw assistant reply and normalize it for the client.
pub struct RelayAgent {
    chat_client: Arc<dyn ChatClient>,
    conversation_store: Arc<dyn ConversationStore>,
}

impl RelayAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        conversation_store: Arc<dyn ConversationStore>
    ) -> Self {
        Self {
            chat_client,
            conversation_store,
        }
    }

    pub async fn handle(
        &self,
        query: &str,
        conversation_id: Option<&str>
    ) -> Result<(String, ResponseEnvelope), RelayError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RelayError::InvalidInput);
        }

        let (id, turn) = self.conversation_store.get_or_create(conversation_id).await;
        // One exchange at a time per conversation; other ids proceed in
        // parallel.
        let _turn = turn.lock().await;

        self.conversation_store.append(&id, Role::User, query).await?;
        let conversation = self.conversation_store.history(&id).await?;
        info!(
            "Conversation '{}': sending {} message(s) to completion",
            id,
            conversation.messages.len()
        );

        let raw = match self.chat_client.complete(&conversation.messages).await {
            Ok(resp) => resp.response,
            Err(e) => {
                // The appended user message stays in history.
                error!("Completion failed for conversation '{}': {}", id, e);
                return Err(RelayError::Completion(e));
            }
        };

        // Store the raw model text, pre-normalization, so the model sees
        // its own earlier replies verbatim on the next turn.
        self.conversation_store.append(&id, Role::Assistant, &raw).await?;

        Ok((id, normalize(&raw)))
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversation_store.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::error::Error as StdError;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::time::Duration;

    use crate::history::memory::MemoryConversationStore;
    use crate::llm::chat::CompletionResponse;
    use crate::models::chat::ChatMessage;

    const REPLY_JSON: &str = r#"{"html_response": "Hi! 😘", "messages": [{"text": "Hi! 😘", "facialExpression": "smile", "animation": "Talking_0"}], "function_call": null}"#;

    struct ScriptedClient {
        reply: String,
        fail: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: String::new(),
                fail: true,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(reply: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                fail: false,
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            _messages: &[ChatMessage]
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err("simulated outage".into());
            }
            Ok(CompletionResponse { response: self.reply.clone() })
        }
    }

    fn agent_with(
        client: Arc<ScriptedClient>
    ) -> (RelayAgent, Arc<MemoryConversationStore>) {
        let store = Arc::new(
            MemoryConversationStore::new("system prompt".to_string(), 0, None)
        );
        let agent = RelayAgent::new(client, Arc::clone(&store) as Arc<dyn ConversationStore>);
        (agent, store)
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_completion() {
        let client = ScriptedClient::replying(REPLY_JSON);
        let (agent, store) = agent_with(Arc::clone(&client));

        let err = agent.handle("   ", None).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn exchange_appends_user_and_assistant_messages() {
        let client = ScriptedClient::replying(REPLY_JSON);
        let (agent, store) = agent_with(Arc::clone(&client));

        let (id, envelope) = agent.handle("hey aurora", None).await.unwrap();
        assert_eq!(envelope.html_response, "Hi! 😘");
        assert!(envelope.function_call.is_none());

        let messages = store.history(&id).await.unwrap().messages;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant]);
        assert_eq!(messages[1].content, "hey aurora");
        assert_eq!(messages[2].content, REPLY_JSON, "assistant turn stores the raw model text");
    }

    #[tokio::test]
    async fn reuses_conversation_across_requests() {
        let client = ScriptedClient::replying(REPLY_JSON);
        let (agent, store) = agent_with(Arc::clone(&client));

        let (id, _) = agent.handle("first", None).await.unwrap();
        let (same, _) = agent.handle("second", Some(&id)).await.unwrap();
        assert_eq!(id, same);

        let messages = store.history(&id).await.unwrap().messages;
        assert_eq!(messages.len(), 5);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn completion_failure_keeps_the_user_message() {
        let client = ScriptedClient::failing();
        let (agent, store) = agent_with(Arc::clone(&client));

        let err = agent.handle("are you there?", Some("chat-1")).await.unwrap_err();
        assert!(matches!(err, RelayError::Completion(_)));

        let messages = store.history("chat-1").await.unwrap().messages;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User]);
    }

    #[tokio::test]
    async fn concurrent_same_conversation_exchanges_do_not_interleave() {
        let client = ScriptedClient::slow(REPLY_JSON, Duration::from_millis(30));
        let (agent, store) = agent_with(Arc::clone(&client));
        let agent = Arc::new(agent);

        let a = {
            let agent = Arc::clone(&agent);
            tokio::spawn(async move { agent.handle("ping one", Some("shared")).await })
        };
        let b = {
            let agent = Arc::clone(&agent);
            tokio::spawn(async move { agent.handle("ping two", Some("shared")).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let messages = store.history("shared").await.unwrap().messages;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant],
            "each user message must be followed by its own assistant reply"
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn prose_reply_degrades_to_fallback_envelope() {
        let client = ScriptedClient::replying("Hey there, just thinking about you babe 😘");
        let (agent, _) = agent_with(Arc::clone(&client));

        let (_, envelope) = agent.handle("hi", None).await.unwrap();
        assert_eq!(envelope.messages.len(), 1);
        assert_eq!(envelope.messages[0].text, "Hey there, just thinking about you babe 😘");
        assert!(envelope.function_call.is_none());
    }
}
