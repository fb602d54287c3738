pub mod memory;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::cli::Args;
use crate::error::RelayError;
use crate::models::chat::{ Conversation, Role };

/// Lock handed out per conversation. Holding its guard serializes one
/// full read-modify-append exchange for that id; other ids stay fully
/// parallel.
pub type TurnLock = Arc<Mutex<()>>;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Resolves a conversation id, creating and seeding the history with
    /// the system prompt when the id is absent or unseen.
    async fn get_or_create(&self, conversation_id: Option<&str>) -> (String, TurnLock);

    /// Appends a timestamped message to an existing conversation.
    async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), RelayError>;

    /// Snapshot of the conversation with its ordered message sequence.
    async fn history(&self, conversation_id: &str) -> Result<Conversation, RelayError>;

    /// Number of live conversations.
    async fn len(&self) -> usize;
}

pub fn create_conversation_store(
    args: &Args,
    system_prompt: String
) -> Result<Arc<dyn ConversationStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => {
            let idle_ttl = if args.conversation_idle_secs > 0 {
                Some(Duration::from_secs(args.conversation_idle_secs))
            } else {
                None
            };
            let store = memory::MemoryConversationStore::new(
                system_prompt,
                args.conversation_capacity,
                idle_ttl
            );
            Ok(Arc::new(store))
        }
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_conversation_store(
    args: &Args,
    system_prompt: String
) -> Result<Arc<dyn ConversationStore>, Box<dyn Error + Send + Sync>> {
    info!(
        "Chat history will be stored in: {} (capacity: {}, idle ttl: {}s)",
        args.history_type,
        args.conversation_capacity,
        args.conversation_idle_secs
    );
    create_conversation_store(args, system_prompt)
}
