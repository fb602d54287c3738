use async_trait::async_trait;
use log::{ debug, info };
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{ Duration, Instant };
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ ConversationStore, TurnLock };
use crate::error::RelayError;
use crate::models::chat::{ ChatMessage, Conversation, Role };

struct Entry {
    messages: Vec<ChatMessage>,
    turn: TurnLock,
    last_active: Instant,
}

/// Process-local conversation store. Histories are created lazily, seeded
/// with the composed system prompt, and dropped again by idle TTL or a
/// least-recently-used capacity bound.
pub struct MemoryConversationStore {
    conversations: Mutex<HashMap<String, Entry>>,
    system_prompt: String,
    capacity: usize,
    idle_ttl: Option<Duration>,
}

impl MemoryConversationStore {
    /// `capacity` of 0 means unbounded; `idle_ttl` of None disables the
    /// idle sweep.
    pub fn new(system_prompt: String, capacity: usize, idle_ttl: Option<Duration>) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            system_prompt,
            capacity,
            idle_ttl,
        }
    }

    fn evict_idle(&self, map: &mut HashMap<String, Entry>) {
        if let Some(ttl) = self.idle_ttl {
            let before = map.len();
            map.retain(|_, entry| entry.last_active.elapsed() < ttl);
            let dropped = before - map.len();
            if dropped > 0 {
                info!("Evicted {} idle conversation(s)", dropped);
            }
        }
    }

    fn evict_to_capacity(&self, map: &mut HashMap<String, Entry>) {
        if self.capacity == 0 {
            return;
        }
        while map.len() >= self.capacity {
            let oldest = map
                .iter()
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    map.remove(&id);
                    info!("Evicted conversation '{}' at capacity {}", id, self.capacity);
                }
                None => {
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get_or_create(&self, conversation_id: Option<&str>) -> (String, TurnLock) {
        let mut map = self.conversations.lock().await;
        self.evict_idle(&mut map);

        let id = match conversation_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        if let Some(entry) = map.get_mut(&id) {
            entry.last_active = Instant::now();
            return (id.clone(), Arc::clone(&entry.turn));
        }

        self.evict_to_capacity(&mut map);
        let entry = Entry {
            messages: vec![ChatMessage::new(Role::System, self.system_prompt.clone())],
            turn: Arc::new(Mutex::new(())),
            last_active: Instant::now(),
        };
        let turn = Arc::clone(&entry.turn);
        map.insert(id.clone(), entry);
        debug!("Created conversation '{}'", id);
        (id, turn)
    }

    async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), RelayError> {
        let mut map = self.conversations.lock().await;
        let entry = map
            .get_mut(conversation_id)
            .ok_or_else(|| RelayError::ConversationNotFound(conversation_id.to_string()))?;
        entry.messages.push(ChatMessage::new(role, content));
        entry.last_active = Instant::now();
        Ok(())
    }

    async fn history(&self, conversation_id: &str) -> Result<Conversation, RelayError> {
        let map = self.conversations.lock().await;
        map.get(conversation_id)
            .map(|entry| Conversation {
                id: conversation_id.to_string(),
                messages: entry.messages.clone(),
            })
            .ok_or_else(|| RelayError::ConversationNotFound(conversation_id.to_string()))
    }

    async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: usize, idle_ttl: Option<Duration>) -> MemoryConversationStore {
        MemoryConversationStore::new("system prompt".to_string(), capacity, idle_ttl)
    }

    #[tokio::test]
    async fn generates_distinct_ids_seeded_with_system_message() {
        let store = store(0, None);
        let (first, _) = store.get_or_create(None).await;
        let (second, _) = store.get_or_create(None).await;
        assert_ne!(first, second);

        for id in [&first, &second] {
            let conversation = store.history(id).await.unwrap();
            assert_eq!(&conversation.id, id);
            assert_eq!(conversation.messages.len(), 1);
            assert_eq!(conversation.messages[0].role, Role::System);
            assert_eq!(conversation.messages[0].content, "system prompt");
        }
    }

    #[tokio::test]
    async fn reuses_existing_conversation() {
        let store = store(0, None);
        let (id, _) = store.get_or_create(Some("chat-1")).await;
        assert_eq!(id, "chat-1");
        store.append(&id, Role::User, "hello").await.unwrap();

        let (again, _) = store.get_or_create(Some("chat-1")).await;
        assert_eq!(again, "chat-1");
        let conversation = store.history("chat-1").await.unwrap();
        assert_eq!(conversation.messages.len(), 2, "reuse must not reseed the history");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn blank_id_gets_a_generated_one() {
        let store = store(0, None);
        let (id, _) = store.get_or_create(Some("  ")).await;
        assert!(!id.trim().is_empty());
        assert_ne!(id, "  ");
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let store = store(0, None);
        let (id, _) = store.get_or_create(Some("chat-1")).await;
        store.append(&id, Role::User, "one").await.unwrap();
        store.append(&id, Role::Assistant, "two").await.unwrap();
        store.append(&id, Role::User, "three").await.unwrap();

        let conversation = store.history(&id).await.unwrap();
        let contents: Vec<&str> = conversation.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["system prompt", "one", "two", "three"]);
    }

    #[tokio::test]
    async fn append_to_unknown_id_is_not_found() {
        let store = store(0, None);
        let err = store.append("ghost", Role::User, "hello").await.unwrap_err();
        assert!(matches!(err, RelayError::ConversationNotFound(_)));
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = store(2, None);
        store.get_or_create(Some("a")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.get_or_create(Some("b")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        // Touch "a" so "b" becomes the eviction candidate.
        store.get_or_create(Some("a")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        store.get_or_create(Some("c")).await;
        assert_eq!(store.len().await, 2);
        let err = store.append("b", Role::User, "hi").await.unwrap_err();
        assert!(matches!(err, RelayError::ConversationNotFound(_)));
        assert!(store.history("a").await.is_ok());
        assert!(store.history("c").await.is_ok());
    }

    #[tokio::test]
    async fn idle_conversations_are_swept() {
        let store = store(0, Some(Duration::from_millis(10)));
        store.get_or_create(Some("stale")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.get_or_create(Some("fresh")).await;
        assert_eq!(store.len().await, 1);
        assert!(store.history("stale").await.is_err());
    }
}
