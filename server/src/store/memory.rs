use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{MessageStore, StorageBackend, StoreError};
use crate::models::{Emoji, Message, MessageView, RECENT_WINDOW};

/// Fallback store holding only the most recent messages in process memory.
///
/// Input is expected to be validated upstream; inserts never fail.
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<Mutex<VecDeque<Message>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages().len()
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(
        &self,
        text: String,
        emoji: Emoji,
        client_hash: String,
    ) -> Result<Message, StoreError> {
        // Stamped under the lock so the deque stays in timestamp order and
        // trimming always drops the oldest entry.
        let mut messages = self.messages();
        let message = Message::new(text, emoji, client_hash);
        messages.push_back(message.clone());
        while messages.len() > RECENT_WINDOW {
            messages.pop_front();
        }

        Ok(message)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<MessageView>, StoreError> {
        let mut recent: Vec<MessageView> = self
            .messages()
            .iter()
            .rev()
            .map(Message::view)
            .collect();

        // Stable sort keeps later inserts first among equal timestamps.
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit.min(RECENT_WINDOW));

        Ok(recent)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = InMemoryMessageStore::new();
        let message = store
            .insert("hello world".to_string(), Emoji::Happy, "hash".to_string())
            .await
            .unwrap();

        assert!(!message.id.is_empty());
        assert_eq!(message.text, "hello world");
        assert_eq!(message.client_hash, "hash");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryMessageStore::new();
        for text in ["first", "second", "third"] {
            store
                .insert(text.to_string(), Emoji::Thought, "hash".to_string())
                .await
                .unwrap();
        }

        let texts: Vec<String> = store
            .list_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_trims_to_recent_window() {
        let store = InMemoryMessageStore::new();
        for i in 0..(RECENT_WINDOW + 25) {
            store
                .insert(format!("message {}", i), Emoji::Thought, "hash".to_string())
                .await
                .unwrap();
        }

        assert_eq!(store.len(), RECENT_WINDOW);

        let recent = store.list_recent(500).await.unwrap();
        assert_eq!(recent.len(), RECENT_WINDOW);
        assert_eq!(recent[0].text, format!("message {}", RECENT_WINDOW + 24));
        assert_eq!(recent[RECENT_WINDOW - 1].text, "message 25");
    }

    #[tokio::test]
    async fn test_limit_is_respected() {
        let store = InMemoryMessageStore::new();
        for i in 0..5 {
            store
                .insert(format!("message {}", i), Emoji::Thought, "hash".to_string())
                .await
                .unwrap();
        }

        assert_eq!(store.list_recent(2).await.unwrap().len(), 2);
        assert!(store.list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let store = InMemoryMessageStore::new();
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(format!("message {}", i), Emoji::Thought, "hash".to_string())
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_stay_in_timestamp_order() {
        let store = InMemoryMessageStore::new();
        let handles: Vec<_> = (0..(RECENT_WINDOW * 3))
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(format!("message {}", i), Emoji::Thought, "hash".to_string())
                        .await
                })
            })
            .collect();

        let mut newest = None;
        for handle in handles {
            let message = handle.await.unwrap().unwrap();
            newest = newest.max(Some(message.timestamp));
        }

        let messages = store.messages();
        assert_eq!(messages.len(), RECENT_WINDOW);
        assert!(messages
            .iter()
            .zip(messages.iter().skip(1))
            .all(|(older, newer)| older.timestamp <= newer.timestamp));
        assert_eq!(messages.back().map(|m| m.timestamp), newest);
    }
}
