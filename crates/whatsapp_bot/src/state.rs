//! Conversation state.
//!
//! One slot per actor, keyed by the phone part of the WhatsApp chat id. A
//! slot lives for ten minutes from its last write and is dropped lazily on
//! the next read after that. Writes go through a versioned compare-and-set
//! so a redelivered webhook racing the original cannot clobber a newer step,
//! and terminal confirmations remove the slot through the same check so a
//! duplicate delivery cannot commit twice.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::flow::{FlowData, Step};

pub(crate) const CONVERSATION_TTL: Duration = Duration::from_secs(600);

/// Strips the WhatsApp chat-id suffix so `628123@c.us` and `628123@lid`
/// address the same slot.
pub(crate) fn actor_key(from: &str) -> String {
    from.replace("@c.us", "").replace("@lid", "")
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ConversationState {
    pub step: Step,
    pub data: FlowData,
    pub expires_at: DateTime<Utc>,
    pub version: u64,
}

#[derive(Clone, Default)]
pub(crate) struct ConversationStore {
    inner: Arc<Mutex<HashMap<String, ConversationState>>>,
}

impl ConversationStore {
    pub(crate) async fn get(&self, from: &str) -> Option<ConversationState> {
        self.get_at(from, Utc::now()).await
    }

    pub(crate) async fn get_at(&self, from: &str, now: DateTime<Utc>) -> Option<ConversationState> {
        let key = actor_key(from);
        let mut guard = self.inner.lock().await;
        match guard.get(&key) {
            Some(state) if state.expires_at > now => Some(state.clone()),
            Some(_) => {
                guard.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Start or restart a flow, replacing whatever was stored.
    pub(crate) async fn set(&self, from: &str, step: Step, data: FlowData) {
        self.set_at(from, step, data, Utc::now()).await;
    }

    pub(crate) async fn set_at(&self, from: &str, step: Step, data: FlowData, now: DateTime<Utc>) {
        let key = actor_key(from);
        let mut guard = self.inner.lock().await;
        let version = guard.get(&key).map_or(0, |s| s.version + 1);
        guard.insert(
            key,
            ConversationState {
                step,
                data,
                expires_at: now + CONVERSATION_TTL,
                version,
            },
        );
    }

    /// Advance a flow only if nobody advanced it first.
    ///
    /// `expected_version` is the version of the state the caller read; when a
    /// concurrent redelivery already moved the conversation on, the write is
    /// refused and the caller should drop its event.
    pub(crate) async fn advance(
        &self,
        from: &str,
        expected_version: u64,
        step: Step,
        data: FlowData,
    ) -> bool {
        let key = actor_key(from);
        let mut guard = self.inner.lock().await;
        match guard.get(&key) {
            Some(current) if current.version == expected_version => {
                let version = current.version + 1;
                guard.insert(
                    key,
                    ConversationState {
                        step,
                        data,
                        expires_at: Utc::now() + CONVERSATION_TTL,
                        version,
                    },
                );
                true
            }
            _ => false,
        }
    }

    /// Remove a slot only if nobody advanced it first.
    ///
    /// The terminal counterpart of [`ConversationStore::advance`]: a
    /// confirmation commits exactly once because only one of two racing
    /// redeliveries can take the slot at the version it read.
    pub(crate) async fn take(&self, from: &str, expected_version: u64) -> bool {
        let key = actor_key(from);
        let mut guard = self.inner.lock().await;
        match guard.get(&key) {
            Some(current) if current.version == expected_version => {
                guard.remove(&key);
                true
            }
            _ => false,
        }
    }

    pub(crate) async fn clear(&self, from: &str) {
        let mut guard = self.inner.lock().await;
        guard.remove(&actor_key(from));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    #[test]
    fn chat_id_suffixes_share_a_key() {
        assert_eq!(actor_key("628123@c.us"), "628123");
        assert_eq!(actor_key("628123@lid"), "628123");
        assert_eq!(actor_key("628123"), "628123");
    }

    #[tokio::test]
    async fn state_expires_after_ttl() {
        let store = ConversationStore::default();
        let start = Utc::now();
        store
            .set_at("628123@c.us", Step::ExportPeriod, FlowData::default(), start)
            .await;

        let just_before = start + ChronoDuration::seconds(599);
        assert!(store.get_at("628123@c.us", just_before).await.is_some());

        let just_after = start + ChronoDuration::seconds(601);
        assert!(store.get_at("628123@c.us", just_after).await.is_none());
        // Lazy expiry removed the slot for good.
        assert!(store.get_at("628123@c.us", just_before).await.is_none());
    }

    #[tokio::test]
    async fn writes_refresh_the_deadline() {
        let store = ConversationStore::default();
        let start = Utc::now();
        store
            .set_at("628123", Step::AssetCreateKind, FlowData::default(), start)
            .await;
        let later = start + ChronoDuration::seconds(500);
        store
            .set_at("628123", Step::AssetCreateCountry, FlowData::default(), later)
            .await;

        let past_first_deadline = start + ChronoDuration::seconds(700);
        let state = store.get_at("628123", past_first_deadline).await.unwrap();
        assert_eq!(state.step, Step::AssetCreateCountry);
    }

    #[tokio::test]
    async fn advance_refuses_stale_versions() {
        let store = ConversationStore::default();
        store
            .set("628123", Step::AssetCreateKind, FlowData::default())
            .await;
        let state = store.get("628123").await.unwrap();

        assert!(
            store
                .advance("628123", state.version, Step::AssetCreateCountry, state.data.clone())
                .await
        );
        // A redelivery still holding the old version loses the race.
        assert!(
            !store
                .advance("628123", state.version, Step::AssetCreateName, state.data)
                .await
        );
    }

    #[tokio::test]
    async fn a_slot_can_only_be_taken_once() {
        let store = ConversationStore::default();
        store
            .set("628123", Step::ConfirmTransaction, FlowData::default())
            .await;
        // Two redeliveries of the same "ya" read the same state.
        let first = store.get("628123").await.unwrap();
        let second = store.get("628123").await.unwrap();
        assert_eq!(first.version, second.version);

        assert!(store.take("628123", first.version).await);
        assert!(!store.take("628123", second.version).await);
        assert!(store.get("628123").await.is_none());
    }

    #[tokio::test]
    async fn take_refuses_stale_versions() {
        let store = ConversationStore::default();
        store
            .set("628123", Step::ConfirmTransaction, FlowData::default())
            .await;
        let stale = store.get("628123").await.unwrap();
        store
            .set("628123", Step::ConfirmTransaction, FlowData::default())
            .await;

        assert!(!store.take("628123", stale.version).await);
        // The newer slot survives the refused take.
        assert!(store.get("628123").await.is_some());
    }

    #[tokio::test]
    async fn clear_drops_the_slot() {
        let store = ConversationStore::default();
        store
            .set("628123@lid", Step::ExportPeriod, FlowData::default())
            .await;
        store.clear("628123@c.us").await;
        assert!(store.get("628123").await.is_none());
    }
}
