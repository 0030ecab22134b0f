//! In-process stores and collaborators for tests and local runs.
//!
//! Every relationship transaction holds the store lock from `begin` to
//! `commit`, so transactions are fully serialized.

use crate::adapters::notifications::NotificationDispatcher;
use crate::common::state::AppState;
use crate::models::notification_blocks::NotificationBlock;
use crate::models::notifications::Notification;
use crate::models::relationships::{NewRelationship, Relationship, RelationshipStatus, UserPair};
use crate::models::users::UserProfile;
use crate::repositories::emotion_records::EmotionActivity;
use crate::repositories::notification_blocks::NotificationBlockStore;
use crate::repositories::relationships::{RelationshipStore, RelationshipTx};
use crate::repositories::users::UserDirectory;
use crate::repositories::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hashbrown::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct RelationshipRows {
    last_id: i64,
    rows: HashMap<i64, Relationship>,
}

impl RelationshipRows {
    fn by_pair(&self, pair: UserPair) -> impl Iterator<Item = &Relationship> {
        self.rows.values().filter(move |row| row.pair() == pair)
    }

    fn count_accepted(&self, user_id: i64) -> u64 {
        self.rows
            .values()
            .filter(|row| row.status == RelationshipStatus::Accepted && row.pair().contains(user_id))
            .count() as _
    }

    fn has_active_row(&self, pair: UserPair, except_id: Option<i64>) -> bool {
        self.by_pair(pair)
            .any(|row| !row.status.is_terminal() && Some(row.relationship_id) != except_id)
    }
}

#[derive(Default)]
pub struct MemoryRelationshipStore {
    state: Arc<AsyncMutex<RelationshipRows>>,
    failing_commits: AtomicUsize,
}

impl MemoryRelationshipStore {
    /// Makes the next `count` commits fail as if the database had picked the
    /// transaction as a deadlock victim.
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Snapshot of every stored row, in id order.
    pub async fn rows(&self) -> Vec<Relationship> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state.rows.values().cloned().collect();
        rows.sort_by_key(|row| row.relationship_id);
        rows
    }

    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RelationshipStore for MemoryRelationshipStore {
    async fn begin(&self) -> StoreResult<Box<dyn RelationshipTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        let fail_commit = self.take_commit_failure();
        Ok(Box::new(MemoryRelationshipTx {
            guard,
            working,
            fail_commit,
        }))
    }

    async fn find_by_id(&self, relationship_id: i64) -> StoreResult<Option<Relationship>> {
        let state = self.state.lock().await;
        Ok(state.rows.get(&relationship_id).cloned())
    }

    async fn find_pair(&self, pair: UserPair) -> StoreResult<Option<Relationship>> {
        let state = self.state.lock().await;
        Ok(state
            .by_pair(pair)
            .find(|row| !row.status.is_terminal())
            .cloned())
    }

    async fn count_accepted(&self, user_id: i64) -> StoreResult<u64> {
        let state = self.state.lock().await;
        Ok(state.count_accepted(user_id))
    }

    async fn list_accepted(&self, user_id: i64) -> StoreResult<Vec<Relationship>> {
        let state = self.state.lock().await;
        let mut accepted: Vec<_> = state
            .rows
            .values()
            .filter(|row| row.status == RelationshipStatus::Accepted && row.pair().contains(user_id))
            .cloned()
            .collect();
        accepted.sort_by(|a, b| {
            (b.updated_at, b.relationship_id).cmp(&(a.updated_at, a.relationship_id))
        });
        Ok(accepted)
    }

    async fn list_pending(
        &self,
        user_id: i64,
        as_receiver: bool,
    ) -> StoreResult<Vec<Relationship>> {
        let state = self.state.lock().await;
        let mut pending: Vec<_> = state
            .rows
            .values()
            .filter(|row| row.status == RelationshipStatus::Pending)
            .filter(|row| match as_receiver {
                true => row.is_receiver(user_id),
                false => row.is_requester(user_id),
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            (b.created_at, b.relationship_id).cmp(&(a.created_at, a.relationship_id))
        });
        Ok(pending)
    }

    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.rows.len();
        state
            .rows
            .retain(|_, row| !(row.status.is_terminal() && row.updated_at < cutoff));
        Ok((before - state.rows.len()) as _)
    }
}

pub struct MemoryRelationshipTx {
    guard: OwnedMutexGuard<RelationshipRows>,
    working: RelationshipRows,
    fail_commit: bool,
}

#[async_trait]
impl RelationshipTx for MemoryRelationshipTx {
    async fn lock_participants(&mut self, _pair: UserPair) -> StoreResult<()> {
        // Already exclusive for the whole transaction
        Ok(())
    }

    async fn find_by_id(&mut self, relationship_id: i64) -> StoreResult<Option<Relationship>> {
        Ok(self.working.rows.get(&relationship_id).cloned())
    }

    async fn find_pair(&mut self, pair: UserPair) -> StoreResult<Vec<Relationship>> {
        let mut rows: Vec<_> = self.working.by_pair(pair).cloned().collect();
        rows.sort_by_key(|row| row.relationship_id);
        Ok(rows)
    }

    async fn count_accepted(&mut self, user_id: i64) -> StoreResult<u64> {
        Ok(self.working.count_accepted(user_id))
    }

    async fn insert(&mut self, relationship: NewRelationship) -> StoreResult<Relationship> {
        if self.working.has_active_row(relationship.pair, None) {
            return Err(StoreError::PairConflict);
        }
        self.working.last_id += 1;
        let relationship = relationship.into_relationship(self.working.last_id);
        self.working
            .rows
            .insert(relationship.relationship_id, relationship.clone());
        Ok(relationship)
    }

    async fn save(&mut self, relationship: &Relationship) -> StoreResult<()> {
        if !relationship.status.is_terminal()
            && self
                .working
                .has_active_row(relationship.pair(), Some(relationship.relationship_id))
        {
            return Err(StoreError::PairConflict);
        }
        if let Some(row) = self.working.rows.get_mut(&relationship.relationship_id) {
            row.status = relationship.status;
            row.updated_at = relationship.updated_at;
        }
        Ok(())
    }

    async fn delete(&mut self, relationship_id: i64) -> StoreResult<()> {
        self.working.rows.remove(&relationship_id);
        Ok(())
    }

    async fn delete_terminal(&mut self, pair: UserPair) -> StoreResult<u64> {
        let before = self.working.rows.len();
        self.working
            .rows
            .retain(|_, row| !(row.pair() == pair && row.status.is_terminal()));
        Ok((before - self.working.rows.len()) as _)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryRelationshipTx {
            mut guard,
            working,
            fail_commit,
        } = *self;
        if fail_commit {
            return Err(StoreError::Retryable("injected deadlock".into()));
        }
        *guard = working;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNotificationBlockStore {
    blocks: RwLock<HashMap<(i64, i64), DateTime<Utc>>>,
}

impl MemoryNotificationBlockStore {
    pub fn len(&self) -> usize {
        self.blocks.read().map(|blocks| blocks.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationBlockStore for MemoryNotificationBlockStore {
    async fn exists(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<bool> {
        let blocks = self.blocks.read().map_err(poisoned)?;
        Ok(blocks.contains_key(&(subscriber_id, peer_id)))
    }

    async fn insert(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<()> {
        let mut blocks = self.blocks.write().map_err(poisoned)?;
        blocks.entry((subscriber_id, peer_id)).or_insert_with(Utc::now);
        Ok(())
    }

    async fn delete(&self, subscriber_id: i64, peer_id: i64) -> StoreResult<()> {
        let mut blocks = self.blocks.write().map_err(poisoned)?;
        blocks.remove(&(subscriber_id, peer_id));
        Ok(())
    }

    async fn fetch_by_subscriber(
        &self,
        subscriber_id: i64,
    ) -> StoreResult<Vec<NotificationBlock>> {
        let blocks = self.blocks.read().map_err(poisoned)?;
        let mut found: Vec<_> = blocks
            .iter()
            .filter(|((subscriber, _), _)| *subscriber == subscriber_id)
            .map(|(&(subscriber_id, blocked_peer_id), &created_at)| NotificationBlock {
                subscriber_id,
                blocked_peer_id,
                created_at,
            })
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<i64, UserProfile>>,
}

impl MemoryUserDirectory {
    pub fn insert(&self, profile: UserProfile) {
        if let Ok(mut users) = self.users.write() {
            users.insert(profile.user_id, profile);
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn fetch_one(&self, user_id: i64) -> StoreResult<Option<UserProfile>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&user_id).cloned())
    }

    async fn fetch_one_by_connect_code(
        &self,
        connect_code: &str,
    ) -> StoreResult<Option<UserProfile>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .values()
            .find(|user| user.connect_code == connect_code)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryEmotionActivity {
    recorded_today: RwLock<HashSet<i64>>,
}

impl MemoryEmotionActivity {
    pub fn mark_recorded(&self, user_id: i64) {
        if let Ok(mut recorded) = self.recorded_today.write() {
            recorded.insert(user_id);
        }
    }
}

#[async_trait]
impl EmotionActivity for MemoryEmotionActivity {
    async fn has_recorded_today(&self, user_id: i64) -> StoreResult<bool> {
        let recorded = self.recorded_today.read().map_err(poisoned)?;
        Ok(recorded.contains(&user_id))
    }
}

/// Keeps every delivered notification; can be switched to fail deliveries.
#[derive(Default)]
pub struct RecordingNotificationDispatcher {
    delivered: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotificationDispatcher {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotificationDispatcher {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("push gateway unavailable");
        }
        self.delivered
            .lock()
            .map_err(|_| anyhow::anyhow!("delivery log poisoned"))?
            .push(notification.clone());
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Corrupt("in-memory store lock poisoned".to_owned())
}

/// Every in-memory component, with handles kept for inspection.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub relationships: Arc<MemoryRelationshipStore>,
    pub notification_blocks: Arc<MemoryNotificationBlockStore>,
    pub users: Arc<MemoryUserDirectory>,
    pub emotion_activity: Arc<MemoryEmotionActivity>,
    pub notifier: Arc<RecordingNotificationDispatcher>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AppState {
        AppState {
            relationships: self.relationships.clone(),
            notification_blocks: self.notification_blocks.clone(),
            users: self.users.clone(),
            emotion_activity: self.emotion_activity.clone(),
            notifier: self.notifier.clone(),
        }
    }
}
