/**
 * Persistence Interfaces for the Chat Core
 *
 * This module defines the traits the realtime core uses to reach durable
 * state: group membership, chat message storage, and profile lookup. The
 * session handlers depend only on these traits; concrete backends are
 * injected through `AppState`.
 *
 * Two families of implementations exist:
 * - PostgreSQL-backed (`backend::chat::db`), used when a database is
 *   configured
 * - In-memory (below), used by tests and when the server runs without a
 *   database
 *
 * All `group_name` parameters at this boundary are the sanitized
 * routing-key form.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::Group;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced group does not exist
    #[error("Unknown group: {0}")]
    UnknownGroup(String),
}

/// A chat message accepted from a connection, ready to persist
///
/// Created exactly once per inbound frame that carries non-empty text;
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    /// Sending user
    pub user_id: Uuid,
    /// Routing-key form of the target group name
    pub group_name: String,
    /// Message text
    pub content: String,
    /// Server-assigned timestamp
    pub timestamp: DateTime<Utc>,
}

/// Durable user-to-group membership store
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Returns true if the user has a membership record for the group
    async fn is_member(&self, user_id: Uuid, group_name: &str) -> Result<bool, StoreError>;

    /// Create the membership if absent; a second call for the same pair is
    /// a no-op
    async fn ensure_membership(&self, user_id: Uuid, group_name: &str) -> Result<(), StoreError>;

    /// Remove the membership record if present
    async fn remove_membership(&self, user_id: Uuid, group_name: &str) -> Result<(), StoreError>;

    /// Look up a group by its routing-key name
    async fn resolve_group(&self, group_name: &str) -> Result<Option<Group>, StoreError>;

    /// Create a group; creating an already-present group is a no-op
    async fn create_group(&self, group: &Group) -> Result<(), StoreError>;
}

/// Durable chat message store
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist one accepted chat message
    async fn save(&self, message: NewChatMessage) -> Result<(), StoreError>;
}

/// Profile picture lookup used to enrich chat_message events
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Absolute URL of the user's profile picture
    async fn profile_picture_url(&self, user_id: Uuid) -> String;
}

/// In-memory membership store
///
/// Backs tests and database-less operation. Groups and memberships live in
/// process memory and disappear on restart.
#[derive(Debug, Default)]
pub struct MemoryMembershipStore {
    groups: Mutex<HashMap<String, Group>>,
    memberships: Mutex<HashSet<(Uuid, String)>>,
}

impl MemoryMembershipStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group directly, bypassing the trait (test setup helper)
    pub fn add_group(&self, group: Group) {
        self.groups.lock().unwrap().insert(group.name.clone(), group);
    }

    /// Number of membership records (test assertion helper)
    pub fn membership_count(&self) -> usize {
        self.memberships.lock().unwrap().len()
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn is_member(&self, user_id: Uuid, group_name: &str) -> Result<bool, StoreError> {
        let memberships = self.memberships.lock().unwrap();
        Ok(memberships.contains(&(user_id, group_name.to_string())))
    }

    async fn ensure_membership(&self, user_id: Uuid, group_name: &str) -> Result<(), StoreError> {
        if !self.groups.lock().unwrap().contains_key(group_name) {
            return Err(StoreError::UnknownGroup(group_name.to_string()));
        }
        let mut memberships = self.memberships.lock().unwrap();
        memberships.insert((user_id, group_name.to_string()));
        Ok(())
    }

    async fn remove_membership(&self, user_id: Uuid, group_name: &str) -> Result<(), StoreError> {
        let mut memberships = self.memberships.lock().unwrap();
        memberships.remove(&(user_id, group_name.to_string()));
        Ok(())
    }

    async fn resolve_group(&self, group_name: &str) -> Result<Option<Group>, StoreError> {
        let groups = self.groups.lock().unwrap();
        Ok(groups.get(group_name).cloned())
    }

    async fn create_group(&self, group: &Group) -> Result<(), StoreError> {
        let mut groups = self.groups.lock().unwrap();
        groups.entry(group.name.clone()).or_insert_with(|| group.clone());
        Ok(())
    }
}

/// In-memory message store
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    saved: Mutex<Vec<NewChatMessage>>,
}

impl MemoryMessageStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages saved so far (test assertion helper)
    pub fn saved(&self) -> Vec<NewChatMessage> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save(&self, message: NewChatMessage) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(message);
        Ok(())
    }
}

/// Profile resolver that returns one fixed URL for every user
#[derive(Debug, Clone)]
pub struct StaticProfileResolver {
    url: String,
}

impl StaticProfileResolver {
    /// Creates a resolver that always answers with `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ProfileResolver for StaticProfileResolver {
    async fn profile_picture_url(&self, _user_id: Uuid) -> String {
        self.url.clone()
    }
}
