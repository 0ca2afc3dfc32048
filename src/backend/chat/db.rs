/**
 * PostgreSQL Store Implementations
 *
 * This module implements the chat persistence traits over a PostgreSQL
 * connection pool: group resolution, durable membership, message rows and
 * profile picture lookup.
 *
 * # Schema
 *
 * - `chat_groups (id, name UNIQUE, display_name, description)` where
 *   `name` is the sanitized routing-key form
 * - `chat_group_memberships (id, user_id, group_id, UNIQUE (user_id, group_id))`
 * - `chat_messages (id, user_id, group_id, content, timestamp)`
 * - `users (id, username, profile_picture)` - owned by the account system;
 *   only read here
 *
 * Membership creation relies on `ON CONFLICT DO NOTHING` so a second join
 * by the same user leaves exactly one row.
 */

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::shared::Group;

use super::store::{MembershipStore, MessageStore, NewChatMessage, ProfileResolver, StoreError};

/// Membership store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    /// Creates a store over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn is_member(&self, user_id: Uuid, group_name: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM chat_group_memberships m
                JOIN chat_groups g ON g.id = m.group_id
                WHERE m.user_id = $1 AND g.name = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(group_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn ensure_membership(&self, user_id: Uuid, group_name: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_group_memberships (id, user_id, group_id)
            SELECT gen_random_uuid(), $1, g.id
            FROM chat_groups g
            WHERE g.name = $2
            ON CONFLICT (user_id, group_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(group_name)
        .execute(&self.pool)
        .await?;

        // Zero rows with no conflict means the SELECT matched no group.
        if result.rows_affected() == 0 && !self.is_member(user_id, group_name).await? {
            return Err(StoreError::UnknownGroup(group_name.to_string()));
        }
        Ok(())
    }

    async fn remove_membership(&self, user_id: Uuid, group_name: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM chat_group_memberships m
            USING chat_groups g
            WHERE g.id = m.group_id AND m.user_id = $1 AND g.name = $2
            "#,
        )
        .bind(user_id)
        .bind(group_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn resolve_group(&self, group_name: &str) -> Result<Option<Group>, StoreError> {
        #[derive(sqlx::FromRow)]
        struct GroupRow {
            id: Uuid,
            name: String,
            display_name: Option<String>,
            description: String,
        }

        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, display_name, description
            FROM chat_groups
            WHERE name = $1
            "#,
        )
        .bind(group_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Group {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
        }))
    }

    async fn create_group(&self, group: &Group) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_groups (id, name, display_name, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.display_name)
        .bind(&group.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Message store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Creates a store over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn save(&self, message: NewChatMessage) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_messages (id, user_id, group_id, content, timestamp)
            SELECT gen_random_uuid(), $1, g.id, $2, $3
            FROM chat_groups g
            WHERE g.name = $4
            "#,
        )
        .bind(message.user_id)
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(&message.group_name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownGroup(message.group_name));
        }
        Ok(())
    }
}

/// Profile resolver backed by the users table
///
/// Stored paths are relative (`profile_picture/<file>`); the configured
/// media base URL is prefixed to form the absolute URL sent on the wire.
#[derive(Debug, Clone)]
pub struct PgProfileResolver {
    pool: PgPool,
    media_base_url: String,
}

/// Fallback path used when a user has no stored picture
const DEFAULT_PROFILE_PICTURE: &str = "profile_picture/default.png";

impl PgProfileResolver {
    /// Creates a resolver over the given pool
    pub fn new(pool: PgPool, media_base_url: impl Into<String>) -> Self {
        Self {
            pool,
            media_base_url: media_base_url.into(),
        }
    }

    fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.media_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ProfileResolver for PgProfileResolver {
    async fn profile_picture_url(&self, user_id: Uuid) -> String {
        let stored: Option<Option<String>> = match sqlx::query_scalar(
            r#"
            SELECT profile_picture
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("[Profiles] Lookup failed for {}: {:?}", user_id, e);
                None
            }
        };

        let path = stored
            .flatten()
            .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string());
        self.absolute_url(&path)
    }
}
