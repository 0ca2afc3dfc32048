/**
 * Connection Authentication
 *
 * This module provides the authentication seam for realtime connections.
 * Clients pass a bearer token in the WebSocket URL (`?token=...`); an
 * `AuthResolver` turns it into a user identity before the connection is
 * upgraded. An anonymous result refuses chat connections outright - no
 * registry or store mutation happens for an unauthenticated socket.
 *
 * Token issuance and verification policy belong to the account system;
 * this module only consumes a resolver. The default production resolver
 * decodes an HS256 JWT and confirms the user exists in the database.
 */

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of an authenticated connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// User ID
    pub user_id: Uuid,
    /// Username shown in chat events
    pub username: String,
}

/// Resolves a connection handshake to a user identity
///
/// Returning `None` means the connection is anonymous; the chat handler
/// refuses it, the notification handler consults its access policy.
#[async_trait]
pub trait AuthResolver: Send + Sync {
    /// Resolve the handshake token, if any, to a user identity
    async fn authenticate(&self, token: Option<&str>) -> Option<UserIdentity>;
}

/// JWT claims carried by chat connection tokens
#[derive(Debug, Deserialize)]
struct Claims {
    user_id: Uuid,
    #[allow(dead_code)]
    exp: usize,
}

/// Production resolver: HS256 JWT plus a user-existence check
pub struct JwtAuthResolver {
    secret: String,
    pool: PgPool,
}

impl JwtAuthResolver {
    /// Creates a resolver with an explicit secret
    pub fn new(secret: impl Into<String>, pool: PgPool) -> Self {
        Self {
            secret: secret.into(),
            pool,
        }
    }

    /// Creates a resolver from the `JWT_SECRET` environment variable
    ///
    /// Returns `None` when the variable is unset, in which case the caller
    /// should fall back to refusing authenticated traffic.
    pub fn from_env(pool: PgPool) -> Option<Self> {
        match std::env::var("JWT_SECRET") {
            Ok(secret) => Some(Self::new(secret, pool)),
            Err(_) => {
                tracing::warn!("JWT_SECRET not set. Chat connections will be refused.");
                None
            }
        }
    }
}

#[async_trait]
impl AuthResolver for JwtAuthResolver {
    async fn authenticate(&self, token: Option<&str>) -> Option<UserIdentity> {
        let token = token?;

        let claims = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::warn!("[Auth] Invalid connection token: {:?}", e);
                return None;
            }
        };

        // Token may outlive the account; confirm the user still exists.
        let username: Option<String> = match sqlx::query_scalar(
            r#"
            SELECT username
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(claims.user_id)
        .fetch_optional(&self.pool)
        .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("[Auth] User lookup failed: {:?}", e);
                return None;
            }
        };

        match username {
            Some(username) => Some(UserIdentity {
                user_id: claims.user_id,
                username,
            }),
            None => {
                tracing::warn!("[Auth] Token for unknown user {}", claims.user_id);
                None
            }
        }
    }
}

/// Resolver over a fixed token-to-identity table
///
/// An empty table refuses everything, which is the fallback when no
/// production resolver can be configured. Tests register identities with
/// [`StaticAuthResolver::with_user`].
#[derive(Debug, Default)]
pub struct StaticAuthResolver {
    users: HashMap<String, UserIdentity>,
}

impl StaticAuthResolver {
    /// Creates a resolver that refuses every token
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Register an identity for a token
    pub fn with_user(mut self, token: impl Into<String>, identity: UserIdentity) -> Self {
        self.users.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl AuthResolver for StaticAuthResolver {
    async fn authenticate(&self, token: Option<&str>) -> Option<UserIdentity> {
        token.and_then(|token| self.users.get(token).cloned())
    }
}

/// Extract the bearer token from a raw WebSocket URL query string
pub fn token_from_query(raw_query: Option<&str>) -> Option<String> {
    let raw_query = raw_query?;
    raw_query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "token" && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> UserIdentity {
        UserIdentity {
            user_id: Uuid::new_v4(),
            username: name.to_string(),
        }
    }

    #[test]
    fn test_token_from_query() {
        assert_eq!(token_from_query(Some("token=abc")), Some("abc".to_string()));
        assert_eq!(
            token_from_query(Some("foo=1&token=abc&bar=2")),
            Some("abc".to_string())
        );
        assert_eq!(token_from_query(Some("token=")), None);
        assert_eq!(token_from_query(Some("other=abc")), None);
        assert_eq!(token_from_query(None), None);
    }

    #[tokio::test]
    async fn test_static_resolver_known_token() {
        let alice = identity("alice");
        let resolver = StaticAuthResolver::deny_all().with_user("tok-alice", alice.clone());

        assert_eq!(resolver.authenticate(Some("tok-alice")).await, Some(alice));
    }

    #[tokio::test]
    async fn test_static_resolver_unknown_token() {
        let resolver = StaticAuthResolver::deny_all().with_user("tok-alice", identity("alice"));

        assert_eq!(resolver.authenticate(Some("tok-bob")).await, None);
        assert_eq!(resolver.authenticate(None).await, None);
    }

    #[tokio::test]
    async fn test_deny_all_refuses_everything() {
        let resolver = StaticAuthResolver::deny_all();
        assert_eq!(resolver.authenticate(Some("anything")).await, None);
    }
}
