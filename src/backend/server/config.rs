/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration:
 * the optional PostgreSQL database connection and the chat policy knobs.
 *
 * # Configuration Sources
 *
 * Configuration is loaded from environment variables, with sensible
 * defaults for local development when possible.
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent server startup.
 * A missing or unreachable database makes the server fall back to the
 * in-memory stores instead of aborting.
 */

use sqlx::PgPool;

/// Database configuration result
///
/// Contains the database connection pool if successfully configured,
/// or `None` if the database is not available.
pub type DatabaseConfig = Option<PgPool>;

/// Chat policy configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Create a group implicitly when a connection joins an unknown name
    ///
    /// Off by default: joining an unknown group is refused with a
    /// group-not-found close frame.
    pub auto_create_groups: bool,

    /// Refuse anonymous connections on the global notification channel
    pub notifications_require_auth: bool,

    /// Base URL prefixed to stored profile picture paths
    pub media_base_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            auto_create_groups: false,
            notifications_require_auth: false,
            media_base_url: "http://127.0.0.1:8000/media".to_string(),
        }
    }
}

impl ChatConfig {
    /// Load the chat configuration from environment variables
    ///
    /// - `CHAT_AUTO_CREATE_GROUPS` - enable implicit group creation
    /// - `NOTIFICATIONS_REQUIRE_AUTH` - restrict the notification channel
    /// - `MEDIA_BASE_URL` - profile picture URL prefix
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            auto_create_groups: env_flag("CHAT_AUTO_CREATE_GROUPS"),
            notifications_require_auth: env_flag("NOTIFICATIONS_REQUIRE_AUTH"),
            media_base_url: std::env::var("MEDIA_BASE_URL")
                .unwrap_or(defaults.media_base_url),
        }
    }
}

/// Read a boolean flag from the environment
///
/// `1`, `true` and `yes` (case-insensitive) enable the flag; anything
/// else, including an unset variable, disables it.
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Load and initialize the database connection pool
///
/// This function:
/// 1. Reads `DATABASE_URL` from the environment
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is successfully configured
/// - `None` if `DATABASE_URL` is not set or the connection fails
///
/// # Errors
///
/// Errors are logged but do not prevent server startup. The function
/// returns `None` on any error, letting the server run on the in-memory
/// stores.
pub async fn load_database() -> DatabaseConfig {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set. Falling back to in-memory stores.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to in-memory stores.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            // Migrations might have already been applied out of band.
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
