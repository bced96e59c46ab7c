use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of newsquiz appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface
/// as one of these messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

/// Failures of the cache capability.
///
/// Callers treat every variant as "no cache": a broken cache degrades to a
/// cold start, never to a failed refresh.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache value could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Cache Types
// ============================================================================

/// A stored cache value with its absolute expiry.
///
/// Expiry is reported, not enforced: the reader decides whether an entry in
/// the past is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
