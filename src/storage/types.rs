use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A subscription with this title already exists.
    #[error("Duplicated subscription: {0}")]
    DuplicateSubscription(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A cached channel payload could not be (de)serialized.
    #[error("Cache payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// Row type for subscription queries
pub(crate) type SubscriptionRow = (i64, String, String, Option<String>, i64);

/// A stored feed subscription.
///
/// Serializes with the field names the listing/lookup commands emit
/// (`xmlUrl`, `htmlUrl`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub title: String,
    pub xml_url: String,
    pub html_url: Option<String>,
    /// Unix timestamp of the last add/import touching this row.
    pub updated_at: i64,
}

impl Subscription {
    pub(crate) fn from_row(row: SubscriptionRow) -> Self {
        let (id, title, xml_url, html_url, updated_at) = row;
        Self {
            id,
            title,
            xml_url,
            html_url,
            updated_at,
        }
    }
}

/// Input for inserting or syncing a subscription (no id/timestamp yet).
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub title: String,
    pub xml_url: String,
    pub html_url: Option<String>,
}
