// common/src/models/session.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gateway session data, identified by an opaque cookie token. Auth state
/// (the local auth token) is held next to the session by the registry, not
/// inside it, so this struct stays serializable without leaking credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    /// Unique session identifier
    pub session_id: Uuid,
    /// Opaque token used for cookie-based tracking
    pub cookie_token: String,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of last activity
    pub last_active: DateTime<Utc>,
}

impl GatewaySession {
    pub fn new(cookie_token: String) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            cookie_token,
            created_at: now,
            last_active: now,
        }
    }

    /// Update session activity timestamp
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Check if the session has expired based on TTL
    pub fn is_expired(&self, ttl_seconds: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_active);
        age.num_seconds() > ttl_seconds
    }
}

/// Result of session lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionResult {
    Success(GatewaySession),
    NotFound,
    Expired,
}
