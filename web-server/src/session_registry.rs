// web-server/src/session_registry.rs
use actix::{Actor, AsyncContext, Context, Handler, Message, MessageResult};
use common::config::AuthMode;
use common::models::session::{GatewaySession, SessionResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::token_store::{LocalTokenStore, MemoryStorage};
use crate::utils::token::mint_opaque_token;

// Default session TTL in seconds (24 hours)
const DEFAULT_SESSION_TTL: i64 = 86400;
// Run expired-session cleanup every hour
const DEFAULT_CLEANUP_INTERVAL: u64 = 3600;

/// Actor message: Look up an existing session by cookie token, or create a
/// new one. Answers the cookie token to set and whether it is new.
#[derive(Message)]
#[rtype(result = "EnsuredSession")]
pub struct EnsureSession {
    pub cookie_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnsuredSession {
    pub cookie_token: String,
    pub new_session: bool,
}

/// Actor message: Get a session by cookie token
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct GetSession {
    pub cookie_token: String,
}

/// Actor message: Does this session hold a local auth token?
#[derive(Message)]
#[rtype(result = "bool")]
pub struct HasLocalToken {
    pub cookie_token: String,
}

/// Actor message: Store a local auth token in a session
#[derive(Message)]
#[rtype(result = "bool")]
pub struct SetLocalToken {
    pub cookie_token: String,
    pub token: String,
}

/// Actor message: Clear a session's local auth token
#[derive(Message)]
#[rtype(result = "bool")]
pub struct ClearLocalToken {
    pub cookie_token: String,
}

/// Actor message: Invalidate/remove a session
#[derive(Message)]
#[rtype(result = "bool")]
pub struct InvalidateSession {
    pub cookie_token: String,
}

/// Actor message: Clean up expired sessions
#[derive(Message)]
#[rtype(result = "usize")]
pub struct CleanupExpiredSessions;

struct SessionEntry {
    session: GatewaySession,
    tokens: LocalTokenStore,
}

impl SessionEntry {
    fn new(cookie_token: String) -> Self {
        Self {
            session: GatewaySession::new(cookie_token),
            tokens: LocalTokenStore::new(Arc::new(MemoryStorage::default())),
        }
    }
}

/// Actor managing gateway sessions and their local auth tokens. One token
/// store per session keeps token state session-confined with a single writer.
pub struct SessionRegistryActor {
    mode: AuthMode,
    sessions: Arc<DashMap<String, SessionEntry>>,
    session_ttl: i64,
    cleanup_interval: u64,
}

impl SessionRegistryActor {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            sessions: Arc::new(DashMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.session_ttl = ttl_seconds;
        self
    }

    pub fn with_cleanup_interval(mut self, interval_seconds: u64) -> Self {
        self.cleanup_interval = interval_seconds;
        self
    }

    /// Remove expired sessions, returning how many were dropped
    fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.session_ttl;
        self.sessions
            .retain(|_, entry| !entry.session.is_expired(ttl));
        before - self.sessions.len()
    }
}

impl Actor for SessionRegistryActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            "Session registry started (mode: {}, ttl: {}s)",
            self.mode,
            self.session_ttl
        );

        ctx.run_interval(Duration::from_secs(self.cleanup_interval), |act, _ctx| {
            let removed = act.cleanup_expired();
            if removed > 0 {
                tracing::info!("Cleaned up {} expired sessions", removed);
            }
        });
    }
}

impl Handler<EnsureSession> for SessionRegistryActor {
    type Result = MessageResult<EnsureSession>;

    fn handle(&mut self, msg: EnsureSession, _ctx: &mut Self::Context) -> Self::Result {
        if let Some(cookie_token) = msg.cookie_token {
            let expired = match self.sessions.get_mut(&cookie_token) {
                Some(mut entry) => {
                    if entry.session.is_expired(self.session_ttl) {
                        true
                    } else {
                        entry.session.touch();
                        return MessageResult(EnsuredSession {
                            cookie_token,
                            new_session: false,
                        });
                    }
                }
                None => false,
            };
            if expired {
                self.sessions.remove(&cookie_token);
            }
        }

        let cookie_token = mint_opaque_token();
        self.sessions
            .insert(cookie_token.clone(), SessionEntry::new(cookie_token.clone()));

        tracing::info!("Created new gateway session");

        MessageResult(EnsuredSession {
            cookie_token,
            new_session: true,
        })
    }
}

impl Handler<GetSession> for SessionRegistryActor {
    type Result = MessageResult<GetSession>;

    fn handle(&mut self, msg: GetSession, _ctx: &mut Self::Context) -> Self::Result {
        match self.sessions.get(&msg.cookie_token) {
            Some(entry) => {
                if entry.session.is_expired(self.session_ttl) {
                    MessageResult(SessionResult::Expired)
                } else {
                    MessageResult(SessionResult::Success(entry.session.clone()))
                }
            }
            None => MessageResult(SessionResult::NotFound),
        }
    }
}

impl Handler<HasLocalToken> for SessionRegistryActor {
    type Result = MessageResult<HasLocalToken>;

    fn handle(&mut self, msg: HasLocalToken, _ctx: &mut Self::Context) -> Self::Result {
        let mode = self.mode;
        match self.sessions.get_mut(&msg.cookie_token) {
            Some(mut entry) => {
                if entry.session.is_expired(self.session_ttl) {
                    drop(entry);
                    self.sessions.remove(&msg.cookie_token);
                    return MessageResult(false);
                }
                // A process no longer in local mode must not honor tokens
                // minted under it
                entry.tokens.apply_mode(mode);
                MessageResult(entry.tokens.has_token())
            }
            None => MessageResult(false),
        }
    }
}

impl Handler<SetLocalToken> for SessionRegistryActor {
    type Result = MessageResult<SetLocalToken>;

    fn handle(&mut self, msg: SetLocalToken, _ctx: &mut Self::Context) -> Self::Result {
        if self.mode != AuthMode::Local {
            tracing::warn!("Refusing to store local auth token outside local mode");
            return MessageResult(false);
        }
        match self.sessions.get_mut(&msg.cookie_token) {
            Some(mut entry) => {
                entry.tokens.set(msg.token);
                entry.session.touch();
                MessageResult(true)
            }
            None => MessageResult(false),
        }
    }
}

impl Handler<ClearLocalToken> for SessionRegistryActor {
    type Result = MessageResult<ClearLocalToken>;

    fn handle(&mut self, msg: ClearLocalToken, _ctx: &mut Self::Context) -> Self::Result {
        match self.sessions.get_mut(&msg.cookie_token) {
            Some(mut entry) => {
                entry.tokens.clear();
                entry.session.touch();
                MessageResult(true)
            }
            None => MessageResult(false),
        }
    }
}

impl Handler<InvalidateSession> for SessionRegistryActor {
    type Result = MessageResult<InvalidateSession>;

    fn handle(&mut self, msg: InvalidateSession, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.sessions.remove(&msg.cookie_token).is_some())
    }
}

impl Handler<CleanupExpiredSessions> for SessionRegistryActor {
    type Result = MessageResult<CleanupExpiredSessions>;

    fn handle(&mut self, _msg: CleanupExpiredSessions, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.cleanup_expired())
    }
}
