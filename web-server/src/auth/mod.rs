// web-server/src/auth/mod.rs
pub mod redirects;
pub mod token_store;

use common::config::{AuthMode, Config};
use common::utils::is_likely_valid_publishable_key;

/// Cookie name for gateway session tracking
pub const SESSION_COOKIE_NAME: &str = "mc_session";
/// Cookie the hosted identity provider sets for its own session
pub const HOSTED_SESSION_COOKIE_NAME: &str = "__session";

/// Hosted auth is engaged only when the process runs in hosted mode *and*
/// the publishable key looks real. A malformed or absent key fails open to
/// unprotected content so secretless builds keep working.
pub fn hosted_auth_enabled(config: &Config) -> bool {
    config.auth.mode == AuthMode::Hosted
        && is_likely_valid_publishable_key(&config.auth.publishable_key)
}
