// common/src/config.rs
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which authentication strategy the gateway runs with. Set once at process
/// start and immutable for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Test/dev bypass: a stored opaque token gates access.
    Local,
    /// External hosted identity provider handles sign-in and sessions.
    Hosted,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(AuthMode::Local),
            "hosted" => Ok(AuthMode::Hosted),
            other => Err(format!("unknown auth mode: {other}")),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Local => write!(f, "local"),
            AuthMode::Hosted => write!(f, "hosted"),
        }
    }
}

/// Central configuration for the gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub web_server_addr: String,
    /// Backend origin that /api/v1/* requests are rewritten to.
    pub backend_url: String,
    /// The gateway's own external origin, used when sanitizing absolute
    /// redirect URLs.
    pub public_origin: String,
    pub session_ttl_seconds: i64,

    pub auth: AuthConfig,

    // Static file serving configuration
    pub static_files: StaticFilesConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// Hosted-provider publishable key; hosted auth is skipped when this
    /// fails the format check.
    pub publishable_key: String,
    pub after_sign_out_url: String,
    pub sign_in_fallback_redirect_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_server_addr: "127.0.0.1:3000".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            public_origin: "http://localhost:3000".to_string(),
            session_ttl_seconds: 86400,

            auth: AuthConfig {
                mode: AuthMode::Local,
                publishable_key: String::new(),
                after_sign_out_url: "/".to_string(),
                sign_in_fallback_redirect_url: "/onboarding".to_string(),
            },

            static_files: StaticFilesConfig {
                path: "./static".to_string(),
                index: "index.html".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        // Build configuration
        let config = ConfigFile::builder()
            // Start with defaults
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add environment specific config
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Add a local config file for local overrides
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables with prefix "APP"
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Build and deserialize
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from environment variables directly (backward compatibility)
    pub fn from_env() -> Self {
        // Try to load from file first
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let defaults = Config::default();

                let web_server_addr =
                    env::var("WEB_SERVER_ADDR").unwrap_or(defaults.web_server_addr);

                let backend_url = env::var("BACKEND_URL").unwrap_or(defaults.backend_url);

                let public_origin = env::var("PUBLIC_ORIGIN").unwrap_or(defaults.public_origin);

                let session_ttl_seconds = env::var("SESSION_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(defaults.session_ttl_seconds);

                let mode = env::var("AUTH_MODE")
                    .ok()
                    .and_then(|v| v.parse::<AuthMode>().ok())
                    .unwrap_or(defaults.auth.mode);

                let publishable_key =
                    env::var("AUTH_PUBLISHABLE_KEY").unwrap_or(defaults.auth.publishable_key);

                let after_sign_out_url =
                    env::var("AFTER_SIGN_OUT_URL").unwrap_or(defaults.auth.after_sign_out_url);

                let sign_in_fallback_redirect_url = env::var("SIGN_IN_FALLBACK_REDIRECT_URL")
                    .unwrap_or(defaults.auth.sign_in_fallback_redirect_url);

                let static_files_path =
                    env::var("STATIC_FILES_PATH").unwrap_or(defaults.static_files.path);

                let static_files_index =
                    env::var("STATIC_FILES_INDEX").unwrap_or(defaults.static_files.index);

                Self {
                    web_server_addr,
                    backend_url,
                    public_origin,
                    session_ttl_seconds,
                    auth: AuthConfig {
                        mode,
                        publishable_key,
                        after_sign_out_url,
                        sign_in_fallback_redirect_url,
                    },
                    static_files: StaticFilesConfig {
                        path: static_files_path,
                        index: static_files_index,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_from_str() {
        assert_eq!("local".parse::<AuthMode>().unwrap(), AuthMode::Local);
        assert_eq!("hosted".parse::<AuthMode>().unwrap(), AuthMode::Hosted);
        assert_eq!("HOSTED".parse::<AuthMode>().unwrap(), AuthMode::Hosted);
        assert!("clerk".parse::<AuthMode>().is_err());
        assert!("".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_auth_mode_display_round_trip() {
        for mode in [AuthMode::Local, AuthMode::Hosted] {
            assert_eq!(mode.to_string().parse::<AuthMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.auth.mode, AuthMode::Local);
        assert_eq!(config.auth.sign_in_fallback_redirect_url, "/onboarding");
        assert_eq!(config.auth.after_sign_out_url, "/");
        assert_eq!(config.session_ttl_seconds, 86400);
    }
}
