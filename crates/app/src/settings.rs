//! Handles settings for the application.
//!
//! Configuration is read from an optional `settings.toml` in the working
//! directory, then overridden by `CONTRACTS__<SECTION>__<KEY>` environment
//! variables (for example `CONTRACTS__SERVER__PORT=9000`).
use chrono::Duration;
use config::{Config, ConfigError, Environment, File, Source};
use engine::GuardScope;
use serde::Deserialize;
use server::TokenIssuer;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    #[serde(default)]
    pub guard: GuardScope,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Signing key for bearer tokens. A random key is generated at startup
    /// when unset.
    pub secret: Option<String>,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: default_issuer(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

/// Longest accepted token lifetime: ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

impl Auth {
    pub fn token_ttl(&self) -> Result<Duration, ConfigError> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
                self.token_ttl_hours
            )));
        }
        Duration::try_hours(self.token_ttl_hours).ok_or_else(|| {
            ConfigError::Message(format!(
                "auth.token_ttl_hours out of range: {}",
                self.token_ttl_hours
            ))
        })
    }

    pub fn token_issuer(&self) -> Result<TokenIssuer, ConfigError> {
        let ttl = self.token_ttl()?;
        Ok(match &self.secret {
            Some(secret) => TokenIssuer::new(secret.as_bytes(), &self.issuer, ttl),
            None => {
                tracing::warn!("no auth secret configured, tokens will not survive a restart");
                TokenIssuer::random(&self.issuer, ttl)
            }
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub auth: Auth,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_issuer() -> String {
    "contracts".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(
            File::with_name("settings").required(false),
            Environment::with_prefix("CONTRACTS"),
        )
    }

    fn load<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                env.prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.auth.token_ttl()?;
        Ok(settings)
    }

    pub fn server_addr(&self) -> String {
        let bind = self.server.bind.as_deref().unwrap_or("127.0.0.1");
        format!("{bind}:{}", self.server.port)
    }
}
