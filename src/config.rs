use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::info;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub armies: ArmyConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/muster.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 5509,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens. Required.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Token lifetime, e.g. `7d`, `12h`, `30m`, `45s` or plain seconds.
    pub token_expiry: String,

    /// Shared code a client must present to register. Registration is closed when unset.
    #[serde(skip_serializing)]
    pub registration_code: Option<String>,

    pub bcrypt_cost: u32,

    /// Serve `GET /auth` without a bearer token.
    pub public_user_list: bool,

    /// Mount the admin-only user deletion routes.
    pub allow_user_deletion: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry: "7d".to_string(),
            registration_code: None,
            bcrypt_cost: 12,
            public_user_list: false,
            allow_user_deletion: false,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("token_expiry", &self.token_expiry)
            .field("registration_code", &redact(&self.registration_code))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("public_user_list", &self.public_user_list)
            .field("allow_user_deletion", &self.allow_user_deletion)
            .finish()
    }
}

impl AuthConfig {
    /// Parsed `token_expiry`. Call after [`Config::validate`].
    pub fn token_ttl(&self) -> Result<Duration> {
        parse_duration(&self.token_expiry)
            .ok_or_else(|| anyhow::anyhow!("Invalid token expiry: {}", self.token_expiry))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmyConfig {
    /// Recompute `totalPoints` from the unit roster and reject mismatches.
    pub enforce_point_totals: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over file values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(secret) = non_empty("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(expiry) = non_empty("JWT_EXPIRES_IN") {
            self.auth.token_expiry = expiry;
        }
        if let Some(code) = non_empty("REGISTRATION_CODE") {
            self.auth.registration_code = Some(code);
        }
        if let Some(port) = non_empty("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = non_empty("DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Some(level) = non_empty("LOG_LEVEL") {
            self.general.log_level = level;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("muster").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".muster").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        match &self.auth.jwt_secret {
            Some(secret) if !secret.trim().is_empty() => {}
            _ => anyhow::bail!("Missing required setting: JWT_SECRET (auth.jwt_secret)"),
        }

        self.auth.token_ttl()?;

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            anyhow::bail!(
                "bcrypt cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"
            );
        }

        if self.observability.loki_enabled && self.observability.loki_url.is_empty() {
            anyhow::bail!("Loki URL cannot be empty when enabled");
        }

        Ok(())
    }
}

/// Parses `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
#[must_use]
pub fn parse_duration(input: &str) -> Option<Duration> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)^(\d+)\s*([dhms]?)$").expect("Invalid regex"));

    let caps = re.captures(input.trim())?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).map_or("", |m| m.as_str()).to_lowercase();

    let seconds = match unit.as_str() {
        "d" => value.checked_mul(86_400)?,
        "h" => value.checked_mul(3_600)?,
        "m" => value.checked_mul(60)?,
        _ => value,
    };

    (seconds > 0).then(|| Duration::from_secs(seconds))
}
