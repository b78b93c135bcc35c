//! Configuration module
//!
//! TOML file with `[server]`, `[security]`, `[auth]`, `[logging]` and
//! `[[users]]` sections, plus `TOKEN_GATE_*` environment overrides.
//! The signing secret never lives in the file: `[security]` only says
//! where to read it from.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::auth::gate::PublicRoutes;
use crate::auth::secret::SecretKey;

pub const CONFIG_PATH_VAR: &str = "TOKEN_GATE_CONFIG";
pub const HOST_VAR: &str = "TOKEN_GATE_HOST";
pub const PORT_VAR: &str = "TOKEN_GATE_PORT";
pub const LOG_LEVEL_VAR: &str = "TOKEN_GATE_LOG_LEVEL";
pub const EXPIRATION_VAR: &str = "TOKEN_GATE_TOKEN_EXPIRATION_MINUTES";

/// Errors that stop the process before it serves anything.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("signing secret not set (expected environment variable {var} or security.secret_file)")]
    MissingSecret { var: String },

    #[error("signing secret is {len} bytes, at least {min} required")]
    SecretTooShort { len: usize, min: usize },

    #[error("token expiration must be a positive number of minutes, got {0}")]
    InvalidTokenLifetime(i64),

    #[error("public route '{0}' must start with '/'")]
    InvalidPublicRoute(String),

    #[error("invalid value '{value}' for {var}")]
    InvalidOverride { var: String, value: String },

    #[error("invalid user entry: {0}")]
    InvalidUser(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Environment variable holding the signing secret
    pub secret_env: String,
    /// File holding the signing secret; wins over `secret_env`
    pub secret_file: Option<PathBuf>,
    pub token_expiration_minutes: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_env: "JWT_SECRET_KEY".to_string(),
            secret_file: None,
            token_expiration_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub public_routes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_routes: vec![
                "/api/auth/login".to_string(),
                "/api/auth/register".to_string(),
                "/health".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Account allowed to log in. Only bcrypt hashes are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password_hash: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "Member".to_string()
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `TOKEN_GATE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_VAR) {
            self.server.host = host;
        }
        if let Some(port) = lookup(PORT_VAR) {
            self.server.port = parse_override(PORT_VAR, &port)?;
        }
        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            self.logging.level = level;
        }
        if let Some(minutes) = lookup(EXPIRATION_VAR) {
            self.security.token_expiration_minutes = parse_override(EXPIRATION_VAR, &minutes)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_override<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Validated authentication settings. Building these is the startup
/// check: the service must not run without them.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: SecretKey,
    pub token_lifetime: chrono::Duration,
    pub public_routes: PublicRoutes,
}

impl AuthSettings {
    pub fn from_config<F>(config: &AppConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = match &config.security.secret_file {
            Some(path) => SecretKey::from_file(path)?,
            None => {
                let var = &config.security.secret_env;
                let value = lookup(var)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigError::MissingSecret { var: var.clone() })?;
                SecretKey::new(value)?
            }
        };

        let minutes = config.security.token_expiration_minutes;
        let token_lifetime = chrono::Duration::try_minutes(minutes)
            .filter(|_| minutes > 0)
            .ok_or(ConfigError::InvalidTokenLifetime(minutes))?;

        let public_routes = PublicRoutes::new(&config.auth.public_routes)?;

        Ok(Self {
            secret,
            token_lifetime,
            public_routes,
        })
    }
}

/// Read a variable from the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// `<config_dir>/token-gate/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("token-gate")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.security.secret_env, "JWT_SECRET_KEY");
        assert_eq!(config.security.token_expiration_minutes, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.auth.public_routes.contains(&"/api/auth/login".to_string()));
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
[server]
port = 9090

[security]
token_expiration_minutes = 15

[[users]]
id = "11111111-1111-1111-1111-111111111111"
username = "alice"
password_hash = "$2b$04$abcdefghijklmnopqrstuu"
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.security.token_expiration_minutes, 15);
        assert_eq!(config.security.secret_env, "JWT_SECRET_KEY");
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].role, "Member");
        assert_eq!(config.users[0].email, None);
    }

    #[test]
    fn test_load_reports_path() {
        let path = std::env::temp_dir().join(format!("token-gate-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        std::fs::remove_file(&path).ok();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                (HOST_VAR, "127.0.0.1"),
                (PORT_VAR, "3000"),
                (LOG_LEVEL_VAR, "debug"),
                (EXPIRATION_VAR, "5"),
            ]))
            .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.security.token_expiration_minutes, 5);
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_overrides(env(&[(PORT_VAR, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn test_auth_settings_from_env_secret() {
        let settings =
            AuthSettings::from_config(&AppConfig::default(), env(&[("JWT_SECRET_KEY", SECRET)])).unwrap();
        assert_eq!(settings.secret.len(), 32);
        assert_eq!(settings.token_lifetime.num_seconds(), 1800);
        assert!(settings.public_routes.matches("/health"));
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = AuthSettings::from_config(&AppConfig::default(), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { ref var } if var == "JWT_SECRET_KEY"));

        let err = AuthSettings::from_config(&AppConfig::default(), env(&[("JWT_SECRET_KEY", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
    }

    #[test]
    fn test_short_secret_is_fatal() {
        let err = AuthSettings::from_config(&AppConfig::default(), env(&[("JWT_SECRET_KEY", "short")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::SecretTooShort { len: 5, min: 32 }));
        assert!(!err.to_string().contains("short"));
    }

    #[test]
    fn test_secret_file_takes_precedence() {
        let path = std::env::temp_dir().join(format!("token-gate-key-{}", std::process::id()));
        std::fs::write(&path, SECRET).unwrap();

        let mut config = AppConfig::default();
        config.security.secret_file = Some(path.clone());
        let settings = AuthSettings::from_config(&config, env(&[("JWT_SECRET_KEY", "short")])).unwrap();
        assert_eq!(settings.secret.len(), 32);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_non_positive_lifetime_is_fatal() {
        let mut config = AppConfig::default();
        config.security.token_expiration_minutes = 0;
        let err = AuthSettings::from_config(&config, env(&[("JWT_SECRET_KEY", SECRET)])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokenLifetime(0)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_fatal() {
        let mut config = AppConfig::default();
        config.security.token_expiration_minutes = i64::MAX;
        let err = AuthSettings::from_config(&config, env(&[("JWT_SECRET_KEY", SECRET)])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokenLifetime(i64::MAX)));
    }

    #[test]
    fn test_out_of_range_lifetime_override_is_fatal() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[(EXPIRATION_VAR, &i64::MAX.to_string())]))
            .unwrap();
        let err = AuthSettings::from_config(&config, env(&[("JWT_SECRET_KEY", SECRET)])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokenLifetime(_)));
    }

    #[test]
    fn test_relative_public_route_is_fatal() {
        let mut config = AppConfig::default();
        config.auth.public_routes.push("health".to_string());
        let err = AuthSettings::from_config(&config, env(&[("JWT_SECRET_KEY", SECRET)])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPublicRoute(_)));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("token-gate/config.toml"));
    }
}
