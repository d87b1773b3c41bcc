//! # Configuration
//!
//! YAML configuration with `${VAR}` / `${VAR:default}` environment macros.
//!
//! Loading runs four steps:
//!
//! 1. read the file
//! 2. parse into loosely-typed raw structs (unknown keys ignored)
//! 3. expand environment macros inside each parsed value
//! 4. normalize (defaults, CSV splitting) and validate into [`Config`]
//!
//! Macros are expanded after parsing, so an environment value is always
//! taken verbatim as the field's text and can never alter the document
//! structure.
//!
//! The file path is chosen by [`resolve_path`]: an explicit path wins,
//! then `CONFIG_PATH`, then `config.yml`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use authgate_core::{HeaderNameError, RequiredHeaderSet};
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};
use url::Url;
use zeroize::Zeroizing;

/// Environment variable consulted when no explicit path is given.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Fallback configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

static ENV_MACRO: OnceLock<Regex> = OnceLock::new();

fn env_macro() -> &'static Regex {
    ENV_MACRO.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}")
            .expect("environment macro pattern is valid")
    })
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },

    /// The YAML did not parse.
    #[error("parsing configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// `server.port` is not a valid TCP port.
    #[error("invalid server.port {0:?}: expected 1-65535")]
    InvalidPort(String),

    /// A duration field did not parse.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidDuration {
        /// Field name.
        field: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A URL field did not parse.
    #[error("invalid {field}: {reason}")]
    InvalidUrl {
        /// Field name.
        field: &'static str,
        /// Parser message.
        reason: String,
    },

    /// A required header is not a valid HTTP field name.
    #[error("invalid auth.required_headers entry {0:?}")]
    InvalidHeaderName(String),
}

impl From<HeaderNameError> for ConfigError {
    fn from(err: HeaderNameError) -> Self {
        Self::InvalidHeaderName(err.0)
    }
}

// ── Typed configuration ─────────────────────────────────────────────────────

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Authentication settings.
    pub auth: AuthConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Maximum time to read a request.
    pub read_timeout: Duration,
    /// Maximum time to produce a response; enforced per request.
    pub write_timeout: Duration,
    /// Keep-alive idle limit.
    pub idle_timeout: Duration,
    /// Default log verbosity when `RUST_LOG` is unset.
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            log_level: LogLevel::Info,
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Parse a level name case-insensitively; unknown names mean `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Authentication settings.
///
/// Custom `Debug` redacts `client_secret`; the secret is zeroized on drop.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Required token issuer; empty disables the check.
    pub issuer: String,
    /// `*`, empty, or a comma-separated audience list.
    pub audience: String,
    /// JWKS endpoint; empty disables JWT verification.
    pub jwks_url: String,
    /// Introspection endpoint; empty disables opaque verification.
    pub introspection_url: String,
    /// Introspection client ID; empty disables client authentication.
    pub client_id: String,
    /// Introspection client secret.
    pub client_secret: Zeroizing<String>,
    /// Headers every protected request must carry, in reporting order.
    pub required_headers: RequiredHeaderSet,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("jwks_url", &self.jwks_url)
            .field("introspection_url", &self.introspection_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("required_headers", &self.required_headers.names())
            .finish()
    }
}

// ── Raw file shape ──────────────────────────────────────────────────────────

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    server: RawServer,
    auth: RawAuth,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawServer {
    #[serde(deserialize_with = "scalar")]
    port: String,
    #[serde(deserialize_with = "scalar")]
    read_timeout: String,
    #[serde(deserialize_with = "scalar")]
    write_timeout: String,
    #[serde(deserialize_with = "scalar")]
    idle_timeout: String,
    #[serde(deserialize_with = "scalar")]
    log_level: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawAuth {
    #[serde(deserialize_with = "scalar")]
    issuer: String,
    #[serde(deserialize_with = "scalar")]
    audience: String,
    #[serde(deserialize_with = "scalar")]
    jwks_url: String,
    #[serde(deserialize_with = "scalar")]
    introspection_url: String,
    #[serde(deserialize_with = "scalar")]
    client_id: String,
    #[serde(deserialize_with = "scalar")]
    client_secret: String,
    #[serde(deserialize_with = "scalar")]
    required_headers: String,
}

/// Accept any YAML scalar as text; `null` becomes empty.
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    use serde::de::Error;
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, found {other:?}"))),
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Pick the configuration path: `explicit`, else `$CONFIG_PATH`, else
/// `config.yml`. Empty values are skipped.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| {
            std::env::var(CONFIG_PATH_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load, expand, parse and validate the file at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_yaml_str(&text)?;

    tracing::debug!(
        config_path = %path.display(),
        port = config.server.port,
        log_level = config.server.log_level.as_filter(),
        read_timeout = ?config.server.read_timeout,
        write_timeout = ?config.server.write_timeout,
        idle_timeout = ?config.server.idle_timeout,
        auth_issuer = %config.auth.issuer,
        auth_audience = %config.auth.audience,
        auth_jwks_url = %config.auth.jwks_url,
        auth_introspection_url = %config.auth.introspection_url,
        auth_client_id = %config.auth.client_id,
        auth_required_headers = ?config.auth.required_headers.names(),
        "config loaded"
    );
    Ok(config)
}

/// Parse configuration text, expanding macros from the process environment.
pub fn from_yaml_str(text: &str) -> Result<Config, ConfigError> {
    from_yaml_str_with(text, |name| std::env::var(name).ok())
}

/// Parse configuration text, resolving macros through `lookup`.
pub fn from_yaml_str_with<F>(text: &str, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw: RawConfig = if text.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(text)?
    };
    normalize(raw.expand(&lookup))
}

/// Replace `${VAR}` with `lookup(VAR)` (empty when unset) and
/// `${VAR:default}` with `lookup(VAR)` or `default` when unset or empty.
pub fn expand_env<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_macro()
        .replace_all(text, |caps: &Captures<'_>| {
            let value = lookup(&caps[1]).filter(|v| !v.is_empty());
            match (value, caps.get(2)) {
                (Some(v), _) => v,
                (None, Some(default)) => default.as_str().to_string(),
                (None, None) => String::new(),
            }
        })
        .into_owned()
}

impl RawConfig {
    fn expand<F>(self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |value: String| expand_env(&value, lookup);
        let RawConfig { server, auth } = self;
        Self {
            server: RawServer {
                port: expand(server.port),
                read_timeout: expand(server.read_timeout),
                write_timeout: expand(server.write_timeout),
                idle_timeout: expand(server.idle_timeout),
                log_level: expand(server.log_level),
            },
            auth: RawAuth {
                issuer: expand(auth.issuer),
                audience: expand(auth.audience),
                jwks_url: expand(auth.jwks_url),
                introspection_url: expand(auth.introspection_url),
                client_id: expand(auth.client_id),
                client_secret: expand(auth.client_secret),
                required_headers: expand(auth.required_headers),
            },
        }
    }
}

fn normalize(raw: RawConfig) -> Result<Config, ConfigError> {
    let server = ServerConfig {
        port: parse_port(&raw.server.port)?,
        read_timeout: parse_duration("server.read_timeout", &raw.server.read_timeout, DEFAULT_READ_TIMEOUT)?,
        write_timeout: parse_duration("server.write_timeout", &raw.server.write_timeout, DEFAULT_WRITE_TIMEOUT)?,
        idle_timeout: parse_duration("server.idle_timeout", &raw.server.idle_timeout, DEFAULT_IDLE_TIMEOUT)?,
        log_level: LogLevel::parse(&raw.server.log_level),
    };

    let RawAuth {
        issuer,
        audience,
        jwks_url,
        introspection_url,
        client_id,
        client_secret,
        required_headers,
    } = raw.auth;
    validate_url("auth.jwks_url", &jwks_url)?;
    validate_url("auth.introspection_url", &introspection_url)?;

    let auth = AuthConfig {
        issuer: issuer.trim().to_string(),
        audience: audience.trim().to_string(),
        jwks_url: jwks_url.trim().to_string(),
        introspection_url: introspection_url.trim().to_string(),
        client_id: client_id.trim().to_string(),
        client_secret: Zeroizing::new(client_secret),
        required_headers: RequiredHeaderSet::new(split_csv(&required_headers))?,
    };

    Ok(Config { server, auth })
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_PORT);
    }
    raw.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ConfigError::InvalidPort(raw.to_string()))
}

fn parse_duration(field: &'static str, raw: &str, default: Duration) -> Result<Duration, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    let parsed = humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidDuration {
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(if parsed.is_zero() { default } else { parsed })
}

fn validate_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    Url::parse(raw)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            field,
            reason: e.to_string(),
        })
}
