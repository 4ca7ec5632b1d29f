//! Process configuration, read once at start-up and carried in `AppState`.
//!
//! ```bash
//! DATABASE_URL=sqlite://parkslab.db
//! SECRET_KEY=change-me
//! ACTIVATION_TIMEOUT_SECONDS=10800
//! SITE_PROTOCOL=https
//! SITE_DOMAIN=parkslab.example
//! MAIL_BACKEND=smtp
//! SMTP_HOST=smtp.example.com
//! ```

use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ACTIVATION_TIMEOUT_SECONDS: u64 = 60 * 60 * 3;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub secret_key: String,
    pub activation_timeout: Duration,
    pub session_ttl: chrono::Duration,
    pub site: SiteConfig,
    pub login_redirect_url: String,
    pub mail: MailConfig,
}

/// Where activation links point to.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub protocol: String,
    pub domain: String,
}

impl SiteConfig {
    pub fn activation_url(&self, token: &str) -> String {
        format!(
            "{}://{}/api/auth/activate/{}",
            self.protocol, self.domain, token
        )
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub backend: MailBackend,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MailBackend {
    /// Log outgoing mail instead of delivering it.
    Console,
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid mail backend: {0}. Expected 'console' or 'smtp'")]
    InvalidMailBackend(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnvVar("DATABASE_URL"))?;
        let secret_key = lookup("SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnvVar("SECRET_KEY"))?;

        let activation_timeout = Duration::from_secs(parse_or(
            &lookup,
            "ACTIVATION_TIMEOUT_SECONDS",
            DEFAULT_ACTIVATION_TIMEOUT_SECONDS,
        )?);
        let session_hours = parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        let session_ttl = chrono::Duration::try_hours(session_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "SESSION_TTL_HOURS",
                value: session_hours.to_string(),
            })?;

        let site = SiteConfig {
            protocol: lookup("SITE_PROTOCOL").unwrap_or_else(|| "http".to_string()),
            domain: lookup("SITE_DOMAIN").unwrap_or_else(|| "localhost:3000".to_string()),
        };

        let backend = match lookup("MAIL_BACKEND")
            .unwrap_or_else(|| "console".to_string())
            .to_lowercase()
            .as_str()
        {
            "console" => MailBackend::Console,
            "smtp" => MailBackend::Smtp {
                host: lookup("SMTP_HOST").ok_or(ConfigError::MissingEnvVar("SMTP_HOST"))?,
                port: parse_or(&lookup, "SMTP_PORT", 587)?,
                username: lookup("SMTP_USERNAME"),
                password: lookup("SMTP_PASSWORD"),
                use_tls: lookup("SMTP_USE_TLS")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(true),
            },
            other => return Err(ConfigError::InvalidMailBackend(other.to_string())),
        };

        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            secret_key,
            activation_timeout,
            session_ttl,
            site,
            login_redirect_url: lookup("LOGIN_REDIRECT_URL")
                .unwrap_or_else(|| "/projects/search".to_string()),
            mail: MailConfig {
                from_address: lookup("MAIL_FROM")
                    .unwrap_or_else(|| "webmaster@localhost".to_string()),
                backend,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}
