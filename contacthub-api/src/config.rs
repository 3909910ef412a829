/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file
/// honored for development.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `ACCESS_TOKEN_TTL_MINUTES`: Access token lifetime (default: 15)
/// - `REFRESH_TOKEN_TTL_DAYS`: Refresh token lifetime (default: 7)
/// - `CONFIRMATION_CODE_TTL_MINUTES`: Confirmation code lifetime (default: 10)
/// - `SMTP_HOST`: SMTP relay; when unset, mail is only logged
/// - `SMTP_PORT`: SMTP port (default: 587)
/// - `SMTP_USERNAME` / `SMTP_PASSWORD`: SMTP credentials
/// - `MAIL_FROM`: Sender address (default: Contact Hub <no-reply@localhost>)
///
/// # Example
///
/// ```no_run
/// use contacthub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use contacthub_shared::auth::{
    confirmation::DEFAULT_CODE_TTL_MINUTES, jwt::DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
    refresh::DEFAULT_REFRESH_TOKEN_TTL_DAYS,
};
use contacthub_shared::mail::smtp::SmtpSettings;
use std::env;
use std::str::FromStr;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Upper bound for `ACCESS_TOKEN_TTL_MINUTES` (one day)
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;

/// Upper bound for `REFRESH_TOKEN_TTL_DAYS`
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;

/// Upper bound for `CONFIRMATION_CODE_TTL_MINUTES` (one day)
pub const MAX_CONFIRMATION_CODE_TTL_MINUTES: i64 = 24 * 60;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub confirmation: ConfirmationConfig,
    pub mail: MailConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Adds HSTS to responses
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_token_ttl_minutes: i64,

    pub refresh_token_ttl_days: i64,
}

/// Confirmation code configuration
#[derive(Debug, Clone)]
pub struct ConfirmationConfig {
    pub code_ttl_minutes: i64,
}

/// Outgoing mail configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP relay host; None logs mail instead of sending it
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from: String,
}

impl MailConfig {
    /// SMTP settings, if a relay is configured
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        self.smtp_host.as_ref().map(|host| SmtpSettings {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self.from.clone(),
        })
    }
}

impl Config {
    /// Configuration with every optional setting at its default
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.into(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
                refresh_token_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            },
            confirmation: ConfirmationConfig {
                code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                from: "Contact Hub <no-reply@localhost>".to_string(),
            },
        }
    }

    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - A numeric or boolean variable doesn't parse
    /// - A TTL is outside its allowed range
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let mut config = Self::new(database_url, jwt_secret);

        if let Some(host) = var("API_HOST") {
            config.api.host = host;
        }
        parse_into(&var, "API_PORT", &mut config.api.port)?;
        parse_into(&var, "PRODUCTION", &mut config.api.production)?;
        if let Some(origins) = var("CORS_ORIGINS") {
            config.api.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        parse_into(&var, "DATABASE_MAX_CONNECTIONS", &mut config.database.max_connections)?;
        parse_into(&var, "ACCESS_TOKEN_TTL_MINUTES", &mut config.jwt.access_token_ttl_minutes)?;
        parse_into(&var, "REFRESH_TOKEN_TTL_DAYS", &mut config.jwt.refresh_token_ttl_days)?;
        parse_into(
            &var,
            "CONFIRMATION_CODE_TTL_MINUTES",
            &mut config.confirmation.code_ttl_minutes,
        )?;

        for (key, ttl, max) in [
            (
                "ACCESS_TOKEN_TTL_MINUTES",
                config.jwt.access_token_ttl_minutes,
                MAX_ACCESS_TOKEN_TTL_MINUTES,
            ),
            (
                "REFRESH_TOKEN_TTL_DAYS",
                config.jwt.refresh_token_ttl_days,
                MAX_REFRESH_TOKEN_TTL_DAYS,
            ),
            (
                "CONFIRMATION_CODE_TTL_MINUTES",
                config.confirmation.code_ttl_minutes,
                MAX_CONFIRMATION_CODE_TTL_MINUTES,
            ),
        ] {
            if !(1..=max).contains(&ttl) {
                anyhow::bail!("{} must be between 1 and {}", key, max);
            }
        }

        config.mail.smtp_host = var("SMTP_HOST");
        parse_into(&var, "SMTP_PORT", &mut config.mail.smtp_port)?;
        config.mail.smtp_username = var("SMTP_USERNAME");
        config.mail.smtp_password = var("SMTP_PASSWORD");
        if let Some(from) = var("MAIL_FROM") {
            config.mail.from = from;
        }

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_into<T, F>(var: &F, key: &str, target: &mut T) -> anyhow::Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = var(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw))?;
    }
    Ok(())
}
