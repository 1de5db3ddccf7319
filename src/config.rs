use std::fmt;

use anyhow::{bail, Context};

const MAX_ACCESS_TTL_MINUTES: i64 = 60 * 24 * 365;
const MAX_RESET_TTL_HOURS: i64 = 24 * 30;

/// Token settings. The signing algorithm is fixed to HS256 and is not configurable.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub reset_ttl_hours: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("reset_ttl_hours", &self.reset_ttl_hours)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from_email: String,
    pub from_name: String,
}

#[derive(Clone)]
pub struct SuperuserSeed {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SuperuserSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserSeed")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub project_name: String,
    pub server_host: String,
    pub jwt: JwtConfig,
    pub emails: EmailConfig,
    pub first_superuser: Option<SuperuserSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let project_name = std::env::var("PROJECT_NAME").unwrap_or_else(|_| "itemvault".into());
        let server_host =
            std::env::var("SERVER_HOST").unwrap_or_else(|_| "http://localhost:8080".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            access_ttl_minutes: parse_ttl(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES").ok(),
                60 * 24 * 8,
                MAX_ACCESS_TTL_MINUTES,
            )?,
            reset_ttl_hours: parse_ttl(
                "EMAIL_RESET_TOKEN_EXPIRE_HOURS",
                std::env::var("EMAIL_RESET_TOKEN_EXPIRE_HOURS").ok(),
                48,
                MAX_RESET_TTL_HOURS,
            )?,
        };
        let emails = EmailConfig {
            from_email: std::env::var("EMAILS_FROM_EMAIL")
                .unwrap_or_else(|_| format!("noreply@{}.local", project_name)),
            from_name: std::env::var("EMAILS_FROM_NAME").unwrap_or_else(|_| project_name.clone()),
        };
        let first_superuser = match (
            std::env::var("FIRST_SUPERUSER"),
            std::env::var("FIRST_SUPERUSER_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(SuperuserSeed { email, password }),
            _ => None,
        };
        Ok(Self {
            database_url,
            project_name,
            server_host,
            jwt,
            emails,
            first_superuser,
        })
    }
}

/// A token lifetime setting: `default` when unset, otherwise an integer in `1..=max`.
fn parse_ttl(key: &str, raw: Option<String>, default: i64, max: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{} must be an integer, got '{}'", key, raw))?;
    if !(1..=max).contains(&value) {
        bail!("{} must be between 1 and {}, got {}", key, max, value);
    }
    Ok(value)
}
