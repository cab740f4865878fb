use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    pub verify_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub smtp: Option<SmtpConfig>,
    pub cookie_secure: bool,
    pub cors_origin: String,
    pub store_timeout_secs: u64,
    pub mail_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env_trimmed("DATABASE_URL");

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_days: env_parse("JWT_TTL_DAYS", 7),
        };

        let otp = OtpConfig {
            verify_ttl_hours: env_parse("OTP_VERIFY_TTL_HOURS", 24),
            reset_ttl_minutes: env_parse("OTP_RESET_TTL_MINUTES", 10),
        };

        // SMTP is optional; without credentials the service runs in a
        // log-only delivery mode.
        let smtp = match (env_trimmed("SMTP_USER"), env_trimmed("SMTP_PASS")) {
            (Some(user), Some(pass)) => Some(SmtpConfig {
                host: env_trimmed("SMTP_HOST").unwrap_or_else(|| "smtp-relay.brevo.com".into()),
                sender: env_trimmed("SENDER_EMAIL").unwrap_or_else(|| user.clone()),
                user,
                pass,
            }),
            _ => None,
        };

        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Ok(Self {
            database_url,
            jwt,
            otp,
            smtp,
            cookie_secure: production,
            cors_origin: env_trimmed("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            store_timeout_secs: env_parse("STORE_TIMEOUT_SECS", 5),
            mail_timeout_secs: env_parse("MAIL_TIMEOUT_SECS", 10),
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Trimmed env lookup; whitespace-only values count as unset.
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
