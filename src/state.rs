use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::auth::otp::OtpEngine;
use crate::auth::token::SessionKeys;
use crate::config::AppConfig;
use crate::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::store::{MemoryStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub keys: SessionKeys,
    pub otp: OtpEngine,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Self::with_config(config).await
    }

    pub async fn with_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let store_timeout = Duration::from_secs(config.store_timeout_secs);
        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => Arc::new(PgUserStore::connect(url, store_timeout).await?),
            None => {
                warn!("DATABASE_URL not set; using the in-memory user store");
                Arc::new(MemoryStore::new())
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => {
                warn!("SMTP credentials not set; emails will be logged, not sent");
                Arc::new(LogMailer)
            }
        };

        let keys = SessionKeys::new(&config.jwt.secret, time::Duration::days(config.jwt.ttl_days));
        let otp = OtpEngine::new(
            time::Duration::hours(config.otp.verify_ttl_hours),
            time::Duration::minutes(config.otp.reset_ttl_minutes),
        );

        Ok(Self {
            store,
            mailer,
            keys,
            otp,
            config,
        })
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.config.mail_timeout_secs)
    }

    /// In-memory state for tests: map-backed store, log-only mailer.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                ttl_days: 7,
            },
            otp: crate::config::OtpConfig {
                verify_ttl_hours: 24,
                reset_ttl_minutes: 10,
            },
            smtp: None,
            cookie_secure: false,
            cors_origin: "http://localhost:3000".into(),
            store_timeout_secs: 5,
            mail_timeout_secs: 5,
        });
        Self {
            store: Arc::new(MemoryStore::new()),
            mailer: Arc::new(LogMailer),
            keys: SessionKeys::new("test-secret", time::Duration::days(7)),
            otp: OtpEngine::new(time::Duration::hours(24), time::Duration::minutes(10)),
            config,
        }
    }
}
