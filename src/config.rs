use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub auth_port: u16,
    pub enhance_port: u16,
    pub weights_dir: PathBuf,
    pub default_model: String,
    pub device_override: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:users.db?mode=rwc".into());
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development default");
            "your-secret-key-change-this-in-production".into()
        });
        let jwt = JwtConfig {
            secret,
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        let auth_port = std::env::var("AUTH_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5001);
        let enhance_port = std::env::var("ENHANCE_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let weights_dir = std::env::var("WEIGHTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("weights"));
        let default_model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "realesr-general-x4v3".into());
        let device_override = std::env::var("ENHANCE_DEVICE").ok();

        Ok(Self {
            database_url,
            jwt,
            auth_port,
            enhance_port,
            weights_dir,
            default_model,
            device_override,
        })
    }

    /// Config used by unit tests; never touches the environment.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_hours: 24,
            },
            auth_port: 0,
            enhance_port: 0,
            weights_dir: PathBuf::from("weights"),
            default_model: "realesr-general-x4v3".into(),
            device_override: Some("cpu".into()),
        }
    }
}
