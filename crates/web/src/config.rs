use anyhow::{Context, Result};

const DEFAULT_CHECKOUT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub checkout_base_url: String,
    /// Empty means any origin
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("Cannot load {key} env variable"))
        };

        Ok(Self {
            host: required("HOST")?,
            port: required("PORT")?
                .parse()
                .context("PORT must be a number")?,
            database_url: required("DATABASE_URL")?,
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .map(|v| v.parse())
                .transpose()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            jwt_secret: required("JWT_SECRET")?,
            checkout_base_url: lookup("CHECKOUT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CHECKOUT_BASE_URL.to_string()),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}
