use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Which backend holds user rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match var("USER_STORE").as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => anyhow::bail!("unknown USER_STORE {other:?}"),
        };
        let database_url = var("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when USER_STORE=postgres");
        }

        let ttl_minutes = match var("JWT_TTL_MINUTES") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("invalid JWT_TTL_MINUTES {v:?}"))?,
            None => 60,
        };
        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "authgate".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "authgate-users".into()),
            ttl_minutes,
        };

        let port = match var("APP_PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid APP_PORT {p:?}"))?,
            None => 8080,
        };

        Ok(Self {
            store,
            database_url,
            jwt,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }
}

/// Settings for the command-line client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub token_file: PathBuf,
}

impl ClientConfig {
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = var("AUTH_API_URL").unwrap_or_else(|| "http://localhost:8080".into());
        let token_file = match var("AUTH_TOKEN_FILE") {
            Some(path) => PathBuf::from(path),
            None => dirs::data_local_dir()
                .context("no local data directory on this platform; set AUTH_TOKEN_FILE")?
                .join("authgate")
                .join("session.json"),
        };
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token_file,
        })
    }
}
