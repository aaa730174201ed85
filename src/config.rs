use dotenvy::dotenv;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} missing, it is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Postgres connection string. When unset the server keeps todos in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv().is_ok();

        let port = env::var("PORT")
            .map_err(|_| ConfigError::Missing("PORT"))?
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: "must be a valid u16 number".to_string(),
            })?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let token_ttl_hours = match env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => parse_ttl(&raw)?,
            Err(_) => 24,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database_url: non_empty(env::var("DATABASE_URL").ok()),
            jwt_secret,
            token_ttl_hours,
            cors_origin: non_empty(env::var("CORS_ORIGIN").ok()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_ttl(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => Ok(hours),
        _ => Err(ConfigError::Invalid {
            name: "TOKEN_TTL_HOURS",
            reason: format!("expected a positive number of hours, got {raw:?}"),
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Where the dashboard finds the API and keeps its session between runs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_file: std::path::PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let _ = dotenv().is_ok();

        Self {
            api_url: non_empty(env::var("TODO_API_URL").ok())
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
            session_file: non_empty(env::var("TODO_SESSION_FILE").ok())
                .unwrap_or_else(|| ".todo-session.json".to_string())
                .into(),
        }
    }
}
