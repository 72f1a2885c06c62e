use std::time::Duration;

use crate::{storage::DATABASE, AppError, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

/// Configuración del proceso, leída del entorno
#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: Option<String>,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    /// Límite para elegir servidor y conectar con MongoDB, siempre menor que `request_timeout`
    pub store_timeout: Duration,
}
impl Config {
    /// Lee el entorno, cargando antes `.env` si existe
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Variables cargadas de {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = parse_var("PORT", var("PORT"), DEFAULT_PORT)?;
        let timeout = parse_var(
            "REQUEST_TIMEOUT_SECS",
            var("REQUEST_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let store_timeout = parse_var(
            "STORE_TIMEOUT_SECS",
            var("STORE_TIMEOUT_SECS"),
            DEFAULT_STORE_TIMEOUT_SECS,
        )?;
        if store_timeout == 0 || store_timeout >= timeout {
            return Err(AppError::ConfigError(format!(
                "STORE_TIMEOUT_SECS ({store_timeout}) debe ser mayor que 0 y menor que REQUEST_TIMEOUT_SECS ({timeout})"
            )));
        }
        Ok(Self {
            mongodb_uri: var("MONGODB_URI"),
            mongodb_db: var("MONGODB_DB").unwrap_or_else(|| DATABASE.to_string()),
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            request_timeout: Duration::from_secs(timeout),
            store_timeout: Duration::from_secs(store_timeout),
        })
    }
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("{key} '{v}' no es válido: {e}"))),
        None => Ok(default),
    }
}
