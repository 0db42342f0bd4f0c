use anyhow::{Context, Result, bail};
use importer::writer::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENCY};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub api_keys: String,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub chunk_size: usize,
    pub max_concurrency: usize,
    pub max_upload_bytes: usize,
}

/// Where imported rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Postgres { database_url: String },
    Postgrest { url: String, key: String },
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |name: &str, default: usize| -> Result<usize> {
            match var(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .with_context(|| format!("{name} must be a number")),
                None => Ok(default),
            }
        };

        Ok(Self {
            host: var("HOST").context("Cannot load HOST env variable")?,
            port: var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: var("DATABASE_URL").filter(|v| !v.is_empty()),
            api_keys: var("API_KEYS").unwrap_or_default(),
            supabase_url: var("SUPABASE_URL").filter(|v| !v.is_empty()),
            supabase_key: var("SUPABASE_KEY").filter(|v| !v.is_empty()),
            chunk_size: number("IMPORT_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            max_concurrency: number("IMPORT_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?,
            max_upload_bytes: number("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// Supabase REST wins when both of its variables are set.
    pub fn backend(&self) -> Result<BackendConfig> {
        match (&self.supabase_url, &self.supabase_key, &self.database_url) {
            (Some(url), Some(key), _) => Ok(BackendConfig::Postgrest {
                url: url.clone(),
                key: key.clone(),
            }),
            (Some(_), None, _) => bail!("SUPABASE_URL is set but SUPABASE_KEY is missing"),
            (None, _, Some(database_url)) => Ok(BackendConfig::Postgres {
                database_url: database_url.clone(),
            }),
            (None, _, None) => bail!("Set DATABASE_URL or SUPABASE_URL/SUPABASE_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/swim"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(
            config.backend().unwrap(),
            BackendConfig::Postgres {
                database_url: "postgres://localhost/swim".to_string()
            }
        );
    }

    #[test]
    fn test_supabase_backend() {
        let config = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_KEY", "service-key"),
            ("IMPORT_CHUNK_SIZE", "50"),
        ])
        .unwrap();

        assert_eq!(config.chunk_size, 50);
        assert!(matches!(
            config.backend().unwrap(),
            BackendConfig::Postgrest { .. }
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("HOST", "0.0.0.0"), ("PORT", "http")]).is_err());
        assert!(
            config(&[("HOST", "0.0.0.0"), ("PORT", "8080"), ("IMPORT_CHUNK_SIZE", "many")])
                .is_err()
        );

        let no_backend = config(&[("HOST", "0.0.0.0"), ("PORT", "8080")]).unwrap();
        assert!(no_backend.backend().is_err());
    }
}
