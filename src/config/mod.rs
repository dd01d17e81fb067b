use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SHEET_NAME: &str = "contracts";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub cache_ttl: Duration,
    pub storage: StorageConfig,
}

/// Where contract rows live.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Sheets(SheetsConfig),
    Memory,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub credentials: CredentialsSource,
}

/// Service account key, either inline JSON or a path to the key file.
#[derive(Clone)]
pub enum CredentialsSource {
    Inline(String),
    File(PathBuf),
}

impl std::fmt::Debug for CredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsSource::Inline(_) => f.write_str("Inline(<redacted>)"),
            CredentialsSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl CredentialsSource {
    pub fn load(&self) -> Result<String, ConfigError> {
        match self {
            CredentialsSource::Inline(json) => Ok(json.clone()),
            CredentialsSource::File(path) => std::fs::read_to_string(path)
                .map_err(|e| ConfigError::CredentialsFile(path.display().to_string(), e)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let cache_ttl_secs = match lookup("CACHE_TTL_SECS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidCacheTtl(raw))?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "sheets".to_string());
        let storage = match backend.to_ascii_lowercase().as_str() {
            "memory" => StorageConfig::Memory,
            "sheets" => StorageConfig::Sheets(sheets_from_lookup(&lookup)?),
            _ => return Err(ConfigError::UnknownBackend(backend)),
        };

        Ok(Self {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            storage,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn sheets_from_lookup<F>(lookup: &F) -> Result<SheetsConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let spreadsheet_id = lookup("GOOGLE_SHEETS_ID")
        .or_else(|| lookup("VITE_GOOGLE_SHEETS_ID"))
        .filter(|id| !id.trim().is_empty())
        .ok_or(ConfigError::MissingVar("GOOGLE_SHEETS_ID"))?;

    let credentials = match (
        lookup("GOOGLE_SERVICE_ACCOUNT_KEY_FILE"),
        lookup("GOOGLE_SERVICE_ACCOUNT_KEY"),
    ) {
        (Some(path), _) => CredentialsSource::File(PathBuf::from(path)),
        (None, Some(json)) => CredentialsSource::Inline(json),
        (None, None) => return Err(ConfigError::MissingVar("GOOGLE_SERVICE_ACCOUNT_KEY")),
    };

    Ok(SheetsConfig {
        spreadsheet_id,
        sheet_name: lookup("SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
        credentials,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid cache TTL: {0}")]
    InvalidCacheTtl(String),
    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("Failed to read credentials file {0}: {1}")]
    CredentialsFile(String, #[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn memory_backend_uses_defaults() {
        let config = Config::from_lookup(lookup_from(&[("STORAGE_BACKEND", "memory")])).unwrap();

        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(matches!(config.storage, StorageConfig::Memory));
    }

    #[test]
    fn sheets_backend_requires_spreadsheet_id() {
        let err = Config::from_lookup(lookup_from(&[("GOOGLE_SERVICE_ACCOUNT_KEY", "{}")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::MissingVar("GOOGLE_SHEETS_ID")));
    }

    #[test]
    fn sheets_backend_accepts_legacy_id_variable() {
        let config = Config::from_lookup(lookup_from(&[
            ("VITE_GOOGLE_SHEETS_ID", "doc-123"),
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "{}"),
            ("SHEET_NAME", "archive"),
        ]))
        .unwrap();

        match config.storage {
            StorageConfig::Sheets(sheets) => {
                assert_eq!(sheets.spreadsheet_id, "doc-123");
                assert_eq!(sheets.sheet_name, "archive");
                assert!(matches!(sheets.credentials, CredentialsSource::Inline(_)));
            }
            StorageConfig::Memory => panic!("expected sheets backend"),
        }
    }

    #[test]
    fn rejects_bad_port_and_ttl() {
        let port = Config::from_lookup(lookup_from(&[("STORAGE_BACKEND", "memory"), ("PORT", "http")]));
        assert!(matches!(port, Err(ConfigError::InvalidPort)));

        let ttl = Config::from_lookup(lookup_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("CACHE_TTL_SECS", "-1"),
        ]));
        assert!(matches!(ttl, Err(ConfigError::InvalidCacheTtl(_))));
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = Config::from_lookup(lookup_from(&[("STORAGE_BACKEND", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "postgres"));
    }
}
