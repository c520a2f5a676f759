use screentask_core::TaskError;
use screentask_storage::SupabaseStorageConfig;

/// Screentask runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// SQLite output cache path
    pub db_path: String,
    /// Directory for rolling log files; stdout JSON when unset
    pub log_dir: Option<String>,
    /// Log level
    pub log_level: String,

    // Storage and auth backend
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub bucket: String,
    pub list_limit: u32,

    // Vision model
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Max screenshots analyzed at once; 0 is unbounded
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            db_path: "screentask.db".to_string(),
            log_dir: None,
            log_level: "info".to_string(),
            supabase_url: None,
            supabase_service_key: None,
            bucket: "screenshots".to_string(),
            list_limit: 100,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 1000,
            concurrency: 0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            bind_address: var("SCREENTASK_BIND").unwrap_or(defaults.bind_address),
            port: var("SCREENTASK_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            db_path: var("SCREENTASK_DB").unwrap_or(defaults.db_path),
            log_dir: var("SCREENTASK_LOG_DIR"),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            supabase_url: var("SUPABASE_URL"),
            supabase_service_key: var("SUPABASE_SERVICE_KEY"),
            bucket: var("SCREENTASK_BUCKET").unwrap_or(defaults.bucket),
            list_limit: var("SCREENTASK_LIST_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.list_limit),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            model: var("SCREENTASK_MODEL").unwrap_or(defaults.model),
            max_tokens: var("SCREENTASK_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            concurrency: var("SCREENTASK_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency),
        }
    }

    pub fn storage_config(&self) -> Result<SupabaseStorageConfig, TaskError> {
        let url = self
            .supabase_url
            .clone()
            .ok_or_else(|| TaskError::Config("SUPABASE_URL is not set".to_string()))?;
        let key = self
            .supabase_service_key
            .clone()
            .ok_or_else(|| TaskError::Config("SUPABASE_SERVICE_KEY is not set".to_string()))?;
        Ok(SupabaseStorageConfig::new(url, key)
            .bucket(self.bucket.clone())
            .list_limit(self.list_limit))
    }

    pub fn openai_api_key(&self) -> Result<&str, TaskError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| TaskError::Config("OPENAI_API_KEY is not set".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.concurrency, 0);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SCREENTASK_PORT", "9000"),
            ("SCREENTASK_CONCURRENCY", "4"),
            ("SCREENTASK_MODEL", "gpt-4o-mini"),
            ("SCREENTASK_BUCKET", "shots"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "service"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.model, "gpt-4o-mini");

        let storage = config.storage_config().unwrap();
        assert_eq!(storage.bucket, "shots");
        assert_eq!(storage.url, "https://proj.supabase.co");
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[("SCREENTASK_PORT", "eighty"), ("SCREENTASK_MAX_TOKENS", "")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_missing_credentials_are_config_errors() {
        let config = config_from(&[]);
        assert!(matches!(config.storage_config(), Err(TaskError::Config(_))));
        assert!(matches!(config.openai_api_key(), Err(TaskError::Config(_))));
    }
}
