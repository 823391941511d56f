//! Configuration management for microb.
//!
//! Parses `microb.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every section is
//! optional; a missing file yields defaults relative to the working directory.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `cache.root`
//! - `credentials.binaryedge_api_key`
//! - `credentials.google_api_key`
//! - `credentials.google_engine_id`
//!
//! Credentials missing from the file fall back to the `BINARYEDGE_API_KEY`,
//! `GOOGLE_CUSTOM_SEARCH_API` and `GOOGLE_CUSTOM_SEARCH_ENGINE_ID`
//! environment variables.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override cache root directory.
    pub cache_root: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override worker thread count.
    pub threads: Option<usize>,
    /// Override pacing interval in milliseconds.
    pub sleep_ms: Option<u64>,
    /// Override failure rate threshold.
    pub max_failure_rate: Option<f64>,
    /// Override HTTP timeout in seconds.
    pub http_timeout_secs: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "microb.toml";

/// Environment fallbacks for credentials.
const BINARYEDGE_ENV: &str = "BINARYEDGE_API_KEY";
const GOOGLE_API_KEY_ENV: &str = "GOOGLE_CUSTOM_SEARCH_API";
const GOOGLE_ENGINE_ID_ENV: &str = "GOOGLE_CUSTOM_SEARCH_ENGINE_ID";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Upper bound for worker threads.
const MAX_THREADS: usize = 1024;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache configuration (paths are relative strings from TOML).
    cache: CacheConfigRaw,
    /// Line pipeline defaults.
    pub pipeline: PipelineConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// Per-engine overrides keyed by service name (e.g. `crt_sh`).
    pub engines: BTreeMap<String, EngineConfig>,
    /// API credentials.
    pub credentials: CredentialsConfig,

    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    root: Option<String>,
    enabled: Option<bool>,
}

/// Resolved cache configuration with an absolute root.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Directory holding one subdirectory per service.
    pub root: PathBuf,
    /// Whether fetch results are cached.
    pub enabled: bool,
}

/// Line pipeline defaults shared by every engine command.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads.
    pub threads: usize,
    /// Minimum spacing between item starts, in milliseconds.
    pub sleep_ms: u64,
    /// Exit non-zero when the share of failed lines exceeds this (0.0-1.0).
    pub max_failure_rate: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: 10,
            sleep_ms: 10,
            max_failure_rate: None,
        }
    }
}

impl PipelineConfig {
    /// Pacing interval as a [`Duration`].
    pub fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }
}

/// HTTP client configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Global per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Per-engine overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Cache TTL in days; 0 keeps entries forever.
    pub ttl_days: Option<u64>,
    /// Worker threads for this engine.
    pub threads: Option<usize>,
}

/// API credentials.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// `BinaryEdge` API key (`X-Key` header).
    pub binaryedge_api_key: Option<String>,
    /// Google Custom Search API key.
    pub google_api_key: Option<String>,
    /// Google Custom Search engine ID (`cx`).
    pub google_engine_id: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`credentials.google_api_key`").
        field: String,
        /// Error message (e.g., "${`GOOGLE_KEY`} not set").
        message: String,
    },
    /// Required credential is neither configured nor in the environment.
    #[error("missing credential {field} (set it in {CONFIG_FILENAME} or export {env})")]
    MissingCredential {
        /// Config field path.
        field: &'static str,
        /// Environment variable consulted as fallback.
        env: &'static str,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `microb.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated again after overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is out of range.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root) = &settings.cache_root {
            self.cache_resolved.root.clone_from(root);
        }
        if let Some(enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = enabled;
        }
        if let Some(threads) = settings.threads {
            self.pipeline.threads = threads;
            // An explicit flag beats per-engine file overrides
            for engine in self.engines.values_mut() {
                engine.threads = None;
            }
        }
        if let Some(sleep_ms) = settings.sleep_ms {
            self.pipeline.sleep_ms = sleep_ms;
        }
        if let Some(rate) = settings.max_failure_rate {
            self.pipeline.max_failure_rate = Some(rate);
        }
        if let Some(timeout) = settings.http_timeout_secs {
            self.http.timeout_secs = timeout;
        }
    }

    /// Cache TTL for `service`, falling back to the engine's built-in default.
    pub fn ttl_for(&self, service: &str, default: Duration) -> Duration {
        self.engines
            .get(service)
            .and_then(|e| e.ttl_days)
            .map_or(default, |days| {
                Duration::from_secs(days.saturating_mul(SECS_PER_DAY))
            })
    }

    /// Worker threads for `service`: its own setting, then the engine's
    /// built-in limit, then the pipeline setting.
    pub fn threads_for(&self, service: &str, default: Option<usize>) -> usize {
        self.engines
            .get(service)
            .and_then(|e| e.threads)
            .or(default)
            .unwrap_or(self.pipeline.threads)
    }

    /// Cache directory for `service`.
    pub fn service_cache_dir(&self, service: &str) -> PathBuf {
        self.cache_resolved.root.join(service)
    }

    /// `BinaryEdge` API key from config or environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if neither source has it.
    pub fn binaryedge_api_key(&self) -> Result<String, ConfigError> {
        credential(
            self.credentials.binaryedge_api_key.as_deref(),
            "credentials.binaryedge_api_key",
            BINARYEDGE_ENV,
        )
    }

    /// Google Custom Search API key and engine ID from config or environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] for the first missing value.
    pub fn google_credentials(&self) -> Result<(String, String), ConfigError> {
        let key = credential(
            self.credentials.google_api_key.as_deref(),
            "credentials.google_api_key",
            GOOGLE_API_KEY_ENV,
        )?;
        let engine_id = credential(
            self.credentials.google_engine_id.as_deref(),
            "credentials.google_engine_id",
            GOOGLE_ENGINE_ID_ENV,
        )?;
        Ok((key, engine_id))
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            cache: CacheConfigRaw::default(),
            pipeline: PipelineConfig::default(),
            http: HttpConfig::default(),
            engines: BTreeMap::new(),
            credentials: CredentialsConfig::default(),
            cache_resolved: CacheConfig {
                root: base.join("cache"),
                enabled: true,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_pipeline()?;
        self.validate_engines()?;
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate pipeline configuration.
    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        require_threads(self.pipeline.threads, "pipeline.threads")?;

        if let Some(rate) = self.pipeline.max_failure_rate
            && !(0.0..=1.0).contains(&rate)
        {
            return Err(ConfigError::Validation(
                "pipeline.max_failure_rate must be between 0.0 and 1.0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate per-engine overrides.
    fn validate_engines(&self) -> Result<(), ConfigError> {
        for (name, engine) in &self.engines {
            if let Some(threads) = engine.threads {
                require_threads(threads, &format!("engines.{name}.threads"))?;
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref root) = self.cache.root {
            self.cache.root = Some(expand::expand_env(root, "cache.root")?);
        }

        let creds = &mut self.credentials;
        for (value, field) in [
            (&mut creds.binaryedge_api_key, "credentials.binaryedge_api_key"),
            (&mut creds.google_api_key, "credentials.google_api_key"),
            (&mut creds.google_engine_id, "credentials.google_engine_id"),
        ] {
            if let Some(raw) = value.as_deref() {
                *value = Some(expand::expand_env(raw, field)?);
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.cache_resolved = CacheConfig {
            root: config_dir.join(self.cache.root.as_deref().unwrap_or("cache")),
            enabled: self.cache.enabled.unwrap_or(true),
        };
    }
}

/// Require a thread count within `1..=MAX_THREADS`.
fn require_threads(threads: usize, field: &str) -> Result<(), ConfigError> {
    if threads == 0 || threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "{field} must be between 1 and {MAX_THREADS}"
        )));
    }
    Ok(())
}

/// Resolve a credential from config, then environment; empty counts as missing.
fn credential(
    configured: Option<&str>,
    field: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    configured
        .map(str::to_owned)
        .or_else(|| std::env::var(env).ok())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingCredential { field, env })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.cache_resolved.root, PathBuf::from("/test/cache"));
        assert!(config.cache_resolved.enabled);
        assert_eq!(config.pipeline.threads, 10);
        assert_eq!(config.pipeline.sleep(), Duration::from_millis(10));
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert!(config.engines.is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.threads, 10);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[cache]
root = "data/cache"
enabled = false

[pipeline]
threads = 4
sleep_ms = 250
max_failure_rate = 0.5

[http]
timeout_secs = 5

[engines.crt_sh]
ttl_days = 30
threads = 1

[credentials]
binaryedge_api_key = "be-key"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.cache_resolved.root,
            PathBuf::from("/project/data/cache")
        );
        assert!(!config.cache_resolved.enabled);
        assert_eq!(config.pipeline.threads, 4);
        assert_eq!(config.pipeline.max_failure_rate, Some(0.5));
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.engines["crt_sh"].ttl_days, Some(30));
        assert_eq!(config.binaryedge_api_key().unwrap(), "be-key");
    }

    #[test]
    fn test_unknown_engine_field_rejected() {
        let toml = r"
[engines.crt_sh]
ttl = 30
";
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_ttl_for_uses_override_or_default() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.engines.insert(
            "crt_sh".to_owned(),
            EngineConfig {
                ttl_days: Some(2),
                threads: None,
            },
        );
        config.engines.insert(
            "web_archive".to_owned(),
            EngineConfig {
                ttl_days: Some(0),
                threads: None,
            },
        );

        let default = Duration::from_secs(99);
        assert_eq!(
            config.ttl_for("crt_sh", default),
            Duration::from_secs(2 * 86_400)
        );
        assert_eq!(config.ttl_for("web_archive", default), Duration::ZERO);
        assert_eq!(config.ttl_for("certspotter", default), default);
    }

    #[test]
    fn test_threads_for_prefers_engine_override() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.engines.insert(
            "commoncrawl".to_owned(),
            EngineConfig {
                ttl_days: None,
                threads: Some(1),
            },
        );
        assert_eq!(config.threads_for("commoncrawl", Some(4)), 1);
        assert_eq!(config.threads_for("crt_sh", None), 10);
        assert_eq!(config.threads_for("alienvault_passivedns", Some(1)), 1);
    }

    #[test]
    fn test_ttl_for_saturates_huge_days() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.engines.insert(
            "crt_sh".to_owned(),
            EngineConfig {
                ttl_days: Some(u64::MAX),
                threads: None,
            },
        );
        assert_eq!(
            config.ttl_for("crt_sh", Duration::ZERO),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_service_cache_dir() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(
            config.service_cache_dir("crt_sh"),
            PathBuf::from("/test/cache/crt_sh")
        );
    }

    #[test]
    fn test_apply_cli_settings_threads_beat_engine_override() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.engines.insert(
            "crt_sh".to_owned(),
            EngineConfig {
                ttl_days: Some(1),
                threads: Some(1),
            },
        );

        config.apply_cli_settings(&CliSettings {
            threads: Some(32),
            ..Default::default()
        });

        assert_eq!(config.threads_for("crt_sh", None), 32);
        assert_eq!(config.engines["crt_sh"].ttl_days, Some(1)); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_multiple() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings {
            cache_root: Some(PathBuf::from("/tmp/c")),
            cache_enabled: Some(false),
            sleep_ms: Some(0),
            max_failure_rate: Some(0.25),
            http_timeout_secs: Some(7),
            ..Default::default()
        });

        assert_eq!(config.cache_resolved.root, PathBuf::from("/tmp/c"));
        assert!(!config.cache_resolved.enabled);
        assert_eq!(config.pipeline.sleep_ms, 0);
        assert_eq!(config.pipeline.max_failure_rate, Some(0.25));
        assert_eq!(config.http.timeout_secs, 7);
        assert_eq!(config.pipeline.threads, 10); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let before = Config::default_with_base(Path::new("/test"));
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.cache_resolved.root, before.cache_resolved.root);
        assert_eq!(config.pipeline.threads, before.pipeline.threads);
        assert_eq!(config.pipeline.sleep_ms, before.pipeline.sleep_ms);
    }

    #[test]
    fn test_expand_env_vars_credentials() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TEST_MICROB_GOOGLE_KEY", "g-key");
        }

        let toml = r#"
[credentials]
google_api_key = "${TEST_MICROB_GOOGLE_KEY}"
google_engine_id = "${TEST_MICROB_GOOGLE_CX:-default-cx}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(
            config.google_credentials().unwrap(),
            ("g-key".to_owned(), "default-cx".to_owned())
        );

        unsafe {
            std::env::remove_var("TEST_MICROB_GOOGLE_KEY");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MISSING_VAR_MICROB_TEST");
        }

        let toml = r#"
[cache]
root = "${MISSING_VAR_MICROB_TEST}/cache"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MISSING_VAR_MICROB_TEST"));
        assert!(err.to_string().contains("cache.root"));
    }

    #[test]
    fn test_credential_falls_back_to_env() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TEST_MICROB_FALLBACK", "from-env");
        }
        assert_eq!(
            credential(None, "credentials.x", "TEST_MICROB_FALLBACK").unwrap(),
            "from-env"
        );
        assert_eq!(
            credential(Some("from-file"), "credentials.x", "TEST_MICROB_FALLBACK").unwrap(),
            "from-file"
        );
        unsafe {
            std::env::remove_var("TEST_MICROB_FALLBACK");
        }
    }

    #[test]
    fn test_credential_missing() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("TEST_MICROB_NOWHERE");
        }
        let err = credential(Some(""), "credentials.x", "TEST_MICROB_NOWHERE").unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("TEST_MICROB_NOWHERE"));
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[cache]\nroot = \"store\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.cache_resolved.root, tmp.path().join("store"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/microb.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    // Validation tests

    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_threads() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.pipeline.threads = 0;
        assert_validation_error(&config, &["pipeline.threads"]);
    }

    #[test]
    fn test_validate_engine_threads() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.engines.insert(
            "crt_sh".to_owned(),
            EngineConfig {
                ttl_days: None,
                threads: Some(5000),
            },
        );
        assert_validation_error(&config, &["engines.crt_sh.threads", "1024"]);
    }

    #[test]
    fn test_validate_failure_rate_range() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.pipeline.max_failure_rate = Some(1.5);
        assert_validation_error(&config, &["max_failure_rate"]);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.http.timeout_secs = 0;
        assert_validation_error(&config, &["timeout_secs"]);
    }

    #[test]
    fn test_cli_override_is_validated() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let err = Config::load(
            Some(&path),
            Some(&CliSettings {
                threads: Some(0),
                ..Default::default()
            }),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
