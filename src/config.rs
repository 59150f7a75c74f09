//! Configuration management for the taskman CLI and SDK

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::cli::ConfigCommand;
use crate::error::{Result, TaskmanError};
use crate::ui::UI;

pub const DEFAULT_API_BASE: &str = "http://localhost:8089";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-facing settings persisted as JSON in the config directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub api_base: String,
    pub timeout: u64,
    pub verbose: bool,
    pub storage_dir: PathBuf,
    pub token_storage_enabled: bool,
    #[serde(default = "default_rotates_refresh_token")]
    pub rotates_refresh_token: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            verbose: false,
            storage_dir: default_storage_dir(),
            token_storage_enabled: true,
            rotates_refresh_token: default_rotates_refresh_token(),
        }
    }
}

impl CliConfig {
    pub async fn load() -> Result<Self> {
        Self::load_from(&default_config_path()).await
    }

    /// Load from `config_path`, writing defaults if the file is missing or unreadable
    pub async fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path).await?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {}: {}", config_path.display(), e);
                    let config = Self::default();
                    config.save(config_path).await?;
                    Ok(config)
                }
            }
        } else {
            let config = Self::default();
            config.save(config_path).await?;
            Ok(config)
        }
    }

    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).await?;
        Ok(())
    }

    pub fn to_client_config(&self) -> Result<ClientConfig> {
        let use_proxy =
            !self.api_base.contains("localhost") && !self.api_base.contains("127.0.0.1");

        let token_storage = TokenStorageConfig {
            enabled: self.token_storage_enabled,
            storage_path: self
                .token_storage_enabled
                .then(|| self.storage_dir.join("session.json").to_string_lossy().to_string()),
        };

        ClientConfigBuilder::new()
            .api_base(&self.api_base)
            .timeout(self.timeout)
            .verbose(self.verbose)
            .use_proxy(use_proxy)
            .rotates_refresh_token(self.rotates_refresh_token)
            .token_storage(token_storage)
            .build()
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskman")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskman")
}

/// Token storage configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TokenStorageConfig {
    #[serde(default)]
    pub enabled: bool,
    pub storage_path: Option<String>,
}

impl From<TokenStorageConfig> for crate::store::TokenStoreConfig {
    fn from(config: TokenStorageConfig) -> Self {
        Self {
            enabled: config.enabled,
            storage_path: config.storage_path.map(PathBuf::from),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub verbose: bool,
    /// Whether a refresh token returned by the refresh endpoint replaces the stored one
    #[serde(default = "default_rotates_refresh_token")]
    pub rotates_refresh_token: bool,
    #[serde(default)]
    pub token_storage: TokenStorageConfig,
    #[serde(default = "default_use_proxy")]
    pub use_proxy: bool,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_rotates_refresh_token() -> bool {
    true
}

fn default_use_proxy() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: default_timeout(),
            verbose: false,
            rotates_refresh_token: default_rotates_refresh_token(),
            token_storage: TokenStorageConfig::default(),
            use_proxy: default_use_proxy(),
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_base: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    rotates_refresh_token: Option<bool>,
    token_storage: Option<TokenStorageConfig>,
    config_file: Option<PathBuf>,
    use_proxy: Option<bool>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn rotates_refresh_token(mut self, rotates: bool) -> Self {
        self.rotates_refresh_token = Some(rotates);
        self
    }

    pub fn use_proxy(mut self, use_proxy: bool) -> Self {
        self.use_proxy = Some(use_proxy);
        self
    }

    pub fn token_storage(mut self, token_storage: TokenStorageConfig) -> Self {
        self.token_storage = Some(token_storage);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_file_and_env(self.config_file.as_deref())?;

        if let Some(api_base) = self.api_base {
            config.api_base = api_base;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(rotates) = self.rotates_refresh_token {
            config.rotates_refresh_token = rotates;
        }
        if let Some(token_storage) = self.token_storage {
            config.token_storage = token_storage;
        }
        if let Some(use_proxy) = self.use_proxy {
            config.use_proxy = use_proxy;
        }

        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    pub fn new() -> Result<Self> {
        Self::from_file_and_env::<&str>(None)
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Defaults, then the optional file, then `TASKMAN_*` environment variables
    pub fn from_file_and_env<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        Self::layered(config_file, environment())
    }

    fn layered<P: AsRef<Path>>(config_file: Option<P>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("timeout", DEFAULT_TIMEOUT_SECS)?
            .set_default("verbose", false)?
            .set_default("rotates_refresh_token", true)?
            .set_default("use_proxy", true)?;

        if let Some(config_path) = config_file {
            if config_path.as_ref().exists() {
                builder = builder.add_source(File::from(config_path.as_ref()));
            }
        }
        builder = builder.add_source(env);

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(TaskmanError::invalid_endpoint("API base URL cannot be empty"));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(TaskmanError::invalid_endpoint(format!(
                "API base URL must start with http:// or https://: {}",
                self.api_base
            )));
        }
        if self.timeout == 0 {
            return Err(TaskmanError::config("Timeout must be at least one second"));
        }
        Ok(())
    }

    /// Resolve an API path against the base URL; absolute URLs pass through
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        format!("{}/{}", self.api_base.trim_end_matches('/'), endpoint)
    }
}

/// Implements the `config` subcommands
pub struct ConfigService {
    config: CliConfig,
    config_path: PathBuf,
    ui: UI,
}

impl ConfigService {
    pub fn new(config: CliConfig) -> Self {
        Self::with_config_path(config, default_config_path())
    }

    pub fn with_config_path(config: CliConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
            ui: UI::new(),
        }
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub async fn handle_config(&mut self, command: ConfigCommand) -> Result<()> {
        match command {
            ConfigCommand::Show => {
                self.show();
                return Ok(());
            }
            ConfigCommand::SetApiBase { url } => self.set_api_base(url)?,
            ConfigCommand::SetTimeout { seconds } => self.set_timeout(seconds)?,
            ConfigCommand::SetVerbose { enabled } => self.set_verbose(&enabled)?,
            ConfigCommand::Reset => self.config = CliConfig::default(),
        }
        self.config.save(&self.config_path).await?;
        self.ui.success("Configuration saved");
        Ok(())
    }

    pub fn set_api_base(&mut self, url: String) -> Result<()> {
        let candidate = ClientConfig {
            api_base: url.trim_end_matches('/').to_string(),
            ..ClientConfig::default()
        };
        candidate.validate()?;
        self.config.api_base = candidate.api_base;
        Ok(())
    }

    pub fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(TaskmanError::invalid_input("Timeout must be at least one second"));
        }
        self.config.timeout = seconds;
        Ok(())
    }

    pub fn set_verbose(&mut self, enabled: &str) -> Result<()> {
        self.config.verbose = match enabled.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => true,
            "false" | "off" | "no" | "0" => false,
            other => {
                return Err(TaskmanError::invalid_input(format!(
                    "Expected true/false, got '{}'",
                    other
                )))
            }
        };
        Ok(())
    }

    fn show(&self) {
        self.ui.card(
            "Configuration",
            vec![
                ("Config file", self.config_path.display().to_string()),
                ("API base", self.config.api_base.clone()),
                ("Timeout", format!("{}s", self.config.timeout)),
                ("Verbose", self.config.verbose.to_string()),
                ("Storage", self.config.storage_dir.display().to_string()),
                (
                    "Token storage",
                    if self.config.token_storage_enabled {
                        "enabled".to_string()
                    } else {
                        "disabled".to_string()
                    },
                ),
                (
                    "Refresh rotation",
                    self.config.rotates_refresh_token.to_string(),
                ),
            ],
        );
    }
}

/// `TASKMAN_API_BASE`, `TASKMAN_TIMEOUT`, ...; `__` separates nested keys
fn environment() -> Environment {
    Environment::with_prefix("TASKMAN")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::create_temp_dir;

    #[test]
    fn test_endpoint_url_joins_paths() {
        let config = ClientConfig {
            api_base: "http://localhost:8089/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.endpoint_url("/api/tasks/"),
            "http://localhost:8089/api/tasks/"
        );
        assert_eq!(
            config.endpoint_url("api/tasks/recent/"),
            "http://localhost:8089/api/tasks/recent/"
        );
        assert_eq!(
            config.endpoint_url("https://other.example/api/x/"),
            "https://other.example/api/x/"
        );
    }

    #[test]
    fn test_validate_rejects_bad_base() {
        let mut config = ClientConfig::default();
        assert!(config.validate().is_ok());

        config.api_base = "localhost:8089".to_string();
        assert!(config.validate().is_err());

        config.api_base = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_overrides_file_values() {
        let dir = create_temp_dir();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "api_base = \"https://tasks.example\"\ntimeout = 12\n").unwrap();

        let from_file = ClientConfig::builder().config_file(&path).build().unwrap();
        assert_eq!(from_file.api_base, "https://tasks.example");
        assert_eq!(from_file.timeout, 12);
        assert!(from_file.rotates_refresh_token);

        let overridden = ClientConfig::builder()
            .config_file(&path)
            .timeout(5)
            .rotates_refresh_token(false)
            .build()
            .unwrap();
        assert_eq!(overridden.timeout, 5);
        assert!(!overridden.rotates_refresh_token);
    }

    #[test]
    fn test_environment_uses_single_underscore_prefix() {
        let mut vars = config::Map::new();
        vars.insert("TASKMAN_API_BASE".to_string(), "https://env.example".to_string());
        vars.insert("TASKMAN_TIMEOUT".to_string(), "7".to_string());

        let config = ClientConfig::layered::<&str>(None, environment().source(Some(vars))).unwrap();
        assert_eq!(config.api_base, "https://env.example");
        assert_eq!(config.timeout, 7);
        assert!(config.rotates_refresh_token);
    }

    #[tokio::test]
    async fn test_cli_config_created_with_defaults() {
        let dir = create_temp_dir();
        let path = dir.path().join("nested").join("config.json");

        let config = CliConfig::load_from(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.api_base, DEFAULT_API_BASE);

        std::fs::write(&path, "{ not json").unwrap();
        let recovered = CliConfig::load_from(&path).await.unwrap();
        assert_eq!(recovered.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_cli_config_to_client_config() {
        let dir = create_temp_dir();
        let cli = CliConfig {
            api_base: "http://127.0.0.1:9000".to_string(),
            storage_dir: dir.path().to_path_buf(),
            ..CliConfig::default()
        };
        let client = cli.to_client_config().unwrap();
        assert!(!client.use_proxy);
        assert!(client.token_storage.enabled);
        assert!(client
            .token_storage
            .storage_path
            .unwrap()
            .ends_with("session.json"));
    }

    #[test]
    fn test_config_service_setters() {
        let mut service =
            ConfigService::with_config_path(CliConfig::default(), PathBuf::from("unused.json"));
        service.set_api_base("https://tasks.example/".to_string()).unwrap();
        assert_eq!(service.config().api_base, "https://tasks.example");
        assert!(service.set_api_base("ftp://nope".to_string()).is_err());
        assert!(service.set_timeout(0).is_err());
        service.set_verbose("on").unwrap();
        assert!(service.config().verbose);
        assert!(service.set_verbose("maybe").is_err());
    }
}
