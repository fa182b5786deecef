use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

const APP_DIR: &str = "license-admin";
pub const CONFIG_FILE: &str = "config.toml";

/// Points at a config file outside the search paths.
pub const ENV_CONFIG_PATH: &str = "LICENSE_ADMIN_CONFIG";

/// Overrides `registry.base_url` when set.
pub const ENV_REGISTRY_URL: &str = "LICENSE_ADMIN_URL";

/// Takes precedence over the stored credential when set and non-empty.
pub const ENV_API_KEY: &str = "LICENSE_ADMIN_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub registry: RegistryConfig,

    pub credential: CredentialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,

    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            user_agent: format!("license-admin/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// File holding the API key. Defaults to `<config dir>/license-admin/credential`.
    pub path: Option<String>,
}

impl CredentialConfig {
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map_or_else(|| PathBuf::from(".license-admin"), |dir| dir.join(APP_DIR))
            .join("credential")
    }
}

impl Config {
    /// Resolves the config file to use.
    ///
    /// An explicit path (`--config`) must exist. Otherwise `LICENSE_ADMIN_CONFIG`
    /// is consulted, then the search paths; no file at all means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Self::load_from_path(path);
        }

        let from_env = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        match Self::locate(from_env) {
            Some(path) => Self::load_from_path(&path),
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn locate(from_env: Option<PathBuf>) -> Option<PathBuf> {
        from_env
            .into_iter()
            .chain(std::iter::once(PathBuf::from(CONFIG_FILE)))
            .chain(dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE)))
            .find(|p| p.is_file())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Writes a commented default config to `path` unless one is already there.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let body = toml::to_string_pretty(&Self::default())?;
        let credential_hint = CredentialConfig::default().resolved_path();
        let content = format!(
            "# license-admin configuration\n\
             # {ENV_REGISTRY_URL} overrides registry.base_url.\n\
             # The API key is not stored here; it lives in {} (or {ENV_API_KEY}).\n\n{body}",
            credential_hint.display()
        );

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!("Created default config file: {}", path.display());
        Ok(true)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(ENV_REGISTRY_URL).ok());
    }

    fn apply_overrides(&mut self, registry_url: Option<String>) {
        if let Some(url) = registry_url.filter(|u| !u.trim().is_empty()) {
            self.registry.base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry.base_url.trim().is_empty() {
            anyhow::bail!("Registry URL cannot be empty");
        }

        let url = Url::parse(&self.registry.base_url)
            .with_context(|| format!("Invalid registry URL: {}", self.registry.base_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Registry URL must use http or https, got {}", url.scheme());
        }

        Ok(())
    }
}

/// API key from the environment, if one is set.
#[must_use]
pub fn env_api_key() -> Option<String> {
    std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.registry.base_url, "http://localhost:5000");
        assert!(config.registry.user_agent.starts_with("license-admin/"));
        assert!(config.credential.path.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[registry]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [registry]
            base_url = "https://licenses.example.com"

            [credential]
            path = "/tmp/key"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.registry.base_url, "https://licenses.example.com");
        assert_eq!(config.credential.resolved_path(), PathBuf::from("/tmp/key"));

        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_default_credential_path() {
        let path = CredentialConfig::default().resolved_path();
        assert!(path.ends_with("credential"));
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_overrides(Some(" https://registry.internal ".to_string()));
        assert_eq!(config.registry.base_url, "https://registry.internal");

        config.apply_overrides(Some(String::new()));
        assert_eq!(config.registry.base_url, "https://registry.internal");

        config.apply_overrides(None);
        assert_eq!(config.registry.base_url, "https://registry.internal");
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = Config::default();
        config.registry.base_url = String::new();
        assert!(config.validate().is_err());

        config.registry.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.registry.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_init_writes_loadable_commented_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        assert!(Config::init_at(&path).unwrap());
        assert!(!Config::init_at(&path).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# license-admin configuration"));
        assert!(content.contains(ENV_API_KEY));

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.registry.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_locate_prefers_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[registry]\nbase_url = \"https://example.org\"\n").unwrap();

        assert_eq!(Config::locate(Some(path.clone())), Some(path.clone()));

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.registry.base_url, "https://example.org");
    }
}
