//! Configuration file support
//!
//! Loads and validates devcfg settings from TOML files.
//! Default location: /etc/devcfg/devcfg.toml
//!
//! Two switches can also be set from the environment:
//! `DEVCFG_FAKE_SESSION` and `DEVCFG_NO_DECODE_SECRETS`. The SSH login
//! password is read from `DEVCFG_PASSWORD` so it can stay out of the file.

use crate::error::{ResourceError, ResourceResult};
use devcfg_codec::{PlainDecoder, SecretDecoder, Type9Decoder};
use devcfg_session::{DeviceConfig, SessionMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Default settings file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/devcfg/devcfg.toml";

/// Environment switch for [`SessionSettings::fake_session`].
pub const ENV_FAKE_SESSION: &str = "DEVCFG_FAKE_SESSION";

/// Environment switch for [`SessionSettings::no_decode_secrets`].
pub const ENV_NO_DECODE_SECRETS: &str = "DEVCFG_NO_DECODE_SECRETS";

/// Environment variable holding the device login password.
pub const ENV_PASSWORD: &str = "DEVCFG_PASSWORD";

/// Session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Apply statements directly without lock or commit (test setups only)
    #[serde(default)]
    pub fake_session: bool,

    /// Keep secrets in their device-encoded form when reading
    #[serde(default)]
    pub no_decode_secrets: bool,

    /// Commit log message
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

/// Complete devcfg configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevcfgConfig {
    /// Device connection
    #[serde(default)]
    pub device: DeviceConfig,

    /// Session behaviour
    #[serde(default)]
    pub session: SessionSettings,
}

fn default_commit_message() -> String {
    "commit from devcfg".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            fake_session: false,
            no_decode_secrets: false,
            commit_message: default_commit_message(),
        }
    }
}

impl SessionSettings {
    /// Session mode selected by `fake_session`
    pub fn mode(&self) -> SessionMode {
        if self.fake_session {
            SessionMode::Direct
        } else {
            SessionMode::Transactional
        }
    }

    /// Secret decoder selected by `no_decode_secrets`
    pub fn decoder(&self) -> Arc<dyn SecretDecoder> {
        if self.no_decode_secrets {
            Arc::new(PlainDecoder)
        } else {
            Arc::new(Type9Decoder::new())
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl DevcfgConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> ResourceResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| {
                    ResourceError::Configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ResourceError::Io(e)),
        }
    }

    /// Load from default location or defaults, then apply the environment
    pub fn load() -> ResourceResult<Self> {
        Ok(Self::load_or_default(DEFAULT_CONFIG_PATH)?.with_env())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> ResourceResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ResourceError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }

    /// Apply environment switches from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply environment switches looked up with `lookup`
    ///
    /// A switch only turns its setting on; an unset or false value leaves
    /// the file setting alone.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if lookup(ENV_FAKE_SESSION).is_some_and(|v| truthy(&v)) {
            self.session.fake_session = true;
        }
        if lookup(ENV_NO_DECODE_SECRETS).is_some_and(|v| truthy(&v)) {
            self.session.no_decode_secrets = true;
        }
        if let Some(password) = lookup(ENV_PASSWORD).filter(|v| !v.is_empty()) {
            self.device.password = Some(password);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ResourceResult<()> {
        self.device
            .validate()
            .map_err(|e| ResourceError::Configuration(e.to_string()))?;

        if self.session.commit_message.trim().is_empty() {
            return Err(ResourceError::Configuration(
                "session.commit_message must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcfg_session::HostKeyPolicy;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = DevcfgConfig::default();
        assert_eq!(config.device.host, "localhost");
        assert_eq!(config.device.port, 830);
        assert!(!config.session.fake_session);
        assert!(!config.session.no_decode_secrets);
        assert_eq!(config.session.mode(), SessionMode::Transactional);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(DevcfgConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = DevcfgConfig::default();
        config.device.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_option_like_host() {
        let mut config = DevcfgConfig::default();
        config.device.host = "-oProxyCommand=touch /tmp/x".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ResourceError::Configuration(_)));
        assert!(err.to_string().contains("must not start with '-'"));

        config.device.host = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_commit_message() {
        let mut config = DevcfgConfig::default();
        config.session.commit_message = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[device]
host = "192.0.2.10"
username = "netops"
host_key = "accept-any"

[session]
fake_session = true
"#;
        let config: DevcfgConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.device.host, "192.0.2.10");
        assert_eq!(config.device.username.as_deref(), Some("netops"));
        assert_eq!(config.device.host_key, HostKeyPolicy::AcceptAny);
        assert_eq!(config.session.mode(), SessionMode::Direct);
        // Unspecified values should use defaults
        assert_eq!(config.device.port, 830);
        assert_eq!(config.session.commit_message, "commit from devcfg");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devcfg.toml");

        let mut config = DevcfgConfig::default();
        config.device.host = "r1.example.net".to_string();
        config.session.no_decode_secrets = true;
        config.save(&path).unwrap();

        let loaded = DevcfgConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = DevcfgConfig::load_or_default("/nonexistent/devcfg.toml").unwrap();
        assert_eq!(config, DevcfgConfig::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devcfg.toml");
        fs::write(&path, "[device\nhost = 1").unwrap();
        let err = DevcfgConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, ResourceError::Configuration(_)));
    }

    #[test]
    fn test_env_lookup_overrides() {
        let config = DevcfgConfig::default().with_env_from(|name| match name {
            ENV_FAKE_SESSION => Some("true".to_string()),
            ENV_NO_DECODE_SECRETS => Some("0".to_string()),
            ENV_PASSWORD => Some("hunter2".to_string()),
            _ => None,
        });
        assert!(config.session.fake_session);
        assert!(!config.session.no_decode_secrets);
        assert_eq!(config.device.password.as_deref(), Some("hunter2"));
    }

    #[test]
    #[serial]
    fn test_process_environment() {
        std::env::set_var(ENV_NO_DECODE_SECRETS, "1");
        let config = DevcfgConfig::default().with_env();
        std::env::remove_var(ENV_NO_DECODE_SECRETS);

        assert!(config.session.no_decode_secrets);
        assert_eq!(
            config.session.decoder().decode("$9$abc").unwrap(),
            "$9$abc"
        );
    }
}
