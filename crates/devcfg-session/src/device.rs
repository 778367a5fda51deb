//! Connection parameters for one device.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{SessionError, SessionResult};

/// Default NETCONF-over-SSH port.
pub const DEFAULT_NETCONF_PORT: u16 = 830;

/// How the device's SSH host key is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// The key must be listed in the known hosts file.
    #[default]
    KnownHosts,
    /// Any key is accepted. Lab setups only.
    AcceptAny,
}

/// How to reach a device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// SSH port of the NETCONF subsystem.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user.
    #[serde(default)]
    pub username: Option<String>,

    /// Password login, used when no identity file is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Private key file for public key login.
    #[serde(default)]
    pub identity_file: Option<PathBuf>,

    /// Host key check.
    #[serde(default)]
    pub host_key: HostKeyPolicy,

    /// Known hosts file; `~/.ssh/known_hosts` when unset.
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    /// Time allowed for TCP connect, key exchange and login, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_NETCONF_PORT
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            identity_file: None,
            host_key: HostKeyPolicy::default(),
            known_hosts: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("identity_file", &self.identity_file)
            .field("host_key", &self.host_key)
            .field("known_hosts", &self.known_hosts)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DeviceConfig {
    /// Creates parameters for `host` with defaults for everything else.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Returns `host:port`.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks the parameters before anything is dialled.
    ///
    /// Hosts must be a bare name or address: no whitespace, no control
    /// characters and no leading `-`.
    pub fn validate(&self) -> SessionResult<()> {
        let host = self.host.as_str();
        if host.is_empty() {
            return Err(SessionError::invalid_device("host", "must not be empty"));
        }
        if host.starts_with('-') {
            return Err(SessionError::invalid_device(
                "host",
                format!("'{host}' must not start with '-'"),
            ));
        }
        if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(SessionError::invalid_device(
                "host",
                format!("'{}' contains whitespace or control characters", host.escape_debug()),
            ));
        }
        if self.port == 0 {
            return Err(SessionError::invalid_device("port", "must be > 0"));
        }
        if self.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(SessionError::invalid_device("username", "must not be empty"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(SessionError::invalid_device(
                "connect_timeout_secs",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.port, 830);
        assert_eq!(config.host_key, HostKeyPolicy::KnownHosts);
        assert_eq!(config.target(), "localhost:830");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_option_like_host_is_rejected() {
        for host in ["-oProxyCommand=sh -c id", "-p22", "r1 -l root", "r1\n", ""] {
            let err = DeviceConfig::for_host(host).validate().unwrap_err();
            assert!(
                matches!(err, SessionError::InvalidDevice { field: "host", .. }),
                "{host:?}: {err}"
            );
        }
        assert!(DeviceConfig::for_host("2001:db8::1").validate().is_ok());
        assert!(DeviceConfig::for_host("r1.example.net").validate().is_ok());
    }

    #[test]
    fn test_other_settings_are_checked() {
        let config = DeviceConfig {
            port: 0,
            ..DeviceConfig::for_host("192.0.2.10")
        };
        assert!(config.validate().is_err());

        let config = DeviceConfig {
            username: Some(" ".to_string()),
            ..DeviceConfig::for_host("192.0.2.10")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let config = DeviceConfig {
            password: Some("hunter2".to_string()),
            ..DeviceConfig::for_host("192.0.2.10")
        };
        let text = format!("{config:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("<redacted>"));
    }
}
