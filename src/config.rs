//! Domain configuration for adtools.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AdError, Result};

/// Default location of the domains file.
pub const DEFAULT_CONFIG_PATH: &str = "domains.yaml";
/// Default port for plaintext LDAP.
pub const LDAP_PORT: u16 = 389;
/// Default port for LDAP over TLS.
pub const LDAPS_PORT: u16 = 636;

/// Transport used to reach the domain controller.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    #[serde(alias = "ldap")]
    Plaintext,
    #[serde(alias = "ldaps")]
    Encrypted,
}

impl Protocol {
    /// URL scheme of the protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Plaintext => "ldap",
            Protocol::Encrypted => "ldaps",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Plaintext => LDAP_PORT,
            Protocol::Encrypted => LDAPS_PORT,
        }
    }
}

impl FromStr for Protocol {
    type Err = AdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plaintext" => Ok(Protocol::Plaintext),
            "encrypted" => Ok(Protocol::Encrypted),
            _ => Err(AdError::invalid("invalid protocol specified")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Plaintext => "plaintext",
            Protocol::Encrypted => "encrypted",
        })
    }
}

/// A domain entry, as written in the domains file.
#[derive(Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Hostname of the domain controller.
    pub dc: Option<String>,
    /// DNS name of the domain. Used as host when `dc` is missing.
    pub domain: Option<String>,
    /// Base DN for searches.
    pub dn: Option<String>,
    /// Bind DN or user principal name.
    pub username: Option<String>,
    /// Bind password.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub protocol: Option<Protocol>,
    /// Older files use `ldaps: true` instead of `protocol`.
    pub ldaps: Option<bool>,
    pub port: Option<u16>,
}

impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("dc", &self.dc)
            .field("domain", &self.domain)
            .field("dn", &self.dn)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("protocol", &self.protocol)
            .field("ldaps", &self.ldaps)
            .field("port", &self.port)
            .finish()
    }
}

impl DomainConfig {
    /// Apply defaulting rules and produce an immutable [`SessionConfig`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if neither `dc` nor `domain` is set.
    pub fn resolve(&self) -> Result<SessionConfig> {
        let host = self
            .dc
            .as_deref()
            .or(self.domain.as_deref())
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                AdError::invalid("DC must be specified in config file")
            })?;

        let protocol = match (self.protocol, self.ldaps) {
            (Some(protocol), _) => protocol,
            (None, Some(true)) => Protocol::Encrypted,
            (None, _) => Protocol::Plaintext,
        };

        Ok(SessionConfig {
            host: host.to_owned(),
            base_dn: self.dn.clone().filter(|dn| !dn.is_empty()),
            protocol,
            port: self.port.unwrap_or_else(|| protocol.default_port()),
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

/// Resolved connection parameters of one session.
#[derive(Clone, PartialEq)]
pub struct SessionConfig {
    pub host: String,
    pub base_dn: Option<String>,
    pub protocol: Protocol,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SessionConfig {
    /// Configuration for a session opened with explicit credentials.
    pub fn new(host: impl Into<String>, protocol: Protocol, port: u16) -> Self {
        Self {
            host: host.into(),
            base_dn: None,
            protocol,
            port,
            username: None,
            password: None,
        }
    }

    /// Set default base DN for searches.
    pub fn base_dn(mut self, dn: impl Into<String>) -> Self {
        self.base_dn = Some(dn.into());
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("base_dn", &self.base_dn)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Lookup of domain entries by key.
pub trait ConfigStore {
    fn lookup(&self, key: &str) -> Option<DomainConfig>;
}

impl ConfigStore for HashMap<String, DomainConfig> {
    fn lookup(&self, key: &str) -> Option<DomainConfig> {
        self.get(key).cloned()
    }
}

/// Every domain declared in a domains file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domains(HashMap<String, DomainConfig>);

impl Domains {
    pub fn from_yaml(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Reads the domains file from `path`, or from [`DEFAULT_CONFIG_PATH`]
    /// when `path` is `None`.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let file = File::open(&path).map_err(|err| {
            tracing::error!(error = %err, path = %path.display(), "domains file not found");
            AdError::invalid(format!(
                "cannot open config file {}: {err}",
                path.display()
            ))
        })?;

        Ok(serde_yaml::from_reader(file)?)
    }

    /// Keys of the declared domains, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl ConfigStore for Domains {
    fn lookup(&self, key: &str) -> Option<DomainConfig> {
        self.0.lookup(key)
    }
}
