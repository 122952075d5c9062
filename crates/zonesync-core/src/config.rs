//! Configuration types for zonesync
//!
//! A manifest names the provider, the cache settings and every resource to
//! reconcile. Resource shapes are checked here, at the boundary, so nothing
//! downstream deals with untyped input.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::resource::{RecordData, ResourceKind, ResourceState};

/// Default Reg.ru API endpoint
pub const DEFAULT_REGRU_API_URL: &str = "https://api.reg.ru/api/regru2";

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonesyncConfig {
    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Zone cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Resources to reconcile
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl ZonesyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            resources: Vec::new(),
        }
    }

    /// Parse a JSON manifest
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(json).map_err(|e| crate::Error::config(format!("invalid manifest: {e}")))
    }

    /// Read and parse a JSON manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("cannot read manifest {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.resources.is_empty() {
            return Err(crate::Error::config("No resources configured"));
        }

        self.provider.validate()?;
        self.cache.validate()?;

        let mut seen = HashSet::new();
        for resource in &self.resources {
            resource.validate()?;
            let key = (resource.data.kind(), resource.zone.as_str(), resource.name.as_str());
            if !seen.insert(key) {
                return Err(crate::Error::config(format!(
                    "Duplicate {} resource {}/{}",
                    resource.data.kind(),
                    resource.zone,
                    resource.name
                )));
            }
        }

        Ok(())
    }
}

impl Default for ZonesyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Reg.ru API v2
    Regru {
        /// Account login
        #[serde(default)]
        username: String,
        /// Account password
        #[serde(default)]
        password: String,
        /// API base URL (defaults to the public endpoint)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_url: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Regru {
                username,
                password,
                api_url,
            } => {
                if username.is_empty() {
                    return Err(crate::Error::config("Reg.ru username cannot be empty"));
                }
                if password.is_empty() {
                    return Err(crate::Error::config("Reg.ru password cannot be empty"));
                }
                if let Some(url) = api_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Reg.ru API URL must use HTTP or HTTPS scheme. Got: {url}"
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Regru { .. } => "regru",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Regru {
            username: String::new(),
            password: String::new(),
            api_url: None,
        }
    }
}

// Credentials must never reach logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Regru {
                username, api_url, ..
            } => f
                .debug_struct("Regru")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("api_url", api_url)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<redacted>")
                .finish(),
        }
    }
}

/// Zone cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached zone listing in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validate the cache configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl_secs == 0 {
            return Err(crate::Error::config("Cache TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    30
}

/// A declared resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Zone (e.g. "example.com")
    pub zone: String,

    /// Name relative to the zone ("@" for the apex)
    pub name: String,

    /// Declared records; the `type` tag selects the resource kind
    #[serde(flatten)]
    pub data: RecordData,
}

impl ResourceConfig {
    /// Resource kind
    pub fn kind(&self) -> ResourceKind {
        self.data.kind()
    }

    /// Validate the resource identity
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.trim().is_empty() {
            return Err(crate::Error::config("Resource zone cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Resource name cannot be empty (zone {})",
                self.zone
            )));
        }
        if self.zone.contains('/') || self.name.contains('/') {
            return Err(crate::Error::config(format!(
                "Resource {}/{} must not contain '/'",
                self.zone, self.name
            )));
        }
        Ok(())
    }

    /// Desired state for this resource
    pub fn to_state(&self) -> ResourceState {
        ResourceState::new(self.zone.clone(), self.name.clone(), self.data.clone())
    }
}
