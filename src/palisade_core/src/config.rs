use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Process-wide authentication configuration, immutable once built.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub defaults: AuthDefaults,
    #[serde(default)]
    pub guards: HashMap<String, GuardConfig>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthDefaults {
    pub guard: String,
}

/// Configuration for one named guard.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardConfig {
    pub driver: String,
    #[serde(default)]
    pub provider: Option<String>,
    /// Driver-specific options, passed through untouched.
    #[serde(flatten, default)]
    pub options: Map<String, Value>,
}

/// Configuration for one named user provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub driver: String,
    #[serde(flatten, default)]
    pub options: Map<String, Value>,
}

impl GuardConfig {
    pub fn new(driver: impl Into<String>, provider: Option<String>) -> Self {
        Self {
            driver: driver.into(),
            provider,
            options: Map::new(),
        }
    }

    /// Deserialize the driver-specific options into a typed struct.
    pub fn options<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_value(Value::Object(self.options.clone()))
    }
}

impl ProviderConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            options: Map::new(),
        }
    }

    pub fn options<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_value(Value::Object(self.options.clone()))
    }
}

impl AuthConfig {
    /// Look up the configuration for a named guard.
    pub fn guard(&self, name: &str) -> Option<&GuardConfig> {
        self.guards.get(name)
    }

    /// Look up the configuration for a named provider.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn default_guard(&self) -> &str {
        &self.defaults.guard
    }
}
