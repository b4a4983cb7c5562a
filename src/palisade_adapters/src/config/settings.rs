use config::{Config, ConfigError, Environment, File};
use palisade_core::AuthConfig;
use serde::Deserialize;

/// Application settings, with the authentication section nested under `auth`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub auth: AuthConfig,
}

/// Load settings from an optional JSON file and the process environment.
///
/// Environment variables use the `PALISADE` prefix with `__` as the nesting
/// separator, so `PALISADE__AUTH__DEFAULTS__GUARD=api` overrides the default
/// guard. A `.env` file is read first when present.
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }

    builder
        .add_source(Environment::with_prefix("PALISADE").separator("__"))
        .build()?
        .try_deserialize()
}
