//! Session settings loaded through the `config` crate.
//!
//! Sources, later ones winning: built-in defaults, an optional settings file,
//! then `CATALOG_*` environment variables (`CATALOG_API_KEY`,
//! `CATALOG_API_BASE_URL`, `CATALOG_POSTER_SIZE`,
//! `CATALOG_NOTIFY_ON_FAILURE`).

use std::path::Path;

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::client::CatalogClient;
use crate::error::CatalogError;
use crate::session::CatalogSession;
use crate::types::FALLBACK_POSTER_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_POSTER_SIZE: &str = FALLBACK_POSTER_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub api_key: String,
    /// Preferred default poster size.
    pub poster_size: String,
    /// Whether phase failures ask the host to notify the user.
    pub notify_on_failure: bool,
}

impl Settings {
    /// Load from defaults, the optional file at `path`, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let mut builder = defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let builder = builder.add_source(
            Environment::with_prefix("CATALOG")
                .prefix_separator("_")
                .separator("__"),
        );
        finish(builder)
    }

    /// Load from defaults and a TOML document, ignoring the environment.
    pub fn from_toml(toml: &str) -> Result<Self, CatalogError> {
        let builder = defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        finish(builder)
    }

    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&self.api_base_url, &self.api_key)
    }

    /// A fresh, idle session configured from these settings.
    pub fn session(&self) -> CatalogSession {
        CatalogSession::new(self.client(), &self.poster_size)
            .with_failure_notifications(self.notify_on_failure)
    }
}

fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, CatalogError> {
    Ok(Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("poster_size", DEFAULT_POSTER_SIZE)?
        .set_default("notify_on_failure", true)?)
}

fn finish(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Settings, CatalogError> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    if settings.api_key.trim().is_empty() {
        return Err(CatalogError::Settings("api_key is empty".to_string()));
    }
    if settings.api_base_url.trim().is_empty() {
        return Err(CatalogError::Settings("api_base_url is empty".to_string()));
    }
    Ok(settings)
}
