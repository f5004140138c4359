use super::{Options, smart_load};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Layered dispatcher configuration
pub struct FanfoldConfig {
    figment: Figment,
}

impl FanfoldConfig {
    pub fn load_with_custom_config(custom_config: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // If custom config is specified, use only that + defaults + env vars
        if let Some(custom_path) = custom_config {
            if !custom_path.exists() {
                anyhow::bail!("Config file not found: {}", custom_path.display());
            }
            tracing::debug!("Loading config from {}", custom_path.display());
            figment = figment.merge(smart_load::auto(custom_path));
        } else {
            // Standard priority: user config -> working directory config
            figment = figment
                .merge(Toml::file(Self::user_config_path()))
                .merge(Toml::file("fanfold.toml"))
                .merge(Json::file("fanfold.json"))
                .merge(Yaml::file("fanfold.yaml"))
                .merge(Yaml::file("fanfold.yml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("FANFOLD_"));

        Ok(FanfoldConfig { figment })
    }

    /// Extract the dispatch options from the merged layers
    pub fn options(&self) -> Result<Options> {
        self.figment
            .extract::<Options>()
            .context("Invalid dispatcher configuration")
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{}/.config/fanfold/config.toml", home),
            Err(_) => "~/.config/fanfold/config.toml".to_string(),
        }
    }
}
