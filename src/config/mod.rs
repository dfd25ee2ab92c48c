use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::flow::FlowConfig;
use crate::resolver::{DemoResolver, DemoUser};

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Where the file-backed session store keeps its entries.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DemoConfig {
    /// Extra allow-listed identities. Empty means the built-in list is used
    /// when the demo bypass is enabled.
    #[serde(default)]
    pub users: Vec<DemoUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub api: ApiConfig,
    pub flow: FlowConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("api.base_url", "http://localhost:8080/")?
            .set_default("flow.login_method", "email")?
            .set_default("flow.require_otp", false)?
            .set_default("flow.demo_bypass", false)?
            .set_default("session.path", "session.json")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_FLOW__DEMO_BYPASS=true` would set `Settings.flow.demo_bypass`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// The demo resolver this configuration calls for, if any.
    pub fn demo_resolver(&self) -> Option<DemoResolver> {
        if !self.flow.demo_bypass {
            return None;
        }
        if self.demo.users.is_empty() {
            Some(DemoResolver::builtin())
        } else {
            Some(DemoResolver::new(self.demo.users.clone()))
        }
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("api.base_url", "http://localhost:8080/")?
            .set_default("flow.login_method", "email")?
            .set_default("flow.require_otp", false)?
            .set_default("flow.demo_bypass", false)?
            .set_default("session.path", "session-test.json")?
            .build()?
            .try_deserialize()
    }
}
