use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "COLLECTOR";

/// Runtime settings, read from `COLLECTOR_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub s3_endpoint: String,
    pub releases_url: String,
    pub darwin_manual_url: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(ENV_PREFIX)
    }

    fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("output_dir", ".")?
            .set_default("http_timeout_secs", 300_i64)?
            .set_default(
                "user_agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default(
                "s3_endpoint",
                "https://nix-releases.s3.eu-west-1.amazonaws.com",
            )?
            .set_default("releases_url", "https://releases.nixos.org")?
            .set_default(
                "darwin_manual_url",
                "https://nix-darwin.github.io/nix-darwin/manual/index.html",
            )?
            .add_source(Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()
    }
}
