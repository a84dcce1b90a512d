// ABOUTME: Resolves the effective configuration from the config file and command-line flags
// ABOUTME: Flags and BYTEDGE_* environment variables win over the file

use anyhow::{Context, Result};
use bytedge_core::{BackendKind, Config};
use std::path::PathBuf;

/// Values given on the command line that override the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file instead of the XDG location
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    /// "simulated" or "http"
    pub backend: Option<String>,
    /// Chat server base URL
    pub url: Option<String>,
}

impl Overrides {
    /// Load the config file (explicit path or XDG default) and apply the overrides
    pub fn load(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        self.apply(config)
    }

    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(seed) = self.seed {
            config.engine.seed = Some(seed);
        }
        if let Some(backend) = &self.backend {
            config.backend.kind = backend
                .parse::<BackendKind>()
                .context("Invalid --backend value")?;
        }
        if let Some(url) = &self.url {
            config.backend.base_url = url.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
