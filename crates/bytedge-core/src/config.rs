// ABOUTME: Configuration loading and management for bytedge
// ABOUTME: Supports TOML config files with sensible defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::Latency;
use crate::engine::DEFAULT_MAX_INPUT_CHARS;
use crate::error::EdgeError;
use crate::knowledge::Domain;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend answers turns
    pub backend: BackendConfig,
    /// Simulated backend delay
    pub latency: LatencyConfig,
    /// Engine behavior
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local rule tables with simulated latency
    #[default]
    Simulated,
    /// Remote chat server
    Http,
}

impl std::str::FromStr for BackendKind {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self, EdgeError> {
        match s.trim().to_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "http" => Ok(Self::Http),
            other => Err(EdgeError::Config(format!("unknown backend kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Chat server base URL (http backend only)
    pub base_url: String,
    /// Request timeout in seconds (http backend only)
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Simulated,
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            min_ms: 1500,
            max_ms: 2500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for fallback selection and latency; random when unset
    pub seed: Option<u64>,
    /// Longest accepted input, in characters
    pub max_input_chars: usize,
    /// Agent used when a request names none
    pub default_domain: Domain,
    /// Directory holding `<domain>.toml` knowledge overrides
    pub knowledge_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            default_domain: Domain::Clutch,
            knowledge_dir: None,
        }
    }
}

impl Config {
    /// Get the XDG config directory for bytedge (~/.config/bytedge)
    pub fn config_dir() -> PathBuf {
        // Respect XDG_CONFIG_HOME if set, otherwise use ~/.config
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|p| p.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("."))
            })
            .join("bytedge")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load config from XDG config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            // No config found, use defaults
            Ok(Self::default())
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EdgeError> {
        if self.latency.min_ms > self.latency.max_ms {
            return Err(EdgeError::Config(format!(
                "latency.min_ms ({}) is greater than latency.max_ms ({})",
                self.latency.min_ms, self.latency.max_ms
            )));
        }
        if self.engine.max_input_chars == 0 {
            return Err(EdgeError::Config(
                "engine.max_input_chars must be at least 1".to_string(),
            ));
        }
        if let Some(dir) = self.knowledge_dir() {
            if !dir.is_dir() {
                return Err(EdgeError::Config(format!(
                    "engine.knowledge_dir is not a directory: {}",
                    dir.display()
                )));
            }
        }
        if self.backend.kind == BackendKind::Http && self.backend.base_url.trim().is_empty() {
            return Err(EdgeError::Config(
                "backend.base_url is required for the http backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Knowledge override directory with a leading `~` expanded
    pub fn knowledge_dir(&self) -> Option<PathBuf> {
        self.engine.knowledge_dir.as_deref().map(expand_home)
    }

    pub fn latency(&self) -> Latency {
        Latency::from_millis(self.latency.min_ms, self.latency.max_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Generate a default config file content
    pub fn default_toml() -> String {
        r#"# bytedge configuration
# Location: ~/.config/bytedge/config.toml

[backend]
# "simulated" answers from the built-in knowledge tables,
# "http" forwards every turn to a chat server.
kind = "simulated"
base_url = "http://localhost:5000"
timeout_secs = 30

[latency]
# Simulated response delay, drawn uniformly from this range
min_ms = 1500
max_ms = 2500

[engine]
# seed = 42  # Fixed seed makes fallback answers and delays repeatable
max_input_chars = 2000
default_domain = "clutch"
# knowledge_dir = "~/.config/bytedge/knowledge"  # <domain>.toml overrides
"#
        .to_string()
    }

    /// Initialize config directory and create default config if needed
    pub fn init() -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_path();

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

        // Write default config if it doesn't exist
        if !config_path.exists() {
            std::fs::write(&config_path, Self::default_toml())
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        Ok(config_path)
    }
}

/// Expand a leading `~` to the home directory; other paths are returned as-is
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_toml_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nseed = 7\ndefault_domain = \"tire\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.engine.default_domain, Domain::Tire);
        assert_eq!(config.engine.max_input_chars, 2000);
        assert_eq!(config.backend.kind, BackendKind::Simulated);
        assert_eq!(config.latency(), Latency::from_millis(1500, 2500));
    }

    #[test]
    fn test_inverted_latency_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[latency]\nmin_ms = 900\nmax_ms = 100").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("greater than"));
    }

    #[test]
    fn test_http_requires_base_url() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Http;
        config.backend.base_url = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_domain_is_a_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\ndefault_domain = \"brakes\"").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load_from("/nonexistent/bytedge.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("HTTP".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert_eq!("simulated".parse::<BackendKind>().unwrap(), BackendKind::Simulated);
        assert!("grpc".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_knowledge_dir_expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let mut config = Config::default();
        config.engine.knowledge_dir = Some(PathBuf::from("~/.config/bytedge/knowledge"));
        assert_eq!(
            config.knowledge_dir(),
            Some(home.join(".config/bytedge/knowledge"))
        );

        config.engine.knowledge_dir = Some(PathBuf::from("/srv/knowledge"));
        assert_eq!(config.knowledge_dir(), Some(PathBuf::from("/srv/knowledge")));

        config.engine.knowledge_dir = Some(PathBuf::from("~other/knowledge"));
        assert_eq!(config.knowledge_dir(), Some(PathBuf::from("~other/knowledge")));
    }

    #[test]
    fn test_tilde_knowledge_dir_loads_from_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let Ok(dir) = tempfile::tempdir_in(&home) else {
            return;
        };
        let name = dir.path().file_name().unwrap().to_string_lossy().to_string();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nknowledge_dir = \"~/{name}\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.knowledge_dir(), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_missing_knowledge_dir_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nknowledge_dir = \"/nonexistent/bytedge/knowledge\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("not a directory"));
    }

    #[test]
    fn test_timeout() {
        assert_eq!(Config::default().timeout(), Duration::from_secs(30));
    }
}
