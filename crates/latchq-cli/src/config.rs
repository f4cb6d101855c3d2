//! Optional `latchq.toml` configuration.
//!
//! Looked up in the working directory. Command-line flags always win;
//! the file only supplies defaults for the output root and the preview
//! endpoint bind address.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const CONFIG_FILENAME: &str = "latchq.toml";
pub const DEFAULT_OUTPUT_ROOT: &str = "output";
pub const DEFAULT_BIND: &str = "127.0.0.1:8189";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatchqConfig {
    #[serde(default)]
    pub output_root: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
}

impl LatchqConfig {
    /// Load `latchq.toml` when present; a missing file is the default
    /// config, a malformed one is an error worth stopping for.
    pub fn load() -> Result<Self, String> {
        match fs::read_to_string(CONFIG_FILENAME) {
            Ok(raw) => toml::from_str(&raw)
                .map_err(|e| format!("{CONFIG_FILENAME}: {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(format!("{CONFIG_FILENAME}: {e}")),
        }
    }

    pub fn resolve_output_root(&self, flag: Option<String>) -> PathBuf {
        PathBuf::from(
            flag.or_else(|| self.output_root.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT_ROOT.to_string()),
        )
    }

    pub fn resolve_bind(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }
}
