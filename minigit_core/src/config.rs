//! Repository configuration file (`.minigit/config`).
//!
//! ```text
//! # comments are allowed
//! version=1
//! algo=blake3-256
//! ```

use crate::error::{Error, Result};
use crate::hash::Algorithm;
use std::fs;
use std::path::Path;

/// Repository layout version written by this crate.
pub const CONFIG_VERSION: u32 = 1;

/// Settings fixed at `init` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Layout version.
    pub version: u32,
    /// Algorithm used for every object id.
    pub algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            algorithm: Algorithm::Blake3,
        }
    }
}

impl Config {
    /// Render the config file body.
    pub fn render(&self) -> String {
        format!("version={}\nalgo={}\n", self.version, self.algorithm.as_str())
    }

    /// Write the config file.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::invalid_config(path, "config file not found"));
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(&content, path)
    }

    /// Parse a config body. `path` is only used to label errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        let version = match version {
            Some(v) if v == CONFIG_VERSION.to_string() => CONFIG_VERSION,
            other => {
                return Err(Error::invalid_config(
                    path,
                    format!("unsupported config version: {:?}", other),
                ));
            }
        };

        let algo = algo.ok_or_else(|| Error::invalid_config(path, "missing algo"))?;
        let algorithm = Algorithm::parse(algo)?;

        Ok(Self { version, algorithm })
    }
}
