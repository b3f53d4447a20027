//! `wemprobe.toml` configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codebook::{CodebookLibraryId, CodebookRegistry};
use crate::describe::DEFAULT_MAX_LENGTH;
use crate::error::{Error, Result};

/// Configuration file name, looked up under the platform config directory.
pub const CONFIG_FILE_NAME: &str = "wemprobe.toml";

const APP_DIR: &str = "wemprobe";

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

/// The full configuration (wemprobe.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub codebooks: CodebookSettings,
    #[serde(default)]
    pub describe: DescribeSettings,
}

/// Where the packed codebook libraries live
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodebookSettings {
    /// Directory holding the libraries under their conventional names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aotuv603: Option<String>,
    /// Only ever use this library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<CodebookLibraryId>,
}

/// Description output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeSettings {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub ignore_loops: bool,
}

impl Default for DescribeSettings {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            ignore_loops: false,
        }
    }
}

impl ProbeConfig {
    /// `<config dir>/wemprobe/wemprobe.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file is missing and
    /// [`Error::Config`] if it is not valid TOML for this schema.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        toml::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the default configuration file, or defaults when there is none.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Write the configuration as TOML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl CodebookSettings {
    /// Configured directory, or `<data dir>/wemprobe`.
    #[must_use]
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        match &self.dir {
            Some(dir) => Some(expand(dir)),
            None => dirs::data_dir().map(|dir| dir.join(APP_DIR)),
        }
    }

    /// Path of every library, explicit paths winning over the directory.
    #[must_use]
    pub fn library_paths(&self) -> Vec<(CodebookLibraryId, PathBuf)> {
        let dir = self.resolved_dir();
        CodebookLibraryId::ALL
            .iter()
            .filter_map(|&id| {
                let explicit = match id {
                    CodebookLibraryId::Standard => self.standard.as_deref(),
                    CodebookLibraryId::AoTuV603 => self.aotuv603.as_deref(),
                };
                let path = match (explicit, &dir) {
                    (Some(p), Some(dir)) => dir.join(expand(p)),
                    (Some(p), None) => expand(p),
                    (None, Some(dir)) => dir.join(id.default_file_name()),
                    (None, None) => return None,
                };
                Some((id, path))
            })
            .collect()
    }

    /// Load every configured library that exists on disk.
    pub fn load_registry(&self) -> Result<CodebookRegistry> {
        let mut registry = CodebookRegistry::load_paths(&self.library_paths())?;
        registry.set_force(self.force);
        Ok(registry)
    }
}

/// Tilde/env expansion; unexpandable input is used verbatim.
fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(path),
    }
}
