//! Configuration handling for the searchplan CLI
//!
//! Supports loading configuration from searchplan.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use searchplan_core::planner::DEFAULT_STAGE_BINARY;
use searchplan_core::{PlannerSettings, SlicingSettings};

use crate::overrides::SearchOverrides;

const DEFAULT_CONFIG_FILE: &str = "searchplan.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchOverrides,
    #[serde(default)]
    pub slicing: SlicingSettings,
    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Threads handed to the stages (all cores when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Delete intermediate databases once a search finishes
    #[serde(default)]
    pub remove_tmp_files: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Binary that implements the individual stages
    #[serde(default = "default_stage_binary")]
    pub stage_binary: String,

    /// Command prefixed to parallel stages (empty runs them directly)
    #[serde(default)]
    pub runner: String,
}

fn default_stage_binary() -> String { DEFAULT_STAGE_BINARY.to_string() }

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stage_binary: default_stage_binary(),
            runner: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }

    /// File-level search options with the `[general]` and `[runner]`
    /// entries folded in. Only values written in the file count.
    pub fn file_overrides(&self) -> SearchOverrides {
        let general = SearchOverrides {
            threads: self.general.threads,
            remove_tmp_files: self.general.remove_tmp_files.then_some(true),
            runner: (!self.runner.runner.is_empty()).then(|| self.runner.runner.clone()),
            ..SearchOverrides::default()
        };
        self.search.clone().merge(general)
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            slicing: self.slicing.clone(),
            stage_binary: self.runner.stage_binary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.runner.stage_binary, "mmseqs");
        assert_eq!(config.slicing.max_steps, 30);
        assert_eq!(config.search, SearchOverrides::default());
        assert_eq!(config.file_overrides(), SearchOverrides::default());
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.search.sensitivity = Some(6.5);
        config.runner.stage_binary = "/opt/mmseqs/bin/mmseqs".to_string();
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded_config = Config::load_from_file(temp_file.path())?;

        assert_eq!(loaded_config.search.sensitivity, Some(6.5));
        assert_eq!(loaded_config.runner.stage_binary, config.runner.stage_binary);
        assert_eq!(loaded_config.slicing, config.slicing);

        Ok(())
    }

    #[test]
    fn test_partial_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[search]\nnum_iterations = 3\nrealign = false\n\n[slicing]\nmax_steps = 10")?;
        writeln!(file, "\n[general]\nremove_tmp_files = true\n\n[runner]\nrunner = \"mpirun -np 4\"")?;

        let config = Config::load(Some(file.path()))?;
        assert_eq!(config.slicing.max_steps, 10);
        assert_eq!(config.slicing.memory_fraction, 0.9);

        let overrides = config.file_overrides();
        assert_eq!(overrides.num_iterations, Some(3));
        assert_eq!(overrides.realign, Some(false));
        assert_eq!(overrides.remove_tmp_files, Some(true));
        assert_eq!(overrides.runner.as_deref(), Some("mpirun -np 4"));
        assert_eq!(overrides.threads, None);
        Ok(())
    }

    #[test]
    fn test_example_toml_generation() -> Result<()> {
        let example = Config::example_toml()?;
        assert!(example.contains("[general]"));
        assert!(example.contains("[slicing]"));
        assert!(example.contains("[runner]"));
        assert!(example.contains("stage_binary"));
        Ok(())
    }
}
