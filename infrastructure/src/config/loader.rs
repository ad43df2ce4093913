//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["ballot.toml", ".ballot.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `BALLOT_*` environment variables (`BALLOT_SESSION__QUORUM=0.6`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./ballot.toml` or `./.ballot.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/ballot/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path)
            .merge(Env::prefixed("BALLOT_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Defaults and files only, without the environment
    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(&global_path));
            }
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/ballot/config.toml`, or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ballot").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used, in priority order
    pub fn describe_sources(explicit: Option<&Path>) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("[{:<7}] Explicit: {}", mark, path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("[FOUND  ] Project:  {}", path.display())),
            None => lines.push("[       ] Project:  ./ballot.toml or ./.ballot.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "" };
            lines.push(format!("[{:<7}] Global:   {}", mark, path.display()));
        }

        lines.push("[       ] Default:  built-in defaults".to_string());
        lines
    }
}
