//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

const APP_DIR: &str = "agent-dispatch";
const PROJECT_FILES: [&str; 2] = ["dispatch.toml", ".dispatch.toml"];
const ENV_PREFIX: &str = "AGENT_DISPATCH_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `AGENT_DISPATCH_*` environment variables (`__` separates sections,
    ///    e.g. `AGENT_DISPATCH_SCHEDULER__CONCURRENCY=8`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./dispatch.toml` or `./.dispatch.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/agent-dispatch/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Files and defaults only, without environment overrides.
    pub fn load_files(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
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

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/agent-dispatch/config.toml if set,
    /// otherwise falls back to ~/.config/agent-dispatch/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config sources in priority order (for `--show-config`)
    pub fn describe_sources(config_path: Option<&PathBuf>) -> Vec<String> {
        let mut lines = vec![format!("[ env ] {}<SECTION>__<KEY>", ENV_PREFIX)];

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("[{}] Explicit: {}", mark, path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("[FOUND] Project: {}", path.display())),
            None => lines.push(format!(
                "[     ] Project: ./{} or ./{}",
                PROJECT_FILES[0], PROJECT_FILES[1]
            )),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("[{}] Global:  {}", mark, path.display()));
        }

        lines.push("[     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.scheduler.concurrency, 4);
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("agent-dispatch"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[scheduler]
concurrency = 2

[storage]
backend = "memory"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_files(Some(&path)).unwrap();
        assert_eq!(config.scheduler.concurrency, 2);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.scheduler.max_retries, 3);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[scheduler]\nconcurrency = \"many\"\n").unwrap();

        assert!(ConfigLoader::load_files(Some(&path)).is_err());
    }

    #[test]
    fn test_describe_sources_lists_explicit_path() {
        let path = PathBuf::from("/nonexistent/dispatch.toml");
        let lines = ConfigLoader::describe_sources(Some(&path));
        assert!(lines.iter().any(|l| l.contains("MISSING") && l.contains("Explicit")));
        assert!(lines.last().unwrap().contains("Default"));
    }
}
