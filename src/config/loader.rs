use super::{global_config_dir, CadenceConfig, PROJECT_CONFIG_FILE};
use crate::error::{CadenceError, ErrorCode};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Finds and reads the configuration for one repository.
///
/// Lookup order: an explicit path, `<repo>/.cadence.toml`, the global
/// `config.toml`, then built-in defaults. Environment overrides are applied
/// to whichever one wins.
pub struct ConfigLoader {
    repo_root: PathBuf,
    explicit: Option<PathBuf>,
    global_dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            explicit: None,
            global_dir: global_config_dir().ok(),
        }
    }

    /// Use `path` instead of searching; it must exist
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_dir = dir;
        self
    }

    /// The file that would be loaded, if any
    pub fn resolve_path(&self) -> Result<Option<PathBuf>, CadenceError> {
        if let Some(explicit) = &self.explicit {
            if !explicit.exists() {
                return Err(CadenceError::config_with_code(
                    ErrorCode::CONFIG_NOT_FOUND,
                    format!("Config file {} does not exist", explicit.display()),
                ));
            }
            return Ok(Some(explicit.clone()));
        }

        let project = self.repo_root.join(PROJECT_CONFIG_FILE);
        if project.exists() {
            return Ok(Some(project));
        }

        Ok(self
            .global_dir
            .as_ref()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists()))
    }

    pub async fn load(&self) -> Result<CadenceConfig, CadenceError> {
        let mut config = match self.resolve_path()? {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::read_file(&path).await?
            }
            None => CadenceConfig::new(),
        };
        config.merge_env_vars();
        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<CadenceConfig, CadenceError> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            CadenceError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("Failed to read {}", path.display()),
            )
            .with_source(e)
        })?;
        toml::from_str(&content).map_err(|e| {
            CadenceError::config_with_code(
                ErrorCode::CONFIG_PARSE_ERROR,
                format!("Failed to parse {}: {}", path.display(), e.message()),
            )
            .with_source(e)
        })
    }
}
