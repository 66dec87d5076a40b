//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-project metadata directory
pub const MURP_DIR: &str = ".murp";

/// Represents a MuRP project (a directory holding a `.murp/` folder)
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .murp/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Use an explicit root if given, otherwise walk up from the current directory
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(MURP_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(MURP_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_structure(root)
    }

    /// Force initialization even if .murp/ exists (the data store is kept)
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root)
    }

    fn write_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };

        std::fs::create_dir_all(project.artwork_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        if !project.local_storage_path().exists() {
            std::fs::write(project.local_storage_path(), "{}")
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# MuRP Project Configuration

# Name recorded on activity entries and resolutions (default: git user / $USER)
# author: ""

# Default output format (auto, yaml, json, tsv, csv, md, id)
# default_format: auto

# Currency label used in reports
# currency: USD

# google:
#   access_token: ""
#   refresh_token: ""
#   client_id: ""
#   client_secret: ""
#   backup_spreadsheet_id: ""

# docs:
#   base_url: "https://context7.com/api/v1"
#   api_key: ""
#   cache_ttl_hours: 24
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .murp metadata directory
    pub fn murp_dir(&self) -> PathBuf {
        self.root.join(MURP_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.murp_dir().join("config.yaml")
    }

    /// SQLite data store holding every record table
    pub fn db_path(&self) -> PathBuf {
        self.murp_dir().join("murp.db")
    }

    /// Key/value file for client-side preferences and caches
    pub fn local_storage_path(&self) -> PathBuf {
        self.murp_dir().join("local_storage.json")
    }

    /// Directory where uploaded label artwork is copied
    pub fn artwork_dir(&self) -> PathBuf {
        self.murp_dir().join("artwork")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a MuRP project (searched from {searched_from:?}). Run 'murp init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("MuRP project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
