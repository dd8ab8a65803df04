//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the AspirePath directory (~/.aspirepath/)
pub fn aspirepath_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".aspirepath"))
}

/// Get the config file path (~/.aspirepath/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(aspirepath_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
