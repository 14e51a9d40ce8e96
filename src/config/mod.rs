mod account;
mod portal_settings;

pub use account::Account;
pub use portal_settings::{Config, ExportSettings, PortalSettings};

use crate::error::{DteError, Result};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.dte/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "dte") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.dte/
    let home = dirs_home().ok_or_else(|| {
        DteError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".dte"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs_home() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Resolve the export output directory relative to the config directory
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(output_dir);
    if expanded.is_relative() {
        config_dir.join(expanded)
    } else {
        expanded
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(DteError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| DteError::ConfigParse { path, source: e })
}

/// Load accounts.toml as a HashMap
pub fn load_accounts(config_dir: &Path) -> Result<HashMap<String, Account>> {
    let path = config_dir.join("accounts.toml");
    if !path.exists() {
        return Err(DteError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| DteError::ConfigParse { path, source: e })
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[portal]
base_url = "https://portal.example.com/api"
# api_token = "your-api-token"   # optional bearer token
page_size = 100

[export]
output_dir = "~/.dte/output"
root_folder = "dte-export"       # top-level folder inside export archives
concurrent_downloads = 8
"#;

/// Template content for accounts.toml
pub const ACCOUNTS_TEMPLATE: &str = r#"# Linked portal accounts. The table name (e.g., [acme]) is the client
# identifier shown by 'dte list' and accepted by the export selection
# flags (--client acme, --year acme/2025, --month acme/2025-8).

[example-client]
name = "Example Client S.A. de C.V."
# tax_id = "0614-290292-102-3"   # optional
"#;
