mod settings;

pub use settings::{AuthSettings, Config, DisplaySettings, SessionSettings, StorageSettings};

use crate::error::{ArchiveError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Categories created by `archive init`
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Comptabilité",
    "Réparation",
    "Entretien",
    "Assurance",
    "Impôts",
    "Charges",
];

/// Get the config directory path (XDG-style, falling back to ~/.invoice-archive/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "invoice-archive") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        ArchiveError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".invoice-archive"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured path: `~/` is expanded, relative paths hang off the config dir
pub fn resolve_path(raw: &str, cfg_dir: &Path) -> PathBuf {
    let expanded = expand_path(raw);
    if expanded.is_absolute() {
        expanded
    } else {
        cfg_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(cfg_dir: &Path) -> Result<Config> {
    if !cfg_dir.exists() {
        return Err(ArchiveError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    let path = cfg_dir.join("config.toml");
    if !path.exists() {
        return Err(ArchiveError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ArchiveError::ConfigParse { path, source: e })
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[storage]
upload_dir = "uploads"      # where PDFs are stored, relative to this directory
database = "archive.toml"   # invoices, suppliers, categories and users

[session]
max_age_days = 7            # how long 'archive login' stays valid

[auth]
bcrypt_cost = 10            # work factor for password hashes

[display]
currency_symbol = "€"
"#;
