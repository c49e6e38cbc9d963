//! Application configuration for vaultflat.
//!
//! User config lives at `~/.vaultflat/vaultflat.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultflatError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "vaultflat.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vaultflat";

// ---------------------------------------------------------------------------
// Config structs (matching vaultflat.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Copy non-Markdown files into the assets folder.
    #[serde(default = "default_true")]
    pub copy_assets: bool,

    /// Name of the assets subfolder inside the output directory.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,

    /// Prepend a `**Parent:**` breadcrumb line to nested documents.
    #[serde(default = "default_true")]
    pub breadcrumbs: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            copy_assets: true,
            assets_dir: default_assets_dir(),
            breadcrumbs: true,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_assets_dir() -> String {
    "assets".into()
}

// ---------------------------------------------------------------------------
// Flatten options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime flatten configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Whether non-Markdown files are copied at all.
    pub copy_assets: bool,
    /// Assets subfolder name (a single path segment).
    pub assets_dir: String,
    /// Whether breadcrumbs are injected.
    pub breadcrumbs: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FlattenOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            copy_assets: config.defaults.copy_assets,
            assets_dir: config.defaults.assets_dir.clone(),
            breadcrumbs: config.defaults.breadcrumbs,
        }
    }
}

impl FlattenOptions {
    /// Reject an assets folder name that would escape or alias the output directory.
    pub fn validate(&self) -> Result<()> {
        validate_assets_dir(&self.assets_dir)
    }
}

/// Check that `name` is a single, non-empty path segment.
pub fn validate_assets_dir(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VaultflatError::config("assets_dir must not be empty"));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(VaultflatError::config(format!(
            "assets_dir '{name}' must name a subfolder"
        )));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(VaultflatError::config(format!(
            "assets_dir '{name}' must be a single folder name, not a path"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vaultflat/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VaultflatError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vaultflat/vaultflat.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VaultflatError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        VaultflatError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_assets_dir(&config.defaults.assets_dir)?;

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VaultflatError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VaultflatError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VaultflatError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
