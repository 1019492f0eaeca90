use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::Settings;
use crate::core::ReportColumn;

const APP_NAME: &str = "SearchFiles";
const CONFIG_FILE: &str = "settings.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "searchfiles", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the settings from `path`, or from the platform config file.
///
/// A missing file is created with defaults. A file that does not parse is
/// recovered key by key; anything unusable falls back to its default so a
/// damaged file never prevents a search.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let config_path = resolve_path(path)?;

    if !config_path.exists() {
        tracing::info!(
            "Settings file not found, creating default settings at {:?}",
            config_path
        );
        let default_settings = Settings::default();
        save_config(&default_settings, Some(&config_path))?;
        return Ok(default_settings);
    }

    parse_config(&config_path)
}

/// Loads the settings from `path` without ever writing to disk.
///
/// A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::info!("Settings file not found at {:?}, using defaults", path);
        return Ok(Settings::default());
    }
    parse_config(path)
}

fn parse_config(config_path: &Path) -> Result<Settings> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read settings from {:?}", config_path))?;

    match serde_json::from_str::<Settings>(&config_content) {
        Ok(mut settings) => {
            settings.cleanup();
            tracing::info!("Loaded settings from {:?}", config_path);
            Ok(settings)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse settings file at {:?}: {}. Recovering known fields.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|_| Ok(Settings::default()))
        }
    }
}

/// Rebuilds `Settings` from a JSON object with missing, mistyped or unknown entries.
fn migrate_legacy_config(config_content: &str) -> Result<Settings> {
    let value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("Settings file is not a JSON object"))?;

    let mut settings = Settings::default();

    take_field(obj, "Version", &mut settings.version);
    take_field(obj, "RootDir", &mut settings.root_directory);
    take_field(obj, "RecentDirectories", &mut settings.recent_directories);
    take_field(obj, "FilterExtension", &mut settings.filter_extension);
    take_field(obj, "RecentExtensions", &mut settings.recent_extensions);
    take_field(obj, "FilterFilename", &mut settings.filter_filename);
    take_field(obj, "FilenameCaseSensitive", &mut settings.filename_case_sensitive);
    take_field(obj, "RecentFilenames", &mut settings.recent_filename_filters);

    if let Some(Value::Array(columns)) = obj.get("ReportColumns") {
        settings.report_columns = columns
            .iter()
            .filter_map(|column| match serde_json::from_value::<ReportColumn>(column.clone()) {
                Ok(column) => Some(column),
                Err(e) => {
                    tracing::warn!("Dropping report column {}: {}", column, e);
                    None
                }
            })
            .collect();
    }

    settings.cleanup();
    tracing::info!("Successfully migrated legacy settings");
    Ok(settings)
}

/// Overwrites `target` with `obj[key]` if it is present and has the right shape.
fn take_field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str, target: &mut T) {
    let Some(value) = obj.get(key) else {
        return;
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => *target = parsed,
        Err(e) => tracing::warn!("Ignoring settings field {}: {}", key, e),
    }
}

/// Saves the settings to `path`, or to the platform config file.
///
/// Recent lists are normalised on the way out.
pub fn save_config(settings: &Settings, path: Option<&Path>) -> Result<()> {
    let config_path = resolve_path(path)?;

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let mut normalized = settings.clone();
    normalized.cleanup();
    let config_json = serde_json::to_string_pretty(&normalized)?;

    fs::write(&config_path, config_json)
        .with_context(|| format!("Failed to write settings to {:?}", config_path))?;
    tracing::info!("Saved settings to {:?}", config_path);

    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.searchfiles.SearchFiles/
// Linux:   ~/.config/searchfiles/
// Windows: %APPDATA%/searchfiles/SearchFiles/config/
