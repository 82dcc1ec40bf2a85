use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::EngineSettings;
use crate::error::ConfigError;

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("rug_quest");
    path.push("settings.json");
    path
}

/// Loads settings, falling back to defaults when the file is missing or broken.
pub fn load_settings() -> EngineSettings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> EngineSettings {
    let Ok(text) = fs::read_to_string(path) else {
        log::debug!("No settings at {}, using defaults", path.display());
        return EngineSettings::default();
    };

    match serde_json::from_str(&text) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Ignoring unreadable settings at {}: {}", path.display(), e);
            EngineSettings::default()
        }
    }
}

pub fn save_settings(settings: &EngineSettings) -> Result<PathBuf, ConfigError> {
    let path = settings_path();
    save_settings_to(settings, &path)?;
    Ok(path)
}

pub fn save_settings_to(settings: &EngineSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Provider;

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = EngineSettings::default();
        settings.provider = Provider::Offline;
        settings.token_name = "WAGMI".into();
        save_settings_to(&settings, &path).unwrap();

        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn missing_or_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings_from(&path), EngineSettings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), EngineSettings::default());
    }
}
