//! Settings persistence

use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::Settings;
use crate::Result;

/// Owner of the settings file. Reads once, rewrites the whole document on
/// every update.
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load the document at `path`, or create it with defaults when absent.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let data = fs::read_to_string(&path)?;
            let settings: Settings = serde_json::from_str(&data)?;
            tracing::debug!(path = %path.display(), "Loaded settings");
            return Ok(Self { path, settings });
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path,
            settings: Settings::default(),
        };
        store.save()?;
        tracing::info!(path = %store.path.display(), "Initialized default settings");

        Ok(store)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutate the document and persist it immediately.
    pub fn update<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        mutate(&mut self.settings);
        self.save()?;
        tracing::debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
