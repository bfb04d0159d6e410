// src/settings/io.rs
//! Reading and writing `app_settings.json`.

use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use tracing::{debug, info, warn};

use super::AppSettings;

const SETTINGS_FILE_NAME: &str = "app_settings.json";

/// Location of the settings file. Defaults to the platform config dir.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn in_config_dir() -> io::Result<Self> {
        let dirs = ProjectDirs::from("com", "sheetflow", "sheetflow").ok_or_else(|| {
            io::Error::new(ErrorKind::NotFound, "no config directory for this platform")
        })?;
        Ok(Self::at(dirs.config_dir().join(SETTINGS_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// No file means defaults; a file that does not parse is `InvalidData`.
    pub fn load(&self) -> io::Result<AppSettings> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Settings: {:?} not found, using defaults", self.path);
                return Ok(AppSettings::default());
            }
            Err(e) => return Err(e),
        };
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            warn!("Settings: {:?} is not valid settings JSON: {}", self.path, e);
            io::Error::new(ErrorKind::InvalidData, e)
        })
    }

    pub fn save(&self, settings: &AppSettings) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut writer = BufWriter::new(fs::File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, settings)?;
        writer.flush()?;
        info!("Settings: saved to {:?}", self.path);
        Ok(())
    }
}
