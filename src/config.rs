use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{PitwallError, session::lap_table::QuickLapReference};

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "pitwall";

pub const DEFAULT_TELEMETRY_STRIDE: usize = 4;
pub const DEFAULT_MAP_STRIDE: usize = 2;
pub const DEFAULT_DELTA_STRIDE: usize = 4;
pub const DEFAULT_QUICK_LAP_THRESHOLD: f64 = 1.07;

/// Tuning of the analytics and where exported sessions are read from
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub telemetry_stride: usize,
    pub map_stride: usize,
    pub delta_stride: usize,
    pub quick_lap_threshold: f64,
    pub quick_lap_reference: QuickLapReference,
    pub data_dir: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            telemetry_stride: DEFAULT_TELEMETRY_STRIDE,
            map_stride: DEFAULT_MAP_STRIDE,
            delta_stride: DEFAULT_DELTA_STRIDE,
            quick_lap_threshold: DEFAULT_QUICK_LAP_THRESHOLD,
            quick_lap_reference: QuickLapReference::PersonalBest,
            data_dir: None,
        }
    }
}

impl AnalyticsConfig {
    pub fn config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads the user's config file. Returns `Ok(None)` when there is none.
    pub fn from_local_file() -> Result<Option<Self>, PitwallError> {
        match Self::config_path() {
            Some(config_path) if config_path.exists() => Self::from_file(&config_path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn from_file(path: &PathBuf) -> Result<Self, PitwallError> {
        let file =
            std::fs::File::open(path).map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), PitwallError> {
        let config_path = Self::config_path().ok_or(PitwallError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &PathBuf) -> Result<(), PitwallError> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PitwallError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }

    /// Directory sessions are read from when none is given on the command line
    pub fn resolved_data_dir(&self) -> Result<PathBuf, PitwallError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .ok_or(PitwallError::NoConfigDir)?
                .join(APP_DIR_NAME)
                .join("sessions")),
        }
    }
}
