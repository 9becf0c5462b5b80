// Session loading
// Sessions are exported ahead of time into a directory tree:
//
//   <root>/<year>/<round>/<CODE>/session.json
//   <root>/<year>/<round>/<CODE>/telemetry/<DRIVER>_<LAP>.jsonl
//   <root>/<year>/<round>/<CODE>/weather.jsonl

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, info};
use serde::Deserialize;

use crate::errors::PitwallError;

use super::{Driver, Lap, ResultEntry, Session, SessionKey, SessionType, TelemetrySample};

const SESSION_FILE_NAME: &str = "session.json";
const TELEMETRY_DIR_NAME: &str = "telemetry";
const WEATHER_FILE_NAME: &str = "weather.jsonl";

/// What to load on top of laps and results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    pub telemetry: bool,
    pub weather: bool,
}

impl LoadOptions {
    pub fn laps_only() -> Self {
        Self::default()
    }

    pub fn with_telemetry() -> Self {
        Self {
            telemetry: true,
            weather: false,
        }
    }
}

/// Source of loaded sessions. Loading must be idempotent so results can be cached.
pub trait SessionProvider {
    fn load_session(
        &self,
        key: &SessionKey,
        options: LoadOptions,
    ) -> Result<Arc<Session>, PitwallError>;
}

#[derive(Deserialize)]
struct SessionRecord {
    #[serde(default)]
    drivers: Vec<Driver>,
    #[serde(default)]
    laps: Vec<Lap>,
    #[serde(default)]
    results: Vec<ResultEntry>,
}

/// Reads sessions exported as JSON files under a root directory
#[derive(Clone, Debug)]
pub struct FileSessionProvider {
    root: PathBuf,
}

impl FileSessionProvider {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files of one session
    pub fn session_dir(&self, key: &SessionKey) -> PathBuf {
        self.root
            .join(key.year.to_string())
            .join(key.round.to_string())
            .join(key.session_type.code())
    }

    pub fn telemetry_path(&self, key: &SessionKey, driver: &str, lap_number: u32) -> PathBuf {
        self.session_dir(key)
            .join(TELEMETRY_DIR_NAME)
            .join(format!("{driver}_{lap_number}.jsonl"))
    }

    /// Session types exported for a round, in no particular order
    pub fn available_sessions(&self, year: u16, round: u8) -> Result<Vec<SessionType>, PitwallError> {
        let round_dir = self.root.join(year.to_string()).join(round.to_string());
        if !round_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&round_dir).map_err(|e| PitwallError::SessionIOError {
            path: round_dir.clone(),
            source: e,
        })?;

        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.join(SESSION_FILE_NAME).exists() {
                continue;
            }
            if let Some(session_type) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<SessionType>().ok())
            {
                sessions.push(session_type);
            }
        }
        Ok(sessions)
    }

    fn read_session_record(&self, key: &SessionKey) -> Result<SessionRecord, PitwallError> {
        let path = self.session_dir(key).join(SESSION_FILE_NAME);
        if !path.exists() {
            return Err(PitwallError::SessionNotFound {
                key: key.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| PitwallError::SessionIOError {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| PitwallError::SessionParseError { path, source: e })
    }

    fn load_telemetry(
        &self,
        key: &SessionKey,
        lap: &Lap,
    ) -> Result<Option<Vec<TelemetrySample>>, PitwallError> {
        let path = self.telemetry_path(key, &lap.driver, lap.lap_number);
        if !path.exists() {
            debug!("No telemetry for lap {} of {} in {}", lap.lap_number, lap.driver, key);
            return Ok(None);
        }
        read_json_lines(&path).map(Some)
    }
}

fn read_json_lines<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, PitwallError> {
    serde_jsonlines::json_lines(path)
        .map_err(|e| PitwallError::TelemetryLoaderError {
            path: path.to_path_buf(),
            source: e,
        })?
        .collect::<Result<Vec<T>, std::io::Error>>()
        .map_err(|e| PitwallError::TelemetryLoaderError {
            path: path.to_path_buf(),
            source: e,
        })
}

impl SessionProvider for FileSessionProvider {
    fn load_session(
        &self,
        key: &SessionKey,
        options: LoadOptions,
    ) -> Result<Arc<Session>, PitwallError> {
        let record = self.read_session_record(key)?;
        let mut session = Session {
            key: *key,
            drivers: record.drivers,
            laps: record.laps,
            results: record.results,
            weather: None,
        };

        if options.telemetry {
            for lap in session.laps.iter_mut() {
                lap.telemetry = self.load_telemetry(key, lap)?;
            }
        }

        if options.weather {
            let path = self.session_dir(key).join(WEATHER_FILE_NAME);
            if path.exists() {
                session.weather = Some(read_json_lines(&path)?);
            }
        }

        info!(
            "Loaded session {} with {} laps and {} result rows",
            key,
            session.laps.len(),
            session.results.len()
        );
        Ok(Arc::new(session))
    }
}

/// Everything that changes what a provider returns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub year: u16,
    pub round: u8,
    pub session_type: SessionType,
    pub telemetry: bool,
    pub weather: bool,
}

impl CacheKey {
    pub fn new(key: &SessionKey, options: LoadOptions) -> Self {
        Self {
            year: key.year,
            round: key.round,
            session_type: key.session_type,
            telemetry: options.telemetry,
            weather: options.weather,
        }
    }
}

/// Keeps every session loaded through the wrapped provider in memory
pub struct CachedSessionProvider<P> {
    inner: P,
    cache: Mutex<HashMap<CacheKey, Arc<Session>>>,
}

impl<P: SessionProvider> CachedSessionProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<P: SessionProvider> SessionProvider for CachedSessionProvider<P> {
    fn load_session(
        &self,
        key: &SessionKey,
        options: LoadOptions,
    ) -> Result<Arc<Session>, PitwallError> {
        let cache_key = CacheKey::new(key, options);
        if let Some(session) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cache_key)
        {
            debug!("Cache hit for {:?}", cache_key);
            return Ok(session.clone());
        }

        // loading happens outside the lock, a concurrent miss may load the same session twice
        let session = self.inner.load_session(key, options)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(cache_key).or_insert(session).clone())
    }
}
