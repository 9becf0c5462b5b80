// Session data model
// A session is loaded once by a provider and only read by the analytics

pub mod lap_table;
pub mod provider;

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{clock::option_seconds, errors::PitwallError};

pub use lap_table::LapTable;
pub use provider::{CachedSessionProvider, FileSessionProvider, LoadOptions, SessionProvider};

/// The kind of session within an event weekend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "FP1")]
    Practice1,
    #[serde(rename = "FP2")]
    Practice2,
    #[serde(rename = "FP3")]
    Practice3,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "SQ")]
    SprintQualifying,
    #[serde(rename = "S")]
    Sprint,
    #[serde(rename = "R")]
    Race,
}

/// How results are produced for a session type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Official table with segment times
    TimedQualifying,
    /// Official table with finishing status and points
    RaceFinish,
    /// Derived from each driver's fastest quick lap
    Practice,
}

impl SessionType {
    pub const ALL: [SessionType; 7] = [
        SessionType::Practice1,
        SessionType::Practice2,
        SessionType::Practice3,
        SessionType::Qualifying,
        SessionType::SprintQualifying,
        SessionType::Sprint,
        SessionType::Race,
    ];

    /// Short code used by timing exports
    pub fn code(&self) -> &'static str {
        match self {
            Self::Practice1 => "FP1",
            Self::Practice2 => "FP2",
            Self::Practice3 => "FP3",
            Self::Qualifying => "Q",
            Self::SprintQualifying => "SQ",
            Self::Sprint => "S",
            Self::Race => "R",
        }
    }

    pub fn classification(&self) -> Classification {
        match self {
            Self::Qualifying | Self::SprintQualifying => Classification::TimedQualifying,
            Self::Race | Self::Sprint => Classification::RaceFinish,
            Self::Practice1 | Self::Practice2 | Self::Practice3 => Classification::Practice,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionType {
    type Err = PitwallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|session_type| session_type.code() == code)
            .ok_or_else(|| PitwallError::UnknownSessionType {
                code: s.to_string(),
            })
    }
}

/// Identifies a session: season, round within the season and session type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub year: u16,
    pub round: u8,
    pub session_type: SessionType,
}

impl SessionKey {
    pub fn new(year: u16, round: u8, session_type: SessionType) -> Self {
        Self {
            year,
            round,
            session_type,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.round, self.session_type)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Three letter abbreviation, e.g. "VER"
    pub code: String,
    /// Car number as printed on the timing screens
    pub number: String,
    pub full_name: String,
    pub team: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Seconds since the start of the lap
    pub time: f64,
    /// Meters traveled from the start of the lap
    pub distance: f64,
    /// km/h
    pub speed: f64,
    /// 0 to 100
    pub throttle: f64,
    /// 0 to 100, or 0/1 from feeds that only report on/off
    #[serde(deserialize_with = "brake_level")]
    pub brake: f64,
    pub rpm: f64,
    pub gear: u8,
    pub x: f64,
    pub y: f64,
}

fn brake_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Brake {
        Pressed(bool),
        Percentage(f64),
    }

    Ok(match Brake::deserialize(deserializer)? {
        Brake::Pressed(true) => 1.,
        Brake::Pressed(false) => 0.,
        Brake::Percentage(pct) => pct,
    })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Driver abbreviation
    pub driver: String,
    pub lap_number: u32,
    /// None for invalid or incomplete laps
    #[serde(with = "option_seconds", default)]
    pub lap_time: Option<Duration>,
    #[serde(default)]
    pub compound: Option<String>,
    #[serde(default)]
    pub stint: Option<u32>,
    #[serde(default)]
    pub pit_in: bool,
    #[serde(default)]
    pub pit_out: bool,
    /// Only populated when the session is loaded with telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Vec<TelemetrySample>>,
}

impl Lap {
    pub fn is_timed(&self) -> bool {
        self.lap_time.is_some()
    }

    pub fn telemetry(&self) -> Result<&[TelemetrySample], PitwallError> {
        self.telemetry
            .as_deref()
            .ok_or_else(|| PitwallError::TelemetryNotLoaded {
                driver: self.driver.clone(),
                lap_number: self.lap_number,
            })
    }
}

/// A row of the official results table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default)]
    pub position: Option<u32>,
    pub driver_number: String,
    pub abbreviation: String,
    pub team_name: String,
    #[serde(with = "option_seconds", default)]
    pub q1: Option<Duration>,
    #[serde(with = "option_seconds", default)]
    pub q2: Option<Duration>,
    #[serde(with = "option_seconds", default)]
    pub q3: Option<Duration>,
    /// Total race time for the winner, gap for the others
    #[serde(with = "option_seconds", default)]
    pub time: Option<Duration>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub laps: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Seconds since the start of the session
    pub time: f64,
    pub air_temp: f64,
    pub track_temp: f64,
    pub humidity: f64,
    pub rainfall: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub laps: Vec<Lap>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Vec<WeatherSample>>,
}

impl Session {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            drivers: Vec::new(),
            laps: Vec::new(),
            results: Vec::new(),
            weather: None,
        }
    }

    pub fn lap_table(&self) -> LapTable<'_> {
        LapTable::new(&self.laps)
    }

    pub fn driver(&self, code: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.code == code)
    }
}
