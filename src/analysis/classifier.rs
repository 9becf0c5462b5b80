// Session classification
// Qualifying and race results come from the official table, practice results are
// derived from each driver's fastest quick lap.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    clock::{format_clock, format_optional_clock},
    errors::PitwallError,
    session::{Classification, ResultEntry, Session, lap_table::QuickLapReference},
};

const FINISHED_STATUS: &str = "Finished";

/// Which laps count as representative in practice
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickLapFilter {
    /// A lap is quick when it is faster than `threshold` times the reference time
    pub threshold: f64,
    pub reference: QuickLapReference,
}

impl Default for QuickLapFilter {
    fn default() -> Self {
        Self {
            threshold: crate::config::DEFAULT_QUICK_LAP_THRESHOLD,
            reference: QuickLapReference::PersonalBest,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualifyingResult {
    /// 0 when the driver is not classified
    pub position: u32,
    pub driver_number: String,
    pub driver: String,
    pub team: String,
    pub q1: String,
    pub q2: String,
    pub q3: String,
    pub laps: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceResult {
    /// 0 when the driver is not classified
    pub position: u32,
    pub driver_number: String,
    pub driver: String,
    pub team: String,
    /// Finishing time, or the status for drivers that did not finish
    pub time: String,
    pub points: f64,
    pub laps: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PracticeResult {
    pub position: u32,
    pub driver_number: String,
    pub driver: String,
    pub team: String,
    /// Best quick lap
    pub time: String,
    pub laps: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassifiedResult {
    Qualifying(QualifyingResult),
    Race(RaceResult),
    Practice(PracticeResult),
}

impl ClassifiedResult {
    pub fn position(&self) -> u32 {
        match self {
            Self::Qualifying(r) => r.position,
            Self::Race(r) => r.position,
            Self::Practice(r) => r.position,
        }
    }

    pub fn driver(&self) -> &str {
        match self {
            Self::Qualifying(r) => &r.driver,
            Self::Race(r) => &r.driver,
            Self::Practice(r) => &r.driver,
        }
    }

    pub fn laps(&self) -> u32 {
        match self {
            Self::Qualifying(r) => r.laps,
            Self::Race(r) => r.laps,
            Self::Practice(r) => r.laps,
        }
    }
}

/// Classifies a session. Any malformed row fails the whole classification.
pub fn classify(
    session: &Session,
    quick_laps: QuickLapFilter,
) -> Result<Vec<ClassifiedResult>, PitwallError> {
    match session.key.session_type.classification() {
        Classification::TimedQualifying => classify_qualifying(session),
        Classification::RaceFinish => classify_race(session),
        Classification::Practice => classify_practice(session, quick_laps),
    }
}

fn classify_qualifying(session: &Session) -> Result<Vec<ClassifiedResult>, PitwallError> {
    let lap_counts = session.lap_table().lap_counts();
    Ok(session
        .results
        .iter()
        .map(|row| {
            ClassifiedResult::Qualifying(QualifyingResult {
                position: row.position.unwrap_or(0),
                driver_number: row.driver_number.clone(),
                driver: row.abbreviation.clone(),
                team: row.team_name.clone(),
                q1: format_optional_clock(row.q1),
                q2: format_optional_clock(row.q2),
                q3: format_optional_clock(row.q3),
                laps: lap_counts.get(&row.abbreviation).copied().unwrap_or(0),
            })
        })
        .collect())
}

fn classify_race(session: &Session) -> Result<Vec<ClassifiedResult>, PitwallError> {
    session
        .results
        .iter()
        .map(|row| race_row(row).map(ClassifiedResult::Race))
        .collect()
}

fn race_row(row: &ResultEntry) -> Result<RaceResult, PitwallError> {
    let status = row
        .status
        .as_deref()
        .ok_or_else(|| malformed(row, "missing status"))?;
    let time = if status == FINISHED_STATUS {
        row.time
            .map(format_clock)
            .unwrap_or_else(|| FINISHED_STATUS.to_string())
    } else {
        status.to_string()
    };
    let laps = row.laps.ok_or_else(|| malformed(row, "missing lap count"))?;

    Ok(RaceResult {
        position: row.position.unwrap_or(0),
        driver_number: row.driver_number.clone(),
        driver: row.abbreviation.clone(),
        team: row.team_name.clone(),
        time,
        points: row.points.unwrap_or(0.),
        laps,
    })
}

fn malformed(row: &ResultEntry, reason: &str) -> PitwallError {
    PitwallError::ClassificationError {
        reason: format!("{reason} for driver {}", row.abbreviation),
    }
}

fn classify_practice(
    session: &Session,
    filter: QuickLapFilter,
) -> Result<Vec<ClassifiedResult>, PitwallError> {
    let table = session.lap_table();
    let lap_counts: HashMap<String, u32> = table.lap_counts();

    table
        .quick_laps(filter.threshold, filter.reference)
        .into_iter()
        .sorted_by(|a, b| {
            a.lap_time
                .cmp(&b.lap_time)
                .then(a.lap_number.cmp(&b.lap_number))
                .then(a.driver.cmp(&b.driver))
        })
        .unique_by(|lap| lap.driver.clone())
        .enumerate()
        .map(|(idx, lap)| {
            let driver =
                session
                    .driver(&lap.driver)
                    .ok_or_else(|| PitwallError::ClassificationError {
                        reason: format!("driver {} missing from the entry list", lap.driver),
                    })?;
            Ok(ClassifiedResult::Practice(PracticeResult {
                position: idx as u32 + 1,
                driver_number: driver.number.clone(),
                driver: lap.driver.clone(),
                team: driver.team.clone(),
                time: format_optional_clock(lap.lap_time),
                laps: lap_counts.get(&lap.driver).copied().unwrap_or(0),
            }))
        })
        .collect()
}
