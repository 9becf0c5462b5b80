// Read-only views over the laps of a session

use std::{collections::HashMap, time::Duration};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::PitwallError;

use super::Lap;

/// Lap time a quick lap is compared against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuickLapReference {
    /// The fastest lap of the same driver
    #[default]
    PersonalBest,
    /// The fastest lap of anybody in the session
    SessionBest,
}

/// Borrowed accessor over a session's laps. Laps are kept in session order.
#[derive(Clone, Copy, Debug)]
pub struct LapTable<'a> {
    laps: &'a [Lap],
}

impl<'a> LapTable<'a> {
    pub fn new(laps: &'a [Lap]) -> Self {
        Self { laps }
    }

    pub fn laps(&self) -> impl Iterator<Item = &'a Lap> + use<'a> {
        self.laps.iter()
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    pub fn by_driver(&self, driver: &str) -> impl Iterator<Item = &'a Lap> + use<'a> {
        let driver = driver.to_string();
        self.laps.iter().filter(move |lap| lap.driver == driver)
    }

    /// Laps with a recorded lap time
    pub fn timed(&self) -> impl Iterator<Item = &'a Lap> + use<'a> {
        self.laps.iter().filter(|lap| lap.is_timed())
    }

    /// Total number of lap rows per driver, timed or not
    pub fn lap_counts(&self) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for lap in self.laps {
            *counts.entry(lap.driver.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// The driver's fastest timed lap. Ties go to the earlier lap.
    pub fn fastest_lap(&self, driver: &str) -> Result<&'a Lap, PitwallError> {
        self.by_driver(driver)
            .filter_map(|lap| lap.lap_time.map(|time| (time, lap)))
            .min_by_key(|(time, lap)| (*time, lap.lap_number))
            .map(|(_, lap)| lap)
            .ok_or_else(|| PitwallError::NoValidLap {
                driver: driver.to_string(),
            })
    }

    pub fn session_best(&self) -> Option<Duration> {
        self.laps.iter().filter_map(|lap| lap.lap_time).min()
    }

    pub fn personal_bests(&self) -> HashMap<&'a str, Duration> {
        let mut bests: HashMap<&'a str, Duration> = HashMap::new();
        for lap in self.laps {
            if let Some(time) = lap.lap_time {
                bests
                    .entry(lap.driver.as_str())
                    .and_modify(|best| *best = (*best).min(time))
                    .or_insert(time);
            }
        }
        bests
    }

    /// Timed laps that are neither in nor out laps and are within `threshold` times the
    /// reference lap time.
    pub fn quick_laps(&self, threshold: f64, reference: QuickLapReference) -> Vec<&'a Lap> {
        let session_best = self.session_best();
        let personal_bests = self.personal_bests();

        self.timed()
            .filter(|lap| !lap.pit_in && !lap.pit_out)
            .filter(|lap| {
                let reference_time = match reference {
                    QuickLapReference::PersonalBest => {
                        personal_bests.get(lap.driver.as_str()).copied()
                    }
                    QuickLapReference::SessionBest => session_best,
                };
                match (lap.lap_time, reference_time) {
                    (Some(time), Some(best)) => {
                        time.as_secs_f64() < best.as_secs_f64() * threshold
                    }
                    _ => false,
                }
            })
            .collect()
    }

    /// The driver's laps grouped by stint id, ascending. Laps keep their session order
    /// within a stint. Laps without a stint id are left out.
    pub fn stints(&self, driver: &str) -> Vec<(u32, Vec<&'a Lap>)> {
        self.by_driver(driver)
            .filter_map(|lap| lap.stint.map(|stint| (stint, lap)))
            .sorted_by_key(|(stint, _)| *stint)
            .chunk_by(|(stint, _)| *stint)
            .into_iter()
            .map(|(stint, laps)| (stint, laps.map(|(_, lap)| lap).collect()))
            .collect()
    }
}
