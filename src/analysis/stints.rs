use serde::{Deserialize, Serialize};

use crate::session::Session;

const UNKNOWN_COMPOUND: &str = "UNKNOWN";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stint {
    pub stint: u32,
    pub compound: String,
    pub start_lap: u32,
    pub end_lap: u32,
    /// Span of lap numbers, gaps in the lap rows still count
    pub laps_count: u32,
}

/// The driver's tyre stints in stint order. Untimed laps count too.
pub fn segment_stints(session: &Session, driver: &str) -> Vec<Stint> {
    session
        .lap_table()
        .stints(driver)
        .into_iter()
        .filter_map(|(stint, laps)| {
            let compound = laps
                .first()?
                .compound
                .clone()
                .unwrap_or_else(|| UNKNOWN_COMPOUND.to_string());
            let start_lap = laps.iter().map(|lap| lap.lap_number).min()?;
            let end_lap = laps.iter().map(|lap| lap.lap_number).max()?;
            Some(Stint {
                stint,
                compound,
                start_lap,
                end_lap,
                laps_count: end_lap - start_lap + 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::{Lap, SessionKey, SessionType};

    fn lap(lap_number: u32, stint: u32, compound: &str, timed: bool) -> Lap {
        Lap {
            driver: "VER".to_string(),
            lap_number,
            lap_time: timed.then(|| Duration::from_millis(95_000)),
            compound: Some(compound.to_string()),
            stint: Some(stint),
            ..Lap::default()
        }
    }

    fn session(laps: Vec<Lap>) -> Session {
        let mut session = Session::new(SessionKey::new(2024, 8, SessionType::Race));
        session.laps = laps;
        session
    }

    #[test]
    fn test_two_stints() {
        let mut laps: Vec<Lap> = (1..=5).map(|n| lap(n, 1, "A", true)).collect();
        laps.extend((6..=10).map(|n| lap(n, 2, "B", true)));
        let stints = segment_stints(&session(laps), "VER");
        assert_eq!(
            stints,
            vec![
                Stint {
                    stint: 1,
                    compound: "A".to_string(),
                    start_lap: 1,
                    end_lap: 5,
                    laps_count: 5,
                },
                Stint {
                    stint: 2,
                    compound: "B".to_string(),
                    start_lap: 6,
                    end_lap: 10,
                    laps_count: 5,
                },
            ]
        );
    }

    #[test]
    fn test_gap_in_lap_numbers_counts_full_span() {
        let laps = vec![lap(1, 1, "MEDIUM", false), lap(2, 1, "MEDIUM", true), lap(5, 1, "MEDIUM", true)];
        let stints = segment_stints(&session(laps), "VER");
        assert_eq!(stints.len(), 1);
        assert_eq!(stints[0].start_lap, 1);
        assert_eq!(stints[0].end_lap, 5);
        assert_eq!(stints[0].laps_count, 5);
    }

    #[test]
    fn test_compound_comes_from_first_lap() {
        let mut laps = vec![lap(1, 1, "SOFT", true), lap(2, 1, "HARD", true)];
        laps[0].compound = None;
        let stints = segment_stints(&session(laps), "VER");
        assert_eq!(stints[0].compound, UNKNOWN_COMPOUND);
    }

    #[test]
    fn test_unknown_driver_has_no_stints() {
        let laps = vec![lap(1, 1, "SOFT", true)];
        assert!(segment_stints(&session(laps), "HAM").is_empty());
    }
}
