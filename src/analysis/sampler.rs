use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{
    errors::{InvalidArgumentSnafu, PitwallError},
    session::{Session, TelemetrySample},
};

/// A telemetry sample as shown on charts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSample {
    /// Meters, rounded to 2 decimals
    pub distance: f64,
    pub speed: i64,
    pub throttle: i64,
    pub brake: i64,
    pub rpm: i64,
    pub gear: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampledTelemetry {
    pub driver: String,
    pub lap_number: u32,
    pub samples: Vec<ChartSample>,
}

/// A point of the track outline, colored by speed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.).round() / 100.
}

/// Every `stride`-th element, starting with the first one
pub(crate) fn every_nth<T>(items: &[T], stride: usize) -> Result<impl Iterator<Item = &T>, PitwallError> {
    ensure!(
        stride > 0,
        InvalidArgumentSnafu {
            field: "stride",
            reason: "must be at least 1",
        }
    );
    Ok(items.iter().step_by(stride))
}

/// Telemetry of the driver's fastest valid lap, keeping every `stride`-th sample
pub fn sample_fastest_lap(
    session: &Session,
    driver: &str,
    stride: usize,
) -> Result<SampledTelemetry, PitwallError> {
    let lap = session.lap_table().fastest_lap(driver)?;
    let samples = every_nth(lap.telemetry()?, stride)?
        .map(chart_sample)
        .collect();

    Ok(SampledTelemetry {
        driver: driver.to_string(),
        lap_number: lap.lap_number,
        samples,
    })
}

fn chart_sample(sample: &TelemetrySample) -> ChartSample {
    // float to int casts truncate towards zero
    ChartSample {
        distance: round2(sample.distance),
        speed: sample.speed as i64,
        throttle: sample.throttle as i64,
        brake: sample.brake as i64,
        rpm: sample.rpm as i64,
        gear: sample.gear as i64,
    }
}

/// Track outline from the driver's fastest valid lap
pub fn track_map(
    session: &Session,
    driver: &str,
    stride: usize,
) -> Result<Vec<TrackPoint>, PitwallError> {
    let lap = session.lap_table().fastest_lap(driver)?;
    Ok(every_nth(lap.telemetry()?, stride)?
        .map(|sample| TrackPoint {
            x: sample.x,
            y: sample.y,
            speed: sample.speed,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::{Lap, SessionKey, SessionType};

    fn telemetry(len: usize) -> Vec<TelemetrySample> {
        (0..len)
            .map(|i| TelemetrySample {
                time: i as f64 * 0.25,
                distance: i as f64 * 10.126,
                speed: 200.9 + i as f64,
                throttle: 99.7,
                brake: 0.4,
                rpm: 10_999.9,
                gear: 7,
                x: i as f64,
                y: -(i as f64),
            })
            .collect()
    }

    fn session() -> Session {
        let mut session = Session::new(SessionKey::new(2024, 1, SessionType::Race));
        session.laps = vec![
            Lap {
                driver: "VER".to_string(),
                lap_number: 1,
                lap_time: Some(Duration::from_millis(95_000)),
                telemetry: Some(telemetry(3)),
                ..Lap::default()
            },
            Lap {
                driver: "VER".to_string(),
                lap_number: 2,
                lap_time: Some(Duration::from_millis(93_000)),
                telemetry: Some(telemetry(10)),
                ..Lap::default()
            },
            Lap {
                driver: "HAM".to_string(),
                lap_number: 1,
                lap_time: None,
                telemetry: Some(telemetry(10)),
                ..Lap::default()
            },
            Lap {
                driver: "LEC".to_string(),
                lap_number: 1,
                lap_time: Some(Duration::from_millis(93_000)),
                telemetry: None,
                ..Lap::default()
            },
        ];
        session
    }

    #[test]
    fn test_samples_fastest_lap_with_stride() {
        let sampled = sample_fastest_lap(&session(), "VER", 4).unwrap();
        assert_eq!(sampled.lap_number, 2);
        assert_eq!(sampled.samples.len(), 3);
        let distances: Vec<f64> = sampled.samples.iter().map(|s| s.distance).collect();
        assert_eq!(distances, vec![0., 40.5, 81.01]);

        let first = &sampled.samples[0];
        assert_eq!(first.speed, 200);
        assert_eq!(first.throttle, 99);
        assert_eq!(first.brake, 0);
        assert_eq!(first.rpm, 10_999);
        assert_eq!(first.gear, 7);
    }

    #[test]
    fn test_stride_of_one_keeps_everything() {
        let sampled = sample_fastest_lap(&session(), "VER", 1).unwrap();
        assert_eq!(sampled.samples.len(), 10);
    }

    #[test]
    fn test_zero_stride_is_rejected() {
        assert!(matches!(
            sample_fastest_lap(&session(), "VER", 0),
            Err(PitwallError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_driver_without_timed_lap() {
        assert!(matches!(
            sample_fastest_lap(&session(), "HAM", 4),
            Err(PitwallError::NoValidLap { .. })
        ));
        assert!(matches!(
            track_map(&session(), "BOT", 2),
            Err(PitwallError::NoValidLap { .. })
        ));
    }

    #[test]
    fn test_lap_without_telemetry() {
        assert!(matches!(
            sample_fastest_lap(&session(), "LEC", 4),
            Err(PitwallError::TelemetryNotLoaded { .. })
        ));
    }

    #[test]
    fn test_track_map_positions() {
        let points = track_map(&session(), "VER", 2).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[1].x, 2.);
        assert_eq!(points[1].y, -2.);
        assert_eq!(points[1].speed, 202.9);
    }
}
