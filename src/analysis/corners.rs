// Corner detection from a single lap's speed trace
//
// Corners are the slowest points of the lap: local minima of the smoothed speed that are
// slow enough not to be a lift on a straight. Minima closer than MIN_CORNER_SPACING_M to the
// previously kept corner are folded into it.

use serde::{Deserialize, Serialize};
use simple_moving_average::{SMA, SumTreeSMA};

use crate::{
    errors::PitwallError,
    session::{Session, TelemetrySample},
};

use super::sampler::round2;

const SMOOTHING_WINDOW: usize = 5;
const MAX_CORNER_SPEED: f64 = 280.;
const MIN_CORNER_SPACING_M: f64 = 50.;
const NO_PREVIOUS_CORNER_M: f64 = -1000.;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerEvent {
    /// "T1", "T2", ... in distance order. Not stable across laps.
    pub id: String,
    pub distance: f64,
    pub speed: i64,
    pub gear: i64,
}

/// Centered moving average of the speed trace. The first and last `WINDOW / 2` samples
/// have no value.
fn smoothed_speed(telemetry: &[TelemetrySample]) -> Vec<Option<f64>> {
    let half_window = SMOOTHING_WINDOW / 2;
    let mut smoothed = vec![None; telemetry.len()];
    let mut window = SumTreeSMA::<f64, f64, SMOOTHING_WINDOW>::new();

    for (idx, sample) in telemetry.iter().enumerate() {
        window.add_sample(sample.speed);
        if window.get_num_samples() == SMOOTHING_WINDOW {
            smoothed[idx - half_window] = Some(window.get_average());
        }
    }
    smoothed
}

/// Indices of strict local minima of the smoothed trace
fn local_minima(smoothed: &[Option<f64>]) -> Vec<usize> {
    smoothed
        .windows(3)
        .enumerate()
        .filter_map(|(idx, w)| match (w[0], w[1], w[2]) {
            (Some(prev), Some(cur), Some(next)) if cur < prev && cur < next => Some(idx + 1),
            _ => None,
        })
        .collect()
}

/// Detects the corners of a lap. An empty result is valid.
pub fn detect_corners(telemetry: &[TelemetrySample]) -> Vec<CornerEvent> {
    let smoothed = smoothed_speed(telemetry);

    let mut corners = Vec::new();
    let mut last_distance = NO_PREVIOUS_CORNER_M;
    for idx in local_minima(&smoothed) {
        let sample = &telemetry[idx];
        if sample.speed >= MAX_CORNER_SPEED {
            continue;
        }
        // first minimum of a cluster wins, even when a later one is slower
        let distance = round2(sample.distance);
        if distance - last_distance <= MIN_CORNER_SPACING_M {
            continue;
        }
        last_distance = distance;
        corners.push(CornerEvent {
            id: format!("T{}", corners.len() + 1),
            distance,
            speed: sample.speed as i64,
            gear: sample.gear as i64,
        });
    }
    corners
}

/// Corners of the driver's fastest valid lap
pub fn corners_for_driver(session: &Session, driver: &str) -> Result<Vec<CornerEvent>, PitwallError> {
    let lap = session.lap_table().fastest_lap(driver)?;
    Ok(detect_corners(lap.telemetry()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STEP_M: f64 = 10.;

    fn trace(speeds: &[f64]) -> Vec<TelemetrySample> {
        trace_with_step(speeds, STEP_M)
    }

    fn trace_with_step(speeds: &[f64], step_m: f64) -> Vec<TelemetrySample> {
        speeds
            .iter()
            .enumerate()
            .map(|(i, speed)| TelemetrySample {
                distance: i as f64 * step_m,
                speed: *speed,
                gear: if *speed < 150. { 3 } else { 7 },
                ..TelemetrySample::default()
            })
            .collect()
    }

    /// Flat at `base` with a symmetric V shaped dip centered at each index of `dips`
    fn with_dips(len: usize, base: f64, dips: &[(usize, f64)]) -> Vec<f64> {
        let mut speeds = vec![base; len];
        for (center, depth) in dips {
            for offset in 0..8usize {
                let speed = depth + offset as f64 * 20.;
                if speed >= base {
                    break;
                }
                speeds[center + offset] = speeds[center + offset].min(speed);
                speeds[center - offset] = speeds[center - offset].min(speed);
            }
        }
        speeds
    }

    #[test]
    fn test_constant_speed_has_no_corners() {
        assert!(detect_corners(&trace(&[250.; 100])).is_empty());
    }

    #[test]
    fn test_short_traces() {
        assert!(detect_corners(&[]).is_empty());
        assert!(detect_corners(&trace(&[100., 90., 80., 90., 100.])).is_empty());
    }

    #[test]
    fn test_smoothing_edges_have_no_value() {
        let smoothed = smoothed_speed(&trace(&[1., 2., 3., 4., 5., 6.]));
        assert_eq!(smoothed, vec![None, None, Some(3.), Some(4.), None, None]);
    }

    #[test]
    fn test_single_dip() {
        let speeds = with_dips(100, 300., &[(50, 90.)]);
        let corners = detect_corners(&trace(&speeds));
        assert_eq!(
            corners,
            vec![CornerEvent {
                id: "T1".to_string(),
                distance: 500.,
                speed: 90,
                gear: 3,
            }]
        );
    }

    #[test]
    fn test_dip_above_threshold_is_ignored() {
        let speeds = with_dips(100, 330., &[(50, 285.)]);
        assert!(detect_corners(&trace(&speeds)).is_empty());
    }

    #[test]
    fn test_plateau_is_not_a_minimum() {
        let mut speeds = vec![300.; 40];
        for speed in speeds.iter_mut().skip(10).take(20) {
            *speed = 100.;
        }
        assert!(detect_corners(&trace(&speeds)).is_empty());
    }

    /// Two dips six samples apart, the second one slower
    const DOUBLE_DIP: [f64; 11] = [
        200., 120., 100., 120., 200., 300., 200., 120., 90., 120., 200.,
    ];

    fn double_dip_trace(step_m: f64) -> Vec<TelemetrySample> {
        let mut speeds = vec![300.; 50];
        speeds[20..31].copy_from_slice(&DOUBLE_DIP);
        trace_with_step(&speeds, step_m)
    }

    #[test]
    fn test_close_minima_keep_the_first() {
        let telemetry = double_dip_trace(8.);
        assert_eq!(local_minima(&smoothed_speed(&telemetry)), vec![22, 28]);

        // 48m apart, the slower second minimum is folded into the first
        let corners = detect_corners(&telemetry);
        assert_eq!(corners.len(), 1);
        assert_eq!(corners[0].distance, 176.);
        assert_eq!(corners[0].speed, 100);
    }

    #[test]
    fn test_minima_just_over_spacing_are_kept() {
        let corners = detect_corners(&double_dip_trace(STEP_M));
        assert_eq!(corners.len(), 2);
        assert_eq!(corners[0].distance, 220.);
        assert_eq!(corners[1].distance, 280.);
        assert_eq!(corners[1].speed, 90);
    }

    #[test]
    fn test_distant_minima_are_both_kept() {
        let speeds = with_dips(200, 300., &[(40, 80.), (120, 120.)]);
        let corners = detect_corners(&trace(&speeds));
        assert_eq!(corners.len(), 2);
        assert_eq!(corners[0].id, "T1");
        assert_eq!(corners[0].distance, 400.);
        assert_eq!(corners[1].id, "T2");
        assert_eq!(corners[1].distance, 1200.);
        assert_eq!(corners[1].speed, 120);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_corners_are_spaced_and_slow(
            speeds in prop::collection::vec(60.0f64..340.0, 0..300)
        ) {
            let telemetry = trace(&speeds);
            let corners = detect_corners(&telemetry);
            for (idx, corner) in corners.iter().enumerate() {
                prop_assert_eq!(&corner.id, &format!("T{}", idx + 1));
                prop_assert!((corner.speed as f64) < MAX_CORNER_SPEED);
            }
            for pair in corners.windows(2) {
                prop_assert!(pair[1].distance - pair[0].distance > MIN_CORNER_SPACING_M);
            }
            prop_assert_eq!(corners.clone(), detect_corners(&telemetry));
        }
    }
}
