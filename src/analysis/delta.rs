// Time delta between the fastest laps of two drivers
//
// The second driver's lap is the reference: for every reference sample we look up how long
// the first driver needed to reach the same distance. A positive delta means the second
// driver is ahead at that point of the lap.

use serde::{Deserialize, Serialize};

use crate::{
    errors::PitwallError,
    session::{Session, TelemetrySample},
};

use super::sampler::every_nth;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaPoint {
    /// Distance along the reference lap
    pub distance: f64,
    /// Seconds
    pub delta: f64,
}

fn alignment_error(reason: impl Into<String>) -> PitwallError {
    PitwallError::AlignmentError {
        reason: reason.into(),
    }
}

fn check_trace(name: &str, telemetry: &[TelemetrySample]) -> Result<(), PitwallError> {
    if telemetry.len() < 2 {
        return Err(alignment_error(format!(
            "{name} lap has {} telemetry samples, at least 2 are needed",
            telemetry.len()
        )));
    }
    if telemetry
        .iter()
        .any(|s| !s.distance.is_finite() || !s.time.is_finite())
    {
        return Err(alignment_error(format!("{name} lap has non finite samples")));
    }
    if telemetry.windows(2).any(|w| w[1].distance < w[0].distance) {
        return Err(alignment_error(format!("{name} lap distance is not increasing")));
    }
    Ok(())
}

/// Linear interpolation of the lap time at `distance`, clamped to the ends of the trace.
/// `telemetry` must be ordered by distance.
fn time_at_distance(telemetry: &[TelemetrySample], distance: f64) -> f64 {
    let idx = telemetry.partition_point(|s| s.distance <= distance);
    if idx == 0 {
        return telemetry[0].time;
    }
    if idx == telemetry.len() {
        return telemetry[idx - 1].time;
    }
    let (before, after) = (&telemetry[idx - 1], &telemetry[idx]);
    let ratio = (distance - before.distance) / (after.distance - before.distance);
    before.time + ratio * (after.time - before.time)
}

/// Delta of `comparison` against `reference` at each of the reference samples
pub fn delta_time(
    reference: &[TelemetrySample],
    comparison: &[TelemetrySample],
) -> Result<Vec<f64>, PitwallError> {
    check_trace("reference", reference)?;
    check_trace("comparison", comparison)?;
    Ok(reference
        .iter()
        .map(|sample| time_at_distance(comparison, sample.distance) - sample.time)
        .collect())
}

/// Delta curve of `driver2` against `driver1`, keeping every `stride`-th point
pub fn compute_delta(
    session: &Session,
    driver1: &str,
    driver2: &str,
    stride: usize,
) -> Result<Vec<DeltaPoint>, PitwallError> {
    let table = session.lap_table();
    let comparison = table.fastest_lap(driver1)?.telemetry()?;
    let reference = table.fastest_lap(driver2)?.telemetry()?;

    let deltas = delta_time(reference, comparison)?;
    // zip stops at the shorter of the two series
    let points: Vec<DeltaPoint> = reference
        .iter()
        .zip(deltas)
        .map(|(sample, delta)| DeltaPoint {
            distance: sample.distance,
            delta,
        })
        .collect();

    Ok(every_nth(&points, stride)?.cloned().collect())
}
