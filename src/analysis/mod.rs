// Session analytics
// Each operation loads the session it needs through the provider and runs one of the pure
// analysis functions on it. Nothing is kept between calls apart from what the provider caches.

pub mod classifier;
pub mod corners;
pub mod delta;
pub mod sampler;
pub mod stints;

use log::debug;

use crate::{
    config::AnalyticsConfig,
    errors::PitwallError,
    session::{LoadOptions, SessionKey, SessionProvider, SessionType, lap_table::QuickLapReference},
};

pub use classifier::{ClassifiedResult, QuickLapFilter, classify};
pub use corners::{CornerEvent, corners_for_driver, detect_corners};
pub use delta::{DeltaPoint, compute_delta};
pub use sampler::{SampledTelemetry, TrackPoint, sample_fastest_lap, track_map};
pub use stints::{Stint, segment_stints};

/// Strides and filters used by [`SessionAnalytics`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyticsSettings {
    pub telemetry_stride: usize,
    pub map_stride: usize,
    pub delta_stride: usize,
    pub quick_laps: QuickLapFilter,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for AnalyticsSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            telemetry_stride: config.telemetry_stride,
            map_stride: config.map_stride,
            delta_stride: config.delta_stride,
            quick_laps: QuickLapFilter {
                threshold: config.quick_lap_threshold,
                reference: config.quick_lap_reference,
            },
        }
    }
}

impl AnalyticsSettings {
    pub fn with_quick_lap_reference(mut self, reference: QuickLapReference) -> Self {
        self.quick_laps.reference = reference;
        self
    }
}

/// Entry point for callers that identify sessions by year, round and session type
pub struct SessionAnalytics<P> {
    provider: P,
    settings: AnalyticsSettings,
}

impl<P: SessionProvider> SessionAnalytics<P> {
    pub fn new(provider: P, settings: AnalyticsSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    fn key(year: u16, round: u8, session_type: SessionType) -> SessionKey {
        SessionKey::new(year, round, session_type)
    }

    pub fn session_results(
        &self,
        year: u16,
        round: u8,
        session_type: SessionType,
    ) -> Result<Vec<ClassifiedResult>, PitwallError> {
        let key = Self::key(year, round, session_type);
        debug!("Classifying {}", key);
        let session = self.provider.load_session(&key, LoadOptions::laps_only())?;
        classify(&session, self.settings.quick_laps)
    }

    pub fn telemetry(
        &self,
        year: u16,
        round: u8,
        session_type: SessionType,
        driver: &str,
    ) -> Result<SampledTelemetry, PitwallError> {
        let key = Self::key(year, round, session_type);
        debug!("Sampling telemetry of {} in {}", driver, key);
        let session = self
            .provider
            .load_session(&key, LoadOptions::with_telemetry())?;
        sample_fastest_lap(&session, driver, self.settings.telemetry_stride)
    }

    pub fn track_map(
        &self,
        year: u16,
        round: u8,
        session_type: SessionType,
        driver: &str,
    ) -> Result<Vec<TrackPoint>, PitwallError> {
        let key = Self::key(year, round, session_type);
        debug!("Building track map from {} in {}", driver, key);
        let session = self
            .provider
            .load_session(&key, LoadOptions::with_telemetry())?;
        track_map(&session, driver, self.settings.map_stride)
    }

    pub fn corners(
        &self,
        year: u16,
        round: u8,
        session_type: SessionType,
        driver: &str,
    ) -> Result<Vec<CornerEvent>, PitwallError> {
        let key = Self::key(year, round, session_type);
        debug!("Detecting corners from {} in {}", driver, key);
        let session = self
            .provider
            .load_session(&key, LoadOptions::with_telemetry())?;
        corners_for_driver(&session, driver)
    }

    pub fn strategy(
        &self,
        year: u16,
        round: u8,
        session_type: SessionType,
        driver: &str,
    ) -> Result<Vec<Stint>, PitwallError> {
        let key = Self::key(year, round, session_type);
        let session = self.provider.load_session(&key, LoadOptions::laps_only())?;
        Ok(segment_stints(&session, driver))
    }

    pub fn delta(
        &self,
        year: u16,
        round: u8,
        session_type: SessionType,
        driver1: &str,
        driver2: &str,
    ) -> Result<Vec<DeltaPoint>, PitwallError> {
        let key = Self::key(year, round, session_type);
        debug!("Aligning {} against {} in {}", driver2, driver1, key);
        let session = self
            .provider
            .load_session(&key, LoadOptions::with_telemetry())?;
        compute_delta(&session, driver1, driver2, self.settings.delta_stride)
    }
}
