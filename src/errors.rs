// Error types for pitwall

use snafu::Snafu;
use std::{io, path::PathBuf};

/// Broad category of a failure, used by callers that only care whether a request
/// could not find its data, could not load it, or could not process it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    UpstreamFailure,
    ComputationFailure,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PitwallError {
    // Lookup errors
    #[snafu(display("Session {key} not found"))]
    SessionNotFound { key: String },
    #[snafu(display("Driver {driver} has no valid lap data"))]
    NoValidLap { driver: String },

    // Errors while loading session data
    #[snafu(display("Unknown session type: {code}"))]
    UnknownSessionType { code: String },
    #[snafu(display("Error reading session file {path:?}"))]
    SessionIOError { path: PathBuf, source: io::Error },
    #[snafu(display("Error parsing session file {path:?}"))]
    SessionParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("Error reading telemetry file {path:?}"))]
    TelemetryLoaderError { path: PathBuf, source: io::Error },

    // Analytics errors
    #[snafu(display("Classification failed: {reason}"))]
    ClassificationError { reason: String },
    #[snafu(display("Telemetry not loaded for lap {lap_number} of {driver}"))]
    TelemetryNotLoaded { driver: String, lap_number: u32 },
    #[snafu(display("Delta alignment failed: {reason}"))]
    AlignmentError { reason: String },
    #[snafu(display("Invalid clock string: {value}"))]
    InvalidClock { value: String },
    #[snafu(display("Invalid argument: {field} - {reason}"))]
    InvalidArgument { field: String, reason: String },
    #[snafu(display("Error serializing output"))]
    OutputSerializeError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl PitwallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound { .. } | Self::NoValidLap { .. } => ErrorKind::NotFound,
            Self::UnknownSessionType { .. }
            | Self::SessionIOError { .. }
            | Self::SessionParseError { .. }
            | Self::TelemetryLoaderError { .. } => ErrorKind::UpstreamFailure,
            Self::ClassificationError { .. }
            | Self::TelemetryNotLoaded { .. }
            | Self::AlignmentError { .. }
            | Self::InvalidClock { .. }
            | Self::InvalidArgument { .. }
            | Self::OutputSerializeError { .. }
            | Self::NoConfigDir
            | Self::ConfigIOError { .. }
            | Self::ConfigSerializeError { .. } => ErrorKind::ComputationFailure,
        }
    }
}
