// Library interface for pitwall
// This allows integration tests and benchmarks to access internal modules

pub mod analysis;
pub mod clock;
pub mod config;
pub mod errors;
pub mod session;

// Re-export commonly used types
pub use analysis::{AnalyticsSettings, SessionAnalytics};
pub use config::AnalyticsConfig;
pub use errors::{ErrorKind, PitwallError};
pub use session::{
    CachedSessionProvider, FileSessionProvider, LoadOptions, Session, SessionKey,
    SessionProvider, SessionType,
};
