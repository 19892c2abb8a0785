//! Best-effort delivery of notifications outside the app.

use thiserror::Error;

use super::settings::PlatformPermission;
use super::types::Notification;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("platform notifications are not supported here")]
    Unsupported,

    #[error("platform notification permission denied")]
    Denied,

    #[error("platform notification failed: {0}")]
    Failed(String),
}

/// Port to the operating system's notification facility.
pub trait PlatformNotifier: Send + Sync {
    /// Attempt to show `notification`. Callers ignore the outcome beyond logging.
    fn show(&self, notification: &Notification) -> Result<(), PlatformError>;

    /// Current permission as the platform reports it.
    fn permission(&self) -> PlatformPermission {
        PlatformPermission::Default
    }
}

/// Drops everything. Used when no platform channel is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl PlatformNotifier for NoopNotifier {
    fn show(&self, _notification: &Notification) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn permission(&self) -> PlatformPermission {
        PlatformPermission::Denied
    }
}
