use goalsave_core::notification::{PlatformError, PlatformPermission};
use goalsave_core::{Notification, PlatformNotifier};

/// Shows notifications on stderr. A terminal never refuses, so permission is
/// always granted; delivery still needs `platform.enabled` in the settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl PlatformNotifier for TerminalNotifier {
    fn show(&self, notification: &Notification) -> Result<(), PlatformError> {
        eprintln!(
            "\x07[{}] {}: {}",
            notification.kind.as_str(),
            notification.title,
            notification.message
        );
        Ok(())
    }

    fn permission(&self) -> PlatformPermission {
        PlatformPermission::Granted
    }
}
