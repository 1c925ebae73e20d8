use tracing::info;

use crate::error::NotifyError;
use crate::events::NotificationKind;
use crate::ports::Notifier;
use crate::timer::TimerMode;

/// Notifier that only writes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, mode: TimerMode) -> Result<(), NotifyError> {
        match kind {
            NotificationKind::PhaseCompleted => info!(%mode, "{mode} finished"),
        }
        Ok(())
    }
}
