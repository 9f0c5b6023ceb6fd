use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use timer::{Guard, Timer};

use crate::index::IndexCommand;

/// Periodically queues a commit while writes are pending.
///
/// The task stops when dropped.
pub(crate) struct AutoCommit {
    // declared first so the guard cancels before the timer shuts down
    _guard: Guard,
    _timer: Timer,
}

impl AutoCommit {
    /// Returns `None` when the interval is zero or out of range.
    pub(crate) fn start(
        interval: Duration,
        sender: Sender<IndexCommand>,
        pending: Arc<AtomicUsize>,
    ) -> Option<AutoCommit> {
        if interval.is_zero() {
            log::warn!("Autocommit interval is zero, autocommit disabled");
            return None;
        }
        let period = match chrono::Duration::from_std(interval) {
            Ok(period) => period,
            Err(e) => {
                log::error!("Invalid autocommit interval {:?}: {}, autocommit disabled", interval, e);
                return None;
            }
        };

        let timer = Timer::new();
        let guard = timer.schedule_repeating(period, move || {
            if pending.load(Ordering::Acquire) == 0 {
                return;
            }
            match sender.try_send(IndexCommand::Commit(None)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::debug!("Command queue full, autocommit deferred");
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::debug!("Full-text writer gone, autocommit skipped");
                }
            }
        });
        Some(AutoCommit {
            _guard: guard,
            _timer: timer,
        })
    }
}
