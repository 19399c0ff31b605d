//! Cooperative shutdown and the redraw hand-off

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;

use crate::error::{Result, SandboxError};

/// Creates a linked trigger/token pair.
///
/// Nothing is ever sent on the channel: firing drops the only sender, and
/// every receiver observes the disconnect at once, including ones parked
/// in `recv_timeout`.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownToken) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (
        ShutdownTrigger {
            tx: Mutex::new(Some(tx)),
        },
        ShutdownToken { rx },
    )
}

pub struct ShutdownTrigger {
    tx: Mutex<Option<Sender<()>>>,
}

impl ShutdownTrigger {
    /// Idempotent
    pub fn fire(&self) {
        if self.tx.lock().take().is_some() {
            tracing::debug!("shutdown requested");
        }
    }

    pub fn is_fired(&self) -> bool {
        self.tx.lock().is_none()
    }
}

#[derive(Clone)]
pub struct ShutdownToken {
    rx: Receiver<()>,
}

impl ShutdownToken {
    /// Sleeps for `duration` or until shutdown, whichever comes first.
    /// Returns `true` if shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
            // never sent, but a message can only mean "stop"
            Ok(()) => true,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Asks whatever thread owns the rendering surface to repaint.
///
/// Implementations must only post the request; the painting itself happens
/// later on the owning thread.
pub trait RedrawSink: Send + Sync {
    fn request_redraw(&self) -> Result<()>;
}

/// A full channel already carries a pending redraw, so that counts as
/// success.
impl RedrawSink for Sender<()> {
    fn request_redraw(&self) -> Result<()> {
        match self.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Disconnected(())) => Err(SandboxError::RedrawDisconnected),
        }
    }
}

/// Discards redraw requests; for headless runs.
pub struct NoRedraw;

impl RedrawSink for NoRedraw {
    fn request_redraw(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn sleep_times_out_while_running() {
        let (trigger, token) = shutdown_channel();
        assert!(!token.sleep(Duration::from_millis(5)));
        assert!(!token.is_shutdown());
        assert!(!trigger.is_fired());
    }

    #[test]
    fn fire_interrupts_sleep() {
        let (trigger, token) = shutdown_channel();
        let sleeper = {
            let token = token.clone();
            std::thread::spawn(move || {
                let started = Instant::now();
                let stopped = token.sleep(Duration::from_secs(30));
                (stopped, started.elapsed())
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        trigger.fire();
        trigger.fire();

        let (stopped, elapsed) = sleeper.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(5));
        assert!(token.is_shutdown());
        assert!(trigger.is_fired());
    }

    #[test]
    fn sender_sink_coalesces_and_reports_disconnect() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.request_redraw().unwrap();
        tx.request_redraw().unwrap();
        assert_eq!(rx.len(), 1);

        drop(rx);
        assert!(matches!(
            tx.request_redraw(),
            Err(SandboxError::RedrawDisconnected)
        ));
    }
}
