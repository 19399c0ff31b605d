//! The fixed-tick simulation thread

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Result, SandboxError};
use crate::manager::ParticleManager;
use crate::signal::{RedrawSink, ShutdownToken};

/// Handle to the running simulation thread.
///
/// Each iteration sleeps one tick, advances the population and posts a
/// redraw. It stops only when the shutdown token fires; a tick that fails
/// or panics is logged and the next one runs as normal.
pub struct SimulationLoop {
    handle: Option<JoinHandle<()>>,
}

impl SimulationLoop {
    pub fn spawn(
        manager: Arc<ParticleManager>,
        redraw: Arc<dyn RedrawSink>,
        tick: Duration,
        shutdown: ShutdownToken,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("particle-sim".into())
            .spawn(move || run(&manager, redraw.as_ref(), tick, &shutdown))
            .map_err(|source| SandboxError::Spawn {
                name: "simulation",
                source,
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Waits for the thread to exit. Only returns promptly once the
    /// shutdown token has fired.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("simulation thread panicked outside a tick");
            }
        }
    }
}

fn run(manager: &ParticleManager, redraw: &dyn RedrawSink, tick: Duration, shutdown: &ShutdownToken) {
    tracing::debug!(tick_ms = tick.as_millis() as u64, "simulation loop started");
    let mut ticks: u64 = 0;

    while !shutdown.sleep(tick) {
        ticks += 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let stats = manager.update_particles();
            tracing::trace!(tick = ticks, alive = stats.advanced - stats.reaped, reaped = stats.reaped);
            redraw.request_redraw()
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(tick = ticks, "redraw request failed: {err}"),
            Err(payload) => {
                tracing::error!(tick = ticks, "simulation tick panicked: {}", panic_message(&*payload))
            }
        }
    }

    tracing::debug!(ticks, "simulation loop stopped");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
