//! Re-triggerable emission bursts

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};

use crate::config::EmissionConfig;
use crate::emission::emit_burst;
use crate::error::{Result, SandboxError};
use crate::manager::ParticleManager;
use crate::signal::ShutdownToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionState {
    Idle,
    Emitting,
}

/// Runs at most one burst at a time on its own thread.
///
/// A burst is `cycle_count` cycles of: sleep `interval_ms`, emit one batch.
/// The cycle count is fixed when the burst starts; everything else is read
/// from the live config at the start of each cycle.
pub struct EmissionLoop {
    manager: Arc<ParticleManager>,
    config: Arc<RwLock<EmissionConfig>>,
    shutdown: ShutdownToken,
    emitting: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Flips the loop back to Idle however the burst thread ends
struct IdleOnDrop(Arc<AtomicBool>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl EmissionLoop {
    pub fn new(
        manager: Arc<ParticleManager>,
        config: Arc<RwLock<EmissionConfig>>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            manager,
            config,
            shutdown,
            emitting: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> EmissionState {
        if self.emitting.load(Ordering::Acquire) {
            EmissionState::Emitting
        } else {
            EmissionState::Idle
        }
    }

    /// Starts a burst. Returns `false` without doing anything if one is
    /// already in flight or shutdown has begun.
    pub fn trigger(&self) -> Result<bool> {
        if self.shutdown.is_shutdown() {
            return Ok(false);
        }
        if self
            .emitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("emission already running, trigger ignored");
            return Ok(false);
        }
        let idle = IdleOnDrop(Arc::clone(&self.emitting));

        let cycles = self.config.read().cycle_count;
        let manager = Arc::clone(&self.manager);
        let config = Arc::clone(&self.config);
        let shutdown = self.shutdown.clone();

        let mut worker = self.worker.lock();
        if let Some(previous) = worker.take() {
            // already past its last cycle; only the thread teardown remains
            if previous.join().is_err() {
                tracing::error!("previous emission burst panicked");
            }
        }

        // on spawn failure the closure, and with it `idle`, is dropped
        let handle = thread::Builder::new()
            .name("particle-emitter".into())
            .spawn(move || {
                let _idle = idle;
                run_burst(&manager, &config, cycles, &shutdown);
            })
            .map_err(|source| SandboxError::Spawn {
                name: "emitter",
                source,
            })?;
        *worker = Some(handle);

        Ok(true)
    }

    /// Waits for the current burst, if any, to finish or be cancelled.
    pub fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("emission burst panicked");
            }
        }
    }
}

fn run_burst(
    manager: &ParticleManager,
    config: &RwLock<EmissionConfig>,
    cycles: u32,
    shutdown: &ShutdownToken,
) {
    let mut rng = rand::thread_rng();
    tracing::info!(cycles, "emission started");

    for cycle in 0..cycles {
        let interval = config.read().interval();
        if shutdown.sleep(interval) {
            tracing::debug!(cycle, "emission cancelled by shutdown");
            return;
        }
        let snapshot = config.read().clone();
        let particles = emit_burst(&snapshot, &mut rng);
        tracing::debug!(cycle, count = particles.len(), "emitted");
        manager.add_particles(particles);
    }

    tracing::info!(cycles, "emission finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::shutdown_channel;
    use std::time::{Duration, Instant};

    fn quick_config(cycles: u32, interval_ms: u64) -> EmissionConfig {
        EmissionConfig {
            particle_amount: 4,
            life: 1_000,
            cycle_count: cycles,
            interval_ms,
            ..EmissionConfig::default()
        }
    }

    #[test]
    fn second_trigger_while_emitting_is_ignored() {
        let manager = Arc::new(ParticleManager::new());
        let config = Arc::new(RwLock::new(quick_config(3, 30)));
        let (_trigger, token) = shutdown_channel();
        let emitter = EmissionLoop::new(Arc::clone(&manager), config, token);

        assert_eq!(emitter.state(), EmissionState::Idle);
        assert!(emitter.trigger().unwrap());
        assert_eq!(emitter.state(), EmissionState::Emitting);
        assert!(!emitter.trigger().unwrap());

        emitter.join();
        assert_eq!(emitter.state(), EmissionState::Idle);
        assert_eq!(manager.len(), 3 * 4);

        assert!(emitter.trigger().unwrap());
        emitter.join();
        assert_eq!(manager.len(), 6 * 4);
    }

    #[test]
    fn config_changes_apply_to_later_cycles() {
        let manager = Arc::new(ParticleManager::new());
        let config = Arc::new(RwLock::new(quick_config(1, 1)));
        let (_trigger, token) = shutdown_channel();
        let emitter = EmissionLoop::new(Arc::clone(&manager), Arc::clone(&config), token);

        assert!(emitter.trigger().unwrap());
        emitter.join();
        assert_eq!(manager.len(), 4);

        config.write().particle_amount = 9;
        assert!(emitter.trigger().unwrap());
        emitter.join();
        assert_eq!(manager.len(), 4 + 9);
    }

    #[test]
    fn edits_during_the_interval_apply_to_that_batch() {
        let manager = Arc::new(ParticleManager::new());
        let config = Arc::new(RwLock::new(quick_config(1, 400)));
        let (_trigger, token) = shutdown_channel();
        let emitter = EmissionLoop::new(Arc::clone(&manager), Arc::clone(&config), token);

        assert!(emitter.trigger().unwrap());
        std::thread::sleep(Duration::from_millis(100));
        config.write().particle_amount = 9;
        emitter.join();

        assert_eq!(manager.len(), 9);
    }

    #[test]
    fn shutdown_mid_burst_returns_to_idle() {
        let manager = Arc::new(ParticleManager::new());
        let config = Arc::new(RwLock::new(quick_config(5, 60_000)));
        let (trigger, token) = shutdown_channel();
        let emitter = EmissionLoop::new(Arc::clone(&manager), config, token);

        assert!(emitter.trigger().unwrap());
        let start = Instant::now();
        trigger.fire();
        emitter.join();

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(emitter.state(), EmissionState::Idle);
        assert!(manager.is_empty());
        assert!(!emitter.trigger().unwrap(), "no new bursts after shutdown");
    }
}
