//! Wires the manager, live config and both loops together

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{EmissionConfig, SandboxSettings};
use crate::emitter::{EmissionLoop, EmissionState};
use crate::error::{ConfigError, Result};
use crate::manager::ParticleManager;
use crate::particle::Surface;
use crate::signal::{RedrawSink, ShutdownTrigger, shutdown_channel};
use crate::simulation::SimulationLoop;

/// The whole simulation core as seen by a front-end.
///
/// Starting it spawns the simulation thread; `start_emission` spawns burst
/// threads on demand. Dropping it shuts both down and waits for them.
pub struct ParticleSandbox {
    manager: Arc<ParticleManager>,
    config: Arc<RwLock<EmissionConfig>>,
    emitter: EmissionLoop,
    simulation: SimulationLoop,
    trigger: ShutdownTrigger,
}

impl ParticleSandbox {
    pub fn start(settings: SandboxSettings, redraw: Arc<dyn RedrawSink>) -> Result<Self> {
        settings.validate()?;

        let tick = settings.tick_interval();
        let manager = Arc::new(ParticleManager::new());
        let config = Arc::new(RwLock::new(settings.emission));
        let (trigger, token) = shutdown_channel();

        let simulation = SimulationLoop::spawn(
            Arc::clone(&manager),
            redraw,
            tick,
            token.clone(),
        )?;
        let emitter = EmissionLoop::new(Arc::clone(&manager), Arc::clone(&config), token);

        tracing::info!(
            tick_ms = settings.tick_interval_ms,
            preset = settings.preset.map(|p| p.name()),
            "particle sandbox started"
        );

        Ok(Self {
            manager,
            config,
            emitter,
            simulation,
            trigger,
        })
    }

    /// Returns `Ok(false)` when a burst is already running.
    pub fn start_emission(&self) -> Result<bool> {
        self.emitter.trigger()
    }

    pub fn is_emitting(&self) -> bool {
        self.emitter.state() == EmissionState::Emitting
    }

    pub fn config(&self) -> EmissionConfig {
        self.config.read().clone()
    }

    /// Validates and swaps in a new config; bursts pick it up at their
    /// next cycle.
    pub fn set_config(&self, config: EmissionConfig) -> std::result::Result<(), ConfigError> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Paints the current population; call from the thread that owns
    /// `surface`.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.manager.draw_particles(surface);
    }

    pub fn particle_count(&self) -> usize {
        self.manager.len()
    }

    pub fn manager(&self) -> &Arc<ParticleManager> {
        &self.manager
    }

    pub fn is_running(&self) -> bool {
        self.simulation.is_running()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.trigger.is_fired() {
            return;
        }
        self.trigger.fire();
        self.simulation.join();
        self.emitter.join();
        tracing::info!("particle sandbox stopped");
    }
}

impl Drop for ParticleSandbox {
    fn drop(&mut self) {
        self.stop();
    }
}
