//! Interactive 2D particle sandbox: simulation core
//!
//! - `Particle` — point mass with constant wind/gravity and a tick lifetime
//! - `ParticleManager` — lock-guarded population shared by every thread
//! - `emit_burst` — config snapshot + randomness -> one burst of particles
//! - `SimulationLoop` / `EmissionLoop` — the tick thread and burst threads
//! - `ParticleSandbox` — owns all of the above for a front-end

pub mod config;
pub mod emission;
pub mod emitter;
pub mod error;
pub mod manager;
pub mod particle;
pub mod sandbox;
pub mod signal;
pub mod simulation;

pub use config::{EmissionConfig, Preset, SandboxSettings};
pub use emission::{SpawnSource, emit_burst};
pub use emitter::{EmissionLoop, EmissionState};
pub use error::{ConfigError, Result, SandboxError};
pub use manager::{ParticleManager, TickStats};
pub use particle::{Forces, Particle, Rgb, Surface};
pub use sandbox::ParticleSandbox;
pub use signal::{NoRedraw, RedrawSink, ShutdownToken, ShutdownTrigger, shutdown_channel};
pub use simulation::SimulationLoop;
