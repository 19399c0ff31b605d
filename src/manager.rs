//! The shared particle population

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::particle::{Particle, Surface};

/// Owns every live particle behind a single lock.
///
/// Insert, advance-and-reap and iterate-and-render each take the lock for
/// exactly one pass, so callers on different threads only ever see a whole
/// population. A particle inserted while an update holds the lock simply
/// waits for the next tick.
#[derive(Default)]
pub struct ParticleManager {
    particles: Mutex<Vec<Particle>>,
}

/// Outcome of one `update_particles` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    pub advanced: usize,
    pub reaped: usize,
}

impl ParticleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_particle(&self, particle: Particle) {
        self.particles.lock().push(particle);
    }

    /// Inserts a whole burst under one lock acquisition
    pub fn add_particles<I>(&self, particles: I)
    where
        I: IntoIterator<Item = Particle>,
    {
        self.particles.lock().extend(particles);
    }

    /// Advances every particle once, then drops the expired ones.
    pub fn update_particles(&self) -> TickStats {
        let mut particles = self.particles.lock();

        particles.par_iter_mut().for_each(Particle::advance);

        let advanced = particles.len();
        particles.retain(|p| !p.is_expired());

        TickStats {
            advanced,
            reaped: advanced - particles.len(),
        }
    }

    pub fn draw_particles<S: Surface + ?Sized>(&self, surface: &mut S) {
        let particles = self.particles.lock();
        for particle in particles.iter() {
            particle.render(&mut *surface);
        }
    }

    pub fn len(&self) -> usize {
        self.particles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.lock().is_empty()
    }

    /// Copies the current population out from under the lock
    pub fn snapshot(&self) -> Vec<Particle> {
        self.particles.lock().clone()
    }
}
