//! Turns an `EmissionConfig` into concrete particles

use cgmath::{Deg, Vector2};
use rand::Rng;
use rand::distributions::Standard;

use crate::config::EmissionConfig;
use crate::particle::{Particle, Rgb};

/// Screen-space "straight up"; +y grows downwards
pub const ANGLE_UP: f32 = 270.0;

/// Uniform sample in [0, 1)
fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.sample(Standard)
}

/// Position and colour shared by every particle of one burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSource {
    pub position: Vector2<f32>,
    pub color: Rgb,
}

impl SpawnSource {
    pub fn sample<R: Rng + ?Sized>(config: &EmissionConfig, rng: &mut R) -> Self {
        let x = config.min_pos[0] + unit(rng) * (config.max_pos[0] - config.min_pos[0]);
        let y = config.min_pos[1] + unit(rng) * (config.max_pos[1] - config.min_pos[1]);

        let mut channel = |i: usize| {
            let (min, max) = (config.color_min[i], config.color_max[i]);
            let span = max.saturating_sub(min) as f32;
            // floor keeps the result strictly below `max` unless the range is empty
            min.saturating_add((unit(rng) * span).floor() as u8)
        };
        let color = Rgb::new(channel(0), channel(1), channel(2));

        Self {
            position: Vector2::new(x, y),
            color,
        }
    }
}

/// Launch angle drawn uniformly from `angle_range` degrees centred on up
pub fn launch_angle<R: Rng + ?Sized>(angle_range: f32, rng: &mut R) -> Deg<f32> {
    Deg(ANGLE_UP - angle_range / 2.0 + unit(rng) * angle_range)
}

/// Produces exactly `particle_amount` particles from one spawn source.
/// Only angle and speed vary between them.
pub fn emit_burst<R: Rng + ?Sized>(config: &EmissionConfig, rng: &mut R) -> Vec<Particle> {
    let source = SpawnSource::sample(config, rng);
    let forces = config.forces();

    (0..config.particle_amount)
        .map(|_| {
            let angle = launch_angle(config.angle_range, rng);
            let speed = unit(rng) * config.speed;
            Particle::new(source.position, forces, config.life, angle, speed, source.color)
        })
        .collect()
}
