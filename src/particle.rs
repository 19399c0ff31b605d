//! Point-mass particles and the surface they paint on

use cgmath::{Angle, Deg, Vector2};

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Constant accelerations, copied into each particle at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Forces {
    /// Horizontal acceleration per tick
    pub wind: f32,
    /// Vertical acceleration per tick (screen space, +y is down)
    pub gravity: f32,
}

/// Anything a particle can be plotted onto.
///
/// Implementations are owned by whatever thread drives rendering; the
/// simulation never calls into a surface itself.
pub trait Surface {
    fn plot(&mut self, x: i32, y: i32, color: Rgb);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    position: Vector2<f32>,
    velocity: Vector2<f32>,
    forces: Forces,
    remaining: i32,
    color: Rgb,
    drawable: bool,
}

impl Particle {
    /// Launches a particle from `position` at `angle` (screen space, 270°
    /// points up) with the given `speed` in pixels per tick.
    pub fn new(
        position: Vector2<f32>,
        forces: Forces,
        lifetime: i32,
        angle: Deg<f32>,
        speed: f32,
        color: Rgb,
    ) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            position,
            velocity: Vector2::new(speed * cos, speed * sin),
            forces,
            remaining: lifetime,
            color,
            drawable: true,
        }
    }

    /// Marks the particle as bookkeeping-only when `drawable` is false.
    pub fn with_drawable(mut self, drawable: bool) -> Self {
        self.drawable = drawable;
        self
    }

    /// One Euler step: accelerate, move by the new velocity, age by a tick.
    pub fn advance(&mut self) {
        self.velocity.x += self.forces.wind;
        self.velocity.y += self.forces.gravity;
        self.position += self.velocity;
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0
    }

    /// Plots one point at the rounded position. Hidden and expired
    /// particles are skipped.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        if !self.drawable || self.is_expired() {
            return;
        }
        surface.plot(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
            self.color,
        );
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn velocity(&self) -> Vector2<f32> {
        self.velocity
    }

    pub fn forces(&self) -> Forces {
        self.forces
    }

    pub fn remaining_life(&self) -> i32 {
        self.remaining
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn is_drawable(&self) -> bool {
        self.drawable
    }
}
