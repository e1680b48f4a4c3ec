//! Transient visual effects
//!
//! Loss debris and win confetti. Nothing here feeds back into gameplay; the
//! phase machine only asks for bursts and the tick advances them.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::TAU;

use crate::tuning::Tuning;

/// Confetti palette (0xRRGGBB)
pub const CONFETTI_COLORS: [u32; 6] = [0xff4d6d, 0xffd166, 0x06d6a0, 0x118ab2, 0xef476f, 0xf8f9fa];

/// Debris color, matches the player's tracksuit
pub const DEBRIS_COLOR: u32 = 0x2a9d8f;

/// Maximum particles alive across both pools
pub const MAX_PARTICLES: usize = 512;

/// A short-lived effect particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Seconds left
    pub life: f32,
    /// Lifetime at spawn, for fading
    pub max_life: f32,
    pub color: u32,
    pub size: f32,
}

impl Particle {
    /// Opacity, proportional to remaining lifetime
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// Owner of every live particle
#[derive(Debug, Clone)]
pub struct Effects {
    pub debris: Vec<Particle>,
    pub confetti: Vec<Particle>,
    rng: Pcg32,
}

impl Effects {
    pub fn new(seed: u64) -> Self {
        Self {
            debris: Vec::new(),
            confetti: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.debris.is_empty() && self.confetti.is_empty()
    }

    pub fn len(&self) -> usize {
        self.debris.len() + self.confetti.len()
    }

    pub fn clear(&mut self) {
        self.debris.clear();
        self.confetti.clear();
    }

    /// Random direction on the unit sphere
    fn random_unit(&mut self) -> Vec3 {
        let y: f32 = self.rng.random_range(-1.0..=1.0);
        let theta: f32 = self.rng.random_range(0.0..TAU);
        let r = (1.0 - y * y).max(0.0).sqrt();
        Vec3::new(r * theta.cos(), y, r * theta.sin())
    }

    fn room(&self) -> usize {
        MAX_PARTICLES.saturating_sub(self.len())
    }

    /// Explode the player at `at`
    pub fn spawn_debris(&mut self, at: Vec3, tuning: &Tuning) {
        let origin = at + Vec3::Y * tuning.burst_height;
        let count = tuning.debris_count.min(self.room());
        for _ in 0..count {
            let dir = self.random_unit();
            let speed = if tuning.debris_speed_max > tuning.debris_speed_min {
                self.rng
                    .random_range(tuning.debris_speed_min..tuning.debris_speed_max)
            } else {
                tuning.debris_speed_min
            };
            let size = self.rng.random_range(0.08..0.22);
            self.debris.push(Particle {
                pos: origin,
                vel: dir * speed,
                life: tuning.debris_lifetime,
                max_life: tuning.debris_lifetime,
                color: DEBRIS_COLOR,
                size,
            });
        }
        log::debug!("Spawned {} debris particles", count);
    }

    /// Celebrate a win around `at`
    pub fn spawn_confetti(&mut self, at: Vec3, tuning: &Tuning) {
        let count = tuning.confetti_count.min(self.room());
        for i in 0..count {
            let spread: f32 = self.rng.random_range(0.0..TAU);
            let up: f32 = self.rng.random_range(5.0..10.0);
            let out: f32 = self.rng.random_range(0.5..3.0);
            let life = tuning.confetti_lifetime * self.rng.random_range(0.7f32..1.0);
            self.confetti.push(Particle {
                pos: at + Vec3::Y * 0.5,
                vel: Vec3::new(spread.cos() * out, up, spread.sin() * out),
                life,
                max_life: life,
                color: CONFETTI_COLORS[i % CONFETTI_COLORS.len()],
                size: 0.12,
            });
        }
    }

    /// Advance both pools and drop expired particles
    pub fn update(&mut self, dt: f32, tuning: &Tuning) {
        for p in self.debris.iter_mut() {
            p.vel.y -= tuning.gravity * dt;
            p.pos += p.vel * dt;

            // Inelastic bounce off the ground
            if p.pos.y <= tuning.ground_y {
                p.pos.y = tuning.ground_y;
                if p.vel.y < 0.0 {
                    p.vel.y = -p.vel.y * tuning.bounce_restitution;
                }
                p.vel.x *= tuning.bounce_friction;
                p.vel.z *= tuning.bounce_friction;
            }

            p.life -= dt;
        }
        self.debris.retain(|p| p.life > 0.0);

        let drag = (1.0 - tuning.confetti_drag * dt).max(0.0);
        for p in self.confetti.iter_mut() {
            p.vel.y -= tuning.gravity * 0.25 * dt;
            p.vel *= drag;
            p.pos += p.vel * dt;
            p.pos.y = p.pos.y.max(tuning.ground_y);
            p.life -= dt;
        }
        self.confetti.retain(|p| p.life > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_debris_burst_count_and_speed() {
        let tuning = Tuning::default();
        let mut fx = Effects::new(42);
        fx.spawn_debris(Vec3::new(0.0, 0.0, 10.0), &tuning);
        assert_eq!(fx.debris.len(), tuning.debris_count);
        for p in &fx.debris {
            let speed = p.vel.length();
            assert!(speed >= tuning.debris_speed_min - 1e-3);
            assert!(speed <= tuning.debris_speed_max + 1e-3);
            assert_eq!(p.pos, Vec3::new(0.0, tuning.burst_height, 10.0));
        }
    }

    #[test]
    fn test_debris_bounces_off_ground() {
        let tuning = Tuning::default();
        let mut fx = Effects::new(1);
        fx.debris.push(Particle {
            pos: Vec3::new(0.0, 0.01, 0.0),
            vel: Vec3::new(2.0, -5.0, 0.0),
            life: 1.0,
            max_life: 1.0,
            color: DEBRIS_COLOR,
            size: 0.1,
        });
        fx.update(DT, &tuning);
        let p = &fx.debris[0];
        assert_eq!(p.pos.y, tuning.ground_y);
        assert!(p.vel.y > 0.0);
        assert!(p.vel.x < 2.0);
    }

    #[test]
    fn test_particles_fade_and_expire() {
        let tuning = Tuning::default();
        let mut fx = Effects::new(3);
        fx.spawn_debris(Vec3::ZERO, &tuning);
        let mut last_alpha = 1.0;
        let mut frames = 0;
        while !fx.debris.is_empty() {
            fx.update(DT, &tuning);
            if let Some(p) = fx.debris.first() {
                assert!(p.alpha() <= last_alpha);
                assert!(p.life > 0.0);
                last_alpha = p.alpha();
            }
            frames += 1;
            assert!(frames < 1000, "debris never expired");
        }
        // Every particle shares the lifetime, so they all leave together
        let expected = (tuning.debris_lifetime / DT).ceil() as i32;
        assert!((frames - expected).abs() <= 1);
    }

    #[test]
    fn test_confetti_is_independent_of_debris() {
        let tuning = Tuning::default();
        let mut fx = Effects::new(9);
        fx.spawn_confetti(Vec3::new(0.0, 0.0, 40.0), &tuning);
        assert!(fx.debris.is_empty());
        assert_eq!(fx.confetti.len(), tuning.confetti_count);
        fx.update(DT, &tuning);
        assert!(fx.confetti.iter().all(|p| p.pos.y >= tuning.ground_y));
        fx.clear();
        assert!(fx.is_empty());
    }

    #[test]
    fn test_pool_is_capped() {
        let tuning = Tuning {
            debris_count: MAX_PARTICLES,
            ..Default::default()
        };
        let mut fx = Effects::new(5);
        fx.spawn_debris(Vec3::ZERO, &tuning);
        fx.spawn_confetti(Vec3::ZERO, &tuning);
        assert_eq!(fx.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_same_seed_same_burst() {
        let tuning = Tuning::default();
        let mut a = Effects::new(77);
        let mut b = Effects::new(77);
        a.spawn_debris(Vec3::ZERO, &tuning);
        b.spawn_debris(Vec3::ZERO, &tuning);
        assert_eq!(a.debris, b.debris);
    }
}
