//! Math utilities
//!
//! Re-exports glam with the spherical helpers used by the onion partition and
//! a deterministic random source for jitter and cell surveys.

pub use glam::*;

use std::f32::consts::TAU;

/// Azimuth of a direction around the z axis, counter-clockwise from +x,
/// normalised to `(0, 2*pi]`.
///
/// The +x axis itself sits at `2*pi`, closing the last azimuthal bucket.
#[inline]
pub fn azimuth(x: f32, y: f32) -> f32 {
    let phi = y.atan2(x);
    if phi <= 0.0 {
        phi + TAU
    } else {
        phi
    }
}

/// Signed elevation above the xy plane, in `[-pi/2, pi/2]`.
#[inline]
pub fn elevation(z: f32, radius: f32) -> f32 {
    (z / radius).clamp(-1.0, 1.0).asin()
}

/// Point at `radius` with the given azimuth and elevation (z up).
pub fn spherical_to_cartesian(radius: f32, azimuth: f32, elevation: f32) -> Vec3 {
    let (sin_e, cos_e) = elevation.sin_cos();
    let (sin_a, cos_a) = azimuth.sin_cos();
    Vec3::new(cos_e * cos_a, cos_e * sin_a, sin_e) * radius
}

/// Deterministic random number generator
pub struct DeterministicRng {
    seed: u64,
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self { seed, state: seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u32(&mut self) -> u32 {
        // PCG-style 64-bit LCG, output taken from the high bits
        const A: u64 = 6364136223846793005;
        const C: u64 = 1442695040888963407;

        self.state = self.state.wrapping_mul(A).wrapping_add(C);
        (self.state >> 32) as u32
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Three independent uniforms, the shape jitter consumes.
    pub fn next_f32x3(&mut self) -> [f32; 3] {
        [self.next_f32(), self.next_f32(), self.next_f32()]
    }

    /// Uniform point inside a ball of `radius` (rejection sampled).
    pub fn next_in_ball(&mut self, radius: f32) -> Vec3 {
        loop {
            let [u, v, w] = self.next_f32x3();
            let p = Vec3::new(u, v, w) * 2.0 - Vec3::ONE;
            if p.length_squared() <= 1.0 {
                return p * radius;
            }
        }
    }
}
