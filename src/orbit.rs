//! Escape-time iteration of `z -> z² + c` starting from `z = 0`.
//!
//! Both functions here share [`Complex::step`] and [`Complex::escapes`], and
//! both test for escape on a freshly computed value before anything else
//! happens to it. So for any seed and limit the escape index reported by
//! [`escape_iterations`] equals the number of values [`record_trajectory`]
//! writes, and the escaping value itself never lands in a trajectory.

use crate::complex::Complex;

/// Outcome of iterating a seed up to some limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escape {
    /// The value produced by iteration `i` (0-based) was the first to exceed
    /// the escape radius.
    Escaped(u32),
    /// Still within the escape radius after the full limit.
    Bounded,
}

impl Escape {
    /// The escape index, or `limit` when the orbit stayed bounded.
    pub fn steps(self, limit: u32) -> u32 {
        match self {
            Escape::Escaped(index) => index,
            Escape::Bounded => limit,
        }
    }

    /// Escape-time colouring: `index / limit`, zero for bounded orbits.
    pub fn intensity(self, limit: u32) -> f32 {
        match self {
            Escape::Escaped(index) => index as f32 / limit as f32,
            Escape::Bounded => 0.0,
        }
    }
}

pub fn escape_iterations(seed: Complex, limit: u32, escape_radius: f32) -> Escape {
    let escape_radius_squared = escape_radius * escape_radius;
    let mut z = Complex::ZERO;
    for index in 0..limit {
        z = z.step(seed);
        if z.escapes(escape_radius_squared) {
            return Escape::Escaped(index);
        }
    }
    Escape::Bounded
}

/// Replays [`escape_iterations`], writing every non-escaping orbit value into
/// `buffer`. Returns how many values were written; `limit` means the orbit
/// never escaped and the trajectory must be thrown away.
///
/// `buffer` must hold at least `limit` values.
pub fn record_trajectory(
    seed: Complex,
    limit: u32,
    escape_radius: f32,
    buffer: &mut [Complex],
) -> u32 {
    debug_assert!(buffer.len() >= limit as usize);

    let escape_radius_squared = escape_radius * escape_radius;
    let mut z = Complex::ZERO;
    for (index, slot) in buffer[..limit as usize].iter_mut().enumerate() {
        z = z.step(seed);
        if z.escapes(escape_radius_squared) {
            return index as u32;
        }
        *slot = z;
    }
    limit
}
