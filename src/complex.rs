use bytemuck::{Pod, Zeroable};

/// A point on the complex plane.
///
/// Laid out as a WGSL `vec2<f32>` so seeds and orbits can be copied to and from
/// the GPU without conversion.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex {
    pub real: f32,
    pub imaginary: f32,
}

impl Complex {
    pub const ZERO: Self = Complex {
        real: 0.0,
        imaginary: 0.0,
    };

    pub const fn new(real: f32, imaginary: f32) -> Self {
        Self { real, imaginary }
    }

    pub fn norm_squared(self) -> f32 {
        self.real * self.real + self.imaginary * self.imaginary
    }

    /// One step of `z -> z² + c`.
    ///
    /// `trace.wgsl#trace` evaluates the same expression term by term. Keep the
    /// two in sync.
    #[inline]
    pub fn step(self, c: Complex) -> Complex {
        Complex {
            real: self.real * self.real - self.imaginary * self.imaginary + c.real,
            imaginary: 2.0 * self.real * self.imaginary + c.imaginary,
        }
    }

    /// Whether `|self| > sqrt(escape_radius_squared)`.
    #[inline]
    pub fn escapes(self, escape_radius_squared: f32) -> bool {
        self.norm_squared() > escape_radius_squared
    }
}
