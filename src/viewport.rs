//! Mapping between the fixed plane region and the accumulation grid.
//!
//! The grid is transposed relative to the plane: the real axis runs down the
//! rows (inverted, larger real values towards the top) and the imaginary axis
//! runs across the columns.

use crate::{complex::Complex, config, screen};

/// A cell of the accumulation grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub row: u32,
    pub column: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    size: screen::Size,
    origin: Complex,
    extent: Complex,
}

impl Viewport {
    pub fn new(size: screen::Size, origin: Complex, extent: Complex) -> Self {
        Self {
            size,
            origin,
            extent,
        }
    }

    /// The region every preset renders: real ∈ [-2.25, 0.75], imaginary ∈ [-1.5, 1.5].
    pub fn reference(size: screen::Size) -> Self {
        Self::new(
            size,
            config::PLANE_ORIGIN,
            Complex::new(config::PLANE_EXTENT, config::PLANE_EXTENT),
        )
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    /// Grid cell containing `z`, or `None` when `z` falls on or outside the
    /// grid edge. Points are dropped rather than clamped so that nothing piles
    /// up along the border.
    pub fn to_pixel(&self, z: Complex) -> Option<Pixel> {
        let rows = self.size.height as i32;
        let columns = self.size.width as i32;

        let x = ((z.real as f64 - self.origin.real as f64) / self.extent.real as f64
            * rows as f64) as i32;
        let y = ((z.imaginary as f64 - self.origin.imaginary as f64)
            / self.extent.imaginary as f64
            * columns as f64) as i32;

        if x > 0 && x < rows && y > 0 && y < columns {
            Some(Pixel {
                row: (rows - x) as u32,
                column: y as u32,
            })
        } else {
            None
        }
    }

    /// Sample seed for scan row `row` and column `column`, each offset by a
    /// sub-pixel jitter (expected in `[-0.5, 0.5)`).
    ///
    /// Columns step along the real axis and scan rows along the imaginary axis.
    pub fn seed(&self, row: u32, column: u32, jitter: (f32, f32)) -> Complex {
        let (row_jitter, column_jitter) = jitter;
        Complex {
            real: (column as f32 + column_jitter) / self.size.width as f32 * self.extent.real
                + self.origin.real,
            imaginary: (row as f32 + row_jitter) / self.size.height as f32
                * self.extent.imaginary
                + self.origin.imaginary,
        }
    }

    /// Plane point at the corner of `pixel`; inverse of [`Viewport::to_pixel`]
    /// up to truncation.
    pub fn pixel_to_plane(&self, pixel: Pixel) -> Complex {
        let x = self.size.height as f32 - pixel.row as f32;
        Complex {
            real: x / self.size.height as f32 * self.extent.real + self.origin.real,
            imaginary: pixel.column as f32 / self.size.width as f32 * self.extent.imaginary
                + self.origin.imaginary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Viewport {
        Viewport::reference(screen::Size::square(512))
    }

    #[test]
    fn to_pixel_is_pure() {
        let viewport = reference();
        let z = Complex::new(-0.4, 0.61);
        assert_eq!(viewport.to_pixel(z), viewport.to_pixel(z));
    }

    #[test]
    fn upper_corner_is_rejected() {
        // x = 512, y = 512: one past the last valid index on both axes.
        assert_eq!(reference().to_pixel(Complex::new(0.75, 1.5)), None);
    }

    #[test]
    fn lower_corner_is_rejected() {
        // x = 0, y = 0 sits on the excluded edge.
        assert_eq!(reference().to_pixel(Complex::new(-2.25, -1.5)), None);
    }

    #[test]
    fn points_outside_are_dropped() {
        let viewport = reference();
        assert_eq!(viewport.to_pixel(Complex::new(5.0, 0.0)), None);
        assert_eq!(viewport.to_pixel(Complex::new(0.0, -5.0)), None);
    }

    #[test]
    fn real_axis_maps_to_inverted_rows() {
        let viewport = reference();
        // x = (0 + 2.25) / 3 * 512 = 384, y = (0 + 1.5) / 3 * 512 = 256
        assert_eq!(
            viewport.to_pixel(Complex::ZERO),
            Some(Pixel {
                row: 128,
                column: 256
            })
        );
        // x = 1.5 / 3 * 512 = 256
        assert_eq!(
            viewport.to_pixel(Complex::new(-0.75, 0.0)),
            Some(Pixel {
                row: 256,
                column: 256
            })
        );
    }

    #[test]
    fn unjittered_seed_is_cell_corner() {
        let viewport = reference();
        assert_eq!(viewport.seed(0, 0, (0.0, 0.0)), Complex::new(-2.25, -1.5));
        assert_eq!(viewport.seed(256, 384, (0.0, 0.0)), Complex::new(0.0, 0.0));
    }

    #[test]
    fn pixel_to_plane_round_trips_interior_cells() {
        let viewport = reference();
        let pixel = Pixel {
            row: 128,
            column: 256,
        };
        assert_eq!(viewport.pixel_to_plane(pixel), Complex::ZERO);
        assert_eq!(viewport.to_pixel(viewport.pixel_to_plane(pixel)), Some(pixel));
    }
}
