//! The displayable image handed to the presenter each frame.

use log::trace;
use rayon::prelude::{
    IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator, ParallelSliceMut,
};

use crate::{config, histogram::Channel, histogram::Histogram, screen, viewport::Pixel};

/// Row-major `height × width` RGB values in `[0, 1]`.
pub struct Frame {
    size: screen::Size,
    values: Vec<[f32; Channel::COUNT]>,
}

impl Frame {
    pub fn new(size: screen::Size) -> Self {
        Self {
            size,
            values: vec![[0.0; Channel::COUNT]; size.pixel_count()],
        }
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    pub fn set(&mut self, pixel: Pixel, value: [f32; Channel::COUNT]) {
        let offset = pixel.row as usize * self.size.width as usize + pixel.column as usize;
        self.values[offset] = value;
    }

    pub fn get(&self, pixel: Pixel) -> [f32; Channel::COUNT] {
        self.values[pixel.row as usize * self.size.width as usize + pixel.column as usize]
    }

    pub fn row(&self, row: u32) -> &[[f32; Channel::COUNT]] {
        let width = self.size.width as usize;
        let start = row as usize * width;
        &self.values[start..start + width]
    }

    /// Overwrite every value with `count / max` for its channel. A channel whose
    /// maximum is still zero is black.
    pub fn normalize(&mut self, histogram: &Histogram) {
        trace!("begin normalize");
        debug_assert_eq!(self.size, histogram.size());

        let maxima = histogram.maxima();
        let width = self.size.width as usize;

        self.values
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, values)| {
                for (value, counts) in values.iter_mut().zip(histogram.row(row as u32)) {
                    for channel in 0..Channel::COUNT {
                        value[channel] = if maxima[channel] == 0 {
                            0.0
                        } else {
                            (counts[channel] as f64 / maxima[channel] as f64) as f32
                        };
                    }
                }
            });

        trace!("end normalize");
    }

    /// Paint the display column that images scan row `row` grey.
    ///
    /// Scan rows step along the imaginary axis, which runs across the display
    /// columns, so the row being sampled shows up as a vertical line.
    pub fn mark_scanline(&mut self, row: u32) {
        if row >= self.size.width {
            return;
        }
        let width = self.size.width as usize;
        for values in self.values.chunks_mut(width) {
            values[row as usize] = [config::SCANLINE_INTENSITY; Channel::COUNT];
        }
    }

    /// 8-bit RGBA, alpha opaque, in the layout `Rgba8Unorm` textures expect.
    pub fn to_rgba8(&self, rgba: &mut Vec<u8>) {
        rgba.resize(self.values.len() * 4, 0);
        rgba.par_chunks_mut(4)
            .zip(self.values.par_iter())
            .for_each(|(out, value)| {
                for channel in 0..Channel::COUNT {
                    out[channel] = (value[channel].clamp(0.0, 1.0) * 255.0).round() as u8;
                }
                out[3] = u8::MAX;
            });
    }

    /// Flat `height × width × 3` copy of the values.
    #[cfg(test)]
    pub fn to_rgb_f32(&self) -> Vec<f32> {
        self.values.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(row: u32, column: u32) -> Pixel {
        Pixel { row, column }
    }

    #[test]
    fn empty_histogram_normalizes_to_black() {
        let size = screen::Size::square(8);
        let histogram = Histogram::new(size);
        let mut frame = Frame::new(size);
        frame.set(pixel(3, 3), [1.0; 3]);

        frame.normalize(&histogram);
        assert!(frame.to_rgb_f32().iter().all(|value| *value == 0.0));
    }

    #[test]
    fn hottest_cell_is_full_intensity() {
        let size = screen::Size::square(512);
        let mut histogram = Histogram::new(size);
        for _ in 0..3 {
            histogram.accumulate(Channel::Red, pixel(10, 10));
        }
        histogram.accumulate(Channel::Red, pixel(20, 20));

        let mut frame = Frame::new(size);
        frame.normalize(&histogram);

        assert_eq!(histogram.max(Channel::Red), 3);
        assert_eq!(frame.get(pixel(10, 10)), [1.0, 0.0, 0.0]);
        assert_eq!(frame.get(pixel(20, 20))[0], (1.0f64 / 3.0) as f32);
        assert_eq!(frame.get(pixel(0, 0)), [0.0; 3]);
    }

    #[test]
    fn channels_normalize_independently() {
        let size = screen::Size::square(4);
        let mut histogram = Histogram::new(size);
        histogram.accumulate(Channel::Green, pixel(1, 2));
        for _ in 0..4 {
            histogram.accumulate(Channel::Blue, pixel(1, 2));
            histogram.accumulate(Channel::Blue, pixel(3, 0));
        }
        histogram.accumulate(Channel::Blue, pixel(3, 0));

        let mut frame = Frame::new(size);
        frame.normalize(&histogram);
        assert_eq!(frame.get(pixel(1, 2)), [0.0, 1.0, 0.8]);
        assert_eq!(frame.get(pixel(3, 0)), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn scanline_marks_one_column() {
        let size = screen::Size::square(4);
        let mut frame = Frame::new(size);
        frame.mark_scanline(2);
        for row in 0..4 {
            assert_eq!(frame.get(pixel(row, 2)), [0.5; 3]);
            assert_eq!(frame.get(pixel(row, 1)), [0.0; 3]);
        }
    }

    #[test]
    fn rgba8_scales_and_fills_alpha() {
        let size = screen::Size {
            width: 2,
            height: 1,
        };
        let mut frame = Frame::new(size);
        frame.set(pixel(0, 0), [1.0, 0.5, 0.0]);

        let mut rgba = Vec::new();
        frame.to_rgba8(&mut rgba);
        assert_eq!(rgba, [255, 128, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn rgb_f32_is_row_major() {
        let size = screen::Size {
            width: 2,
            height: 2,
        };
        let mut frame = Frame::new(size);
        frame.set(pixel(1, 0), [0.25, 0.5, 0.75]);
        let flat = frame.to_rgb_f32();
        assert_eq!(flat.len(), 12);
        assert_eq!(&flat[6..9], &[0.25, 0.5, 0.75]);
    }
}
