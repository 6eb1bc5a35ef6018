//! Per-channel hit counts with running maxima.

use crate::{screen, viewport::Pixel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const COUNT: usize = 3;

    pub const ALL: [Channel; Channel::COUNT] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Row-major `height × width × 3` grid of counters.
///
/// Counters only ever increase, and `max[c]` is never below any counter of
/// channel `c`. There is no way to decrement or clear.
pub struct Histogram {
    size: screen::Size,
    counts: Vec<[u64; Channel::COUNT]>,
    maxima: [u64; Channel::COUNT],
    totals: [u64; Channel::COUNT],
}

impl Histogram {
    pub fn new(size: screen::Size) -> Self {
        Self {
            size,
            counts: vec![[0; Channel::COUNT]; size.pixel_count()],
            maxima: [0; Channel::COUNT],
            totals: [0; Channel::COUNT],
        }
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    fn offset(&self, pixel: Pixel) -> usize {
        debug_assert!(pixel.row < self.size.height && pixel.column < self.size.width);
        pixel.row as usize * self.size.width as usize + pixel.column as usize
    }

    pub fn accumulate(&mut self, channel: Channel, pixel: Pixel) {
        let offset = self.offset(pixel);
        let channel = channel.index();

        let count = &mut self.counts[offset][channel];
        *count += 1;
        if *count > self.maxima[channel] {
            self.maxima[channel] = *count;
        }
        self.totals[channel] += 1;
    }

    pub fn count(&self, channel: Channel, pixel: Pixel) -> u64 {
        self.counts[self.offset(pixel)][channel.index()]
    }

    pub fn max(&self, channel: Channel) -> u64 {
        self.maxima[channel.index()]
    }

    /// Number of hits ever accumulated into `channel`.
    pub fn total(&self, channel: Channel) -> u64 {
        self.totals[channel.index()]
    }

    /// Counters of one grid row, one `[r, g, b]` per column.
    pub fn row(&self, row: u32) -> &[[u64; Channel::COUNT]] {
        let width = self.size.width as usize;
        let start = row as usize * width;
        &self.counts[start..start + width]
    }

    pub fn maxima(&self) -> [u64; Channel::COUNT] {
        self.maxima
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn starts_empty() {
        let histogram = Histogram::new(screen::Size::square(4));
        for channel in Channel::ALL {
            assert_eq!(histogram.max(channel), 0);
            assert_eq!(histogram.total(channel), 0);
        }
    }

    #[test]
    fn repeated_hits_count_up() {
        let mut histogram = Histogram::new(screen::Size::square(512));
        let pixel = Pixel {
            row: 10,
            column: 10,
        };
        for _ in 0..3 {
            histogram.accumulate(Channel::Red, pixel);
        }
        assert_eq!(histogram.count(Channel::Red, pixel), 3);
        assert!(histogram.max(Channel::Red) >= 3);
        assert_eq!(histogram.count(Channel::Green, pixel), 0);
        assert_eq!(histogram.max(Channel::Blue), 0);
    }

    #[test]
    fn maxima_bound_every_cell() {
        let size = screen::Size::square(16);
        let mut histogram = Histogram::new(size);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..5000 {
            let channel = Channel::ALL[rng.gen_range(0..Channel::COUNT)];
            let pixel = Pixel {
                row: rng.gen_range(0..size.height),
                column: rng.gen_range(0..size.width),
            };
            let before = histogram.count(channel, pixel);
            histogram.accumulate(channel, pixel);
            assert_eq!(histogram.count(channel, pixel), before + 1);

            for channel in Channel::ALL {
                let max = histogram.max(channel);
                for row in 0..size.height {
                    assert!(histogram.row(row).iter().all(|cell| cell[channel.index()] <= max));
                }
            }
        }

        let sum: u64 = Channel::ALL.iter().map(|channel| histogram.total(*channel)).sum();
        assert_eq!(sum, 5000);
    }
}
