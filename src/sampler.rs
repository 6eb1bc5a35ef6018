//! The per-frame sampling driver.
//!
//! Each frame resamples one scan row: one jittered seed per column, traced at
//! every channel budget, with every escaping orbit folded into the histogram
//! on the calling thread.

use log::{debug, trace};
use rand::{rngs::StdRng, Rng};

use crate::{
    complex::Complex,
    error::Error,
    frame::Frame,
    histogram::{Channel, Histogram},
    orbit::escape_iterations,
    source::{TrajectoryBatch, TrajectorySource},
    viewport::{Pixel, Viewport},
};

/// What one channel of one row contributed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Seeds whose orbit escaped within the budget.
    pub kept: u32,
    /// Seeds that used the whole budget without escaping.
    pub discarded: u32,
    /// Orbit points accumulated.
    pub hits: u64,
    /// Orbit points that fell outside the grid.
    pub dropped: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowStats {
    pub row: u32,
    pub channels: [ChannelStats; Channel::COUNT],
}

pub struct Sampler<S> {
    viewport: Viewport,
    budgets: [u32; Channel::COUNT],
    source: S,
    rng: StdRng,
    row: u32,
    seeds: Vec<Complex>,
    batch: TrajectoryBatch,
}

impl<S: TrajectorySource> Sampler<S> {
    pub fn new(
        viewport: Viewport,
        budgets: [u32; Channel::COUNT],
        source: S,
        rng: StdRng,
    ) -> Self {
        let width = viewport.size().width as usize;
        let max_limit = budgets.into_iter().max().unwrap_or(0);
        Self {
            viewport,
            budgets,
            source,
            rng,
            row: 0,
            seeds: Vec::with_capacity(width),
            batch: TrajectoryBatch::with_capacity(width, max_limit),
        }
    }

    /// The scan row the next call to [`Sampler::sample_row`] resamples.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Sample the current scan row into `histogram`, then move to the next row.
    pub fn sample_row(&mut self, histogram: &mut Histogram) -> Result<RowStats, Error> {
        trace!("begin sample_row {}", self.row);

        let size = self.viewport.size();
        let row = self.row;

        self.seeds.clear();
        for column in 0..size.width {
            let jitter = (self.rng.gen_range(-0.5..0.5), self.rng.gen_range(-0.5..0.5));
            self.seeds.push(self.viewport.seed(row, column, jitter));
        }

        let mut stats = RowStats {
            row,
            ..RowStats::default()
        };
        for (channel, limit) in Channel::ALL.into_iter().zip(self.budgets) {
            self.source.trace(&self.seeds, limit, &mut self.batch)?;
            stats.channels[channel.index()] = fold(&self.viewport, &self.batch, channel, histogram);
        }

        debug!(
            "row {}: kept {:?}, hits {:?}",
            row,
            stats.channels.map(|channel| channel.kept),
            stats.channels.map(|channel| channel.hits)
        );

        self.row = (self.row + 1) % size.height;

        trace!("end sample_row");
        Ok(stats)
    }
}

/// Accumulate every escaping trajectory of `batch` into `channel`.
pub fn fold(
    viewport: &Viewport,
    batch: &TrajectoryBatch,
    channel: Channel,
    histogram: &mut Histogram,
) -> ChannelStats {
    let mut stats = ChannelStats::default();
    for index in 0..batch.len() {
        let Some(trajectory) = batch.trajectory(index) else {
            stats.discarded += 1;
            continue;
        };
        stats.kept += 1;
        for z in trajectory {
            match viewport.to_pixel(*z) {
                Some(pixel) => {
                    histogram.accumulate(channel, pixel);
                    stats.hits += 1;
                }
                None => stats.dropped += 1,
            }
        }
    }
    stats
}

/// Escape-time colouring of display row `row`: every channel of each pixel is
/// `escape index / limit`, zero for bounded seeds.
pub fn escape_time_row(
    viewport: &Viewport,
    row: u32,
    limit: u32,
    escape_radius: f32,
    frame: &mut Frame,
) {
    for column in 0..viewport.size().width {
        let pixel = Pixel { row, column };
        let seed = viewport.pixel_to_plane(pixel);
        let intensity = escape_iterations(seed, limit, escape_radius).intensity(limit);
        frame.set(pixel, [intensity; Channel::COUNT]);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::{
        screen,
        source::{ScalarSource, ThreadedSource},
    };

    const RADIUS: f32 = 3.0;
    const BUDGETS: [u32; 3] = [32, 64, 128];

    fn viewport(side: u32) -> Viewport {
        Viewport::reference(screen::Size::square(side))
    }

    fn histogram_total(histogram: &Histogram) -> u64 {
        Channel::ALL.iter().map(|channel| histogram.total(*channel)).sum()
    }

    #[test]
    fn bounded_trajectories_are_never_accumulated() {
        let viewport = viewport(64);
        let seeds = [Complex::ZERO, Complex::new(-1.0, 0.0), Complex::new(-0.1, 0.1)];
        let mut batch = TrajectoryBatch::with_capacity(seeds.len(), 256);
        ScalarSource::new(RADIUS).trace(&seeds, 256, &mut batch).unwrap();

        let mut histogram = Histogram::new(viewport.size());
        let stats = fold(&viewport, &batch, Channel::Red, &mut histogram);

        assert_eq!(stats.discarded, 3);
        assert_eq!(stats.kept, 0);
        assert_eq!(histogram_total(&histogram), 0);
    }

    #[test]
    fn fold_counts_every_recorded_point() {
        let viewport = viewport(64);
        let seeds = [Complex::new(0.5, 0.5), Complex::new(1.0, 0.0)];
        let mut batch = TrajectoryBatch::with_capacity(seeds.len(), 256);
        ScalarSource::new(RADIUS).trace(&seeds, 256, &mut batch).unwrap();

        let mut histogram = Histogram::new(viewport.size());
        let stats = fold(&viewport, &batch, Channel::Green, &mut histogram);

        let recorded: u64 = batch.steps().iter().map(|steps| *steps as u64).sum();
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.hits + stats.dropped, recorded);
        assert_eq!(histogram.total(Channel::Green), stats.hits);
        assert_eq!(histogram.total(Channel::Red), 0);
    }

    #[test]
    fn rows_cycle_through_the_grid() {
        let viewport = viewport(4);
        let mut sampler = Sampler::new(
            viewport,
            BUDGETS,
            ScalarSource::new(RADIUS),
            StdRng::seed_from_u64(1),
        );
        let mut histogram = Histogram::new(viewport.size());

        let rows: Vec<u32> = (0..9)
            .map(|_| sampler.sample_row(&mut histogram).unwrap().row)
            .collect();
        assert_eq!(rows, [0, 1, 2, 3, 0, 1, 2, 3, 0]);
        assert_eq!(sampler.row(), 1);
    }

    #[test]
    fn every_seed_is_kept_or_discarded() {
        let viewport = viewport(32);
        let mut sampler = Sampler::new(
            viewport,
            BUDGETS,
            ScalarSource::new(RADIUS),
            StdRng::seed_from_u64(2),
        );
        let mut histogram = Histogram::new(viewport.size());

        for _ in 0..32 {
            let stats = sampler.sample_row(&mut histogram).unwrap();
            for channel in stats.channels {
                assert_eq!(channel.kept + channel.discarded, 32);
            }
        }

        assert!(histogram_total(&histogram) > 0);
        for channel in Channel::ALL {
            assert!(histogram.max(channel) > 0);
        }
    }

    #[test]
    fn threaded_and_scalar_sources_build_the_same_histogram() {
        let viewport = viewport(48);
        let mut scalar = Sampler::new(
            viewport,
            BUDGETS,
            ScalarSource::new(RADIUS),
            StdRng::seed_from_u64(3),
        );
        let mut threaded = Sampler::new(
            viewport,
            BUDGETS,
            ThreadedSource::new(RADIUS).unwrap(),
            StdRng::seed_from_u64(3),
        );

        let mut scalar_histogram = Histogram::new(viewport.size());
        let mut threaded_histogram = Histogram::new(viewport.size());
        for _ in 0..48 {
            let scalar_stats = scalar.sample_row(&mut scalar_histogram).unwrap();
            let threaded_stats = threaded.sample_row(&mut threaded_histogram).unwrap();
            assert_eq!(scalar_stats, threaded_stats);
        }

        assert_eq!(scalar_histogram.maxima(), threaded_histogram.maxima());
        for row in 0..48 {
            assert_eq!(scalar_histogram.row(row), threaded_histogram.row(row));
        }
    }

    #[test]
    fn escape_time_row_paints_all_channels_alike() {
        let viewport = viewport(64);
        let mut frame = Frame::new(viewport.size());
        escape_time_row(&viewport, 16, 256, RADIUS, &mut frame);

        let values = frame.row(16);
        assert!(values.iter().any(|pixel| pixel[0] > 0.0));
        for pixel in values {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
            assert!((0.0..1.0).contains(&pixel[0]));
        }
        assert!(frame.row(15).iter().all(|pixel| *pixel == [0.0; 3]));
    }

    #[test]
    fn escape_time_rows_run_along_the_imaginary_axis() {
        // Row 40 of 64 is real = -1.125, inside the period-2 bulb. Columns
        // 32 ± k are complex conjugates, which escape alike.
        let viewport = viewport(64);
        let mut frame = Frame::new(viewport.size());
        escape_time_row(&viewport, 40, 256, RADIUS, &mut frame);

        assert_eq!(
            viewport.pixel_to_plane(Pixel { row: 40, column: 32 }),
            Complex::new(-1.125, 0.0)
        );
        assert_eq!(frame.get(Pixel { row: 40, column: 32 }), [0.0; 3]);
        assert!(frame.get(Pixel { row: 40, column: 0 })[0] > 0.0);
        for k in 1..32 {
            assert_eq!(
                frame.get(Pixel { row: 40, column: 32 - k }),
                frame.get(Pixel { row: 40, column: 32 + k })
            );
        }
    }
}
