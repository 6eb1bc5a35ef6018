//! Ties one frame of work together: sample (or colour) a row, then refresh the
//! displayable [`Frame`].

use log::info;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::{self, Backend, Config, Mode},
    error::Error,
    frame::Frame,
    gpu::{GpuContext, GpuSource},
    histogram::Histogram,
    sampler::{self, RowStats, Sampler},
    source::{ScalarSource, ThreadedSource, TrajectorySource},
    viewport::Viewport,
};

enum Work {
    Buddhabrot {
        sampler: Sampler<Box<dyn TrajectorySource>>,
        histogram: Histogram,
    },
    Mandelbrot {
        row: u32,
    },
}

pub struct Engine {
    config: Config,
    viewport: Viewport,
    frame: Frame,
    work: Work,
}

/// Build the trajectory source `config.backend` names.
pub fn trajectory_source(config: &Config) -> Result<Box<dyn TrajectorySource>, Error> {
    let escape_radius = config.escape_radius();
    let source: Box<dyn TrajectorySource> = match config.backend {
        Backend::Scalar => Box::new(ScalarSource::new(escape_radius)),
        Backend::Threaded => Box::new(ThreadedSource::new(escape_radius)?),
        Backend::Gpu => Box::new(GpuSource::new(
            GpuContext::new()?,
            config.size.width as usize,
            config.max_limit(),
            escape_radius,
        )?),
    };
    info!(
        "{:?} preset: escape radius {}, budgets {:?}, {} source",
        config.preset,
        escape_radius,
        config.budgets(),
        source.name()
    );
    Ok(source)
}

impl Engine {
    pub fn new(config: Config) -> Result<Self, Error> {
        match config.mode {
            Mode::Buddhabrot => Ok(Self::with_source(
                config,
                trajectory_source(&config)?,
                StdRng::from_entropy(),
            )),
            Mode::Mandelbrot => Ok(Self::escape_time(config)),
        }
    }

    /// A Buddhabrot engine drawing from `source` with jitter from `rng`.
    pub fn with_source(config: Config, source: Box<dyn TrajectorySource>, rng: StdRng) -> Self {
        let viewport = Viewport::reference(config.size);
        Self {
            config,
            viewport,
            frame: Frame::new(config.size),
            work: Work::Buddhabrot {
                sampler: Sampler::new(viewport, config.budgets(), source, rng),
                histogram: Histogram::new(config.size),
            },
        }
    }

    /// A Mandelbrot escape-time engine; needs no trajectory source.
    pub fn escape_time(config: Config) -> Self {
        Self {
            config,
            viewport: Viewport::reference(config.size),
            frame: Frame::new(config.size),
            work: Work::Mandelbrot { row: 0 },
        }
    }

    pub fn histogram(&self) -> Option<&Histogram> {
        match &self.work {
            Work::Buddhabrot { histogram, .. } => Some(histogram),
            Work::Mandelbrot { .. } => None,
        }
    }

    /// Do one frame of work and return the image to display. Returns the row
    /// statistics when sampling.
    pub fn step(&mut self) -> Result<(&Frame, Option<RowStats>), Error> {
        let stats = match &mut self.work {
            Work::Buddhabrot { sampler, histogram } => {
                let stats = sampler.sample_row(histogram)?;
                self.frame.normalize(histogram);
                if self.config.scanline {
                    self.frame.mark_scanline(stats.row);
                }
                Some(stats)
            }
            Work::Mandelbrot { row } => {
                sampler::escape_time_row(
                    &self.viewport,
                    *row,
                    config::MANDELBROT_LIMIT,
                    self.config.escape_radius(),
                    &mut self.frame,
                );
                *row = (*row + 1) % self.config.size.height;
                None
            }
        };
        Ok((&self.frame, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Preset,
        histogram::Channel,
        screen,
        viewport::Pixel,
    };

    fn small_config(mode: Mode) -> Config {
        Config {
            size: screen::Size::square(32),
            preset: Preset::Classic,
            mode,
            backend: Backend::Scalar,
            scanline: true,
        }
    }

    #[test]
    fn buddhabrot_frames_normalize_the_histogram() {
        let config = small_config(Mode::Buddhabrot);
        let mut engine = Engine::with_source(
            config,
            trajectory_source(&config).unwrap(),
            StdRng::seed_from_u64(11),
        );

        for expected_row in 0..32 {
            let (frame, stats) = engine.step().unwrap();
            let stats = stats.unwrap();
            assert_eq!(stats.row, expected_row);
            assert_eq!(
                frame.get(Pixel {
                    row: 5,
                    column: expected_row
                }),
                [config::SCANLINE_INTENSITY; Channel::COUNT]
            );
        }

        let histogram = engine.histogram().unwrap();
        for channel in Channel::ALL {
            assert!(histogram.max(channel) > 0);
        }
    }

    #[test]
    fn scanline_can_be_disabled() {
        let config = Config {
            scanline: false,
            ..small_config(Mode::Buddhabrot)
        };
        let mut engine = Engine::with_source(
            config,
            trajectory_source(&config).unwrap(),
            StdRng::seed_from_u64(12),
        );
        let (frame, stats) = engine.step().unwrap();
        assert_eq!(stats.unwrap().row, 0);
        // Column 0 lies on the excluded grid edge, so only a marker could light it.
        for row in 0..32 {
            assert_eq!(frame.get(Pixel { row, column: 0 }), [0.0; Channel::COUNT]);
        }
    }

    #[test]
    fn mandelbrot_mode_colours_one_row_per_frame() {
        let mut engine = Engine::new(small_config(Mode::Mandelbrot)).unwrap();
        assert!(engine.histogram().is_none());

        for _ in 0..16 {
            let (_, stats) = engine.step().unwrap();
            assert!(stats.is_none());
        }
        let (frame, _) = engine.step().unwrap();
        assert!(frame.row(8).iter().any(|pixel| pixel[0] > 0.0));
        assert!(frame.row(31).iter().all(|pixel| *pixel == [0.0; 3]));
    }
}
