//! Process-wide constants and presets.
//!
//! Everything here is fixed for the lifetime of the process: the plane region,
//! the grid resolution, the escape radius and the per-channel iteration budgets.

use std::{fmt, str::FromStr};

use crate::{complex::Complex, histogram::Channel, screen};

/// Side length of the square accumulation grid.
pub const GRID_SIDE: u32 = 512;

/// Lower-left corner of the sampled plane region.
pub const PLANE_ORIGIN: Complex = Complex::new(-2.25, -1.5);

/// Extent of the sampled plane region along both axes.
pub const PLANE_EXTENT: f32 = 3.0;

/// Iteration limit used by the escape-time (Mandelbrot) mode.
pub const MANDELBROT_LIMIT: u32 = 256;

/// Display value painted over the column being sampled.
pub const SCANLINE_INTENSITY: f32 = 0.5;

/// Escape radius and channel budgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Radius 3, budgets 512/1024/2048.
    Classic,
    /// Radius 2, budgets 1024/2048/4096.
    Deep,
}

impl Preset {
    pub fn escape_radius(self) -> f32 {
        match self {
            Preset::Classic => 3.0,
            Preset::Deep => 2.0,
        }
    }

    /// Iteration limits in channel order (red, green, blue). Ascending.
    pub fn budgets(self) -> [u32; Channel::COUNT] {
        match self {
            Preset::Classic => [512, 1024, 2048],
            Preset::Deep => [1024, 2048, 4096],
        }
    }
}

/// What each frame computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Trajectory density histogram.
    Buddhabrot,
    /// Escape-time intensity, one display row per frame.
    Mandelbrot,
}

/// Where trajectories are computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Scalar,
    Threaded,
    Gpu,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pub size: screen::Size,
    pub preset: Preset,
    pub mode: Mode,
    pub backend: Backend,
    pub scanline: bool,
}

impl Config {
    pub fn escape_radius(&self) -> f32 {
        self.preset.escape_radius()
    }

    pub fn escape_radius_squared(&self) -> f32 {
        let radius = self.escape_radius();
        radius * radius
    }

    pub fn budgets(&self) -> [u32; Channel::COUNT] {
        self.preset.budgets()
    }

    /// Largest channel budget; sizes the trajectory slab.
    pub fn max_limit(&self) -> u32 {
        self.budgets().into_iter().max().unwrap_or(0)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: screen::Size::square(GRID_SIDE),
            preset: Preset::Classic,
            mode: Mode::Buddhabrot,
            backend: Backend::Gpu,
            scanline: true,
        }
    }
}

/// Unrecognised command line value.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised value `{}`", self.0)
    }
}

impl std::error::Error for ParseError {}

impl FromStr for Preset {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Preset::Classic),
            "deep" => Ok(Preset::Deep),
            other => Err(ParseError(other.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buddhabrot" => Ok(Mode::Buddhabrot),
            "mandelbrot" => Ok(Mode::Mandelbrot),
            other => Err(ParseError(other.to_string())),
        }
    }
}

impl FromStr for Backend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(Backend::Scalar),
            "threaded" => Ok(Backend::Threaded),
            "gpu" => Ok(Backend::Gpu),
            other => Err(ParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_ascend() {
        for preset in [Preset::Classic, Preset::Deep] {
            let budgets = preset.budgets();
            assert!(budgets.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn max_limit_is_blue_budget() {
        let config = Config {
            preset: Preset::Deep,
            ..Config::default()
        };
        assert_eq!(config.max_limit(), 4096);
        assert_eq!(config.escape_radius_squared(), 4.0);
    }

    #[test]
    fn parses_command_line_values() {
        assert_eq!("deep".parse::<Preset>(), Ok(Preset::Deep));
        assert_eq!("mandelbrot".parse::<Mode>(), Ok(Mode::Mandelbrot));
        assert_eq!("threaded".parse::<Backend>(), Ok(Backend::Threaded));
        assert!("opencl".parse::<Backend>().is_err());
    }
}
