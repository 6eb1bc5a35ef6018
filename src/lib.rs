//! Real-time Buddhabrot rendering.
//!
//! Each frame resamples one scan row of the plane: one jittered seed per
//! column is iterated under `z -> z² + c` at three iteration budgets, and the
//! orbits of seeds that escape are counted into a per-channel [`Histogram`].
//! The frame shown is that histogram normalised by its per-channel maxima.
//!
//! Orbits come from a [`TrajectorySource`]: on the calling thread, spread over
//! a thread pool, or computed by a `wgpu` compute kernel.
//!
//! [`Histogram`]: histogram::Histogram
//! [`TrajectorySource`]: source::TrajectorySource

pub mod command_buffer;
pub mod command_encoder;
pub mod complex;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod histogram;
pub mod orbit;
pub mod presenter;
pub mod sampler;
pub mod screen;
pub mod source;
pub mod typed_buffer;
pub mod var;
pub mod viewport;

pub use engine::Engine;
pub use error::Error;
