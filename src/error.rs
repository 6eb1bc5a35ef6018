//! Failures of a trajectory source or of the display. All of them end the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("GPU backend rejected work: {0}")]
    Backend(String),

    #[error("Buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("Batch of {seeds} seeds at limit {limit} exceeds capacity of {capacity_seeds} seeds at limit {capacity_limit}")]
    BatchTooLarge {
        seeds: usize,
        limit: u32,
        capacity_seeds: usize,
        capacity_limit: u32,
    },

    #[error("Surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
