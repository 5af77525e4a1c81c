//! Demo application errors

use frame_engine::core::config::ConfigError;
use frame_engine::render::RenderError;
use frame_engine::scene::WaveError;
use thiserror::Error;

/// Anything that stops the demo
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Wave grid misuse
    #[error("Wave simulation error: {0}")]
    Wave(#[from] WaveError),

    /// Unknown scene name on the command line
    #[error("Unknown scene '{0}' (expected 'castle' or 'billboards')")]
    UnknownScene(String),
}
