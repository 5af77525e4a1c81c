//! # Unified Configuration System
//!
//! Configuration for the frame renderer, the engine loop and the simulated
//! GPU, grouped under [`ApplicationConfig`] so a single TOML or RON file can
//! drive a demo run.
//!
//! ## Configuration Categories
//!
//! - **Renderer Config**: frame resource count, back buffers, constant buffer
//!   alignment, clear colour, fence wait timeout
//! - **Engine Config**: logging and run length
//! - **Simulation Config**: behaviour of the simulated device

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Re-export from the config module for convenience
pub use crate::config::{Config, ConfigError};

/// Cornflower blue, the classic D3D sample clear colour
pub const CORNFLOWER_BLUE: [f32; 4] = [0.392_156_87, 0.584_313_75, 0.929_411_77, 1.0];

/// # Renderer Configuration
///
/// Controls the frame resource ring and how constant buffers are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Number of rotating frame resources (frames the CPU may run ahead + 1)
    pub frame_resource_count: usize,
    /// Number of swap chain back buffers
    pub back_buffer_count: u32,
    /// Constant buffer element alignment in bytes (power of two)
    pub constant_buffer_alignment: u64,
    /// Number of pass-constant slots per frame resource
    pub pass_count: usize,
    /// Render target clear colour (RGBA)
    pub clear_color: [f32; 4],
    /// Render target size in pixels
    pub viewport: (u32, u32),
    /// Give up waiting on the GPU after this many milliseconds (fatal).
    /// `None` waits forever.
    pub fence_wait_timeout_ms: Option<u64>,
}

impl RendererConfig {
    /// Create a renderer configuration with triple buffering
    pub fn new() -> Self {
        Self {
            frame_resource_count: 3,
            back_buffer_count: 2,
            constant_buffer_alignment: 256,
            pass_count: 1,
            clear_color: CORNFLOWER_BLUE,
            viewport: (800, 600),
            fence_wait_timeout_ms: None,
        }
    }

    /// Set the number of frame resources
    pub fn with_frame_resource_count(mut self, count: usize) -> Self {
        self.frame_resource_count = count;
        self
    }

    /// Set the number of back buffers
    pub fn with_back_buffer_count(mut self, count: u32) -> Self {
        self.back_buffer_count = count;
        self
    }

    /// Set the clear colour
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Set the render target size
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Bound every fence wait
    pub fn with_fence_wait_timeout(mut self, timeout: Duration) -> Self {
        self.fence_wait_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Fence wait timeout as a [`Duration`]
    pub fn fence_wait_timeout(&self) -> Option<Duration> {
        self.fence_wait_timeout_ms.map(Duration::from_millis)
    }

    /// Round a constant buffer element size up to the configured alignment
    pub fn aligned_constant_size(&self, byte_size: u64) -> u64 {
        let mask = self.constant_buffer_alignment - 1;
        (byte_size + mask) & !mask
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_resource_count == 0 {
            return Err(ConfigError::Invalid("frame_resource_count must be at least 1".to_string()));
        }

        if self.frame_resource_count > 8 {
            return Err(ConfigError::Invalid(
                "frame_resource_count should not exceed 8".to_string(),
            ));
        }

        if self.back_buffer_count == 0 {
            return Err(ConfigError::Invalid("back_buffer_count must be at least 1".to_string()));
        }

        if !self.constant_buffer_alignment.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "constant_buffer_alignment {} is not a power of two",
                self.constant_buffer_alignment
            )));
        }

        if self.pass_count == 0 {
            return Err(ConfigError::Invalid("pass_count must be at least 1".to_string()));
        }

        if self.viewport.0 == 0 || self.viewport.1 == 0 {
            return Err(ConfigError::Invalid("viewport must be non-empty".to_string()));
        }

        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Engine Configuration
///
/// Logging and run-length settings for the demo loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Stop after this many frames. `None` runs until interrupted.
    pub frame_limit: Option<u64>,
    /// Fixed simulation step in milliseconds. `None` uses the wall clock.
    pub fixed_step_ms: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_limit: Some(600),
            fixed_step_ms: Some(16),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the number of frames to run
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Simulation Configuration
///
/// Parameters of the simulated device that stands in for a real GPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Time the simulated GPU spends on each submitted command list (µs)
    pub gpu_execution_time_us: u64,
    /// Size of one shader-visible descriptor in bytes
    pub descriptor_increment: u32,
    /// Keep a copy of every executed command list
    pub record_executed: bool,
}

impl SimulationConfig {
    /// Create a new simulation configuration
    pub fn new() -> Self {
        Self {
            gpu_execution_time_us: 2_000,
            descriptor_increment: 32,
            record_executed: false,
        }
    }

    /// Set the simulated GPU time per command list
    pub fn with_gpu_execution_time(mut self, time: Duration) -> Self {
        self.gpu_execution_time_us = time.as_micros() as u64;
        self
    }

    /// Keep executed command lists for inspection
    pub fn with_recording(mut self, enabled: bool) -> Self {
        self.record_executed = enabled;
        self
    }

    /// GPU time per command list as a [`Duration`]
    pub fn gpu_execution_time(&self) -> Duration {
        Duration::from_micros(self.gpu_execution_time_us)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Engine loop configuration
    pub engine: EngineConfig,
    /// Frame renderer configuration
    pub renderer: RendererConfig,
    /// Simulated device configuration
    pub simulation: SimulationConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate()
    }
}

impl Config for ApplicationConfig {}
