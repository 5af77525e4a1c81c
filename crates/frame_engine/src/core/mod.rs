//! # Core Engine Module
//!
//! Shared configuration types used by the renderer and the demo applications.

pub mod config;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    EngineConfig,
    RendererConfig,
    SimulationConfig,
    Config,
    ConfigError,
};
