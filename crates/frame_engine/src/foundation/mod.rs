//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the shader upload layout
//! - Axis-aligned bounding boxes
//! - Name-indexed resource registries
//! - Time management
//! - Logging utilities

pub mod math;
pub mod bounds;
pub mod collections;
pub mod time;
pub mod logging;
