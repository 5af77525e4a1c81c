//! Render error types
//!
//! Two families of failure reach the caller. Device failures (API errors,
//! device removal, a fence that never completes) come from the GPU side and
//! cannot be repaired by the frame loop. Logic failures (bad slot index,
//! missing named resource, fence values going backwards) point at a scene
//! setup bug. Neither is retried; the demo loop treats both as fatal.

use std::time::Duration;

use crate::render::layer::RenderLayer;

/// Errors raised by the frame ring, registries and draw recording
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The device was removed or reset
    #[error("GPU device removed: {0}")]
    DeviceRemoved(String),

    /// A device API call failed
    #[error("Device API call failed: {0}")]
    Api(String),

    /// A fence wait exceeded the configured timeout
    #[error("Timed out after {timeout:?} waiting for fence value {value} (completed {completed})")]
    FenceTimeout {
        /// Value being waited for
        value: u64,
        /// Last value the GPU reported complete
        completed: u64,
        /// Configured timeout
        timeout: Duration,
    },

    /// A retired fence value did not advance past the previous one
    #[error("Fence value {value} does not advance past {previous}")]
    FenceRegression {
        /// Value passed to retire
        value: u64,
        /// Highest value retired so far
        previous: u64,
    },

    /// A command allocator was reset while the GPU may still read from it
    #[error("Command allocator reset while fence {fence} is pending (completed {completed})")]
    AllocatorInUse {
        /// Fence value of the allocator's last submission
        fence: u64,
        /// Value the GPU has completed
        completed: u64,
    },

    /// Write or address lookup outside an upload buffer
    #[error("Slot {index} out of range for {buffer} buffer with {capacity} elements")]
    SlotOutOfRange {
        /// Which buffer
        buffer: &'static str,
        /// Requested element
        index: usize,
        /// Number of elements in the buffer
        capacity: usize,
    },

    /// Name lookup failed in a registry
    #[error("No {kind} named '{name}' is registered")]
    MissingResource {
        /// Registry kind ("material", "geometry", ...)
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// A name was registered twice
    #[error("{kind} '{name}' is already registered")]
    DuplicateResource {
        /// Registry kind
        kind: &'static str,
        /// Duplicate name
        name: String,
    },

    /// A handle does not belong to the registry it was used with
    #[error("Stale or foreign {kind} handle")]
    InvalidHandle {
        /// Registry kind
        kind: &'static str,
    },

    /// A layer with render items has no pipeline state bound
    #[error("No pipeline state bound for the {0:?} layer")]
    MissingPipeline(RenderLayer),

    /// Configuration rejected at renderer construction
    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),
}

impl RenderError {
    /// Whether this error came from the device rather than from scene setup
    pub fn is_device_lost(&self) -> bool {
        matches!(
            self,
            Self::DeviceRemoved(_) | Self::Api(_) | Self::FenceTimeout { .. }
        )
    }
}

impl From<crate::config::ConfigError> for RenderError {
    fn from(error: crate::config::ConfigError) -> Self {
        Self::InvalidConfig(error.to_string())
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_errors_are_classified() {
        let timeout = RenderError::FenceTimeout {
            value: 4,
            completed: 2,
            timeout: Duration::from_millis(10),
        };
        assert!(timeout.is_device_lost());
        assert!(RenderError::DeviceRemoved("hung".into()).is_device_lost());
        assert!(!RenderError::FenceRegression { value: 3, previous: 3 }.is_device_lost());
        assert!(!RenderError::MissingPipeline(RenderLayer::Billboard).is_device_lost());
    }

    #[test]
    fn test_config_errors_become_invalid_config() {
        let error: RenderError = crate::config::ConfigError::Invalid("pass_count must be at least 1".into()).into();
        assert!(matches!(error, RenderError::InvalidConfig(message) if message.contains("pass_count")));
    }
}
