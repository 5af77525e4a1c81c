//! GPU/CPU synchronization
//!
//! The GPU is modeled as a separate actor that reports progress through a
//! monotonically increasing counter. [`GpuFence`] is the whole capability the
//! frame loop needs: the queue signals values as it finishes work, and the
//! CPU either reads the completed value or blocks until a target is reached.
//!
//! [`SimulatedFence`] implements the contract with a `Mutex` + `Condvar`
//! pair so the CPU side really blocks while another thread plays the GPU.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::render::error::{RenderError, RenderResult};

/// Fence capability shared between the command queue and the frame loop
pub trait GpuFence: Send + Sync {
    /// Mark `value` as reached. Values lower than the current one are ignored.
    fn signal(&self, value: u64) -> RenderResult<()>;

    /// Highest value the GPU has completed
    fn completed_value(&self) -> u64;

    /// Block until the completed value is at least `value`.
    ///
    /// Returns an error if the device is lost or the wait times out; both are
    /// fatal to the frame.
    fn wait_until(&self, value: u64) -> RenderResult<()>;
}

#[derive(Debug, Default)]
struct FenceState {
    completed: u64,
    lost: Option<String>,
}

/// Condition-variable backed fence
#[derive(Debug, Default)]
pub struct SimulatedFence {
    state: Mutex<FenceState>,
    reached: Condvar,
    timeout: Option<Duration>,
}

impl SimulatedFence {
    /// Create a fence at value zero with unbounded waits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fence whose waits give up after `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Put the fence into the device-lost state and wake every waiter
    pub fn mark_lost(&self, reason: impl Into<String>) {
        let mut state = self.lock();
        state.lost = Some(reason.into());
        self.reached.notify_all();
    }

    /// Whether [`SimulatedFence::mark_lost`] was called
    pub fn is_lost(&self) -> bool {
        self.lock().lost.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, FenceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GpuFence for SimulatedFence {
    fn signal(&self, value: u64) -> RenderResult<()> {
        let mut state = self.lock();
        if let Some(reason) = &state.lost {
            return Err(RenderError::DeviceRemoved(reason.clone()));
        }

        if value > state.completed {
            state.completed = value;
            self.reached.notify_all();
        }
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        self.lock().completed
    }

    fn wait_until(&self, value: u64) -> RenderResult<()> {
        let guard = self.lock();
        let pending = |state: &mut FenceState| state.completed < value && state.lost.is_none();

        let state = match self.timeout {
            None => self
                .reached
                .wait_while(guard, pending)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                let (state, result) = self
                    .reached
                    .wait_timeout_while(guard, timeout, pending)
                    .unwrap_or_else(PoisonError::into_inner);
                if result.timed_out() {
                    return Err(RenderError::FenceTimeout {
                        value,
                        completed: state.completed,
                        timeout,
                    });
                }
                state
            }
        };

        match &state.lost {
            Some(reason) => Err(RenderError::DeviceRemoved(reason.clone())),
            None => Ok(()),
        }
    }
}
