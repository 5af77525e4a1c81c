//! Simulated graphics device
//!
//! [`SimulatedDevice`] stands in for a Direct3D12 device, swap chain and
//! command queue. Submitted command lists and fence signals are queued to a
//! worker thread that plays the GPU: it spends a configurable time on each
//! command list and signals the fence in submission order, so the CPU side
//! sees real back-pressure when it runs ahead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::config::{RendererConfig, SimulationConfig};
use crate::render::backend::{BackBufferId, DescriptorHandle, DescriptorHeap, GpuAddress, GraphicsDevice};
use crate::render::commands::Command;
use crate::render::error::{RenderError, RenderResult};
use crate::render::sync::{GpuFence, SimulatedFence};

/// Upload heaps are placed on 64 KiB boundaries
pub const HEAP_ALIGNMENT: u64 = 64 * 1024;

const UPLOAD_HEAP_BASE: u64 = 0x0001_0000_0000;
const DESCRIPTOR_HEAP_BASE: u64 = 0x0008_0000_0000;

enum GpuWork {
    Execute(Vec<Command>),
    Signal(u64),
    Shutdown,
}

#[derive(Debug, Default)]
struct GpuHistory {
    batches: AtomicU64,
    recorded: Mutex<Vec<Vec<Command>>>,
}

/// Device whose GPU is a worker thread
pub struct SimulatedDevice {
    fence: Arc<SimulatedFence>,
    queue: Sender<GpuWork>,
    worker: Option<JoinHandle<()>>,
    history: Arc<GpuHistory>,
    next_upload: u64,
    next_descriptor: u64,
    descriptor_increment: u32,
    back_buffer_count: u32,
    back_buffer: u32,
    present_count: u64,
    removed: Option<String>,
}

impl std::fmt::Debug for SimulatedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedDevice")
            .field("completed", &self.fence.completed_value())
            .field("back_buffer", &self.back_buffer)
            .field("present_count", &self.present_count)
            .field("removed", &self.removed)
            .finish()
    }
}

impl SimulatedDevice {
    /// Start the GPU worker
    pub fn new(renderer: &RendererConfig, simulation: &SimulationConfig) -> RenderResult<Self> {
        renderer.validate()?;
        let fence = Arc::new(SimulatedFence::with_timeout(renderer.fence_wait_timeout()));
        let history = Arc::new(GpuHistory::default());
        let (queue, work) = mpsc::channel();

        let worker = {
            let fence = Arc::clone(&fence);
            let history = Arc::clone(&history);
            let execution_time = simulation.gpu_execution_time();
            let record = simulation.record_executed;
            thread::Builder::new()
                .name("simulated-gpu".to_string())
                .spawn(move || run_gpu(&work, &fence, &history, execution_time, record))
                .map_err(|e| RenderError::Api(format!("failed to start GPU worker: {}", e)))?
        };

        log::info!(
            "Simulated device created: {} back buffers, {:?} per command list",
            renderer.back_buffer_count,
            simulation.gpu_execution_time()
        );

        Ok(Self {
            fence,
            queue,
            worker: Some(worker),
            history,
            next_upload: UPLOAD_HEAP_BASE,
            next_descriptor: DESCRIPTOR_HEAP_BASE,
            descriptor_increment: simulation.descriptor_increment,
            back_buffer_count: renderer.back_buffer_count,
            back_buffer: 0,
            present_count: 0,
            removed: None,
        })
    }

    /// Put the device into the removed state. Every later call fails and
    /// pending fence waits wake with an error.
    pub fn simulate_device_removed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Simulating device removal: {}", reason);
        self.fence.mark_lost(reason.clone());
        self.removed = Some(reason);
    }

    /// Command lists the GPU has finished
    pub fn executed_count(&self) -> u64 {
        self.history.batches.load(Ordering::Acquire)
    }

    /// Copies of finished command lists, if recording is enabled
    pub fn executed(&self) -> Vec<Vec<Command>> {
        self.history
            .recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of presents
    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    /// The concrete fence
    pub fn simulated_fence(&self) -> &Arc<SimulatedFence> {
        &self.fence
    }

    fn check_removed(&self) -> RenderResult<()> {
        match &self.removed {
            Some(reason) => Err(RenderError::DeviceRemoved(reason.clone())),
            None => Ok(()),
        }
    }

    fn submit(&self, work: GpuWork) -> RenderResult<()> {
        self.check_removed()?;
        self.queue
            .send(work)
            .map_err(|_| RenderError::DeviceRemoved("GPU worker stopped".to_string()))
    }
}

fn run_gpu(
    work: &Receiver<GpuWork>,
    fence: &SimulatedFence,
    history: &GpuHistory,
    execution_time: Duration,
    record: bool,
) {
    while let Ok(item) = work.recv() {
        match item {
            GpuWork::Execute(commands) => {
                if !execution_time.is_zero() {
                    thread::sleep(execution_time);
                }
                if record {
                    history
                        .recorded
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(commands);
                }
                history.batches.fetch_add(1, Ordering::Release);
            }
            GpuWork::Signal(value) => {
                if let Err(e) = fence.signal(value) {
                    log::warn!("GPU worker stopping: {}", e);
                    break;
                }
            }
            GpuWork::Shutdown => break,
        }
    }
}

impl GraphicsDevice for SimulatedDevice {
    fn fence(&self) -> Arc<dyn GpuFence> {
        self.fence.clone()
    }

    fn allocate_upload_heap(&mut self, byte_size: u64) -> RenderResult<GpuAddress> {
        self.check_removed()?;
        let address = GpuAddress(self.next_upload);
        let reserved = byte_size.max(1).div_ceil(HEAP_ALIGNMENT) * HEAP_ALIGNMENT;
        self.next_upload += reserved;
        Ok(address)
    }

    fn allocate_descriptor_heap(&mut self, capacity: u32) -> RenderResult<DescriptorHeap> {
        self.check_removed()?;
        let heap = DescriptorHeap {
            gpu_start: DescriptorHandle(self.next_descriptor),
            increment: self.descriptor_increment,
            capacity,
        };
        self.next_descriptor += u64::from(capacity) * u64::from(self.descriptor_increment);
        Ok(heap)
    }

    fn current_back_buffer(&self) -> BackBufferId {
        BackBufferId(self.back_buffer)
    }

    fn execute_command_list(&mut self, commands: &[Command]) -> RenderResult<()> {
        self.submit(GpuWork::Execute(commands.to_vec()))
    }

    fn signal(&mut self, value: u64) -> RenderResult<()> {
        self.submit(GpuWork::Signal(value))
    }

    fn present(&mut self) -> RenderResult<()> {
        self.check_removed()?;
        self.back_buffer = (self.back_buffer + 1) % self.back_buffer_count;
        self.present_count += 1;
        Ok(())
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        let _ = self.queue.send(GpuWork::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Simulated GPU worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> SimulatedDevice {
        let simulation = SimulationConfig::new().with_gpu_execution_time(Duration::from_micros(100));
        SimulatedDevice::new(&RendererConfig::new(), &simulation).unwrap()
    }

    #[test]
    fn test_upload_heaps_are_64k_aligned_and_disjoint() {
        let mut device = device();
        let a = device.allocate_upload_heap(100).unwrap();
        let b = device.allocate_upload_heap(HEAP_ALIGNMENT + 1).unwrap();
        let c = device.allocate_upload_heap(0).unwrap();

        assert_eq!(a.0 % HEAP_ALIGNMENT, 0);
        assert_eq!(b.0, a.0 + HEAP_ALIGNMENT);
        assert_eq!(c.0, b.0 + 2 * HEAP_ALIGNMENT);
    }

    #[test]
    fn test_present_flips_back_buffers() {
        let mut device = device();
        assert_eq!(device.current_back_buffer(), BackBufferId(0));
        device.present().unwrap();
        assert_eq!(device.current_back_buffer(), BackBufferId(1));
        device.present().unwrap();
        assert_eq!(device.current_back_buffer(), BackBufferId(0));
        assert_eq!(device.present_count(), 2);
    }

    #[test]
    fn test_signal_follows_execution() {
        let mut device = device();
        let fence = device.fence();
        device.execute_command_list(&[Command::SetViewport { width: 1, height: 1 }]).unwrap();
        device.signal(1).unwrap();

        fence.wait_until(1).unwrap();
        assert_eq!(device.executed_count(), 1);
        assert!(device.executed().is_empty());
    }

    #[test]
    fn test_recording_keeps_command_lists() {
        let simulation = SimulationConfig::new()
            .with_gpu_execution_time(Duration::ZERO)
            .with_recording(true);
        let mut device = SimulatedDevice::new(&RendererConfig::new(), &simulation).unwrap();
        let fence = device.fence();

        let commands = vec![Command::SetViewport { width: 4, height: 3 }];
        device.execute_command_list(&commands).unwrap();
        device.signal(1).unwrap();
        fence.wait_until(1).unwrap();

        assert_eq!(device.executed(), vec![commands]);
    }

    #[test]
    fn test_removed_device_rejects_work() {
        let mut device = device();
        device.simulate_device_removed("driver reset");

        assert!(matches!(
            device.execute_command_list(&[]),
            Err(RenderError::DeviceRemoved(_))
        ));
        assert!(device.present().is_err());
        assert!(device.fence().wait_until(1).unwrap_err().is_device_lost());
    }
}
