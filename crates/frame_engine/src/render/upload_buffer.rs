//! CPU-writable, GPU-readable buffers
//!
//! An [`UploadBuffer`] is a persistently mapped array of `T`. Constant
//! buffers round the element stride up to the constant buffer alignment
//! (256 bytes on D3D12) so every element starts on a legal CBV boundary;
//! vertex buffers pack elements tightly.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::render::backend::{GpuAddress, GraphicsDevice};
use crate::render::error::{RenderError, RenderResult};
use crate::render::geometry::VertexBufferView;

/// Typed upload heap with per-element GPU addresses
#[derive(Debug)]
pub struct UploadBuffer<T: Pod> {
    label: &'static str,
    base: GpuAddress,
    stride: u64,
    capacity: usize,
    data: Vec<u8>,
    write_count: u64,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    /// Allocate a constant buffer of `capacity` elements, each aligned to `alignment`
    pub fn constant(
        device: &mut dyn GraphicsDevice,
        label: &'static str,
        capacity: usize,
        alignment: u64,
    ) -> RenderResult<Self> {
        let size = std::mem::size_of::<T>() as u64;
        let stride = (size + alignment - 1) & !(alignment - 1);
        Self::with_stride(device, label, capacity, stride)
    }

    /// Allocate a tightly packed buffer (vertex data)
    pub fn packed(
        device: &mut dyn GraphicsDevice,
        label: &'static str,
        capacity: usize,
    ) -> RenderResult<Self> {
        Self::with_stride(device, label, capacity, std::mem::size_of::<T>() as u64)
    }

    fn with_stride(
        device: &mut dyn GraphicsDevice,
        label: &'static str,
        capacity: usize,
        stride: u64,
    ) -> RenderResult<Self> {
        let byte_size = stride * capacity as u64;
        let base = device.allocate_upload_heap(byte_size)?;
        log::trace!(
            "Allocated {} buffer: {} x {} bytes at {:#x}",
            label,
            capacity,
            stride,
            base.0
        );

        Ok(Self {
            label,
            base,
            stride,
            capacity,
            data: vec![0; byte_size as usize],
            write_count: 0,
            _marker: PhantomData,
        })
    }

    fn check_index(&self, index: usize) -> RenderResult<usize> {
        if index >= self.capacity {
            return Err(RenderError::SlotOutOfRange {
                buffer: self.label,
                index,
                capacity: self.capacity,
            });
        }
        Ok(index * self.stride as usize)
    }

    /// Write one element
    pub fn copy_data(&mut self, index: usize, value: &T) -> RenderResult<()> {
        let offset = self.check_index(index)?;
        let bytes = bytemuck::bytes_of(value);
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.write_count += 1;
        Ok(())
    }

    /// Overwrite the leading elements with `values`
    pub fn copy_slice(&mut self, values: &[T]) -> RenderResult<()> {
        if values.len() > self.capacity {
            return Err(RenderError::SlotOutOfRange {
                buffer: self.label,
                index: values.len() - 1,
                capacity: self.capacity,
            });
        }
        for (index, value) in values.iter().enumerate() {
            self.copy_data(index, value)?;
        }
        Ok(())
    }

    /// Read back one element as the GPU would see it
    pub fn read(&self, index: usize) -> RenderResult<T> {
        let offset = self.check_index(index)?;
        let size = std::mem::size_of::<T>();
        Ok(bytemuck::pod_read_unaligned(&self.data[offset..offset + size]))
    }

    /// GPU address of one element (`base + index * stride`)
    pub fn gpu_address(&self, index: usize) -> RenderResult<GpuAddress> {
        let offset = self.check_index(index)?;
        Ok(self.base.offset(offset as u64))
    }

    /// GPU address of element 0
    pub fn base_address(&self) -> GpuAddress {
        self.base
    }

    /// Bytes between consecutive elements
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of elements
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of element writes since creation
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// Bind the whole buffer as vertex data
    pub fn vertex_buffer_view(&self) -> VertexBufferView {
        VertexBufferView {
            address: self.base,
            size_in_bytes: self.data.len() as u32,
            stride: self.stride as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::constants::{MaterialConstants, ObjectConstants};
    use crate::render::geometry::Vertex;
    use crate::render::tests::doubles::RecordingDevice;
    use bytemuck::Zeroable;

    #[test]
    fn test_constant_stride_is_aligned() {
        let mut device = RecordingDevice::new();
        let objects: UploadBuffer<ObjectConstants> = UploadBuffer::constant(&mut device, "object", 4, 256).unwrap();
        let materials: UploadBuffer<MaterialConstants> =
            UploadBuffer::constant(&mut device, "material", 4, 256).unwrap();

        assert_eq!(objects.stride(), 256);
        assert_eq!(materials.stride(), 256);
        assert_eq!(
            objects.gpu_address(3).unwrap(),
            objects.base_address().offset(3 * 256)
        );
    }

    #[test]
    fn test_packed_stride_matches_element() {
        let mut device = RecordingDevice::new();
        let vertices: UploadBuffer<Vertex> = UploadBuffer::packed(&mut device, "vertex", 10).unwrap();

        assert_eq!(vertices.stride(), 32);
        assert_eq!(vertices.vertex_buffer_view().size_in_bytes, 320);
    }

    #[test]
    fn test_writes_are_bounds_checked() {
        let mut device = RecordingDevice::new();
        let mut buffer: UploadBuffer<ObjectConstants> = UploadBuffer::constant(&mut device, "object", 2, 256).unwrap();

        let value = ObjectConstants {
            world: [[2.0; 4]; 4],
            ..ObjectConstants::zeroed()
        };
        buffer.copy_data(1, &value).unwrap();
        assert_eq!(buffer.read(1).unwrap(), value);
        assert_eq!(buffer.read(0).unwrap(), ObjectConstants::zeroed());
        assert_eq!(buffer.write_count(), 1);

        assert!(matches!(
            buffer.copy_data(2, &value),
            Err(RenderError::SlotOutOfRange { buffer: "object", index: 2, capacity: 2 })
        ));
        assert!(buffer.gpu_address(2).is_err());
        assert!(buffer.copy_slice(&[value; 3]).is_err());
    }
}
