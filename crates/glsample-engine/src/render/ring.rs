use std::marker::PhantomData;
use std::num::NonZeroU64;

use bytemuck::Pod;

use super::{RenderCtx, Tracked};

/// Slot arithmetic for a uniform ring.
///
/// A ring holds `slots` copies of one uniform block in a single buffer, each
/// starting on an `alignment`-byte boundary. Frame `F` always uses slot
/// `F % slots`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RingLayout {
    block_size: u64,
    stride: u64,
    slots: u32,
}

impl RingLayout {
    /// `alignment` must be a power of two. `slots` is clamped to at least 1.
    pub fn new(block_size: u64, alignment: u64, slots: u32) -> Self {
        let block_size = block_size.max(1);
        Self {
            block_size,
            stride: wgpu::util::align_to(block_size, alignment.max(1)),
            slots: slots.max(1),
        }
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn total_size(&self) -> u64 {
        self.stride * u64::from(self.slots)
    }

    #[inline]
    pub fn slot(&self, frame_index: u64) -> u32 {
        (frame_index % u64::from(self.slots)) as u32
    }

    #[inline]
    pub fn offset(&self, frame_index: u64) -> u64 {
        u64::from(self.slot(frame_index)) * self.stride
    }
}

/// `slots` aligned copies of `T` in one uniform buffer, bound with a dynamic offset.
///
/// `update` writes the slot for the current frame, `draw` binds the same slot.
pub struct UniformRing<T> {
    buffer: Tracked<wgpu::Buffer>,
    layout: RingLayout,
    _block: PhantomData<T>,
}

impl<T: Pod> UniformRing<T> {
    pub const DEFAULT_SLOTS: u32 = 3;

    pub fn new(ctx: &RenderCtx<'_>, label: &str, slots: u32) -> Self {
        let layout = RingLayout::new(
            std::mem::size_of::<T>() as u64,
            ctx.uniform_alignment(),
            slots,
        );

        let buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: layout.total_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!(
            "{label}: {} slots, stride {} bytes",
            layout.slots(),
            layout.stride()
        );

        Self {
            buffer,
            layout,
            _block: PhantomData,
        }
    }

    pub fn layout(&self) -> RingLayout {
        self.layout
    }

    /// Copies `block` into the frame's slot and returns the dynamic offset to bind.
    pub fn write(&self, queue: &wgpu::Queue, frame_index: u64, block: &T) -> u32 {
        let offset = self.layout.offset(frame_index);
        queue.write_buffer(&self.buffer, offset, bytemuck::bytes_of(block));
        offset as u32
    }

    /// Binding that covers one slot; the slot is selected by the dynamic offset.
    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: NonZeroU64::new(self.layout.block_size()),
        })
    }

    pub fn layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_up_to_alignment() {
        let l = RingLayout::new(208, 256, 3);
        assert_eq!(l.stride(), 256);
        assert_eq!(l.total_size(), 768);

        let exact = RingLayout::new(512, 256, 2);
        assert_eq!(exact.stride(), 512);
    }

    #[test]
    fn slot_is_frame_modulo_slots() {
        for slots in 1..=5u32 {
            let l = RingLayout::new(64, 256, slots);
            for frame in 0..50u64 {
                let s = l.slot(frame);
                assert_eq!(u64::from(s), frame % u64::from(slots));
                assert!(s < slots);
                assert!(l.offset(frame) + l.block_size() <= l.total_size());
            }
        }
    }

    #[test]
    fn slot_stays_in_range_at_counter_extremes() {
        let l = RingLayout::new(64, 256, 3);
        assert_eq!(l.slot(u64::MAX), (u64::MAX % 3) as u32);
        assert!(l.offset(u64::MAX) < l.total_size());
    }

    #[test]
    fn zero_slots_are_clamped() {
        let l = RingLayout::new(16, 256, 0);
        assert_eq!(l.slots(), 1);
        assert_eq!(l.slot(7), 0);
    }

    #[test]
    fn offsets_are_aligned() {
        let l = RingLayout::new(100, 64, 4);
        for frame in 0..8 {
            assert_eq!(l.offset(frame) % 64, 0);
        }
    }
}
