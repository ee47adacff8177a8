use wgpu::util::DeviceExt;

use super::target::TargetExtent;
use super::{Ledger, ResourceKind, Tracked};

/// Renderer-facing context (device/queue + surface format + ledger).
///
/// Every persistent handle a sample owns goes through the `create_*` helpers so
/// the ledger can audit its release.
#[derive(Clone, Copy)]
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub ledger: &'a Ledger,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        ledger: &'a Ledger,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            ledger,
        }
    }

    pub fn uniform_alignment(&self) -> u64 {
        u64::from(self.device.limits().min_uniform_buffer_offset_alignment)
    }

    pub fn create_buffer(&self, desc: &wgpu::BufferDescriptor<'_>) -> Tracked<wgpu::Buffer> {
        self.ledger
            .track(ResourceKind::Buffer, self.device.create_buffer(desc))
    }

    pub fn create_buffer_init(
        &self,
        desc: &wgpu::util::BufferInitDescriptor<'_>,
    ) -> Tracked<wgpu::Buffer> {
        self.ledger
            .track(ResourceKind::Buffer, self.device.create_buffer_init(desc))
    }

    pub fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> Tracked<wgpu::Texture> {
        self.ledger
            .track(ResourceKind::Texture, self.device.create_texture(desc))
    }

    pub fn create_texture_with_data(
        &self,
        desc: &wgpu::TextureDescriptor<'_>,
        data: &[u8],
    ) -> Tracked<wgpu::Texture> {
        let texture = self.device.create_texture_with_data(
            self.queue,
            desc,
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        self.ledger.track(ResourceKind::Texture, texture)
    }

    pub fn create_sampler(&self, desc: &wgpu::SamplerDescriptor<'_>) -> Tracked<wgpu::Sampler> {
        self.ledger
            .track(ResourceKind::Sampler, self.device.create_sampler(desc))
    }

    pub fn create_bind_group(
        &self,
        desc: &wgpu::BindGroupDescriptor<'_>,
    ) -> Tracked<wgpu::BindGroup> {
        self.ledger
            .track(ResourceKind::BindGroup, self.device.create_bind_group(desc))
    }

    pub fn create_render_pipeline(
        &self,
        desc: &wgpu::RenderPipelineDescriptor<'_>,
    ) -> Tracked<wgpu::RenderPipeline> {
        self.ledger.track(
            ResourceKind::RenderPipeline,
            self.device.create_render_pipeline(desc),
        )
    }

    pub fn create_compute_pipeline(
        &self,
        desc: &wgpu::ComputePipelineDescriptor<'_>,
    ) -> Tracked<wgpu::ComputePipeline> {
        self.ledger.track(
            ResourceKind::ComputePipeline,
            self.device.create_compute_pipeline(desc),
        )
    }

    pub fn create_shader(&self, label: &str, source: &str) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    }
}

/// Target for drawing (encoder + surface color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub extent: TargetExtent,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        extent: TargetExtent,
    ) -> Self {
        Self {
            encoder,
            color_view,
            extent,
        }
    }
}
