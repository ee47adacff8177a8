use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use glsample_engine::camera::OrbitCamera;
use glsample_engine::core::{InitCtx, UpdateCtx};
use glsample_engine::device::{BaselineState, Capability};
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, compute_pipeline, dispatch_size, pipeline_layout,
    render_pipeline, sampler_entry, storage_buffer_entry, storage_texture_entry, texture_entry,
    PipelineSpec,
};
use glsample_engine::render::texture::{self, Texture2d};
use glsample_engine::render::{
    RenderCtx, RenderTarget, SizedTexture, TargetExtent, Tracked, UniformRing,
};
use glsample_engine::Sample;

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const WORKGROUP: u32 = 8;
// One vec4<f32> per pixel.
const ACCUM_TEXEL_BYTES: u64 = 16;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RayUniforms {
    inv_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    params: [u32; 4],
}

/// Counts samples accumulated for an unchanged camera.
#[derive(Debug, Default)]
struct Accumulation {
    last_view_proj: Option<Mat4>,
    samples: u32,
}

impl Accumulation {
    /// Index of the sample about to be traced; restarts at 0 when the camera moved.
    fn advance(&mut self, view_proj: Mat4) -> u32 {
        match self.last_view_proj {
            Some(last) if last.abs_diff_eq(view_proj, 1e-6) => {
                self.samples = self.samples.saturating_add(1);
            }
            _ => {
                self.samples = 0;
                self.last_view_proj = Some(view_proj);
            }
        }
        self.samples
    }

    fn reset(&mut self) {
        self.last_view_proj = None;
        self.samples = 0;
    }
}

/// Bindings that live as long as the sample.
struct Scene {
    trace_bgl: wgpu::BindGroupLayout,
    present_bgl: wgpu::BindGroupLayout,
    ring: UniformRing<RayUniforms>,
    sky: Texture2d,
    sampler: Tracked<wgpu::Sampler>,
    has_sky: bool,
}

/// Output image, accumulation buffer and the groups that bind them; rebuilt on resize.
struct Screen {
    output: SizedTexture,
    _accum: Tracked<wgpu::Buffer>,
    trace_group: Tracked<wgpu::BindGroup>,
    present_group: Tracked<wgpu::BindGroup>,
}

impl Screen {
    fn new(ctx: &RenderCtx<'_>, extent: TargetExtent, scene: &Scene) -> Self {
        let output = SizedTexture::new(
            ctx,
            "ray output",
            extent,
            OUTPUT_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let accum = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ray accumulation"),
            size: u64::from(extent.width()) * u64::from(extent.height()) * ACCUM_TEXEL_BYTES,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let trace_group = ctx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ray trace bind group"),
            layout: &scene.trace_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene.ring.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(output.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: accum.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(scene.sky.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&scene.sampler),
                },
            ],
        });
        let present_group = ctx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ray present bind group"),
            layout: &scene.present_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(output.view()),
            }],
        });

        Self {
            output,
            _accum: accum,
            trace_group,
            present_group,
        }
    }
}

/// Progressive path tracer over a few spheres and a checkered ground plane.
pub struct RayTracing {
    trace_pipeline: Tracked<wgpu::ComputePipeline>,
    present_pipeline: Tracked<wgpu::RenderPipeline>,
    scene: Scene,
    screen: Screen,

    camera: OrbitCamera,
    accumulation: Accumulation,
    ring_offset: u32,
}

impl Sample for RayTracing {
    fn title() -> &'static str {
        "ray tracing"
    }

    fn required_capabilities() -> &'static [Capability] {
        &[Capability::ComputeShaders]
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let (sky, has_sky) = match ctx.assets.skybox() {
            Some(path) => {
                let panorama = texture::load_rgba(&path)?;
                (Texture2d::from_rgba(gfx, "ray sky", &panorama)?, true)
            }
            None => (
                Texture2d::from_bytes(
                    gfx,
                    "ray sky placeholder",
                    1,
                    1,
                    wgpu::TextureFormat::Rgba8UnormSrgb,
                    &[0, 0, 0, 255],
                )?,
                false,
            ),
        };
        let sampler = texture::linear_sampler(gfx, "ray sky sampler", wgpu::AddressMode::Repeat);
        let ring = UniformRing::new(gfx, "ray uniforms", UniformRing::<RayUniforms>::DEFAULT_SLOTS);

        let trace_bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ray trace bgl"),
                entries: &[
                    UniformRing::<RayUniforms>::layout_entry(0, wgpu::ShaderStages::COMPUTE),
                    storage_texture_entry(1, OUTPUT_FORMAT),
                    storage_buffer_entry(2, wgpu::ShaderStages::COMPUTE, false),
                    texture_entry(
                        3,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::TextureViewDimension::D2,
                        true,
                    ),
                    sampler_entry(4, wgpu::ShaderStages::COMPUTE),
                ],
            });
        let present_bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ray present bgl"),
                entries: &[texture_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureViewDimension::D2,
                    false,
                )],
            });

        let trace_shader =
            gfx.create_shader("ray trace", include_str!("../shaders/ray_tracing.wgsl"));
        let trace_layout = pipeline_layout(gfx.device, "ray trace layout", &[&trace_bgl]);
        let trace_pipeline =
            compute_pipeline(gfx, "ray trace pipeline", &trace_layout, &trace_shader, "cs_main");

        let blit = gfx.create_shader("ray blit", include_str!("../shaders/blit.wgsl"));
        let present_layout = pipeline_layout(gfx.device, "ray present layout", &[&present_bgl]);
        let present_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "ray present pipeline",
                layout: &present_layout,
                shader: &blit,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: BaselineState::primitive(),
                depth_stencil: None,
            },
        );

        let scene = Scene {
            trace_bgl,
            present_bgl,
            ring,
            sky,
            sampler,
            has_sky,
        };
        let screen = Screen::new(gfx, ctx.extent, &scene);

        Ok(Self {
            trace_pipeline,
            present_pipeline,
            scene,
            screen,
            camera: OrbitCamera::new(Vec3::new(0.0, -0.2, 0.0), 6.0),
            accumulation: Accumulation::default(),
            ring_offset: 0,
        })
    }

    fn on_resize(&mut self, ctx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        if extent == self.screen.output.extent() {
            return Ok(());
        }
        self.screen = Screen::new(ctx, extent, &self.scene);
        self.accumulation.reset();
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);
        let cam = self.camera.matrices(ctx.extent.aspect());
        let view_proj = cam.view_proj();
        let sample = self.accumulation.advance(view_proj);

        let block = RayUniforms {
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: cam.position.extend(1.0).to_array(),
            params: [sample, ctx.frame_index() as u32, u32::from(self.scene.has_sky), 0],
        };
        self.ring_offset = self.scene.ring.write(ctx.gfx.queue, ctx.frame_index(), &block);
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let extent = self.screen.output.extent();
        {
            let mut pass = target.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("ray trace pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.trace_pipeline);
            pass.set_bind_group(0, &*self.screen.trace_group, &[self.ring_offset]);
            let (x, y) = dispatch_size(extent.width(), extent.height(), WORKGROUP);
            pass.dispatch_workgroups(x, y, 1);
        }

        let mut pass = begin_pass(
            target.encoder,
            "ray present pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
        pass.set_pipeline(&self.present_pipeline);
        pass.set_bind_group(0, &*self.screen.present_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_camera_accumulates() {
        let mut acc = Accumulation::default();
        let m = Mat4::IDENTITY;
        assert_eq!(acc.advance(m), 0);
        assert_eq!(acc.advance(m), 1);
        assert_eq!(acc.advance(m), 2);
    }

    #[test]
    fn moving_camera_restarts() {
        let mut acc = Accumulation::default();
        acc.advance(Mat4::IDENTITY);
        acc.advance(Mat4::IDENTITY);
        let moved = Mat4::from_translation(Vec3::X);
        assert_eq!(acc.advance(moved), 0);
        assert_eq!(acc.advance(moved), 1);
    }

    #[test]
    fn reset_restarts_at_zero() {
        let mut acc = Accumulation::default();
        acc.advance(Mat4::IDENTITY);
        acc.advance(Mat4::IDENTITY);
        acc.reset();
        assert_eq!(acc.advance(Mat4::IDENTITY), 0);
    }
}
