use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use glsample_engine::camera::OrbitCamera;
use glsample_engine::core::{InitCtx, UpdateCtx};
use glsample_engine::device::BaselineState;
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, pipeline_layout, render_pipeline, sampler_entry,
    texture_entry, PipelineSpec,
};
use glsample_engine::render::geometry::{self, MeshVertex, VertexLayout};
use glsample_engine::render::texture::{self, Texture2d};
use glsample_engine::render::{
    GeometryObject, RenderCtx, RenderTarget, SizedTexture, TargetExtent, Tracked, UniformRing,
};
use glsample_engine::Sample;

const GBUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const GBUFFER_LABELS: [&str; 4] = [
    "gbuffer albedo",
    "gbuffer normal",
    "gbuffer world pos",
    "gbuffer depth",
];
const GRID: u32 = 2;
// View distance shown as white in the depth tile.
const DEPTH_RANGE: f32 = 6.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GBufferUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    depth_range: [f32; 4],
}

/// Viewport `[x, y, width, height]` of each tile, row-major from the top left.
pub fn grid_tiles(extent: TargetExtent) -> [[f32; 4]; 4] {
    let w = extent.width() as f32 / GRID as f32;
    let h = extent.height() as f32 / GRID as f32;
    std::array::from_fn(|i| {
        let col = (i as u32 % GRID) as f32;
        let row = (i as u32 / GRID) as f32;
        [col * w, row * h, w, h]
    })
}

/// Offscreen targets written by the geometry pass.
struct GBuffer {
    targets: [SizedTexture; 4],
    depth: SizedTexture,
}

impl GBuffer {
    fn new(ctx: &RenderCtx<'_>, extent: TargetExtent) -> Self {
        Self {
            targets: GBUFFER_LABELS.map(|label| {
                SizedTexture::new(
                    ctx,
                    label,
                    extent,
                    GBUFFER_FORMAT,
                    wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                )
            }),
            depth: SizedTexture::depth(ctx, "gbuffer depth stencil", extent),
        }
    }

    fn resize(&mut self, ctx: &RenderCtx<'_>, extent: TargetExtent) -> bool {
        let mut changed = self.depth.resize(ctx, extent);
        for target in &mut self.targets {
            changed |= target.resize(ctx, extent);
        }
        changed
    }

    fn composite_group(
        &self,
        ctx: &RenderCtx<'_>,
        layout: &wgpu::BindGroupLayout,
    ) -> Tracked<wgpu::BindGroup> {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, t)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(t.view()),
            })
            .collect();
        ctx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite bind group"),
            layout,
            entries: &entries,
        })
    }
}

/// Renders a model into four targets and shows each in a quarter of the window.
pub struct Multipass {
    scene_pipeline: Tracked<wgpu::RenderPipeline>,
    composite_pipeline: Tracked<wgpu::RenderPipeline>,
    scene_group: Tracked<wgpu::BindGroup>,
    composite_bgl: wgpu::BindGroupLayout,
    composite_group: Tracked<wgpu::BindGroup>,

    ring: UniformRing<GBufferUniforms>,
    model: GeometryObject,
    _albedo: Texture2d,
    _sampler: Tracked<wgpu::Sampler>,
    gbuffer: GBuffer,

    camera: OrbitCamera,
    tiles: [[f32; 4]; 4],
    ring_offset: u32,
}

impl Sample for Multipass {
    fn title() -> &'static str {
        "multipass"
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let mesh = match ctx.assets.model() {
            Some(path) => geometry::load_stl(&path)?,
            None => geometry::cube(0.75),
        };
        log::info!("model: {} triangles", mesh.triangle_count());
        let model = GeometryObject::upload(gfx, "multipass model", &mesh);

        let image = match ctx.assets.texture() {
            Some(path) => texture::load_rgba(&path)?,
            None => texture::checkerboard(256, 8),
        };
        let albedo = Texture2d::from_rgba(gfx, "multipass albedo", &image)?;
        let sampler = texture::linear_sampler(gfx, "multipass sampler", wgpu::AddressMode::Repeat);
        let ring = UniformRing::new(
            gfx,
            "gbuffer uniforms",
            UniformRing::<GBufferUniforms>::DEFAULT_SLOTS,
        );

        let scene_bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("gbuffer bgl"),
                entries: &[
                    UniformRing::<GBufferUniforms>::layout_entry(
                        0,
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ),
                    texture_entry(
                        1,
                        wgpu::ShaderStages::FRAGMENT,
                        wgpu::TextureViewDimension::D2,
                        true,
                    ),
                    sampler_entry(2, wgpu::ShaderStages::FRAGMENT),
                ],
            });
        let scene_group = gfx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gbuffer bind group"),
            layout: &scene_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ring.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(albedo.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let composite_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..GBUFFER_LABELS.len() as u32)
            .map(|binding| {
                texture_entry(
                    binding,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureViewDimension::D2,
                    false,
                )
            })
            .collect();
        let composite_bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("composite bgl"),
                entries: &composite_entries,
            });

        let scene_shader =
            gfx.create_shader("gbuffer shader", include_str!("../shaders/multipass_gbuffer.wgsl"));
        let scene_layout = pipeline_layout(gfx.device, "gbuffer layout", &[&scene_bgl]);
        let gbuffer_targets: Vec<Option<wgpu::ColorTargetState>> = GBUFFER_LABELS
            .iter()
            .map(|_| color_target(GBUFFER_FORMAT, None))
            .collect();
        let scene_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "gbuffer pipeline",
                layout: &scene_layout,
                shader: &scene_shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[MeshVertex::layout()],
                targets: &gbuffer_targets,
                primitive: wgpu::PrimitiveState {
                    cull_mode: Some(wgpu::Face::Back),
                    ..BaselineState::primitive()
                },
                depth_stencil: Some(BaselineState::depth_stencil()),
            },
        );

        let composite_shader = gfx.create_shader(
            "composite shader",
            include_str!("../shaders/multipass_composite.wgsl"),
        );
        let composite_layout = pipeline_layout(gfx.device, "composite layout", &[&composite_bgl]);
        let composite_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "composite pipeline",
                layout: &composite_layout,
                shader: &composite_shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: BaselineState::primitive(),
                depth_stencil: None,
            },
        );

        let gbuffer = GBuffer::new(gfx, ctx.extent);
        let composite_group = gbuffer.composite_group(gfx, &composite_bgl);

        Ok(Self {
            scene_pipeline,
            composite_pipeline,
            scene_group,
            composite_bgl,
            composite_group,
            ring,
            model,
            _albedo: albedo,
            _sampler: sampler,
            gbuffer,
            camera: OrbitCamera::new(Vec3::ZERO, 3.0).with_auto_rotate(0.4),
            tiles: grid_tiles(ctx.extent),
            ring_offset: 0,
        })
    }

    fn on_resize(&mut self, gfx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        if self.gbuffer.resize(gfx, extent) {
            self.composite_group = self.gbuffer.composite_group(gfx, &self.composite_bgl);
        }
        self.tiles = grid_tiles(extent);
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);
        let cam = self.camera.matrices(ctx.extent.aspect());
        let model = Mat4::IDENTITY;

        let block = GBufferUniforms {
            mvp: (cam.view_proj() * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            view: cam.view.to_cols_array_2d(),
            depth_range: [DEPTH_RANGE, 0.0, 0.0, 0.0],
        };
        self.ring_offset = self.ring.write(ctx.gfx.queue, ctx.frame_index(), &block);
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        {
            let attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = self
                .gbuffer
                .targets
                .iter()
                .map(|t| Some(color_attachment(t.view(), Some(wgpu::Color::TRANSPARENT))))
                .collect();
            let mut pass = begin_pass(
                target.encoder,
                "gbuffer pass",
                &attachments,
                Some(self.gbuffer.depth.view()),
            );
            pass.set_pipeline(&self.scene_pipeline);
            pass.set_bind_group(0, &*self.scene_group, &[self.ring_offset]);
            self.model.draw(&mut pass);
        }

        let mut pass = begin_pass(
            target.encoder,
            "composite pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &*self.composite_group, &[]);
        for [x, y, w, h] in self.tiles {
            pass.set_viewport(x, y, w, h, 0.0, 1.0);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_cover_the_surface_in_quarters() {
        let extent = TargetExtent::new(800, 600).unwrap();
        let tiles = grid_tiles(extent);
        assert_eq!(tiles[0], [0.0, 0.0, 400.0, 300.0]);
        assert_eq!(tiles[1], [400.0, 0.0, 400.0, 300.0]);
        assert_eq!(tiles[2], [0.0, 300.0, 400.0, 300.0]);
        assert_eq!(tiles[3], [400.0, 300.0, 400.0, 300.0]);
    }

    #[test]
    fn odd_sizes_stay_inside_the_surface() {
        let extent = TargetExtent::new(801, 3).unwrap();
        for [x, y, w, h] in grid_tiles(extent) {
            assert!(x + w <= 801.0 + 1e-3);
            assert!(y + h <= 3.0 + 1e-3);
        }
    }
}
