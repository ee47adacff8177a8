use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use glsample_engine::camera::OrbitCamera;
use glsample_engine::core::{InitCtx, UpdateCtx};
use glsample_engine::device::BaselineState;
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, pipeline_layout, render_pipeline,
    sampler_entry, texture_entry, PipelineSpec,
};
use glsample_engine::render::geometry::{self, MeshVertex, VertexLayout};
use glsample_engine::render::texture::{self, Texture2d};
use glsample_engine::render::{
    GeometryObject, RenderCtx, RenderTarget, SizedTexture, TargetExtent, Tracked, UniformRing,
};
use glsample_engine::Sample;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CubeUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

/// Textured cube spinning with elapsed time; uniforms go through a 3-slot ring.
pub struct TexturedCube {
    pipeline: Tracked<wgpu::RenderPipeline>,
    bind_group: Tracked<wgpu::BindGroup>,
    ring: UniformRing<CubeUniforms>,
    geometry: GeometryObject,
    _texture: Texture2d,
    _sampler: Tracked<wgpu::Sampler>,
    depth: SizedTexture,

    camera: OrbitCamera,
    ring_offset: u32,
}

impl Sample for TexturedCube {
    fn title() -> &'static str {
        "texture"
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let image = match ctx.assets.texture() {
            Some(path) => texture::load_rgba(&path)?,
            None => texture::checkerboard(256, 8),
        };
        let color = Texture2d::from_rgba(gfx, "cube texture", &image)?;
        let sampler = texture::linear_sampler(gfx, "cube sampler", wgpu::AddressMode::Repeat);
        let ring = UniformRing::new(gfx, "cube uniforms", UniformRing::<CubeUniforms>::DEFAULT_SLOTS);

        let bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("cube bgl"),
                entries: &[
                    UniformRing::<CubeUniforms>::layout_entry(
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

        let bind_group = gfx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cube bind group"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ring.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(color.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = gfx.create_shader("cube shader", include_str!("../shaders/texture.wgsl"));
        let layout = pipeline_layout(gfx.device, "cube pipeline layout", &[&bgl]);
        let pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "cube pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[MeshVertex::layout()],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: wgpu::PrimitiveState {
                    cull_mode: Some(wgpu::Face::Back),
                    ..BaselineState::primitive()
                },
                depth_stencil: Some(BaselineState::depth_stencil()),
            },
        );

        Ok(Self {
            pipeline,
            bind_group,
            ring,
            geometry: GeometryObject::upload(gfx, "cube", &geometry::cube(0.5)),
            _texture: color,
            _sampler: sampler,
            depth: SizedTexture::depth(gfx, "cube depth", ctx.extent),
            camera: OrbitCamera::new(Vec3::ZERO, 3.0),
            ring_offset: 0,
        })
    }

    fn on_resize(&mut self, gfx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        self.depth.resize(gfx, extent);
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);

        let t = ctx.time.elapsed;
        let model = Mat4::from_rotation_y(t * 0.8) * Mat4::from_rotation_x(t * 0.5);
        let cam = self.camera.matrices(ctx.extent.aspect());

        let block = CubeUniforms {
            mvp: (cam.view_proj() * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_dir: Vec3::new(0.4, 1.0, 0.6).normalize().extend(0.0).to_array(),
        };
        self.ring_offset = self.ring.write(ctx.gfx.queue, ctx.frame_index(), &block);
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = begin_pass(
            target.encoder,
            "cube pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            Some(self.depth.view()),
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &*self.bind_group, &[self.ring_offset]);
        self.geometry.draw(&mut pass);
    }
}
