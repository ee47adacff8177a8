//! Stencil shadow volumes (depth-fail) cast by a cube onto a ground plane.

mod silhouette;

pub use silhouette::{Edge, Occluder};

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use glsample_engine::camera::OrbitCamera;
use glsample_engine::core::{InitCtx, UpdateCtx};
use glsample_engine::device::BaselineState;
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, depth_read_only, pipeline_layout,
    render_pipeline, PipelineSpec,
};
use glsample_engine::render::geometry::{
    self, MeshData, MeshVertex, PositionVertex, VertexLayout,
};
use glsample_engine::render::{
    GeometryObject, RenderCtx, RenderTarget, SizedTexture, TargetExtent, Tracked, UniformRing,
};
use glsample_engine::Sample;

const CUBE_LIFT: f32 = 0.9;
const GROUND_HALF_EXTENT: f32 = 4.0;
// Near cap sits just inside the occluder.
const NEAR_OFFSET: f32 = 0.002;
const EXTRUSION: f32 = 50.0;
const AMBIENT: f32 = 0.25;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ShadowUniforms {
    view_proj: [[f32; 4]; 4],
    to_light: [f32; 4],
    light: [f32; 4],
}

fn lifted_cube() -> MeshData<MeshVertex> {
    let mut mesh = geometry::cube(0.5);
    for v in &mut mesh.vertices {
        v.position[1] += CUBE_LIFT;
    }
    mesh
}

/// Light circling above the scene.
fn light_direction(elapsed: f32) -> Vec3 {
    let a = elapsed * 0.5;
    Vec3::new(a.cos() * 0.8, 1.2, a.sin() * 0.8).normalize()
}

/// Depth-fail counting: back faces behind the scene increment, front faces decrement.
fn volume_stencil() -> wgpu::StencilState {
    let face = |depth_fail_op| wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Always,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op,
        pass_op: wgpu::StencilOperation::Keep,
    };
    wgpu::StencilState {
        front: face(wgpu::StencilOperation::DecrementWrap),
        back: face(wgpu::StencilOperation::IncrementWrap),
        read_mask: 0xff,
        write_mask: 0xff,
    }
}

/// Passes where the count equals the reference (0: outside every volume).
fn lit_stencil() -> wgpu::StencilState {
    let face = wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Equal,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    };
    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: 0xff,
        write_mask: 0,
    }
}

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

pub struct ShadowVolume {
    ambient_pipeline: Tracked<wgpu::RenderPipeline>,
    volume_pipeline: Tracked<wgpu::RenderPipeline>,
    lit_pipeline: Tracked<wgpu::RenderPipeline>,
    bind_group: Tracked<wgpu::BindGroup>,
    ring: UniformRing<ShadowUniforms>,

    cube: GeometryObject,
    ground: GeometryObject,
    volume: GeometryObject,
    occluder: Occluder,
    depth: SizedTexture,

    camera: OrbitCamera,
    ring_offset: u32,
}

impl Sample for ShadowVolume {
    fn title() -> &'static str {
        "shadow volume"
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let cube_mesh = lifted_cube();
        let occluder = Occluder::new(&cube_mesh.positions(), &cube_mesh.indices);
        log::debug!(
            "occluder: {} welded vertices, {} triangles",
            occluder.vertex_count(),
            occluder.triangle_count()
        );
        let volume = GeometryObject::dynamic::<PositionVertex>(
            gfx,
            "shadow volume",
            occluder.max_volume_vertices(),
            occluder.max_volume_indices(),
        );
        let cube = GeometryObject::upload(gfx, "occluder cube", &cube_mesh);
        let ground = GeometryObject::upload(
            gfx,
            "ground",
            &geometry::plane(GROUND_HALF_EXTENT, 0.0),
        );

        let ring = UniformRing::new(
            gfx,
            "shadow uniforms",
            UniformRing::<ShadowUniforms>::DEFAULT_SLOTS,
        );
        let bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shadow bgl"),
                entries: &[UniformRing::<ShadowUniforms>::layout_entry(
                    0,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                )],
            });
        let bind_group = gfx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow bind group"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ring.binding(),
            }],
        });

        let shader = gfx.create_shader(
            "shadow shader",
            include_str!("../../shaders/shadow_volume.wgsl"),
        );
        let layout = pipeline_layout(gfx.device, "shadow layout", &[&bgl]);
        let scene_primitive = wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..BaselineState::primitive()
        };

        let ambient_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "ambient pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_scene",
                fs_entry: "fs_ambient",
                buffers: &[MeshVertex::layout()],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: scene_primitive,
                depth_stencil: Some(BaselineState::depth_stencil()),
            },
        );

        let volume_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "shadow volume pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_volume",
                fs_entry: "fs_volume",
                buffers: &[PositionVertex::layout()],
                targets: &[Some(wgpu::ColorTargetState {
                    format: gfx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::empty(),
                })],
                primitive: BaselineState::primitive(),
                depth_stencil: Some(wgpu::DepthStencilState {
                    stencil: volume_stencil(),
                    ..depth_read_only(wgpu::CompareFunction::Less)
                }),
            },
        );

        let lit_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "lit pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_scene",
                fs_entry: "fs_lit",
                buffers: &[MeshVertex::layout()],
                targets: &[color_target(gfx.surface_format, Some(ADDITIVE))],
                primitive: scene_primitive,
                depth_stencil: Some(wgpu::DepthStencilState {
                    stencil: lit_stencil(),
                    ..depth_read_only(wgpu::CompareFunction::LessEqual)
                }),
            },
        );

        let mut camera = OrbitCamera::new(Vec3::new(0.0, 0.5, 0.0), 6.0);
        camera.pitch = 0.6;

        Ok(Self {
            ambient_pipeline,
            volume_pipeline,
            lit_pipeline,
            bind_group,
            ring,
            cube,
            ground,
            volume,
            occluder,
            depth: SizedTexture::depth(gfx, "shadow depth stencil", ctx.extent),
            camera,
            ring_offset: 0,
        })
    }

    fn on_resize(&mut self, gfx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        self.depth.resize(gfx, extent);
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);

        let to_light = light_direction(ctx.time.elapsed);
        let mesh = self.occluder.volume(to_light, NEAR_OFFSET, EXTRUSION);
        self.volume.write(ctx.gfx.queue, &mesh)?;

        // The far cap must never be clipped.
        let proj = Mat4::perspective_infinite_rh(
            self.camera.fov_y,
            ctx.extent.aspect(),
            self.camera.near,
        );
        let block = ShadowUniforms {
            view_proj: (proj * self.camera.view()).to_cols_array_2d(),
            to_light: to_light.extend(0.0).to_array(),
            light: [1.0, 0.95, 0.85, AMBIENT],
        };
        self.ring_offset = self.ring.write(ctx.gfx.queue, ctx.frame_index(), &block);
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = begin_pass(
            target.encoder,
            "shadow pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            Some(self.depth.view()),
        );
        pass.set_bind_group(0, &*self.bind_group, &[self.ring_offset]);

        pass.set_pipeline(&self.ambient_pipeline);
        self.cube.draw(&mut pass);
        self.ground.draw(&mut pass);

        pass.set_pipeline(&self.volume_pipeline);
        self.volume.draw(&mut pass);

        pass.set_pipeline(&self.lit_pipeline);
        pass.set_stencil_reference(0);
        self.cube.draw(&mut pass);
        self.ground.draw(&mut pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_stays_above_the_ground() {
        for i in 0..32 {
            let l = light_direction(i as f32 * 0.4);
            assert!((l.length() - 1.0).abs() < 1e-5);
            assert!(l.y > 0.5);
        }
    }

    #[test]
    fn volume_stencil_counts_only_depth_failures() {
        let s = volume_stencil();
        assert_eq!(s.back.depth_fail_op, wgpu::StencilOperation::IncrementWrap);
        assert_eq!(s.front.depth_fail_op, wgpu::StencilOperation::DecrementWrap);
        for face in [s.front, s.back] {
            assert_eq!(face.pass_op, wgpu::StencilOperation::Keep);
            assert_eq!(face.compare, wgpu::CompareFunction::Always);
        }
    }

    #[test]
    fn lit_stencil_never_writes() {
        let s = lit_stencil();
        assert_eq!(s.write_mask, 0);
        assert_eq!(s.front.compare, wgpu::CompareFunction::Equal);
    }

    #[test]
    fn lifted_cube_rests_above_ground() {
        let positions = lifted_cube().positions();
        let lowest = positions.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        assert!(lowest > 0.0);
    }

    #[test]
    fn volume_mesh_fits_dynamic_buffer() {
        let mesh = lifted_cube();
        let occluder = Occluder::new(&mesh.positions(), &mesh.indices);
        for i in 0..16 {
            let volume = occluder.volume(light_direction(i as f32), NEAR_OFFSET, EXTRUSION);
            assert!(volume.vertices.len() <= occluder.max_volume_vertices());
            assert!(volume.indices.len() <= occluder.max_volume_indices());
        }
    }
}
