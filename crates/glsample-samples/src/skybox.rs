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
use glsample_engine::render::texture::{self, Cubemap};
use glsample_engine::render::{RenderCtx, RenderTarget, Tracked, UniformRing};
use glsample_engine::Sample;

const PROCEDURAL_FACE_SIZE: u32 = 256;
const MAX_FACE_SIZE: u32 = 1024;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SkyUniforms {
    inv_view_proj: [[f32; 4]; 4],
}

/// Cube-map environment seen from an orbiting camera.
pub struct Skybox {
    pipeline: Tracked<wgpu::RenderPipeline>,
    bind_group: Tracked<wgpu::BindGroup>,
    ring: UniformRing<SkyUniforms>,
    _cubemap: Cubemap,
    _sampler: Tracked<wgpu::Sampler>,

    camera: OrbitCamera,
    ring_offset: u32,
}

/// A quarter of the panorama width spans 90 degrees, one cube face.
fn face_size_for(panorama_width: u32) -> u32 {
    (panorama_width / 4).clamp(1, MAX_FACE_SIZE)
}

/// Inverse of the camera's rotation-only view-projection.
fn sky_matrix(view: Mat4, proj: Mat4) -> Mat4 {
    let mut rotation = view;
    rotation.w_axis = glam::Vec4::W;
    (proj * rotation).inverse()
}

impl Sample for Skybox {
    fn title() -> &'static str {
        "skybox"
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let faces = match ctx.assets.skybox() {
            Some(path) => {
                let panorama = texture::load_rgba(&path)?;
                let size = face_size_for(panorama.width());
                log::info!("projecting {} into {size}px cube faces", path.display());
                texture::equirect_to_cube_faces(&panorama, size)
            }
            None => texture::procedural_sky_faces(PROCEDURAL_FACE_SIZE),
        };
        let cubemap = Cubemap::from_faces(gfx, "sky cubemap", &faces)?;
        let sampler = texture::linear_sampler(gfx, "sky sampler", wgpu::AddressMode::ClampToEdge);
        let ring = UniformRing::new(gfx, "sky uniforms", UniformRing::<SkyUniforms>::DEFAULT_SLOTS);

        let bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sky bgl"),
                entries: &[
                    UniformRing::<SkyUniforms>::layout_entry(0, wgpu::ShaderStages::FRAGMENT),
                    texture_entry(
                        1,
                        wgpu::ShaderStages::FRAGMENT,
                        wgpu::TextureViewDimension::Cube,
                        true,
                    ),
                    sampler_entry(2, wgpu::ShaderStages::FRAGMENT),
                ],
            });
        let bind_group = gfx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky bind group"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ring.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(cubemap.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = gfx.create_shader("sky shader", include_str!("../shaders/skybox.wgsl"));
        let layout = pipeline_layout(gfx.device, "sky pipeline layout", &[&bgl]);
        let pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "sky pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: BaselineState::primitive(),
                depth_stencil: None,
            },
        );

        Ok(Self {
            pipeline,
            bind_group,
            ring,
            _cubemap: cubemap,
            _sampler: sampler,
            camera: OrbitCamera::new(Vec3::ZERO, 1.0).with_auto_rotate(0.1),
            ring_offset: 0,
        })
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.camera.update(ctx.input, ctx.input_frame, ctx.time.dt);
        let cam = self.camera.matrices(ctx.extent.aspect());
        let block = SkyUniforms {
            inv_view_proj: sky_matrix(cam.view, cam.proj).to_cols_array_2d(),
        };
        self.ring_offset = self.ring.write(ctx.gfx.queue, ctx.frame_index(), &block);
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = begin_pass(
            target.encoder,
            "sky pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &*self.bind_group, &[self.ring_offset]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_size_tracks_panorama_width() {
        assert_eq!(face_size_for(2048), 512);
        assert_eq!(face_size_for(16384), MAX_FACE_SIZE);
        assert_eq!(face_size_for(2), 1);
    }

    #[test]
    fn sky_matrix_ignores_camera_translation() {
        let proj = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let at_origin = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let moved = Mat4::look_at_rh(Vec3::new(5.0, 2.0, 0.0), Vec3::new(5.0, 2.0, -1.0), Vec3::Y);
        let a = sky_matrix(at_origin, proj);
        let b = sky_matrix(moved, proj);
        assert!(a.abs_diff_eq(b, 1e-4));
    }
}
