use anyhow::Result;

use glsample_engine::core::{InitCtx, UpdateCtx};
use glsample_engine::device::{BaselineState, Capability};
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, compute_pipeline, dispatch_size, pipeline_layout,
    render_pipeline, storage_texture_entry, texture_entry, PipelineSpec,
};
use glsample_engine::render::texture::hash2;
use glsample_engine::render::{RenderCtx, RenderTarget, SizedTexture, TargetExtent, Tracked};
use glsample_engine::Sample;

const CELL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const WORKGROUP: u32 = 8;

/// RGBA8 cells, one per pixel, about half of them alive.
pub fn seed_cells(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = if hash2(x, y, seed) >> 31 == 1 { 255 } else { 0 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    data
}

/// Source and destination cell buffer for a generation.
fn ping_pong(generation: u64) -> (usize, usize) {
    let src = ((generation + 1) % 2) as usize;
    (src, 1 - src)
}

/// Conway's Game of Life stepped by a compute shader, one cell per pixel.
pub struct GameOfLife {
    step_pipeline: Tracked<wgpu::ComputePipeline>,
    present_pipeline: Tracked<wgpu::RenderPipeline>,
    step_bgl: wgpu::BindGroupLayout,
    present_bgl: wgpu::BindGroupLayout,

    cells: [SizedTexture; 2],
    // step_groups[i] reads cells[i] and writes the other one.
    step_groups: [Tracked<wgpu::BindGroup>; 2],
    present_groups: [Tracked<wgpu::BindGroup>; 2],

    generation: u64,
    seed: u32,
}

fn cell_texture(ctx: &RenderCtx<'_>, label: &str, extent: TargetExtent) -> SizedTexture {
    SizedTexture::new(
        ctx,
        label,
        extent,
        CELL_FORMAT,
        wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_DST,
    )
}

fn upload_cells(queue: &wgpu::Queue, target: &SizedTexture, seed: u32) {
    let extent = target.extent();
    let data = seed_cells(extent.width(), extent.height(), seed);
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: target.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(extent.width() * 4),
            rows_per_image: Some(extent.height()),
        },
        extent.to_extent3d(),
    );
}

fn step_group(
    ctx: &RenderCtx<'_>,
    layout: &wgpu::BindGroupLayout,
    src: &SizedTexture,
    dst: &SizedTexture,
) -> Tracked<wgpu::BindGroup> {
    ctx.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("life step bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(src.view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(dst.view()),
            },
        ],
    })
}

fn present_group(
    ctx: &RenderCtx<'_>,
    layout: &wgpu::BindGroupLayout,
    cells: &SizedTexture,
) -> Tracked<wgpu::BindGroup> {
    ctx.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("life present bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(cells.view()),
        }],
    })
}

impl GameOfLife {
    fn rebuild_groups(&mut self, ctx: &RenderCtx<'_>) {
        let [a, b] = &self.cells;
        self.step_groups = [
            step_group(ctx, &self.step_bgl, a, b),
            step_group(ctx, &self.step_bgl, b, a),
        ];
        self.present_groups = [
            present_group(ctx, &self.present_bgl, a),
            present_group(ctx, &self.present_bgl, b),
        ];
    }

    fn reseed(&mut self, queue: &wgpu::Queue) {
        self.seed = self.seed.wrapping_add(1);
        upload_cells(queue, &self.cells[0], self.seed);
        self.generation = 0;
    }
}

impl Sample for GameOfLife {
    fn title() -> &'static str {
        "game of life"
    }

    fn required_capabilities() -> &'static [Capability] {
        &[Capability::ComputeShaders]
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let cells = [
            cell_texture(gfx, "life cells a", ctx.extent),
            cell_texture(gfx, "life cells b", ctx.extent),
        ];
        let seed = 1;
        upload_cells(gfx.queue, &cells[0], seed);

        let step_bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("life step bgl"),
                entries: &[
                    texture_entry(
                        0,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::TextureViewDimension::D2,
                        false,
                    ),
                    storage_texture_entry(1, CELL_FORMAT),
                ],
            });
        let present_bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("life present bgl"),
                entries: &[texture_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    wgpu::TextureViewDimension::D2,
                    false,
                )],
            });

        let step_shader = gfx.create_shader("life step", include_str!("../shaders/game_of_life.wgsl"));
        let step_layout = pipeline_layout(gfx.device, "life step layout", &[&step_bgl]);
        let step_pipeline =
            compute_pipeline(gfx, "life step pipeline", &step_layout, &step_shader, "cs_main");

        let present_shader =
            gfx.create_shader("life present", include_str!("../shaders/cells_present.wgsl"));
        let present_layout = pipeline_layout(gfx.device, "life present layout", &[&present_bgl]);
        let present_pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "life present pipeline",
                layout: &present_layout,
                shader: &present_shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: BaselineState::primitive(),
                depth_stencil: None,
            },
        );

        let [a, b] = &cells;
        let step_groups = [
            step_group(gfx, &step_bgl, a, b),
            step_group(gfx, &step_bgl, b, a),
        ];
        let present_groups = [
            present_group(gfx, &present_bgl, a),
            present_group(gfx, &present_bgl, b),
        ];

        Ok(Self {
            step_pipeline,
            present_pipeline,
            step_bgl,
            present_bgl,
            cells,
            step_groups,
            present_groups,
            generation: 0,
            seed,
        })
    }

    fn on_resize(&mut self, ctx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        let [a, b] = &mut self.cells;
        let changed = a.resize(ctx, extent) | b.resize(ctx, extent);
        if changed {
            self.rebuild_groups(ctx);
            self.reseed(ctx.queue);
            log::debug!("reseeded {}x{} cells", extent.width(), extent.height());
        }
        Ok(())
    }

    fn update(&mut self, _ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.generation += 1;
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let (src, dst) = ping_pong(self.generation);
        let extent = self.cells[src].extent();

        {
            let mut pass = target.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("life step pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.step_pipeline);
            pass.set_bind_group(0, &*self.step_groups[src], &[]);
            let (x, y) = dispatch_size(extent.width(), extent.height(), WORKGROUP);
            pass.dispatch_workgroups(x, y, 1);
        }

        let mut pass = begin_pass(
            target.encoder,
            "life present pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
        pass.set_pipeline(&self.present_pipeline);
        pass.set_bind_group(0, &*self.present_groups[dst], &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_fills_every_pixel_opaque() {
        let data = seed_cells(7, 5, 3);
        assert_eq!(data.len(), 7 * 5 * 4);
        assert!(data.chunks_exact(4).all(|px| px[3] == 255));
        assert!(data
            .chunks_exact(4)
            .all(|px| px[0] == px[1] && px[1] == px[2] && (px[0] == 0 || px[0] == 255)));
    }

    #[test]
    fn seeding_is_roughly_half_alive() {
        let data = seed_cells(64, 64, 11);
        let alive = data.chunks_exact(4).filter(|px| px[0] == 255).count();
        let total = 64 * 64;
        assert!(alive > total * 2 / 5 && alive < total * 3 / 5, "alive = {alive}");
    }

    #[test]
    fn seeding_depends_on_seed() {
        assert_eq!(seed_cells(16, 16, 4), seed_cells(16, 16, 4));
        assert_ne!(seed_cells(16, 16, 4), seed_cells(16, 16, 5));
    }

    #[test]
    fn first_generation_reads_the_seeded_buffer() {
        assert_eq!(ping_pong(1), (0, 1));
        assert_eq!(ping_pong(2), (1, 0));
        assert_eq!(ping_pong(3), (0, 1));
    }
}
