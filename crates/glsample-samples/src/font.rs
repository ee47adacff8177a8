use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};

use glsample_engine::core::InitCtx;
use glsample_engine::device::BaselineState;
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, pipeline_layout, render_pipeline, sampler_entry,
    texture_entry, uniform_entry, PipelineSpec,
};
use glsample_engine::render::texture::{self, Texture2d};
use glsample_engine::render::{RenderCtx, RenderTarget, TargetExtent, Tracked};
use glsample_engine::text::{FontSystem, TextBitmap};
use glsample_engine::Sample;

const TEXT: &str = "The quick brown fox jumps over the lazy dog";
const TEXT_PX: f32 = 48.0;
const PADDING: u32 = 2;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadUniforms {
    rect: [f32; 4],
    color: [f32; 4],
}

/// NDC rectangle that shows a `width` x `height` bitmap pixel for pixel, centered.
///
/// Bitmaps larger than the surface are scaled down to fit, keeping their aspect.
pub fn text_rect(width: u32, height: u32, extent: TargetExtent) -> [f32; 4] {
    let (sw, sh) = (extent.width() as f32, extent.height() as f32);
    let scale = (sw / width.max(1) as f32)
        .min(sh / height.max(1) as f32)
        .min(1.0);
    let half_w = width as f32 * scale / sw;
    let half_h = height as f32 * scale / sh;
    [-half_w, -half_h, half_w, half_h]
}

/// Loads the font given with `--font`, otherwise the first system font found.
fn rasterize_text(ctx: &InitCtx<'_>) -> Result<TextBitmap> {
    let path = match ctx.assets.font() {
        Some(path) => path,
        None => match FontSystem::find_system_font() {
            Some(path) => path,
            None => {
                log::warn!("no font found; pass --font <ttf/otf> to render text");
                return Ok(TextBitmap::new(1, 1));
            }
        },
    };

    let mut fonts = FontSystem::new();
    let id = fonts
        .load_file(&path)
        .with_context(|| format!("failed to load font {}", path.display()))?;
    log::info!("font: {}", path.display());
    fonts
        .rasterize(id, TEXT, TEXT_PX, PADDING)
        .context("font vanished from the font system")
}

/// Text rasterized on the CPU into an R8 texture and drawn as one alpha-blended quad.
pub struct FontSample {
    pipeline: Tracked<wgpu::RenderPipeline>,
    bind_group: Tracked<wgpu::BindGroup>,
    uniforms: Tracked<wgpu::Buffer>,
    _atlas: Texture2d,
    _sampler: Tracked<wgpu::Sampler>,
    bitmap_size: (u32, u32),
}

impl FontSample {
    fn quad(&self, extent: TargetExtent) -> QuadUniforms {
        let (w, h) = self.bitmap_size;
        QuadUniforms {
            rect: text_rect(w, h, extent),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl Sample for FontSample {
    fn title() -> &'static str {
        "font"
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;

        let bitmap = rasterize_text(ctx)?;
        let atlas = Texture2d::from_bytes(
            gfx,
            "text atlas",
            bitmap.width,
            bitmap.height,
            wgpu::TextureFormat::R8Unorm,
            &bitmap.pixels,
        )?;
        let sampler = texture::linear_sampler(gfx, "text sampler", wgpu::AddressMode::ClampToEdge);

        let initial = QuadUniforms {
            rect: text_rect(bitmap.width, bitmap.height, ctx.extent),
            color: [1.0; 4],
        };
        let uniforms = gfx.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("text quad"),
            contents: bytemuck::bytes_of(&initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bgl = gfx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("text bgl"),
                entries: &[
                    uniform_entry::<QuadUniforms>(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
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
            label: Some("text bind group"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(atlas.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = gfx.create_shader("text shader", include_str!("../shaders/font.wgsl"));
        let layout = pipeline_layout(gfx.device, "text layout", &[&bgl]);
        let pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "text pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[],
                targets: &[color_target(
                    gfx.surface_format,
                    Some(wgpu::BlendState::ALPHA_BLENDING),
                )],
                primitive: BaselineState::primitive(),
                depth_stencil: None,
            },
        );

        Ok(Self {
            pipeline,
            bind_group,
            uniforms,
            _atlas: atlas,
            _sampler: sampler,
            bitmap_size: (bitmap.width, bitmap.height),
        })
    }

    fn on_resize(&mut self, gfx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        gfx.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&self.quad(extent)));
        Ok(())
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = begin_pass(
            target.encoder,
            "text pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &*self.bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_pixel_exact_when_it_fits() {
        let extent = TargetExtent::new(800, 600).unwrap();
        let [x0, y0, x1, y1] = text_rect(400, 60, extent);
        assert!((x1 - x0 - 1.0).abs() < 1e-6);
        assert!((y1 - y0 - 0.2).abs() < 1e-6);
        assert!((x0 + x1).abs() < 1e-6 && (y0 + y1).abs() < 1e-6);
    }

    #[test]
    fn oversized_bitmap_is_scaled_to_fit() {
        let extent = TargetExtent::new(200, 100).unwrap();
        let [x0, y0, x1, y1] = text_rect(1000, 50, extent);
        assert!((x1 - x0 - 2.0).abs() < 1e-6);
        // 1000 px scaled by 0.2 keeps the 20:1 aspect: 10 px of 100.
        assert!((y1 - y0 - 0.2).abs() < 1e-6);
    }
}
