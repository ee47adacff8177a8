use anyhow::Result;
use glsample_engine::core::InitCtx;
use glsample_engine::device::BaselineState;
use glsample_engine::render::common::{
    begin_pass, color_attachment, color_target, pipeline_layout, render_pipeline, PipelineSpec,
};
use glsample_engine::render::geometry::{self, ColorVertex, VertexLayout};
use glsample_engine::render::{GeometryObject, RenderCtx, RenderTarget, Tracked};
use glsample_engine::Sample;

/// One vertex-colored triangle.
pub struct Triangle {
    pipeline: Tracked<wgpu::RenderPipeline>,
    geometry: GeometryObject,
}

impl Sample for Triangle {
    fn title() -> &'static str {
        "triangle"
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let gfx = &ctx.gfx;
        let shader = gfx.create_shader("triangle shader", include_str!("../shaders/triangle.wgsl"));
        let layout = pipeline_layout(gfx.device, "triangle pipeline layout", &[]);

        let pipeline = render_pipeline(
            gfx,
            PipelineSpec {
                label: "triangle pipeline",
                layout: &layout,
                shader: &shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[ColorVertex::layout()],
                targets: &[color_target(gfx.surface_format, None)],
                primitive: BaselineState::primitive(),
                depth_stencil: None,
            },
        );

        Ok(Self {
            pipeline,
            geometry: GeometryObject::upload(gfx, "triangle", &geometry::triangle()),
        })
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = begin_pass(
            target.encoder,
            "triangle pass",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
        pass.set_pipeline(&self.pipeline);
        self.geometry.draw(&mut pass);
    }
}
