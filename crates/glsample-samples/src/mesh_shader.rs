use anyhow::Result;
use glsample_engine::core::InitCtx;
use glsample_engine::device::{BaselineState, Capability};
use glsample_engine::render::common::{begin_pass, color_attachment};
use glsample_engine::render::{RenderCtx, RenderTarget};
use glsample_engine::Sample;

/// Mesh shading output bounds granted to the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshOutputLimits {
    pub vertices: u32,
    pub primitives: u32,
}

impl MeshOutputLimits {
    pub fn of(limits: &wgpu::Limits) -> Self {
        Self {
            vertices: limits.max_mesh_output_vertices,
            primitives: limits.max_mesh_output_primitives,
        }
    }
}

/// Requires mesh shading, reports its output limits and clears every frame.
pub struct MeshShader {
    limits: MeshOutputLimits,
}

impl MeshShader {
    pub fn limits(&self) -> MeshOutputLimits {
        self.limits
    }
}

impl Sample for MeshShader {
    fn title() -> &'static str {
        "mesh shader"
    }

    fn required_capabilities() -> &'static [Capability] {
        &[Capability::MeshShader]
    }

    fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
        let limits = MeshOutputLimits::of(&ctx.gfx.device.limits());
        log::info!("max mesh output vertices {}", limits.vertices);
        log::info!("max mesh output primitives {}", limits.primitives);
        Ok(Self { limits })
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let _pass = begin_pass(
            target.encoder,
            "mesh shader clear",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_limits_are_read_from_device_limits() {
        let limits = wgpu::Limits {
            max_mesh_output_vertices: 256,
            max_mesh_output_primitives: 128,
            ..wgpu::Limits::defaults()
        };
        assert_eq!(
            MeshOutputLimits::of(&limits),
            MeshOutputLimits {
                vertices: 256,
                primitives: 128
            }
        );
    }

    #[test]
    fn mesh_shading_is_required() {
        assert_eq!(MeshShader::required_capabilities(), &[Capability::MeshShader]);
    }
}
