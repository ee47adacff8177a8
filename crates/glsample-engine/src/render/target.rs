use std::fmt;

use crate::device::BaselineState;

use super::{RenderCtx, Tracked};

/// Non-zero size of a render target in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TargetExtent {
    width: u32,
    height: u32,
}

impl TargetExtent {
    pub fn new(width: u32, height: u32) -> Result<Self, TargetError> {
        if width == 0 || height == 0 {
            return Err(TargetError::ZeroSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn to_extent3d(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetError {
    ZeroSize { width: u32, height: u32 },
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::ZeroSize { width, height } => {
                write!(f, "render target size must be non-zero, got {width}x{height}")
            }
        }
    }
}

impl std::error::Error for TargetError {}

/// A 2D texture whose size follows the surface.
///
/// [`SizedTexture::resize`] replaces the texture and view; the old handle is
/// dropped so the ledger count stays unchanged.
pub struct SizedTexture {
    label: String,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    extent: TargetExtent,
    texture: Tracked<wgpu::Texture>,
    view: wgpu::TextureView,
}

impl SizedTexture {
    pub fn new(
        ctx: &RenderCtx<'_>,
        label: &str,
        extent: TargetExtent,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let (texture, view) = allocate(ctx, label, extent, format, usage);
        Self {
            label: label.to_string(),
            format,
            usage,
            extent,
            texture,
            view,
        }
    }

    /// Depth/stencil attachment in the baseline depth format.
    pub fn depth(ctx: &RenderCtx<'_>, label: &str, extent: TargetExtent) -> Self {
        Self::new(
            ctx,
            label,
            extent,
            BaselineState::DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
    }

    /// Returns `false` when `extent` already matches and nothing was replaced.
    pub fn resize(&mut self, ctx: &RenderCtx<'_>, extent: TargetExtent) -> bool {
        if extent == self.extent {
            return false;
        }
        let (texture, view) = allocate(ctx, &self.label, extent, self.format, self.usage);
        self.texture = texture;
        self.view = view;
        self.extent = extent;
        true
    }

    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

fn allocate(
    ctx: &RenderCtx<'_>,
    label: &str,
    extent: TargetExtent,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> (Tracked<wgpu::Texture>, wgpu::TextureView) {
    let texture = ctx.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent.to_extent3d(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            TargetExtent::new(0, 10),
            Err(TargetError::ZeroSize { width: 0, height: 10 })
        );
        assert!(TargetExtent::new(10, 0).is_err());
        assert!(TargetExtent::new(0, 0).is_err());
    }

    #[test]
    fn positive_dimensions_are_kept_exactly() {
        for (w, h) in [(1, 1), (640, 480), (1921, 1079), (u32::MAX, 3)] {
            let e = TargetExtent::new(w, h).unwrap();
            assert_eq!((e.width(), e.height()), (w, h));
            let e3 = e.to_extent3d();
            assert_eq!((e3.width, e3.height, e3.depth_or_array_layers), (w, h, 1));
        }
    }

    #[test]
    fn aspect_ratio() {
        let e = TargetExtent::new(1280, 720).unwrap();
        assert!((e.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
