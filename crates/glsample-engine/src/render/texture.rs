//! Image loading, procedural images and texture uploads.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec3, Vec4};
use image::{Rgba, RgbaImage};

use super::{RenderCtx, Tracked};

/// Decodes any supported image file into RGBA8.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("failed to load image {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// `cells` x `cells` checkerboard, `size` pixels square.
pub fn checkerboard(size: u32, cells: u32) -> RgbaImage {
    let cell = (size / cells.max(1)).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([230, 230, 230, 255])
        } else {
            Rgba([40, 40, 40, 255])
        }
    })
}

/// Integer hash producing well-mixed bits for grid coordinates.
pub fn hash2(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374_761_393));
    h = h.wrapping_add(y.wrapping_mul(668_265_263));
    h ^= h >> 13;
    h = h.wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    h
}

// ── 2D textures ───────────────────────────────────────────────────────────

/// Rejects sizes the device cannot hold instead of leaving them to wgpu validation.
pub fn check_texture_size(label: &str, width: u32, height: u32, max_dimension: u32) -> Result<()> {
    anyhow::ensure!(
        width > 0 && height > 0,
        "{label}: texture size {width}x{height} is empty"
    );
    anyhow::ensure!(
        width <= max_dimension && height <= max_dimension,
        "{label}: texture size {width}x{height} exceeds the device limit of {max_dimension}"
    );
    Ok(())
}

pub struct Texture2d {
    texture: Tracked<wgpu::Texture>,
    view: wgpu::TextureView,
}

impl Texture2d {
    /// Uploads `image` as an sRGB texture with a single mip level.
    pub fn from_rgba(ctx: &RenderCtx<'_>, label: &str, image: &RgbaImage) -> Result<Self> {
        Self::from_bytes(
            ctx,
            label,
            image.width(),
            image.height(),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            image.as_raw(),
        )
    }

    pub fn from_bytes(
        ctx: &RenderCtx<'_>,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        data: &[u8],
    ) -> Result<Self> {
        check_texture_size(
            label,
            width,
            height,
            ctx.device.limits().max_texture_dimension_2d,
        )?;
        let texel_bytes = format
            .block_copy_size(None)
            .with_context(|| format!("{label}: {format:?} has no single copy size"))?;
        let expected = u64::from(width) * u64::from(height) * u64::from(texel_bytes);
        anyhow::ensure!(
            data.len() as u64 == expected,
            "{label}: {} bytes of texel data, expected {expected}",
            data.len()
        );

        let texture = ctx.create_texture_with_data(
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self { texture, view })
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

pub fn linear_sampler(
    ctx: &RenderCtx<'_>,
    label: &str,
    address_mode: wgpu::AddressMode,
) -> Tracked<wgpu::Sampler> {
    ctx.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

// ── cubemaps ──────────────────────────────────────────────────────────────

/// Layer order of a cube texture: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: usize = 6;

/// World direction through texel coordinate `(u, v)` in `[0, 1]` of `face`.
pub fn cube_face_direction(face: usize, u: f32, v: f32) -> Vec3 {
    let s = 2.0 * u - 1.0;
    let t = 2.0 * v - 1.0;
    let dir = match face {
        0 => Vec3::new(1.0, -t, -s),
        1 => Vec3::new(-1.0, -t, s),
        2 => Vec3::new(s, 1.0, t),
        3 => Vec3::new(s, -1.0, -t),
        4 => Vec3::new(s, -t, 1.0),
        _ => Vec3::new(-s, -t, -1.0),
    };
    dir.normalize()
}

/// Equirectangular `(u, v)` of a unit direction; `v = 0` is straight up.
pub fn direction_to_equirect(dir: Vec3) -> (f32, f32) {
    let u = 0.5 + dir.z.atan2(dir.x) / (2.0 * PI);
    let v = 0.5 - dir.y.clamp(-1.0, 1.0).asin() / PI;
    (u, v)
}

/// Projects a panorama onto six `face_size` square faces.
pub fn equirect_to_cube_faces(panorama: &RgbaImage, face_size: u32) -> [RgbaImage; CUBE_FACES] {
    let (w, h) = panorama.dimensions();
    std::array::from_fn(|face| {
        RgbaImage::from_fn(face_size, face_size, |x, y| {
            let u = (x as f32 + 0.5) / face_size as f32;
            let v = (y as f32 + 0.5) / face_size as f32;
            let (eu, ev) = direction_to_equirect(cube_face_direction(face, u, v));
            let px = ((eu * w as f32) as u32).min(w.saturating_sub(1));
            let py = ((ev * h as f32) as u32).min(h.saturating_sub(1));
            *panorama.get_pixel(px, py)
        })
    })
}

/// Gradient sky: horizon haze to zenith blue, dark ground, a soft sun.
pub fn procedural_sky_faces(face_size: u32) -> [RgbaImage; CUBE_FACES] {
    let zenith = Vec4::new(0.10, 0.25, 0.60, 1.0);
    let horizon = Vec4::new(0.70, 0.80, 0.90, 1.0);
    let ground = Vec4::new(0.20, 0.18, 0.16, 1.0);
    let sun_dir = Vec3::new(0.4, 0.35, -0.85).normalize();

    std::array::from_fn(|face| {
        RgbaImage::from_fn(face_size, face_size, |x, y| {
            let u = (x as f32 + 0.5) / face_size as f32;
            let v = (y as f32 + 0.5) / face_size as f32;
            let dir = cube_face_direction(face, u, v);

            let mut c = if dir.y >= 0.0 {
                horizon.lerp(zenith, dir.y.powf(0.6))
            } else {
                horizon.lerp(ground, (-dir.y * 4.0).min(1.0))
            };
            let sun = dir.dot(sun_dir).max(0.0).powf(256.0);
            c += Vec4::new(1.0, 0.9, 0.7, 0.0) * sun;

            let c = c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
            Rgba([c.x as u8, c.y as u8, c.z as u8, 255])
        })
    })
}

pub struct Cubemap {
    texture: Tracked<wgpu::Texture>,
    view: wgpu::TextureView,
}

impl Cubemap {
    /// All faces must share one square size.
    pub fn from_faces(ctx: &RenderCtx<'_>, label: &str, faces: &[RgbaImage; CUBE_FACES]) -> Result<Self> {
        let size = faces[0].width();
        anyhow::ensure!(
            faces.iter().all(|f| f.dimensions() == (size, size)),
            "cubemap faces must be square and equally sized"
        );
        check_texture_size(label, size, size, ctx.device.limits().max_texture_dimension_2d)?;

        let mut data = Vec::with_capacity((size * size * 4) as usize * CUBE_FACES);
        for face in faces {
            data.extend_from_slice(face.as_raw());
        }

        let texture = ctx.create_texture_with_data(
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: CUBE_FACES as u32,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            &data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        Ok(Self { texture, view })
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::Headless;

    #[test]
    fn face_centers_point_along_axes() {
        let expected = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        for (face, axis) in expected.into_iter().enumerate() {
            let d = cube_face_direction(face, 0.5, 0.5);
            assert!(d.abs_diff_eq(axis, 1e-6), "face {face}: {d:?}");
        }
    }

    #[test]
    fn face_directions_are_unit() {
        for face in 0..CUBE_FACES {
            for (u, v) in [(0.0, 0.0), (1.0, 0.0), (0.3, 0.9)] {
                assert!((cube_face_direction(face, u, v).length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn equirect_poles_and_horizon() {
        let (_, v_up) = direction_to_equirect(Vec3::Y);
        let (_, v_down) = direction_to_equirect(-Vec3::Y);
        let (u_x, v_x) = direction_to_equirect(Vec3::X);
        assert!(v_up.abs() < 1e-6);
        assert!((v_down - 1.0).abs() < 1e-6);
        assert!((u_x - 0.5).abs() < 1e-6);
        assert!((v_x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn panorama_top_half_lands_on_top_face() {
        let pano = RgbaImage::from_fn(64, 32, |_, y| {
            if y < 16 { Rgba([255, 255, 255, 255]) } else { Rgba([0, 0, 0, 255]) }
        });
        let faces = equirect_to_cube_faces(&pano, 8);

        assert!(faces[2].pixels().all(|p| p.0 == [255, 255, 255, 255]));
        assert!(faces[3].pixels().all(|p| p.0 == [0, 0, 0, 255]));
        for f in &faces {
            assert_eq!(f.dimensions(), (8, 8));
        }
    }

    #[test]
    fn checkerboard_alternates() {
        let img = checkerboard(64, 8);
        assert_eq!(img.dimensions(), (64, 64));
        assert_ne!(img.get_pixel(0, 0), img.get_pixel(8, 0));
        assert_eq!(img.get_pixel(0, 0), img.get_pixel(8, 8));
    }

    #[test]
    fn procedural_sky_is_brighter_above_horizon() {
        let faces = procedural_sky_faces(4);
        let luma = |p: &Rgba<u8>| p.0[0] as u32 + p.0[1] as u32 + p.0[2] as u32;
        assert!(luma(faces[2].get_pixel(1, 1)) > luma(faces[3].get_pixel(1, 1)));
    }

    #[test]
    fn texture_size_must_fit_the_device() {
        assert!(check_texture_size("t", 2048, 1, 2048).is_ok());
        assert!(check_texture_size("t", 0, 16, 2048).is_err());
        let err = check_texture_size("t", 2049, 1, 2048).unwrap_err();
        assert!(err.to_string().contains("exceeds the device limit of 2048"));
    }

    #[test]
    fn oversized_image_is_an_error_not_a_validation_panic() {
        let gpu = Headless::with_limits(wgpu::Limits::downlevel_defaults());
        let ctx = gpu.ctx();

        assert!(Texture2d::from_rgba(&ctx, "wide", &RgbaImage::new(2049, 1)).is_err());
        assert_eq!(gpu.ledger.outstanding(), 0);

        let fits = Texture2d::from_rgba(&ctx, "fits", &RgbaImage::new(2048, 1)).unwrap();
        assert_eq!(fits.texture().width(), 2048);
    }

    #[test]
    fn short_texel_data_is_rejected() {
        let gpu = Headless::default();
        let ctx = gpu.ctx();
        let err = Texture2d::from_bytes(&ctx, "short", 2, 2, wgpu::TextureFormat::R8Unorm, &[0; 3])
            .err()
            .unwrap();
        assert!(err.to_string().contains("expected 4"));
    }

    #[test]
    fn hash_is_deterministic_and_spreads() {
        assert_eq!(hash2(3, 4, 7), hash2(3, 4, 7));
        let ones = (0..64)
            .flat_map(|y| (0..64).map(move |x| (x, y)))
            .filter(|&(x, y)| hash2(x, y, 1) & 1 == 1)
            .count();
        assert!((1700..2400).contains(&ones), "{ones}");
    }
}
