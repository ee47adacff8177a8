use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;

    if prefer_srgb {
        if let Some(f) = caps.formats.iter().copied().find(|f| f.is_srgb()) {
            return Some(f);
        }
    }

    Some(first)
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Falls back to FIFO, which every surface supports.
pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        return requested;
    }
    match requested {
        wgpu::PresentMode::Immediate | wgpu::PresentMode::Mailbox => {
            let relaxed = [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate];
            relaxed
                .into_iter()
                .find(|m| caps.present_modes.contains(m))
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
        _ => wgpu::PresentMode::Fifo,
    }
}

pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    let action = classify_surface_error(&err);
    if action == SurfaceErrorAction::Reconfigured && size.width > 0 && size.height > 0 {
        surface.configure(device, config);
    }
    action
}

fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<wgpu::TextureFormat>, present_modes: Vec<wgpu::PresentMode>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes,
            ..Default::default()
        }
    }

    #[test]
    fn srgb_format_is_preferred() {
        let c = caps(
            vec![wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb],
            vec![],
        );
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(
            choose_surface_format(&c, false),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn no_formats_yields_none() {
        assert_eq!(choose_surface_format(&caps(vec![], vec![]), true), None);
    }

    #[test]
    fn unsupported_present_mode_falls_back() {
        let c = caps(vec![], vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox]);
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Immediate),
            wgpu::PresentMode::Mailbox
        );

        let fifo_only = caps(vec![], vec![wgpu::PresentMode::Fifo]);
        assert_eq!(
            choose_present_mode(&fifo_only, wgpu::PresentMode::Immediate),
            wgpu::PresentMode::Fifo
        );
    }

    #[test]
    fn surface_errors_map_to_actions() {
        use wgpu::SurfaceError as E;
        assert_eq!(classify_surface_error(&E::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify_surface_error(&E::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify_surface_error(&E::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(classify_surface_error(&E::Other), SurfaceErrorAction::SkipFrame);
        assert_eq!(classify_surface_error(&E::OutOfMemory), SurfaceErrorAction::Fatal);
    }
}
