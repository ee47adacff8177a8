use super::Capability;

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick from. `--backend gl` narrows this to OpenGL.
    pub backends: wgpu::Backends,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is vsync and universally supported.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Capabilities the sample needs on top of [`Capability::BASELINE`].
    pub required_capabilities: Vec<Capability>,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. A hint only.
    pub desired_maximum_frame_latency: u32,

    /// Validation layers and debug labels (`--debug`).
    pub debug: bool,
}

impl GpuInit {
    /// Baseline plus sample-specific capabilities, without duplicates.
    pub fn all_capabilities(&self) -> Vec<Capability> {
        let mut caps = Capability::BASELINE.to_vec();
        for cap in &self.required_capabilities {
            if !caps.contains(cap) {
                caps.push(*cap);
            }
        }
        caps
    }

    /// `WGPU_*` environment variables override either choice.
    pub fn instance_flags(&self) -> wgpu::InstanceFlags {
        let flags = if self.debug {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::from_build_config()
        };
        flags.with_env()
    }
}

/// Limits to request from the device.
///
/// `base` is raised to the adapter's texture resolution. With mesh shading requested,
/// the adapter's own mesh limits are taken so they can be queried afterwards.
pub fn device_limits(
    base: &wgpu::Limits,
    adapter: &wgpu::Limits,
    features: wgpu::Features,
) -> wgpu::Limits {
    let limits = base.clone().using_resolution(adapter.clone());
    if !features.contains(wgpu::Features::EXPERIMENTAL_MESH_SHADER) {
        return limits;
    }
    wgpu::Limits {
        max_task_mesh_workgroup_total_count: adapter.max_task_mesh_workgroup_total_count,
        max_task_mesh_workgroups_per_dimension: adapter.max_task_mesh_workgroups_per_dimension,
        max_task_invocations_per_workgroup: adapter.max_task_invocations_per_workgroup,
        max_task_invocations_per_dimension: adapter.max_task_invocations_per_dimension,
        max_mesh_invocations_per_workgroup: adapter.max_mesh_invocations_per_workgroup,
        max_mesh_invocations_per_dimension: adapter.max_mesh_invocations_per_dimension,
        max_task_payload_size: adapter.max_task_payload_size,
        max_mesh_output_vertices: adapter.max_mesh_output_vertices,
        max_mesh_output_primitives: adapter.max_mesh_output_primitives,
        max_mesh_output_layers: adapter.max_mesh_output_layers,
        max_mesh_multiview_view_count: adapter.max_mesh_multiview_view_count,
        ..limits
    }
}

/// Experimental opt-in token matching `features`.
pub fn experimental_features(features: wgpu::Features) -> wgpu::ExperimentalFeatures {
    if features.contains(wgpu::Features::EXPERIMENTAL_MESH_SHADER) {
        // SAFETY: mesh shading is the only experimental feature ever requested,
        // and no sample records mesh draws.
        unsafe { wgpu::ExperimentalFeatures::enabled() }
    } else {
        wgpu::ExperimentalFeatures::disabled()
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_capabilities: Vec::new(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
            debug: false,
        }
    }
}

/// Render state every sample starts from.
///
/// wgpu has no global state machine; these values are what each sample feeds
/// into its pipelines and passes unless it has a reason not to.
pub struct BaselineState;

impl BaselineState {
    pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
        r: 0.2,
        g: 0.2,
        b: 0.2,
        a: 1.0,
    };

    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Triangle lists, CCW front faces, no culling.
    pub fn primitive() -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }

    /// Depth test `Less` with writes, stencil untouched.
    pub fn depth_stencil() -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_capabilities_starts_with_baseline_and_dedupes() {
        let init = GpuInit {
            required_capabilities: vec![
                Capability::ComputeShaders,
                Capability::BaseVertex,
                Capability::ComputeShaders,
            ],
            ..Default::default()
        };

        let caps = init.all_capabilities();
        assert_eq!(&caps[..Capability::BASELINE.len()], &Capability::BASELINE);
        assert_eq!(caps.len(), Capability::BASELINE.len() + 1);
        assert_eq!(caps.last(), Some(&Capability::ComputeShaders));
    }

    #[test]
    fn debug_turns_on_validation() {
        let init = GpuInit {
            debug: true,
            ..Default::default()
        };
        // Env overrides may add flags but never strip the requested ones here.
        if std::env::var_os("WGPU_VALIDATION").is_none() {
            assert!(init.instance_flags().contains(wgpu::InstanceFlags::VALIDATION));
        }
    }

    #[test]
    fn mesh_limits_come_from_the_adapter() {
        let adapter = wgpu::Limits {
            max_mesh_output_vertices: 256,
            max_mesh_output_primitives: 512,
            ..wgpu::Limits::defaults()
        };
        let base = wgpu::Limits::downlevel_defaults();

        let plain = device_limits(&base, &adapter, wgpu::Features::empty());
        assert_eq!(plain.max_mesh_output_vertices, 0);

        let mesh = device_limits(&base, &adapter, wgpu::Features::EXPERIMENTAL_MESH_SHADER);
        assert_eq!(mesh.max_mesh_output_vertices, 256);
        assert_eq!(mesh.max_mesh_output_primitives, 512);
        assert_eq!(mesh.max_texture_dimension_2d, adapter.max_texture_dimension_2d);
        assert_eq!(mesh.max_bind_groups, base.max_bind_groups);
    }

    #[test]
    fn experimental_opt_in_only_for_mesh_shading() {
        assert!(!experimental_features(wgpu::Features::empty()).is_enabled());
        assert!(experimental_features(wgpu::Features::EXPERIMENTAL_MESH_SHADER).is_enabled());
    }
}
