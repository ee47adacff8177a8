use std::fmt;

/// A named GPU capability a sample can depend on.
///
/// Each name maps to either a wgpu downlevel flag (reported by the adapter,
/// nothing to request) or a wgpu feature (must be requested at device creation).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Capability {
    BaseVertex,
    IndependentBlend,
    FullDrawIndexUint32,
    NonPowerOfTwoMipmappedTextures,
    ComputeShaders,
    MeshShader,
}

enum Requirement {
    Downlevel(wgpu::DownlevelFlags),
    Feature(wgpu::Features),
}

impl Capability {
    /// Checked for every sample before anything is rendered.
    pub const BASELINE: [Capability; 4] = [
        Capability::BaseVertex,
        Capability::IndependentBlend,
        Capability::FullDrawIndexUint32,
        Capability::NonPowerOfTwoMipmappedTextures,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::BaseVertex => "base_vertex",
            Capability::IndependentBlend => "independent_blend",
            Capability::FullDrawIndexUint32 => "full_draw_index_uint32",
            Capability::NonPowerOfTwoMipmappedTextures => "non_power_of_two_mipmapped_textures",
            Capability::ComputeShaders => "compute_shaders",
            Capability::MeshShader => "mesh_shader",
        }
    }

    fn requirement(self) -> Requirement {
        use wgpu::DownlevelFlags as D;
        match self {
            Capability::BaseVertex => Requirement::Downlevel(D::BASE_VERTEX),
            Capability::IndependentBlend => Requirement::Downlevel(D::INDEPENDENT_BLEND),
            Capability::FullDrawIndexUint32 => Requirement::Downlevel(D::FULL_DRAW_INDEX_UINT32),
            Capability::NonPowerOfTwoMipmappedTextures => {
                Requirement::Downlevel(D::NON_POWER_OF_TWO_MIPMAPPED_TEXTURES)
            }
            Capability::ComputeShaders => Requirement::Downlevel(D::COMPUTE_SHADERS),
            Capability::MeshShader => {
                Requirement::Feature(wgpu::Features::EXPERIMENTAL_MESH_SHADER)
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an adapter reports it can do.
#[derive(Debug, Copy, Clone)]
pub struct AdapterCapabilities {
    pub features: wgpu::Features,
    pub downlevel: wgpu::DownlevelFlags,
}

impl AdapterCapabilities {
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        Self {
            features: adapter.features(),
            downlevel: adapter.get_downlevel_capabilities().flags,
        }
    }

    pub fn supports(&self, cap: Capability) -> bool {
        match cap.requirement() {
            Requirement::Downlevel(flag) => self.downlevel.contains(flag),
            Requirement::Feature(feature) => self.features.contains(feature),
        }
    }

    /// Checks every capability in `required`.
    ///
    /// On success returns the features that must be requested from the device.
    /// On failure every missing name is reported, not only the first.
    pub fn verify(&self, required: &[Capability]) -> Result<wgpu::Features, CapabilityError> {
        let missing: Vec<Capability> = required
            .iter()
            .copied()
            .filter(|cap| !self.supports(*cap))
            .collect();

        if !missing.is_empty() {
            return Err(CapabilityError { missing });
        }

        let features = required
            .iter()
            .fold(wgpu::Features::empty(), |acc, cap| match cap.requirement() {
                Requirement::Feature(f) => acc | f,
                Requirement::Downlevel(_) => acc,
            });
        Ok(features)
    }
}

/// Returned when the adapter lacks one or more required capabilities.
#[derive(Debug, Clone)]
pub struct CapabilityError {
    pub missing: Vec<Capability>,
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.missing.iter().map(|c| c.name()).collect();
        write!(f, "unsupported GPU, missing capabilities: {}", names.join(", "))
    }
}

impl std::error::Error for CapabilityError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(features: wgpu::Features, downlevel: wgpu::DownlevelFlags) -> AdapterCapabilities {
        AdapterCapabilities { features, downlevel }
    }

    #[test]
    fn compliant_adapter_passes_baseline() {
        let adapter = caps(wgpu::Features::empty(), wgpu::DownlevelFlags::all());
        let requested = adapter.verify(&Capability::BASELINE).unwrap();
        assert!(requested.is_empty());
    }

    #[test]
    fn all_missing_names_are_reported() {
        let adapter = caps(wgpu::Features::empty(), wgpu::DownlevelFlags::empty());
        let err = adapter
            .verify(&[Capability::ComputeShaders, Capability::MeshShader])
            .unwrap_err();

        assert_eq!(
            err.missing,
            vec![Capability::ComputeShaders, Capability::MeshShader]
        );
        let msg = err.to_string();
        assert!(msg.contains("compute_shaders"));
        assert!(msg.contains("mesh_shader"));
    }

    #[test]
    fn feature_capabilities_are_requested() {
        let adapter = caps(
            wgpu::Features::EXPERIMENTAL_MESH_SHADER | wgpu::Features::FLOAT32_FILTERABLE,
            wgpu::DownlevelFlags::all(),
        );
        let requested = adapter
            .verify(&[Capability::ComputeShaders, Capability::MeshShader])
            .unwrap();
        assert_eq!(requested, wgpu::Features::EXPERIMENTAL_MESH_SHADER);
    }

    #[test]
    fn downlevel_only_adapter_lacks_compute() {
        let adapter = caps(
            wgpu::Features::empty(),
            wgpu::DownlevelFlags::all() - wgpu::DownlevelFlags::COMPUTE_SHADERS,
        );
        assert!(!adapter.supports(Capability::ComputeShaders));
        assert!(adapter.supports(Capability::BaseVertex));
    }
}
