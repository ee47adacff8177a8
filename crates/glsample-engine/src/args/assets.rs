use std::path::{Path, PathBuf};

/// Asset files named on the command line, resolved against the asset root.
///
/// Every path is optional; samples fall back to procedural content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub skybox: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

impl AssetPaths {
    /// Absolute paths are kept; relative ones are joined onto `root` if set.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn model(&self) -> Option<PathBuf> {
        self.model.as_deref().map(|p| self.resolve(p))
    }

    pub fn texture(&self) -> Option<PathBuf> {
        self.texture.as_deref().map(|p| self.resolve(p))
    }

    pub fn skybox(&self) -> Option<PathBuf> {
        self.skybox.as_deref().map(|p| self.resolve(p))
    }

    pub fn font(&self) -> Option<PathBuf> {
        self.font.as_deref().map(|p| self.resolve(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_root() {
        let assets = AssetPaths {
            root: Some(PathBuf::from("/data/assets")),
            texture: Some(PathBuf::from("textures/brick.png")),
            ..Default::default()
        };
        assert_eq!(
            assets.texture(),
            Some(PathBuf::from("/data/assets/textures/brick.png"))
        );
        assert_eq!(assets.model(), None);
    }

    #[test]
    fn absolute_paths_ignore_root() {
        let abs = std::env::temp_dir().join("sky.hdr");
        let assets = AssetPaths {
            root: Some(PathBuf::from("assets")),
            skybox: Some(abs.clone()),
            ..Default::default()
        };
        assert_eq!(assets.skybox(), Some(abs));
    }

    #[test]
    fn no_root_keeps_paths() {
        let assets = AssetPaths {
            model: Some(PathBuf::from("bunny.stl")),
            ..Default::default()
        };
        assert_eq!(assets.model(), Some(PathBuf::from("bunny.stl")));
    }
}
