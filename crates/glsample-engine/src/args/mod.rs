//! Command line options shared by every sample binary.

mod assets;
mod options;

pub use assets::AssetPaths;
pub use options::{CliBackend, SampleArgs};
