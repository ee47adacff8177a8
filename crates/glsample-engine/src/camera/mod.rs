//! Orbit camera shared by the 3D samples.

mod orbit;

pub use orbit::{CameraMatrices, OrbitCamera};
