//! Font loading and CPU text rasterization via `fontdue`.

mod font_system;

pub use font_system::{FontId, FontLoadError, FontSystem, TextBitmap, SYSTEM_FONT_PATHS};
