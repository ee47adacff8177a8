use crate::args::AssetPaths;
use crate::input::{InputFrame, InputState};
use crate::render::{RenderCtx, TargetExtent};
use crate::time::FrameTime;

/// Passed to [`super::Sample::initialize`].
pub struct InitCtx<'a> {
    pub gfx: RenderCtx<'a>,
    pub assets: &'a AssetPaths,
    /// Surface size at startup.
    pub extent: TargetExtent,
}

/// Per-frame context passed to [`super::Sample::update`].
pub struct UpdateCtx<'a> {
    pub gfx: RenderCtx<'a>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub extent: TargetExtent,
    exit_requested: &'a mut bool,
}

impl<'a> UpdateCtx<'a> {
    pub fn new(
        gfx: RenderCtx<'a>,
        input: &'a InputState,
        input_frame: &'a InputFrame,
        time: FrameTime,
        extent: TargetExtent,
        exit_requested: &'a mut bool,
    ) -> Self {
        Self {
            gfx,
            input,
            input_frame,
            time,
            extent,
            exit_requested,
        }
    }

    /// Frame counter used to pick uniform ring slots.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.time.frame_index
    }

    /// Asks the runtime to release the sample and close after this frame.
    pub fn request_exit(&mut self) {
        *self.exit_requested = true;
    }
}
