use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::input::{InputFrame, InputState, MouseButton};

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Camera circling a target point, driven by left-drag and the mouse wheel.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle in radians.
    pub yaw: f32,
    /// Vertical angle in radians, kept short of the poles.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub drag_sensitivity: f32,
    pub zoom_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per second added to `yaw` while no drag is active.
    pub auto_rotate: f32,
}

/// View/projection pair for one frame.
#[derive(Copy, Clone, Debug)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub proj: Mat4,
    pub position: Vec3,
}

impl CameraMatrices {
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 4.0,
            yaw: 0.6,
            pitch: 0.4,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
            drag_sensitivity: 0.005,
            zoom_step: 0.9,
            min_distance: 0.5,
            max_distance: 50.0,
            auto_rotate: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            ..Self::default()
        }
    }

    pub fn with_auto_rotate(mut self, radians_per_sec: f32) -> Self {
        self.auto_rotate = radians_per_sec;
        self
    }

    /// Applies this frame's pointer drag and wheel input.
    pub fn update(&mut self, input: &InputState, frame: &InputFrame, dt: f32) {
        let dragging = input.button_down(MouseButton::Left);
        if dragging {
            let (dx, dy) = frame.pointer_delta;
            self.rotate(-dx * self.drag_sensitivity, dy * self.drag_sensitivity);
        } else if self.auto_rotate != 0.0 {
            self.rotate(self.auto_rotate * dt, 0.0);
        }

        if frame.wheel_lines != 0.0 {
            self.zoom(frame.wheel_lines);
        }
    }

    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive `lines` move closer.
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance * self.zoom_step.powf(lines))
            .clamp(self.min_distance, self.max_distance);
    }

    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Right-handed perspective with wgpu's `[0, 1]` depth range.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-4), self.near, self.far)
    }

    pub fn matrices(&self, aspect: f32) -> CameraMatrices {
        CameraMatrices {
            view: self.view(),
            proj: self.projection(aspect),
            position: self.position(),
        }
    }
}
