/// Camera - passive container of a view and a projection matrix.
///
/// The renderer only reads `view_projection()`. Moving the camera is the
/// caller's job: compute a view matrix and hand it over with `set_view`.

use glam::{Mat4, Vec3};

/// Default near clip plane distance
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clip plane distance
pub const DEFAULT_FAR: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view: Mat4,
    projection: Mat4,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Left-handed perspective camera at the origin looking down +Z
    pub fn perspective_lh(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_lh(fov_degrees.to_radians(), aspect, near, far),
            fov_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Perspective camera with the default clip planes
    pub fn with_aspect(fov_degrees: f32, aspect: f32) -> Self {
        Self::perspective_lh(fov_degrees, aspect, DEFAULT_NEAR, DEFAULT_FAR)
    }

    // ===== GETTERS =====

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    // ===== SETTERS =====

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    /// Point the camera from `eye` at `target`
    pub fn look_at_lh(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view = Mat4::look_at_lh(eye, target, up);
    }

    /// Rebuild the projection for a new aspect ratio (after a resize)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection = Mat4::perspective_lh(self.fov_degrees.to_radians(), aspect, self.near, self.far);
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
