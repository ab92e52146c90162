//! The view an item list commits against: camera and projection state.

use crate::foundation::bounds::Frustum;
use crate::foundation::math::{Mat4, Vec3};

/// Camera and projection state for one frame of committing.
///
/// Owned by the application; the scene only reads it. The view, projection,
/// and frustum are derived whenever the camera changes.
pub struct View {
    width: u32,
    height: u32,
    camera_matrix: Mat4,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    view_projection_matrix: Mat4,
    frustum: Frustum,

    /// Multiplier on object distance when selecting levels of detail.
    /// Values below 1 treat objects as closer, above 1 as farther.
    pub lod_bias: f32,
}

impl View {
    /// Create a view with identity camera and projection.
    pub fn new(width: u32, height: u32) -> Self {
        let identity = Mat4::identity();
        Self {
            width,
            height,
            camera_matrix: identity,
            view_matrix: identity,
            projection_matrix: identity,
            view_projection_matrix: identity,
            frustum: Frustum::from_matrix(&identity),
            lod_bias: 1.0,
        }
    }

    /// Width of the view in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the view in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Aspect ratio (width over height).
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Resize the view surface.
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Set the camera (camera-to-world) and projection matrices, deriving the
    /// view matrix, the combined view-projection, and the world-space
    /// frustum.
    ///
    /// Falls back to identity for a non-invertible camera matrix.
    pub fn set_camera(&mut self, camera_matrix: Mat4, projection_matrix: Mat4) {
        self.camera_matrix = camera_matrix;
        self.view_matrix = camera_matrix.try_inverse().unwrap_or_else(|| {
            log::warn!("View camera matrix is not invertible; using identity view");
            Mat4::identity()
        });
        self.projection_matrix = projection_matrix;
        self.view_projection_matrix = projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(&self.view_projection_matrix);
    }

    /// The camera matrix, transforming camera to world.
    pub fn camera_matrix(&self) -> &Mat4 {
        &self.camera_matrix
    }

    /// The view matrix, transforming world to camera.
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// The projection matrix.
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// The pre-multiplied view-projection matrix.
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    /// The view frustum in world space.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// The camera position in world space.
    pub fn eye_position(&self) -> Vec3 {
        self.camera_matrix.column(3).xyz()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_is_camera_inverse() {
        let mut view = View::new(640, 480);
        let camera = Mat4::new_translation(&Vec3::new(0.0, 2.0, 5.0));
        view.set_camera(camera, Mat4::identity());

        assert_relative_eq!(
            view.camera_matrix() * view.view_matrix(),
            Mat4::identity(),
            epsilon = 1.0e-5
        );
        assert_relative_eq!(view.eye_position(), Vec3::new(0.0, 2.0, 5.0));
    }
}
