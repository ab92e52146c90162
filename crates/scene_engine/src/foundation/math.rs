//! Math types for the scene graph.
//!
//! Thin aliases over nalgebra plus the decomposed `Transform` used to author
//! local node placements. World transforms flowing through the scene tree are
//! plain `Mat4` values.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Decomposed local transform: position, rotation, and scale.
///
/// Convenience for building the local matrices handed to transform nodes;
/// the scene tree itself only ever stores the composed `Mat4`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform with uniform scale
    pub fn from_scale(scale: f32) -> Self {
        Self {
            scale: Vec3::new(scale, scale, scale),
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Combine this transform with another (self first, then other)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_identity_matrix() {
        let transform = Transform::identity();
        assert_relative_eq!(transform.to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_transform_position_matrix() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let matrix = transform.to_matrix();
        let point = matrix.transform_point(&Point3::origin());
        assert_relative_eq!(point, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_transform_combine_matches_matrix_product() {
        let first = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let second = Transform::from_scale(2.0);
        let combined = first.combine(&second);
        assert_relative_eq!(
            combined.to_matrix(),
            first.to_matrix() * second.to_matrix(),
            epsilon = 1.0e-5
        );
    }
}
