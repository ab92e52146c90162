//! Bounding volumes and visibility tests used by culling item lists.

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Transform this AABB by a matrix, returning the axis-aligned box that
    /// encloses all eight transformed corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut min = Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = -min;
        for corner in corners {
            let transformed =
                matrix.transform_point(&Point3::new(corner.x, corner.y, corner.z));
            min = min.inf(&transformed.coords);
            max = max.sup(&transformed.coords);
        }

        Aabb { min, max }
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix using the
    /// Gribb-Hartmann method.
    ///
    /// The resulting plane normals point inward; a point is inside the
    /// frustum when its signed distance to every plane is non-negative.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| {
            Vec4::new(
                vp_matrix[(i, 0)],
                vp_matrix[(i, 1)],
                vp_matrix[(i, 2)],
                vp_matrix[(i, 3)],
            )
        };
        let r0 = row(0);
        let r1 = row(1);
        let r2 = row(2);
        let r3 = row(3);

        let to_plane = |v: Vec4| {
            let normal = Vec3::new(v.x, v.y, v.z);
            let length = normal.magnitude();
            if length > 0.0 {
                Plane {
                    normal: normal / length,
                    distance: v.w / length,
                }
            } else {
                // Degenerate row: treat the half space as all-inclusive.
                Plane {
                    normal: Vec3::zeros(),
                    distance: 0.0,
                }
            }
        };

        Self {
            planes: [
                to_plane(r3 + r0), // left
                to_plane(r3 - r0), // right
                to_plane(r3 + r1), // bottom
                to_plane(r3 - r1), // top
                to_plane(r3 + r2), // near
                to_plane(r3 - r2), // far
            ],
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // Get the point on the AABB closest to the plane
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 {
                p.x = aabb.max.x;
            }
            if plane.normal.y >= 0.0 {
                p.y = aabb.max.y;
            }
            if plane.normal.z >= 0.0 {
                p.z = aabb.max.z;
            }

            // If this point is outside the plane, the entire AABB is outside
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = Aabb::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = Aabb::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
    }

    #[test]
    fn test_aabb_transformed_by_translation() {
        let aabb = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let moved = aabb.transformed(&Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));

        assert!(moved.contains_point(Vec3::new(10.0, 0.0, 0.0)));
        assert!(!moved.contains_point(Vec3::zeros()));
    }

    #[test]
    fn test_frustum_from_orthographic_matrix() {
        // Symmetric orthographic volume covering [-1, 1] on every axis.
        let ortho = Mat4::new_orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0);
        let frustum = Frustum::from_matrix(&ortho);

        let inside = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(0.1, 0.1, 0.1));
        let outside =
            Aabb::from_center_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.1, 0.1, 0.1));

        assert!(frustum.intersects_aabb(&inside));
        assert!(!frustum.intersects_aabb(&outside));
    }
}
