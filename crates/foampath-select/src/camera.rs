//! View and projection matrices handed over by the viewport.

use foampath_math::{Point3, Transform, Vec3};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// A camera reduced to the two matrices selection needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World to camera transform.
    pub view: Transform,
    /// Camera to clip-space projection.
    pub projection: Transform,
}

impl Camera {
    /// Wrap explicit matrices.
    pub fn new(view: Transform, projection: Transform) -> Self {
        Self { view, projection }
    }

    /// Right-handed view looking from `eye` at `target`.
    pub fn look_at(eye: Point3, target: Point3, up: Vec3, projection: Transform) -> Self {
        Self {
            view: Transform::from_matrix(Matrix4::look_at_rh(&eye, &target, &up)),
            projection,
        }
    }

    /// Orthographic projection of the given view volume.
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Transform {
        Transform::from_matrix(Matrix4::new_orthographic(left, right, bottom, top, near, far))
    }

    /// Perspective projection with vertical field of view `fovy` in radians.
    pub fn perspective(aspect: f64, fovy: f64, near: f64, far: f64) -> Transform {
        Transform::from_matrix(Matrix4::new_perspective(aspect, fovy, near, far))
    }

    /// Model to clip-space matrix for an object placed by `world`.
    pub fn model_to_clip(&self, world: &Transform) -> Transform {
        self.projection.then(&self.view).then(world)
    }

    /// Camera position in world space, if the view is invertible.
    pub fn position(&self) -> Option<Point3> {
        self.view.inverse().map(|inv| inv.apply_point(&Point3::origin()))
    }
}

impl Default for Camera {
    /// Looking straight down the -z axis from 100 units up at a 200 x 200 area.
    fn default() -> Self {
        Self::look_at(
            Point3::new(0.0, 0.0, 100.0),
            Point3::origin(),
            Vec3::y(),
            Self::orthographic(-100.0, 100.0, -100.0, 100.0, 0.1, 1000.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_from_view() {
        let cam = Camera::default();
        let pos = cam.position().unwrap();
        assert_relative_eq!(pos.z, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_top_down_projection() {
        let cam = Camera::default();
        let m = cam.model_to_clip(&Transform::identity());
        let p = m.project_point(&Point3::new(50.0, -100.0, 0.0));
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_perspective_divides() {
        let cam = Camera::look_at(
            Point3::new(0.0, 0.0, 10.0),
            Point3::origin(),
            Vec3::y(),
            Camera::perspective(1.0, std::f64::consts::FRAC_PI_2, 0.1, 100.0),
        );
        let m = cam.model_to_clip(&Transform::identity());
        let near = m.project_point(&Point3::new(1.0, 0.0, 5.0));
        let far = m.project_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(near.x, 0.2, epsilon = 1e-9);
        assert_relative_eq!(far.x, 0.1, epsilon = 1e-9);
    }
}
