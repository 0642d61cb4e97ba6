//! Triangles with precomputed normals and ray intersection.

use foampath_math::{Aabb3, Point3, Tolerance, Vec3};

use crate::ray::{Ray, Side};

/// A triangle with its geometric normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex positions.
    pub v: [Point3; 3],
    /// Unit normal from counter-clockwise winding, `+z` when degenerate.
    pub normal: Vec3,
}

impl Triangle {
    /// Create a new triangle from vertices.
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        let n = (v1 - v0).cross(&(v2 - v0));
        let len = n.norm();
        let normal = if len > 1e-10 {
            n / len
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };
        Self {
            v: [v0, v1, v2],
            normal,
        }
    }

    /// Arithmetic mean of the vertices.
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.v[0].coords + self.v[1].coords + self.v[2].coords) / 3.0)
    }

    /// Bounding box of the three vertices.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points(&self.v)
    }

    /// The edges as `(start, end)` pairs.
    pub fn edges(&self) -> [(Point3, Point3); 3] {
        [
            (self.v[0], self.v[1]),
            (self.v[1], self.v[2]),
            (self.v[2], self.v[0]),
        ]
    }

    /// Möller–Trumbore intersection, returning the ray parameter.
    ///
    /// Hits with `t <= 0` are ignored so a ray starting on the surface
    /// does not report its own origin.
    pub fn intersect_ray(&self, ray: &Ray, side: Side) -> Option<f64> {
        let tol = Tolerance::DEFAULT.barycentric;
        let dir = ray.direction.as_ref();
        let e1 = self.v[1] - self.v[0];
        let e2 = self.v[2] - self.v[0];
        let p = dir.cross(&e2);
        let det = e1.dot(&p);

        match side {
            Side::Front if det <= 1e-12 => return None,
            Side::Back if det >= -1e-12 => return None,
            _ if det.abs() <= 1e-12 => return None,
            _ => {}
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v[0];
        let u = s.dot(&p) * inv_det;
        if u < -tol || u > 1.0 + tol {
            return None;
        }
        let q = s.cross(&e1);
        let v = dir.dot(&q) * inv_det;
        if v < -tol || u + v > 1.0 + tol {
            return None;
        }
        let t = e2.dot(&q) * inv_det;
        (t > 0.0).then_some(t)
    }
}
