//! Bounding Volume Hierarchy over mesh triangles.
//!
//! Uses Surface Area Heuristic (SAH) for construction. Besides closest-hit
//! raycasting, the tree supports *shapecasting*: a caller-supplied
//! [`ShapecastVisitor`] decides per node whether to prune it, accept every
//! triangle below it, or descend further, and then decides per triangle
//! whether the traversal should stop early.

use foampath_math::{Aabb3, Point3, Vec3};

use crate::ray::{Ray, RayHit, Side};
use crate::triangle::Triangle;
use crate::TriangleMesh;

/// Maximum number of triangles stored in a leaf.
const MAX_LEAF_SIZE: usize = 4;

/// A BVH node - either a leaf containing triangles or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node containing triangle numbers.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Triangle numbers contained in this leaf.
        triangles: Vec<usize>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    pub fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Outcome of a shapecast bounds test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsVerdict {
    /// Skip the node and everything below it.
    Prune,
    /// Every triangle below the node is inside; visit them all as contained.
    IncludeAll,
    /// The node straddles the query; descend into its children.
    Refine,
}

/// The two callbacks driven by [`Bvh::shapecast`].
///
/// The root is tested at depth 0 and each level of children at one more.
/// Leaf triangles of a refined leaf are reported with the leaf's depth; a
/// subtree accepted with [`BoundsVerdict::IncludeAll`] reports every triangle
/// with `contained = true` and the depth of the accepting node.
pub trait ShapecastVisitor {
    /// Classify a node's bounding box.
    fn test_bounds(&mut self, aabb: &Aabb3, depth: usize) -> BoundsVerdict;

    /// Visit one triangle. Returning `true` stops the whole traversal.
    fn test_leaf(&mut self, triangle: &Triangle, index: usize, contained: bool, depth: usize)
        -> bool;
}

/// Bounding Volume Hierarchy over a mesh's local-space triangles.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangles: Vec<Triangle>,
}

impl Bvh {
    /// Build a BVH from a mesh using SAH construction.
    ///
    /// The mesh is expected to have passed [`TriangleMesh::validate`].
    pub fn build(mesh: &TriangleMesh) -> Self {
        let triangles: Vec<Triangle> = (0..mesh.num_triangles()).map(|i| mesh.triangle(i)).collect();

        let mut tri_data: Vec<(usize, Aabb3, Point3)> = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| {
                let aabb = tri.aabb();
                (i, aabb, aabb.center())
            })
            .collect();

        let root = if tri_data.is_empty() {
            None
        } else {
            Some(build_node(&mut tri_data))
        };

        log::debug!("built BVH over {} triangles", triangles.len());
        Self { root, triangles }
    }

    /// Get a reference to the root node, if any.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// The triangles the tree indexes, by triangle number.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Bounds of the whole tree, empty for an empty mesh.
    pub fn bounds(&self) -> Aabb3 {
        self.root
            .as_ref()
            .map(|r| *r.aabb())
            .unwrap_or_else(Aabb3::empty)
    }

    /// Trace a ray and return the closest hit with `t <= max_t`.
    pub fn raycast_first(&self, ray: &Ray, side: Side, max_t: f64) -> Option<RayHit> {
        let mut closest: Option<(usize, f64)> = None;
        let mut closest_t = max_t;

        if let Some(ref root) = self.root {
            self.trace_node_closest(ray, side, root, &mut closest, &mut closest_t);
        }

        closest.map(|(triangle, t)| RayHit {
            t,
            point: ray.at(t),
            normal: self.triangles[triangle].normal,
            triangle,
        })
    }

    /// Trace a ray, keeping only the closest hit.
    fn trace_node_closest(
        &self,
        ray: &Ray,
        side: Side,
        node: &BvhNode,
        closest: &mut Option<(usize, f64)>,
        closest_t: &mut f64,
    ) {
        match node {
            BvhNode::Leaf { aabb, triangles } => {
                if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                    if t_min > *closest_t {
                        return;
                    }
                    for &i in triangles {
                        if let Some(t) = self.triangles[i].intersect_ray(ray, side) {
                            if t <= *closest_t && closest.map_or(true, |(_, best)| t < best) {
                                *closest_t = t;
                                *closest = Some((i, t));
                            }
                        }
                    }
                }
            }
            BvhNode::Internal { aabb, left, right } => {
                if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                    if t_min > *closest_t {
                        return;
                    }

                    // Test children in order of AABB distance
                    let left_t = ray.intersect_aabb(left.aabb()).map(|(t, _)| t);
                    let right_t = ray.intersect_aabb(right.aabb()).map(|(t, _)| t);

                    match (left_t, right_t) {
                        (Some(lt), Some(rt)) => {
                            let (near, far) = if lt <= rt { (left, right) } else { (right, left) };
                            self.trace_node_closest(ray, side, near, closest, closest_t);
                            self.trace_node_closest(ray, side, far, closest, closest_t);
                        }
                        (Some(_), None) => {
                            self.trace_node_closest(ray, side, left, closest, closest_t);
                        }
                        (None, Some(_)) => {
                            self.trace_node_closest(ray, side, right, closest, closest_t);
                        }
                        (None, None) => {}
                    }
                }
            }
        }
    }

    /// Drive a visitor over the tree. Returns `true` if the visitor stopped it.
    pub fn shapecast<V: ShapecastVisitor + ?Sized>(&self, visitor: &mut V) -> bool {
        match &self.root {
            Some(root) => self.shapecast_node(root, 0, visitor),
            None => false,
        }
    }

    fn shapecast_node<V: ShapecastVisitor + ?Sized>(
        &self,
        node: &BvhNode,
        depth: usize,
        visitor: &mut V,
    ) -> bool {
        match visitor.test_bounds(node.aabb(), depth) {
            BoundsVerdict::Prune => false,
            BoundsVerdict::IncludeAll => self.visit_contained(node, depth, visitor),
            BoundsVerdict::Refine => match node {
                BvhNode::Leaf { triangles, .. } => triangles
                    .iter()
                    .any(|&i| visitor.test_leaf(&self.triangles[i], i, false, depth)),
                BvhNode::Internal { left, right, .. } => {
                    self.shapecast_node(left, depth + 1, visitor)
                        || self.shapecast_node(right, depth + 1, visitor)
                }
            },
        }
    }

    fn visit_contained<V: ShapecastVisitor + ?Sized>(
        &self,
        node: &BvhNode,
        depth: usize,
        visitor: &mut V,
    ) -> bool {
        match node {
            BvhNode::Leaf { triangles, .. } => triangles
                .iter()
                .any(|&i| visitor.test_leaf(&self.triangles[i], i, true, depth)),
            BvhNode::Internal { left, right, .. } => {
                self.visit_contained(left, depth, visitor)
                    || self.visit_contained(right, depth, visitor)
            }
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(tri_data: &mut [(usize, Aabb3, Point3)]) -> BvhNode {
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in tri_data.iter() {
        bounds.include_aabb(aabb);
    }

    if tri_data.len() <= MAX_LEAF_SIZE {
        return BvhNode::Leaf {
            aabb: bounds,
            triangles: tri_data.iter().map(|(id, _, _)| *id).collect(),
        };
    }

    let (best_axis, best_pos) = find_best_split(tri_data, &bounds);
    let mut mid = partition_triangles(tri_data, best_axis, best_pos);

    // Fall back to a median split when SAH cannot separate the centroids
    if mid == 0 || mid == tri_data.len() {
        mid = tri_data.len() / 2;
    }

    let (left_data, right_data) = tri_data.split_at_mut(mid);
    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left_data)),
        right: Box::new(build_node(right_data)),
    }
}

/// Find the best split axis and position using SAH.
fn find_best_split(tri_data: &[(usize, Aabb3, Point3)], bounds: &Aabb3) -> (usize, f64) {
    const NUM_BUCKETS: usize = 12;

    let extent: Vec3 = bounds.max - bounds.min;
    let total_area = bounds.surface_area();

    let mut best_cost = f64::INFINITY;
    let mut best_axis = 0;
    let mut best_pos = 0.0;

    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-10 {
            continue;
        }
        let axis_min = bounds.min[axis];

        let mut bucket_counts = [0usize; NUM_BUCKETS];
        let mut bucket_bounds = [Aabb3::empty(); NUM_BUCKETS];

        for (_, aabb, centroid) in tri_data {
            let b = ((centroid[axis] - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);
            bucket_counts[b] += 1;
            bucket_bounds[b].include_aabb(aabb);
        }

        for split in 1..NUM_BUCKETS {
            let mut left_count = 0;
            let mut left_bounds = Aabb3::empty();
            for i in 0..split {
                left_count += bucket_counts[i];
                if bucket_counts[i] > 0 {
                    left_bounds.include_aabb(&bucket_bounds[i]);
                }
            }

            let mut right_count = 0;
            let mut right_bounds = Aabb3::empty();
            for i in split..NUM_BUCKETS {
                right_count += bucket_counts[i];
                if bucket_counts[i] > 0 {
                    right_bounds.include_aabb(&bucket_bounds[i]);
                }
            }

            if left_count == 0 || right_count == 0 {
                continue;
            }

            // Flat nodes have zero area; compare counts alone then
            let cost = if total_area > 0.0 {
                0.125
                    + left_bounds.surface_area() / total_area * left_count as f64
                    + right_bounds.surface_area() / total_area * right_count as f64
            } else {
                0.125 + (left_count as f64 - right_count as f64).abs()
            };

            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_pos = axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent;
            }
        }
    }

    (best_axis, best_pos)
}

/// Partition triangles by centroid along an axis.
fn partition_triangles(tri_data: &mut [(usize, Aabb3, Point3)], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = tri_data.len();

    while left < right {
        if tri_data[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            tri_data.swap(left, right);
        }
    }

    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// An n x n grid of unit squares in the z = 0 plane, two triangles each.
    fn plate(n: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.extend_from_slice(&[i as f32, j as f32, 0.0]);
            }
        }
        let stride = (n + 1) as u32;
        let mut indices = Vec::new();
        for j in 0..n as u32 {
            for i in 0..n as u32 {
                let a = j * stride + i;
                indices.extend_from_slice(&[a, a + 1, a + stride + 1, a, a + stride + 1, a + stride]);
            }
        }
        TriangleMesh::indexed(vertices, indices)
    }

    struct CountAll {
        seen: Vec<usize>,
    }

    impl ShapecastVisitor for CountAll {
        fn test_bounds(&mut self, _: &Aabb3, depth: usize) -> BoundsVerdict {
            if depth < 2 {
                BoundsVerdict::Refine
            } else {
                BoundsVerdict::IncludeAll
            }
        }

        fn test_leaf(&mut self, _: &Triangle, index: usize, _: bool, _: usize) -> bool {
            self.seen.push(index);
            false
        }
    }

    /// Accepts triangles whose centroid has x below a cut, stopping at the first.
    struct FirstLeft {
        cut: f64,
        hits: usize,
        max_depth: usize,
    }

    impl ShapecastVisitor for FirstLeft {
        fn test_bounds(&mut self, aabb: &Aabb3, depth: usize) -> BoundsVerdict {
            self.max_depth = self.max_depth.max(depth);
            if aabb.min.x >= self.cut {
                BoundsVerdict::Prune
            } else {
                BoundsVerdict::Refine
            }
        }

        fn test_leaf(&mut self, tri: &Triangle, _: usize, contained: bool, _: usize) -> bool {
            assert!(!contained);
            if tri.centroid().x < self.cut {
                self.hits += 1;
                return true;
            }
            false
        }
    }

    #[test]
    fn test_build_empty() {
        let bvh = Bvh::build(&TriangleMesh::new());
        assert!(bvh.root().is_none());
        assert!(bvh.bounds().is_empty());
        assert!(!bvh.shapecast(&mut CountAll { seen: vec![] }));
        assert!(bvh
            .raycast_first(&Ray::downward(Point3::new(0.0, 0.0, 1.0)), Side::Double, f64::INFINITY)
            .is_none());
    }

    #[test]
    fn test_shapecast_visits_each_triangle_once() {
        let mesh = plate(8);
        let bvh = Bvh::build(&mesh);
        let mut visitor = CountAll { seen: vec![] };
        assert!(!bvh.shapecast(&mut visitor));
        let mut seen = visitor.seen;
        seen.sort_unstable();
        assert_eq!(seen, (0..mesh.num_triangles()).collect::<Vec<_>>());
    }

    #[test]
    fn test_shapecast_stops_early() {
        let bvh = Bvh::build(&plate(8));
        let mut visitor = FirstLeft {
            cut: 2.0,
            hits: 0,
            max_depth: 0,
        };
        assert!(bvh.shapecast(&mut visitor));
        assert_eq!(visitor.hits, 1);
        assert!(visitor.max_depth > 0);
    }

    #[test]
    fn test_raycast_first_matches_brute_force() {
        let mesh = plate(6);
        let bvh = Bvh::build(&mesh);
        let ray = Ray::downward(Point3::new(2.3, 4.6, 3.0));
        let hit = bvh.raycast_first(&ray, Side::Double, f64::INFINITY).unwrap();
        assert_relative_eq!(hit.t, 3.0, epsilon = 1e-9);
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-9);

        let brute = (0..mesh.num_triangles())
            .filter_map(|i| mesh.triangle(i).intersect_ray(&ray, Side::Double).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        assert_eq!(hit.triangle, brute.0);
    }

    #[test]
    fn test_raycast_respects_max_t() {
        let bvh = Bvh::build(&plate(4));
        let ray = Ray::downward(Point3::new(1.5, 1.5, 3.0));
        assert!(bvh.raycast_first(&ray, Side::Double, 2.0).is_none());
        assert!(bvh.raycast_first(&ray, Side::Double, 3.5).is_some());
    }

    #[test]
    fn test_raycast_nearest_of_stacked_layers() {
        let mut mesh = plate(3);
        let mut upper = plate(3);
        for z in upper.vertices.iter_mut().skip(2).step_by(3) {
            *z = 1.0;
        }
        let offset = mesh.num_vertices() as u32;
        mesh.vertices.extend_from_slice(&upper.vertices);
        if let (Some(idx), Some(up_idx)) = (mesh.indices.as_mut(), upper.indices.as_ref()) {
            idx.extend(up_idx.iter().map(|i| i + offset));
        }
        let bvh = Bvh::build(&mesh);
        let hit = bvh
            .raycast_first(&Ray::downward(Point3::new(1.2, 1.7, 5.0)), Side::Double, f64::INFINITY)
            .unwrap();
        assert_relative_eq!(hit.point.z, 1.0, epsilon = 1e-9);
    }
}
