//! Region selection over a mesh's BVH.
//!
//! The region's edges are narrowed per BVH depth: each node keeps only the
//! parent's edges that can still touch its projected box, so leaf tests run
//! against a short candidate list.

use foampath_math::{
    closed_segments, convex_hull, ray_crossings, segments_intersect, Aabb3, Point2, Point3,
    Segment2, Transform,
};
use foampath_mesh::{
    BoundsVerdict, Bvh, Ray, ShapecastVisitor, Side, SpatialMesh, Triangle, TriangleMesh,
};

use crate::camera::Camera;
use crate::error::{Result, SelectError};
use crate::policy::{SelectionMode, SelectionPolicy};
use crate::region::SelectionRegion;

/// Offset along the face normal for occlusion rays.
const VISIBILITY_OFFSET: f64 = 1e-6;

/// Index-buffer mask for highlighting a selection.
///
/// Sized to the source mesh's index buffer; only the first `count` entries
/// are meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightMask {
    /// Vertex ids, three per selected triangle.
    pub indices: Vec<u32>,
    /// Number of meaningful entries.
    pub count: usize,
}

impl HighlightMask {
    /// The meaningful prefix.
    pub fn active(&self) -> &[u32] {
        &self.indices[..self.count]
    }
}

/// Outcome of one selection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult {
    /// Index-buffer offsets of selected triangles, each a multiple of 3.
    pub triangle_indices: Vec<usize>,
    /// Highlight mask for the viewer.
    pub highlight: HighlightMask,
    /// Unindexed local-space copy of the selected triangles.
    pub sub_mesh: TriangleMesh,
    /// Whether the whole-model rule fired.
    pub whole_model: bool,
}

impl SelectionResult {
    fn empty(mesh: &TriangleMesh) -> Self {
        Self {
            highlight: HighlightMask {
                indices: vec![0; mesh.index_count()],
                count: 0,
            },
            ..Default::default()
        }
    }

    /// True if no triangle was selected.
    pub fn is_empty(&self) -> bool {
        self.triangle_indices.is_empty()
    }

    /// Number of selected triangles.
    pub fn len(&self) -> usize {
        self.triangle_indices.len()
    }
}

/// Select the triangles of `mesh` that fall inside `region` as seen by `camera`.
///
/// An empty or degenerate region yields an empty result.
pub fn select(
    mesh: &SpatialMesh,
    camera: &Camera,
    region: &SelectionRegion,
    policy: SelectionPolicy,
) -> Result<SelectionResult> {
    let tri_mesh = mesh.mesh();
    if region.is_degenerate() {
        log::debug!("selection skipped: region has {} effective points", region.effective_len());
        return Ok(SelectionResult::empty(tri_mesh));
    }

    let camera_local = match policy.mode {
        SelectionMode::CentroidVisible => {
            let world_inv = tri_mesh
                .transform
                .inverse()
                .ok_or(SelectError::SingularTransform("world"))?;
            let eye = camera
                .position()
                .ok_or(SelectError::SingularTransform("view"))?;
            Some(world_inv.apply_point(&eye))
        }
        _ => None,
    };

    let mut visitor = SelectionVisitor {
        to_clip: camera.model_to_clip(&tri_mesh.transform),
        region: region.segments(),
        per_depth: Vec::new(),
        policy,
        occluders: mesh.bvh(),
        camera_local,
        hits: Vec::new(),
    };
    mesh.shapecast(&mut visitor);
    let hits = visitor.hits;

    let whole_model = policy.whole_model && !hits.is_empty();
    let triangle_indices: Vec<usize> = if whole_model {
        (0..tri_mesh.num_triangles()).map(|t| t * 3).collect()
    } else {
        hits.iter().map(|t| t * 3).collect()
    };

    let mut indices = vec![0u32; tri_mesh.index_count()];
    let mut count = 0;
    for &offset in &triangle_indices {
        for slot in offset..offset + 3 {
            indices[count] = tri_mesh.index_at(slot) as u32;
            count += 1;
        }
    }

    let sub_mesh = tri_mesh.extract(&triangle_indices)?;
    log::debug!(
        "selected {} of {} triangles ({:?}, whole model: {})",
        triangle_indices.len(),
        tri_mesh.num_triangles(),
        policy.mode,
        whole_model
    );

    Ok(SelectionResult {
        triangle_indices,
        highlight: HighlightMask { indices, count },
        sub_mesh,
        whole_model,
    })
}

/// Shapecast visitor implementing the region tests.
struct SelectionVisitor<'a> {
    to_clip: Transform,
    region: Vec<Segment2>,
    /// Candidate region edges for the node most recently tested at each depth.
    per_depth: Vec<Vec<Segment2>>,
    policy: SelectionPolicy,
    occluders: &'a Bvh,
    camera_local: Option<Point3>,
    /// Selected triangle numbers in visit order.
    hits: Vec<usize>,
}

impl SelectionVisitor<'_> {
    fn project(&self, p: &Point3) -> Point2 {
        let q = self.to_clip.project_point(p);
        Point2::new(q.x, q.y)
    }

    fn candidates(&self, depth: usize) -> &[Segment2] {
        self.per_depth
            .get(depth)
            .map(Vec::as_slice)
            .unwrap_or(&self.region)
    }

    fn is_visible(&self, tri: &Triangle, centroid: &Point3) -> bool {
        let Some(eye) = self.camera_local else {
            return true;
        };
        let to_eye = eye - centroid;
        let distance = to_eye.norm();
        if distance == 0.0 {
            return true;
        }
        let ray = Ray::new(centroid + tri.normal * VISIBILITY_OFFSET, to_eye);
        self.occluders
            .raycast_first(&ray, Side::Double, distance)
            .is_none()
    }
}

fn is_odd(crossings: usize) -> bool {
    crossings % 2 == 1
}

impl ShapecastVisitor for SelectionVisitor<'_> {
    fn test_bounds(&mut self, aabb: &Aabb3, depth: usize) -> BoundsVerdict {
        let projected: Vec<Point2> = aabb.corners().iter().map(|c| self.project(c)).collect();
        let min_x = projected.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = projected.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = projected.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let parent = if depth == 0 {
            &self.region
        } else {
            &self.per_depth[depth - 1]
        };
        let candidates: Vec<Segment2> = parent
            .iter()
            .filter(|s| {
                !(s.start.x < min_x && s.end.x < min_x)
                    && !(s.start.y > max_y && s.end.y > max_y)
                    && !(s.start.y < min_y && s.end.y < min_y)
            })
            .copied()
            .collect();

        if self.per_depth.len() <= depth {
            self.per_depth.resize_with(depth + 1, Vec::new);
        }
        self.per_depth[depth] = candidates;
        let candidates = &self.per_depth[depth];

        if candidates.is_empty() {
            return BoundsVerdict::Prune;
        }

        // A box seen edge-on has no area; let its triangles decide.
        let Some(hull) = convex_hull(&projected) else {
            return BoundsVerdict::Refine;
        };
        let hull_edges = closed_segments(&hull);

        if is_odd(ray_crossings(&candidates[0].start, &hull_edges)) {
            return BoundsVerdict::Refine;
        }

        let parity = is_odd(ray_crossings(&hull[0], candidates));
        if hull[1..]
            .iter()
            .any(|v| is_odd(ray_crossings(v, candidates)) != parity)
        {
            return BoundsVerdict::Refine;
        }

        let crossed = hull_edges
            .iter()
            .any(|e| candidates.iter().any(|s| segments_intersect(e, s)));
        if crossed {
            return BoundsVerdict::Refine;
        }

        if parity {
            BoundsVerdict::IncludeAll
        } else {
            BoundsVerdict::Prune
        }
    }

    fn test_leaf(&mut self, tri: &Triangle, index: usize, contained: bool, depth: usize) -> bool {
        let segments = self.candidates(depth);
        let matched = match self.policy.mode {
            SelectionMode::Centroid | SelectionMode::CentroidVisible => {
                let centroid = tri.centroid();
                let inside =
                    contained || is_odd(ray_crossings(&self.project(&centroid), segments));
                inside
                    && (self.policy.mode == SelectionMode::Centroid
                        || self.is_visible(tri, &centroid))
            }
            SelectionMode::Intersection => {
                contained || {
                    let screen: Vec<Point2> = tri.v.iter().map(|v| self.project(v)).collect();
                    screen.iter().any(|p| is_odd(ray_crossings(p, segments)))
                        || closed_segments(&screen)
                            .iter()
                            .any(|e| segments.iter().any(|s| segments_intersect(e, s)))
                }
            }
        };

        if matched {
            self.hits.push(index);
            self.policy.whole_model
        } else {
            false
        }
    }
}
