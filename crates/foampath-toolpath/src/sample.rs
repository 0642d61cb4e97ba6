//! Surface sampling - drop a grid of vertical rays onto the selected surface.

use foampath_math::{Aabb3, Point3, Transform, Vec3};
use foampath_mesh::{Ray, Side, SpatialMesh};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolpathError};

/// Height above the sampling box from which rays are cast.
pub const RAY_CLEARANCE: f64 = 10.0;

/// Slack on the last grid node so `max` is still sampled despite rounding.
const GRID_EPS: f64 = 1e-9;

/// Material class of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleClass {
    /// Covered only by the regular foam region.
    Foam,
    /// Covered by both the foam region and the sensing region.
    Sense,
}

/// A classified point on the sampled surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// World-space position.
    pub position: Point3,
    /// Material class.
    pub class: SampleClass,
}

impl SamplePoint {
    /// Create a new sample.
    pub fn new(position: Point3, class: SampleClass) -> Self {
        Self { position, class }
    }
}

/// A mesh prepared for world-space downward raycasts.
struct Target<'a> {
    mesh: &'a SpatialMesh,
    world: &'a Transform,
    world_inv: Transform,
    down_local: Vec3,
}

impl<'a> Target<'a> {
    fn new(mesh: &'a SpatialMesh) -> Result<Self> {
        let world = &mesh.mesh().transform;
        let world_inv = world.inverse().ok_or(ToolpathError::SingularTransform)?;
        let down_local = world_inv.apply_vec(&Vec3::new(0.0, 0.0, -1.0));
        Ok(Self {
            mesh,
            world,
            world_inv,
            down_local,
        })
    }

    /// Nearest world-space hit below `origin`.
    fn hit(&self, origin: &Point3) -> Option<Point3> {
        let ray = Ray::new(self.world_inv.apply_point(origin), self.down_local);
        self.mesh
            .raycast_first(&ray, Side::Double, f64::INFINITY)
            .map(|hit| self.world.apply_point(&hit.point))
    }
}

/// Grid coordinates from `min` to `max` inclusive.
fn grid_axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let count = ((max - min) / step + GRID_EPS).floor() as usize + 1;
    (0..count).map(|i| min + i as f64 * step).collect()
}

/// Sample the surface of `primary` on a regular XY grid over `bounds`.
///
/// Each node casts a ray straight down from `bounds.max.z + 10`. A node that
/// hits both `primary` and `secondary` yields a [`SampleClass::Sense`]
/// sample, one that hits only `primary` a [`SampleClass::Foam`] sample, and
/// anything else no sample. The position is always the nearest primary hit.
///
/// Output is in x-major, y-minor scan order.
pub fn sample_surface(
    primary: &SpatialMesh,
    secondary: Option<&SpatialMesh>,
    bounds: &Aabb3,
    grid_size: f64,
) -> Result<Vec<SamplePoint>> {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return Err(ToolpathError::InvalidSettings(format!(
            "grid_size must be positive, got {grid_size}"
        )));
    }
    bounds.validate()?;
    if bounds.is_empty() || primary.mesh().is_empty() {
        return Ok(Vec::new());
    }

    let primary = Target::new(primary)?;
    let secondary = secondary.map(Target::new).transpose()?;
    let top = bounds.max.z + RAY_CLEARANCE;
    let xs = grid_axis(bounds.min.x, bounds.max.x, grid_size);
    let ys = grid_axis(bounds.min.y, bounds.max.y, grid_size);

    // One column per x; collect keeps column order.
    let columns: Vec<Vec<SamplePoint>> = xs
        .par_iter()
        .map(|&x| {
            ys.iter()
                .filter_map(|&y| {
                    let origin = Point3::new(x, y, top);
                    let position = primary.hit(&origin)?;
                    let sensed = secondary
                        .as_ref()
                        .is_some_and(|s| s.hit(&origin).is_some());
                    let class = if sensed {
                        SampleClass::Sense
                    } else {
                        SampleClass::Foam
                    };
                    Some(SamplePoint::new(position, class))
                })
                .collect()
        })
        .collect();

    let samples: Vec<SamplePoint> = columns.into_iter().flatten().collect();
    log::debug!(
        "sampled {}x{} grid at {grid_size}: {} points",
        xs.len(),
        ys.len(),
        samples.len()
    );
    Ok(samples)
}
