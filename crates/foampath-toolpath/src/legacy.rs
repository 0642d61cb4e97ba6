//! Corner-anchored zigzag planner.
//!
//! An older alternative to [`crate::plan_paths`]: each layer is a single
//! zigzag over every sample, alternating between columns (odd layers) and
//! rows (even layers). The start of each layer is the extremal corner
//! nearest to where the previous layer ended. It assumes one connected,
//! roughly rectangular sampled region; holes are crossed without lifting.

use std::cmp::Ordering;

use foampath_math::Point3;
use serde::{Deserialize, Serialize};

use crate::sample::SamplePoint;

/// Parameters of the legacy zigzag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacySettings {
    /// Lift of the first layer (mm).
    pub z_offset: f64,
    /// Lift between layers (mm).
    pub delta_z: f64,
    /// Number of layers.
    pub layers: u32,
}

impl Default for LegacySettings {
    fn default() -> Self {
        Self {
            z_offset: 12.0,
            delta_z: 5.0,
            layers: 3,
        }
    }
}

/// The eight extremal corners of a sample set.
///
/// `x_max_y_min` is the lowest-y point among those at the maximum x, and
/// so on for the other seven.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerPoints {
    /// Lowest y at max x.
    pub x_max_y_min: Point3,
    /// Highest y at max x.
    pub x_max_y_max: Point3,
    /// Lowest y at min x.
    pub x_min_y_min: Point3,
    /// Highest y at min x.
    pub x_min_y_max: Point3,
    /// Lowest x at max y.
    pub y_max_x_min: Point3,
    /// Highest x at max y.
    pub y_max_x_max: Point3,
    /// Lowest x at min y.
    pub y_min_x_min: Point3,
    /// Highest x at min y.
    pub y_min_x_max: Point3,
}

/// Axis a layer sweeps along between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Columns of constant x, walked in y.
    X,
    /// Rows of constant y, walked in x.
    Y,
}

/// Extreme of `points` on `key`, tie-broken by the extreme of `tie`.
fn extreme(
    points: &[Point3],
    key: impl Fn(&Point3) -> f64,
    key_max: bool,
    tie: impl Fn(&Point3) -> f64,
    tie_max: bool,
) -> Option<Point3> {
    let pick = |a: f64, b: f64, max: bool| if max { a > b } else { a < b };
    let target = points.iter().map(&key).reduce(|a, b| if pick(b, a, key_max) { b } else { a })?;
    points
        .iter()
        .filter(|p| key(*p) == target)
        .copied()
        .reduce(|best, p| if pick(tie(&p), tie(&best), tie_max) { p } else { best })
}

impl CornerPoints {
    /// Corners of `points`, or `None` if there are none.
    pub fn find(points: &[Point3]) -> Option<Self> {
        let x = |p: &Point3| p.x;
        let y = |p: &Point3| p.y;
        Some(Self {
            x_max_y_min: extreme(points, x, true, y, false)?,
            x_max_y_max: extreme(points, x, true, y, true)?,
            x_min_y_min: extreme(points, x, false, y, false)?,
            x_min_y_max: extreme(points, x, false, y, true)?,
            y_max_x_min: extreme(points, y, true, x, false)?,
            y_max_x_max: extreme(points, y, true, x, true)?,
            y_min_x_min: extreme(points, y, false, x, false)?,
            y_min_x_max: extreme(points, y, false, x, true)?,
        })
    }

    fn candidates(&self, scan: Scan) -> [Point3; 4] {
        match scan {
            Scan::X => [
                self.x_max_y_min,
                self.x_max_y_max,
                self.x_min_y_max,
                self.x_min_y_min,
            ],
            Scan::Y => [
                self.y_max_x_min,
                self.y_max_x_max,
                self.y_min_x_min,
                self.y_min_x_max,
            ],
        }
    }

    /// Starting corner for a layer scanning along `scan`, nearest to `from`.
    ///
    /// Returns whether the layer starts at the maximum of the scan axis, and
    /// the initial walking direction along the other axis (`1.0` ascending).
    fn nearest(&self, from: &Point3, scan: Scan, lift: f64) -> (bool, f64) {
        let lifted = self
            .candidates(scan)
            .map(|p| Point3::new(p.x, p.y, p.z + lift));

        let mut closest = lifted[0];
        let mut min_dist = (from - lifted[0]).norm();
        for p in &lifted {
            let d = (from - p).norm();
            if d < min_dist {
                min_dist = d;
                closest = *p;
            }
        }

        match scan {
            Scan::X => {
                let max = lifted.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                let ascending =
                    closest.y == self.x_max_y_min.y || closest.y == self.x_min_y_min.y;
                (closest.x == max, if ascending { 1.0 } else { -1.0 })
            }
            Scan::Y => {
                let max = lifted.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
                let ascending =
                    closest.x == self.y_max_x_min.x || closest.x == self.y_min_x_min.x;
                (closest.y == max, if ascending { 1.0 } else { -1.0 })
            }
        }
    }
}

fn by(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// One zigzag path per layer over every sample.
///
/// Layer 1 scans columns from the lowest x, walking up in y first. Each
/// later layer switches axis and starts from the extremal corner closest to
/// the end of the previous layer. The walking direction flips at every new
/// column (or row).
pub fn corner_zigzag(samples: &[SamplePoint], settings: &LegacySettings) -> Vec<Vec<Point3>> {
    let mut points: Vec<Point3> = samples.iter().map(|s| s.position).collect();
    let Some(corners) = CornerPoints::find(&points) else {
        return Vec::new();
    };

    let mut layers: Vec<Vec<Point3>> = Vec::with_capacity(settings.layers as usize);
    for layer in 1..=settings.layers {
        let scan = if layer % 2 == 1 { Scan::X } else { Scan::Y };
        let lift = settings.z_offset + (layer - 1) as f64 * settings.delta_z;

        let (from_max, mut direction) = match layers.last().and_then(|l| l.last()) {
            Some(end) => corners.nearest(end, scan, lift),
            None => (false, 1.0),
        };

        // primary axis, secondary ascending
        let (primary, secondary): (fn(&Point3) -> f64, fn(&Point3) -> f64) = match scan {
            Scan::X => (|p: &Point3| p.x, |p: &Point3| p.y),
            Scan::Y => (|p: &Point3| p.y, |p: &Point3| p.x),
        };
        points.sort_by(|a, b| {
            let main = if from_max {
                by(primary(b), primary(a))
            } else {
                by(primary(a), primary(b))
            };
            main.then(by(secondary(a), secondary(b)))
        });

        let mut path = Vec::with_capacity(points.len());
        let mut line: Vec<Point3> = Vec::new();
        let mut flush = |line: &mut Vec<Point3>, direction: f64| {
            line.sort_by(|a, b| {
                if direction > 0.0 {
                    by(secondary(a), secondary(b))
                } else {
                    by(secondary(b), secondary(a))
                }
            });
            path.append(line);
        };

        let mut current = points.first().map(primary);
        for p in &points {
            if Some(primary(p)) != current {
                flush(&mut line, direction);
                current = Some(primary(p));
                direction = -direction;
            }
            line.push(Point3::new(p.x, p.y, p.z + lift));
        }
        flush(&mut line, direction);
        layers.push(path);
    }

    log::debug!(
        "legacy zigzag: {} layers over {} samples",
        layers.len(),
        samples.len()
    );
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleClass;
    use approx::assert_relative_eq;

    fn samples(nx: usize, ny: usize, step: f64) -> Vec<SamplePoint> {
        (0..nx)
            .flat_map(|i| {
                (0..ny).map(move |j| {
                    SamplePoint::new(
                        Point3::new(i as f64 * step, j as f64 * step, 0.0),
                        SampleClass::Foam,
                    )
                })
            })
            .collect()
    }

    #[test]
    fn test_corners_of_rectangle() {
        let pts: Vec<Point3> = samples(3, 2, 4.0).iter().map(|s| s.position).collect();
        let c = CornerPoints::find(&pts).unwrap();
        assert_eq!(c.x_max_y_min, Point3::new(8.0, 0.0, 0.0));
        assert_eq!(c.x_max_y_max, Point3::new(8.0, 4.0, 0.0));
        assert_eq!(c.x_min_y_max, Point3::new(0.0, 4.0, 0.0));
        assert_eq!(c.y_min_x_max, Point3::new(8.0, 0.0, 0.0));
        assert_eq!(c.y_max_x_min, Point3::new(0.0, 4.0, 0.0));
        assert!(CornerPoints::find(&[]).is_none());
    }

    #[test]
    fn test_corners_of_skewed_set() {
        let pts = vec![
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 6.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(9.0, 3.0, 0.0),
        ];
        let c = CornerPoints::find(&pts).unwrap();
        assert_eq!(c.x_min_y_min, pts[0]);
        assert_eq!(c.x_min_y_max, pts[1]);
        assert_eq!(c.y_min_x_min, pts[2]);
        assert_eq!(c.y_min_x_max, pts[2]);
        assert_eq!(c.x_max_y_max, pts[3]);
    }

    #[test]
    fn test_first_layer_columns() {
        let layers = corner_zigzag(&samples(3, 3, 4.0), &LegacySettings::default());
        assert_eq!(layers.len(), 3);
        let first: Vec<(f64, f64)> = layers[0].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            first,
            vec![
                (0.0, 0.0),
                (0.0, 4.0),
                (0.0, 8.0),
                (4.0, 8.0),
                (4.0, 4.0),
                (4.0, 0.0),
                (8.0, 0.0),
                (8.0, 4.0),
                (8.0, 8.0),
            ]
        );
        assert_relative_eq!(layers[0][0].z, 12.0);
    }

    #[test]
    fn test_second_layer_starts_at_nearest_corner() {
        let layers = corner_zigzag(&samples(3, 3, 4.0), &LegacySettings::default());
        // layer 1 ends at (8, 8): layer 2 scans rows from the top, walking left
        let second: Vec<(f64, f64)> = layers[1].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(second[0], (8.0, 8.0));
        assert_eq!(second[2], (0.0, 8.0));
        assert_eq!(second[3], (0.0, 4.0));
        assert_eq!(second[8], (0.0, 0.0));
        assert_relative_eq!(layers[1][0].z, 17.0);

        // layer 2 ends at (0, 0): layer 3 scans columns from the left, walking up
        let third: Vec<(f64, f64)> = layers[2].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(third, layers[0].iter().map(|p| (p.x, p.y)).collect::<Vec<_>>());
        assert_relative_eq!(layers[2][0].z, 22.0);
    }

    #[test]
    fn test_every_layer_visits_every_sample() {
        let input = samples(4, 5, 2.0);
        for layer in corner_zigzag(&input, &LegacySettings::default()) {
            assert_eq!(layer.len(), input.len());
        }
        assert!(corner_zigzag(&[], &LegacySettings::default()).is_empty());
    }
}
