//! Closed 2D selection regions in normalized device coordinates.

use foampath_math::{closed_segments, Point2, Segment2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SelectError};

/// An ordered, implicitly closed polygon in normalized screen space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionRegion {
    /// Polygon vertices; the last connects back to the first.
    pub points: Vec<Point2>,
}

impl SelectionRegion {
    /// A free-drawn lasso.
    pub fn lasso(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// The 5-point axis-aligned box spanned by a drag from `start` to `end`.
    pub fn rectangle(start: Point2, end: Point2) -> Self {
        Self {
            points: vec![
                start,
                Point2::new(end.x, start.y),
                end,
                Point2::new(start.x, end.y),
                start,
            ],
        }
    }

    /// Parse a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer; z is ignored.
    pub fn from_flat(coords: &[f64]) -> Result<Self> {
        if coords.len() % 3 != 0 {
            return Err(SelectError::RegionBufferLength(coords.len()));
        }
        Ok(Self {
            points: coords
                .chunks_exact(3)
                .map(|c| Point2::new(c[0], c[1]))
                .collect(),
        })
    }

    /// True if the region has no points at all.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of distinct vertices once consecutive repeats and the closing
    /// repeat of the first point are dropped.
    pub fn effective_len(&self) -> usize {
        let mut count = 0;
        let mut prev: Option<&Point2> = None;
        for p in &self.points {
            if prev != Some(p) {
                count += 1;
            }
            prev = Some(p);
        }
        if count > 1 && self.points.first() == self.points.last() {
            count -= 1;
        }
        count
    }

    /// Too few distinct points to enclose anything.
    pub fn is_degenerate(&self) -> bool {
        self.effective_len() < 3
    }

    /// Edges of the closed polygon.
    pub fn segments(&self) -> Vec<Segment2> {
        closed_segments(&self.points)
    }
}

/// Which gesture a [`RegionBuilder`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionTool {
    /// Free-form polygon following the pointer.
    #[default]
    Lasso,
    /// Axis-aligned rectangle from the press point to the pointer.
    Box,
}

/// Turns pointer samples in pixels into a [`SelectionRegion`].
///
/// Lasso samples closer than [`RegionBuilder::MIN_STEP_PX`] to the previous
/// sample are dropped, and a sample that continues the previous direction
/// moves the last vertex instead of adding one.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    tool: RegionTool,
    width: f64,
    height: f64,
    start: Point2,
    prev_px: (f64, f64),
    points: Vec<Point2>,
}

impl RegionBuilder {
    /// Minimum pointer travel, per axis, before a lasso sample is recorded.
    pub const MIN_STEP_PX: f64 = 3.0;

    /// Cosine above which consecutive lasso directions count as collinear.
    pub const COLLINEAR_DOT: f64 = 0.99;

    /// Start a gesture at pixel `(x, y)` on a `width` x `height` viewport.
    pub fn begin(tool: RegionTool, width: f64, height: f64, x: f64, y: f64) -> Self {
        let mut builder = Self {
            tool,
            width,
            height,
            start: Point2::origin(),
            prev_px: (x, y),
            points: Vec::new(),
        };
        builder.start = builder.to_ndc(x, y);
        builder
    }

    fn to_ndc(&self, x: f64, y: f64) -> Point2 {
        Point2::new((x / self.width) * 2.0 - 1.0, -((y / self.height) * 2.0 - 1.0))
    }

    /// Feed a pointer position. Returns `true` if the region changed.
    pub fn drag(&mut self, x: f64, y: f64) -> bool {
        let current = self.to_ndc(x, y);
        match self.tool {
            RegionTool::Box => {
                self.points = SelectionRegion::rectangle(self.start, current).points;
                let moved = (x, y) != self.prev_px;
                self.prev_px = (x, y);
                moved
            }
            RegionTool::Lasso => {
                let (px, py) = self.prev_px;
                if (x - px).abs() < Self::MIN_STEP_PX && (y - py).abs() < Self::MIN_STEP_PX {
                    return false;
                }
                let n = self.points.len();
                let replace = n >= 2 && {
                    let last = (self.points[n - 1] - self.points[n - 2]).normalize();
                    let next = (current - self.points[n - 1]).normalize();
                    last.dot(&next) > Self::COLLINEAR_DOT
                };
                if replace {
                    self.points[n - 1] = current;
                } else {
                    self.points.push(current);
                }
                self.prev_px = (x, y);
                true
            }
        }
    }

    /// The region recorded so far.
    pub fn region(&self) -> SelectionRegion {
        SelectionRegion {
            points: self.points.clone(),
        }
    }

    /// End the gesture. Returns `None` if nothing was recorded.
    pub fn finish(self) -> Option<SelectionRegion> {
        (!self.points.is_empty()).then_some(SelectionRegion {
            points: self.points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_is_closed_five_points() {
        let r = SelectionRegion::rectangle(Point2::new(-0.5, -0.5), Point2::new(0.5, 0.5));
        assert_eq!(r.points.len(), 5);
        assert_eq!(r.points[0], r.points[4]);
        assert_eq!(r.effective_len(), 4);
        assert!(!r.is_degenerate());
    }

    #[test]
    fn test_from_flat() {
        let r = SelectionRegion::from_flat(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(r.points, vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0)
        ]);
        assert_eq!(
            SelectionRegion::from_flat(&[0.0, 1.0]),
            Err(SelectError::RegionBufferLength(2))
        );
    }

    #[test]
    fn test_degenerate_regions() {
        assert!(SelectionRegion::default().is_degenerate());
        let line = SelectionRegion::lasso(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(line.is_degenerate());
        let collapsed = SelectionRegion::rectangle(Point2::new(0.2, 0.2), Point2::new(0.2, 0.2));
        assert!(collapsed.is_degenerate());
    }

    #[test]
    fn test_box_builder_tracks_pointer() {
        let mut b = RegionBuilder::begin(RegionTool::Box, 200.0, 100.0, 50.0, 25.0);
        assert!(b.drag(150.0, 75.0));
        let r = b.finish().unwrap();
        assert_eq!(r.points.len(), 5);
        assert_relative_eq!(r.points[0].x, -0.5);
        assert_relative_eq!(r.points[0].y, 0.5);
        assert_relative_eq!(r.points[2].x, 0.5);
        assert_relative_eq!(r.points[2].y, -0.5);
    }

    #[test]
    fn test_lasso_merges_collinear_samples() {
        let mut b = RegionBuilder::begin(RegionTool::Lasso, 100.0, 100.0, 0.0, 0.0);
        assert!(b.drag(10.0, 10.0));
        assert!(b.drag(20.0, 10.0));
        // continues straight right: replaces the last vertex
        assert!(b.drag(30.0, 10.0));
        assert_eq!(b.region().points.len(), 2);
        // too small a step
        assert!(!b.drag(31.0, 11.0));
        // turn down: appends
        assert!(b.drag(30.0, 40.0));
        assert_eq!(b.region().points.len(), 3);
        assert_relative_eq!(b.region().points[1].x, -0.4);
    }

    #[test]
    fn test_empty_gesture() {
        let b = RegionBuilder::begin(RegionTool::Lasso, 100.0, 100.0, 0.0, 0.0);
        assert!(b.finish().is_none());
    }
}
