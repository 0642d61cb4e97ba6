//! 2D geometry on screen-space points.
//!
//! Convex hulls, ray-crossing parity and segment intersection. These run in
//! the inner loop of region selection, so they are plain functions over
//! slices with no allocation beyond the hull itself.

use crate::Point2;

/// A directed 2D line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2 {
    /// Start point.
    pub start: Point2,
    /// End point.
    pub end: Point2,
}

impl Segment2 {
    /// Create a segment from two points.
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// True when the segment runs downward (start above end).
    #[inline]
    pub fn descends(&self) -> bool {
        self.start.y > self.end.y
    }
}

/// Turn direction of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The three points are collinear.
    Collinear,
    /// Clockwise turn.
    Clockwise,
    /// Counter-clockwise turn.
    CounterClockwise,
}

/// Orientation of the triple `(p, q, r)`.
pub fn orientation(p: &Point2, q: &Point2, r: &Point2) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Close a polyline into segments, connecting the last point back to the first.
pub fn closed_segments(points: &[Point2]) -> Vec<Segment2> {
    let n = points.len();
    (0..n)
        .map(|i| Segment2::new(points[i], points[(i + 1) % n]))
        .collect()
}

/// Convex hull by Graham scan, counter-clockwise from the lowest point.
///
/// Returns `None` when fewer than three non-collinear points remain.
pub fn convex_hull(points: &[Point2]) -> Option<Vec<Point2>> {
    let pivot_index = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)?;
    let p0 = points[pivot_index];

    let mut rest: Vec<Point2> = points
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != pivot_index)
        .map(|(_, p)| *p)
        .collect();
    rest.sort_by(|a, b| {
        let angle_a = (a.y - p0.y).atan2(a.x - p0.x);
        let angle_b = (b.y - p0.y).atan2(b.x - p0.x);
        angle_a
            .total_cmp(&angle_b)
            .then((a - p0).norm_squared().total_cmp(&(b - p0).norm_squared()))
    });

    // Keep only the farthest point of each collinear run through the pivot.
    let mut sorted = Vec::with_capacity(rest.len() + 1);
    sorted.push(p0);
    let mut i = 0;
    while i < rest.len() {
        while i + 1 < rest.len()
            && orientation(&p0, &rest[i], &rest[i + 1]) == Orientation::Collinear
        {
            i += 1;
        }
        sorted.push(rest[i]);
        i += 1;
    }

    if sorted.len() < 3 {
        return None;
    }

    let mut hull: Vec<Point2> = sorted[..3].to_vec();
    for p in &sorted[3..] {
        while hull.len() >= 2
            && orientation(&hull[hull.len() - 2], &hull[hull.len() - 1], p)
                != Orientation::CounterClockwise
        {
            hull.pop();
        }
        hull.push(*p);
    }
    Some(hull)
}

/// Whether a ray cast from `point` toward +x crosses `segment`.
///
/// `prev_descends` and `this_descends` are the vertical directions of the
/// previous and current polygon edge; a ray passing exactly through a shared
/// vertex counts once only when the polygon keeps its direction there.
pub fn ray_crosses_segment(
    point: &Point2,
    segment: &Segment2,
    prev_descends: bool,
    this_descends: bool,
) -> bool {
    let (px, py) = (point.x, point.y);
    let (sx, sy) = (segment.start.x, segment.start.y);
    let (ex, ey) = (segment.end.x, segment.end.y);

    if sy == ey {
        return false;
    }
    if py > sy && py > ey {
        return false;
    }
    if py < sy && py < ey {
        return false;
    }
    if px > sx && px > ex {
        return false;
    }
    if px < sx && px < ex {
        return !(py == sy && prev_descends != this_descends);
    }

    let (dx, dy) = (ex - sx, ey - sy);
    let (perp_x, perp_y) = (dy, -dx);
    let dot = perp_x * (px - sx) + perp_y * (py - sy);
    sign(dot) != sign(perp_x)
}

/// Number of segments crossed by a +x ray from `point`.
///
/// Odd means inside a closed polygon described by `segments`.
pub fn ray_crossings(point: &Point2, segments: &[Segment2]) -> usize {
    let Some(last) = segments.last() else {
        return 0;
    };
    let mut prev_descends = last.descends();
    let mut crossings = 0;
    for segment in segments {
        let this_descends = segment.descends();
        if ray_crosses_segment(point, segment, prev_descends, this_descends) {
            crossings += 1;
        }
        prev_descends = this_descends;
    }
    crossings
}

/// Proper intersection test for two segments.
pub fn segments_intersect(a: &Segment2, b: &Segment2) -> bool {
    fn ccw(a: &Point2, b: &Point2, c: &Point2) -> bool {
        (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
    }
    ccw(&a.start, &b.start, &b.end) != ccw(&a.end, &b.start, &b.end)
        && ccw(&a.start, &a.end, &b.start) != ccw(&a.start, &a.end, &b.end)
}

#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square() -> Vec<Segment2> {
        closed_segments(&[p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)])
    }

    #[test]
    fn test_closed_segments_wrap() {
        let segs = square();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3].end, p(0.0, 0.0));
    }

    #[test]
    fn test_hull_drops_interior_points() {
        let pts = [
            p(0.0, 0.0),
            p(2.0, 2.0),
            p(4.0, 0.0),
            p(1.0, 1.0),
            p(4.0, 4.0),
            p(0.0, 4.0),
        ];
        let hull = convex_hull(&pts).unwrap();
        assert_eq!(hull.len(), 4);
        assert_eq!(hull[0], p(0.0, 0.0));
        assert!(!hull.contains(&p(2.0, 2.0)));
        assert!(!hull.contains(&p(1.0, 1.0)));
    }

    #[test]
    fn test_hull_is_counter_clockwise() {
        let hull = convex_hull(&[p(0.0, 4.0), p(4.0, 4.0), p(4.0, 0.0), p(0.0, 0.0)]).unwrap();
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let c = hull[(i + 2) % hull.len()];
            assert_eq!(orientation(&a, &b, &c), Orientation::CounterClockwise);
        }
    }

    #[test]
    fn test_hull_degenerate() {
        assert!(convex_hull(&[]).is_none());
        assert!(convex_hull(&[p(0.0, 0.0), p(1.0, 1.0)]).is_none());
        assert!(convex_hull(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)]).is_none());
    }

    #[test]
    fn test_parity_inside_and_outside() {
        let segs = square();
        assert_eq!(ray_crossings(&p(2.0, 2.0), &segs) % 2, 1);
        assert_eq!(ray_crossings(&p(5.0, 2.0), &segs) % 2, 0);
        assert_eq!(ray_crossings(&p(-1.0, 2.0), &segs) % 2, 0);
        assert_eq!(ray_crossings(&p(2.0, 5.0), &segs) % 2, 0);
    }

    #[test]
    fn test_parity_concave_polygon() {
        // U shape opening upward.
        let segs = closed_segments(&[
            p(0.0, 0.0),
            p(6.0, 0.0),
            p(6.0, 6.0),
            p(4.0, 6.0),
            p(4.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 6.0),
            p(0.0, 6.0),
        ]);
        assert_eq!(ray_crossings(&p(1.0, 4.0), &segs) % 2, 1);
        assert_eq!(ray_crossings(&p(3.0, 4.0), &segs) % 2, 0);
        assert_eq!(ray_crossings(&p(5.0, 4.0), &segs) % 2, 1);
    }

    #[test]
    fn test_parity_empty_segments() {
        assert_eq!(ray_crossings(&p(0.0, 0.0), &[]), 0);
    }

    #[test]
    fn test_segments_intersect() {
        let a = Segment2::new(p(0.0, 0.0), p(4.0, 4.0));
        let b = Segment2::new(p(0.0, 4.0), p(4.0, 0.0));
        let c = Segment2::new(p(5.0, 0.0), p(6.0, 1.0));
        assert!(segments_intersect(&a, &b));
        assert!(!segments_intersect(&a, &c));
    }
}
