//! Path planning - stitch classified samples into serpentine strokes.
//!
//! Samples are grouped into rows by y, rows are split into segments at
//! x-gaps, and segments are chained greedily from row to row by nearest
//! endpoint. Odd rows are pre-reversed so a fully covered rectangle comes
//! out as a single zigzag.

use rayon::join;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolpathError};
use crate::sample::{SampleClass, SamplePoint};

/// Row grouping and segment splitting parameters, as multiples of the grid size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Samples whose y differs by at most `grid * factor` share a row.
    pub row_tolerance_factor: f64,
    /// Neighbors further apart than `grid * factor` in x start a new segment.
    pub connect_distance_factor: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            row_tolerance_factor: 0.5,
            connect_distance_factor: 3.0,
        }
    }
}

impl PlannerSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.row_tolerance_factor.is_finite() && self.row_tolerance_factor >= 0.0) {
            return Err(ToolpathError::InvalidSettings(
                "row_tolerance_factor must be non-negative".into(),
            ));
        }
        if !(self.connect_distance_factor.is_finite() && self.connect_distance_factor >= 0.0) {
            return Err(ToolpathError::InvalidSettings(
                "connect_distance_factor must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// A run of neighboring samples within one row.
#[derive(Debug, Clone)]
struct Segment {
    points: Vec<SamplePoint>,
    connected: bool,
}

/// Traversal direction of the last segment appended to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Normal,
    Reverse,
}

/// Group samples into rows of ascending y.
///
/// A new row starts whenever two consecutive y values, after sorting,
/// differ by more than `row_tol`.
pub fn group_rows(samples: &[SamplePoint], row_tol: f64) -> Vec<Vec<SamplePoint>> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));

    let mut rows: Vec<Vec<SamplePoint>> = Vec::new();
    let mut prev_y: Option<f64> = None;
    for sample in sorted {
        let y = sample.position.y;
        let same_row = prev_y.is_some_and(|py| (y - py).abs() <= row_tol);
        prev_y = Some(y);
        match rows.last_mut() {
            Some(row) if same_row => row.push(sample),
            _ => rows.push(vec![sample]),
        }
    }
    rows
}

/// Sort a row by x and split it wherever the x gap exceeds `max_gap`.
fn split_row(mut row: Vec<SamplePoint>, max_gap: f64, reverse: bool) -> Vec<Segment> {
    row.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));

    let mut segments: Vec<Vec<SamplePoint>> = Vec::new();
    let mut prev_x: Option<f64> = None;
    for sample in row {
        let x = sample.position.x;
        let same_segment = prev_x.is_some_and(|px| x - px <= max_gap);
        prev_x = Some(x);
        match segments.last_mut() {
            Some(seg) if same_segment => seg.push(sample),
            _ => segments.push(vec![sample]),
        }
    }

    segments
        .into_iter()
        .map(|mut points| {
            if reverse {
                points.reverse();
            }
            Segment {
                points,
                connected: false,
            }
        })
        .collect()
}

fn manhattan(a: &SamplePoint, b: &SamplePoint) -> f64 {
    (a.position.x - b.position.x).abs() + (a.position.y - b.position.y).abs()
}

/// Nearest unconnected endpoint in `row` to `tip`. Heads win ties.
fn nearest_endpoint(row: &[Segment], tip: &SamplePoint) -> Option<(usize, Order)> {
    let mut best = None;
    let mut best_dist = f64::INFINITY;
    for (i, seg) in row.iter().enumerate().filter(|(_, s)| !s.connected) {
        let (Some(head), Some(tail)) = (seg.points.first(), seg.points.last()) else {
            continue;
        };
        let d_head = manhattan(tip, head);
        if d_head < best_dist {
            best = Some((i, Order::Normal));
            best_dist = d_head;
        }
        let d_tail = manhattan(tip, tail);
        if d_tail < best_dist {
            best = Some((i, Order::Reverse));
            best_dist = d_tail;
        }
    }
    best
}

/// Continue with the row's outermost segment on the side the path is heading.
fn fallback(row: &[Segment], order: Order) -> Option<(usize, Order)> {
    match order {
        Order::Normal => row
            .len()
            .checked_sub(1)
            .filter(|&i| !row[i].connected)
            .map(|i| (i, Order::Reverse)),
        Order::Reverse => row
            .first()
            .filter(|s| !s.connected)
            .map(|_| (0, Order::Normal)),
    }
}

/// Stitch samples into continuous serpentine paths.
///
/// Every sample appears in exactly one returned path, exactly once. A
/// rectangular, gap-free sample set produces a single path; holes and
/// non-convex outlines split it into several.
pub fn plan_paths(
    samples: &[SamplePoint],
    grid_size: f64,
    settings: &PlannerSettings,
) -> Vec<Vec<SamplePoint>> {
    if samples.is_empty() {
        return Vec::new();
    }
    let row_tol = grid_size * settings.row_tolerance_factor;
    let max_gap = grid_size * settings.connect_distance_factor;

    let mut rows: Vec<Vec<Segment>> = group_rows(samples, row_tol)
        .into_iter()
        .enumerate()
        .map(|(i, row)| split_row(row, max_gap, i % 2 == 1))
        .collect();

    let mut paths = Vec::new();
    loop {
        let seed = rows.iter().enumerate().find_map(|(r, row)| {
            row.iter().position(|s| !s.connected).map(|i| (r, i))
        });
        let Some((start_row, start_seg)) = seed else {
            break;
        };

        let seg = &mut rows[start_row][start_seg];
        seg.connected = true;
        let mut path = seg.points.clone();
        let mut order = Order::Normal;
        if start_row % 2 == 1 {
            path.reverse();
            order = Order::Reverse;
        }

        for row in rows.iter_mut().skip(start_row + 1) {
            if row.iter().all(|s| s.connected) {
                break;
            }
            let Some(tip) = path.last().copied() else {
                break;
            };
            let Some((i, chosen)) = nearest_endpoint(row, &tip).or_else(|| fallback(row, order))
            else {
                break;
            };
            let seg = &mut row[i];
            seg.connected = true;
            match chosen {
                Order::Normal => path.extend_from_slice(&seg.points),
                Order::Reverse => path.extend(seg.points.iter().rev()),
            }
            order = chosen;
        }
        paths.push(path);
    }

    log::debug!(
        "planned {} samples into {} paths over {} rows",
        samples.len(),
        paths.len(),
        rows.len()
    );
    paths
}

/// Path sets for every material subset of one sampling pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedPaths {
    /// Paths over every sample.
    pub all: Vec<Vec<SamplePoint>>,
    /// Paths over foam-only samples.
    pub foam: Vec<Vec<SamplePoint>>,
    /// Paths over sensing samples.
    pub sense: Vec<Vec<SamplePoint>>,
}

impl PlannedPaths {
    /// True if no subset produced a path.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.foam.is_empty() && self.sense.is_empty()
    }

    /// True if any sensing path exists.
    pub fn has_sense(&self) -> bool {
        !self.sense.is_empty()
    }
}

/// Plan the `all`, `foam` and `sense` subsets independently.
pub fn plan_all(samples: &[SamplePoint], grid_size: f64, settings: &PlannerSettings) -> PlannedPaths {
    let subset = |class: SampleClass| -> Vec<SamplePoint> {
        samples.iter().filter(|s| s.class == class).copied().collect()
    };
    let foam_samples = subset(SampleClass::Foam);
    let sense_samples = subset(SampleClass::Sense);

    let (all, (foam, sense)) = join(
        || plan_paths(samples, grid_size, settings),
        || {
            join(
                || plan_paths(&foam_samples, grid_size, settings),
                || plan_paths(&sense_samples, grid_size, settings),
            )
        },
    );
    PlannedPaths { all, foam, sense }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foampath_math::Point3;
    use proptest::prelude::*;

    fn foam(x: f64, y: f64) -> SamplePoint {
        SamplePoint::new(Point3::new(x, y, 0.0), SampleClass::Foam)
    }

    /// Samples on an `nx` x `ny` grid, x outer like the sampler emits them.
    fn grid(nx: usize, ny: usize, step: f64) -> Vec<SamplePoint> {
        (0..nx)
            .flat_map(|i| (0..ny).map(move |j| foam(i as f64 * step, j as f64 * step)))
            .collect()
    }

    fn sorted_xy(points: impl IntoIterator<Item = SamplePoint>) -> Vec<(f64, f64)> {
        let mut v: Vec<(f64, f64)> = points
            .into_iter()
            .map(|p| (p.position.x, p.position.y))
            .collect();
        v.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        v
    }

    #[test]
    fn test_rows_split_on_tolerance() {
        // grid 4 => row tolerance 2
        let samples = vec![foam(0.0, 0.0), foam(4.0, 0.5), foam(0.0, 4.0), foam(4.0, 4.5)];
        let rows = group_rows(&samples, 2.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 2);

        let rows = group_rows(&[foam(0.0, 0.0), foam(0.0, 3.0)], 2.0);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_serpentine_single_path() {
        let samples = grid(20, 20, 4.0);
        let paths = plan_paths(&samples, 4.0, &PlannerSettings::default());
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.len(), 400);

        for (r, row) in path.chunks(20).enumerate() {
            let y = row[0].position.y;
            assert!(row.iter().all(|p| p.position.y == y));
            let ascending = row.windows(2).all(|w| w[1].position.x > w[0].position.x);
            let descending = row.windows(2).all(|w| w[1].position.x < w[0].position.x);
            if r % 2 == 0 {
                assert!(ascending, "row {r} should run left to right");
            } else {
                assert!(descending, "row {r} should run right to left");
            }
        }
    }

    #[test]
    fn test_gap_splits_into_two_paths() {
        // two 3-wide columns of samples separated by a 20mm gap
        let mut samples = Vec::new();
        for j in 0..4 {
            for i in 0..3 {
                samples.push(foam(i as f64 * 4.0, j as f64 * 4.0));
                samples.push(foam(28.0 + i as f64 * 4.0, j as f64 * 4.0));
            }
        }
        let paths = plan_paths(&samples, 4.0, &PlannerSettings::default());
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].len(), 12);
        assert_eq!(paths[1].len(), 12);
        assert!(paths[0].iter().all(|p| p.position.x < 10.0));
        assert!(paths[1].iter().all(|p| p.position.x > 20.0));
    }

    #[test]
    fn test_tail_endpoint_reverses_segment() {
        // row 0: a single point at the far right; row 1 is reversed so its
        // head is at the right already, and the tip meets it directly.
        let samples = vec![foam(8.0, 0.0), foam(0.0, 4.0), foam(4.0, 4.0), foam(8.0, 4.0)];
        let paths = plan_paths(&samples, 4.0, &PlannerSettings::default());
        assert_eq!(paths.len(), 1);
        let xs: Vec<f64> = paths[0].iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![8.0, 8.0, 4.0, 0.0]);

        // row 0 at the far left: the reversed row 1 is entered at its tail
        let samples = vec![foam(0.0, 0.0), foam(0.0, 4.0), foam(4.0, 4.0), foam(8.0, 4.0)];
        let paths = plan_paths(&samples, 4.0, &PlannerSettings::default());
        let xs: Vec<f64> = paths[0].iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 4.0, 8.0]);
    }

    #[test]
    fn test_odd_seed_row_runs_forward() {
        // Once row 0 is used up, a path seeded on row 1 undoes that row's reversal.
        let samples = vec![foam(0.0, 0.0), foam(0.0, 4.0), foam(20.0, 4.0), foam(24.0, 4.0)];
        let paths = plan_paths(&samples, 4.0, &PlannerSettings::default());
        assert_eq!(paths.len(), 2);
        let xs: Vec<f64> = paths[1].iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![20.0, 24.0]);
    }

    #[test]
    fn test_plan_all_subsets() {
        let mut samples = grid(5, 5, 4.0);
        for s in samples.iter_mut() {
            if s.position.x >= 8.0 {
                s.class = SampleClass::Sense;
            }
        }
        let planned = plan_all(&samples, 4.0, &PlannerSettings::default());
        assert!(planned.has_sense());
        assert_eq!(planned.all.iter().map(Vec::len).sum::<usize>(), 25);
        assert_eq!(planned.foam.iter().map(Vec::len).sum::<usize>(), 10);
        assert_eq!(planned.sense.iter().map(Vec::len).sum::<usize>(), 15);
        assert!(planned
            .sense
            .iter()
            .flatten()
            .all(|s| s.class == SampleClass::Sense));
    }

    #[test]
    fn test_empty_input() {
        assert!(plan_paths(&[], 4.0, &PlannerSettings::default()).is_empty());
        let planned = plan_all(&[], 4.0, &PlannerSettings::default());
        assert!(planned.is_empty());
        assert!(!planned.has_sense());
    }

    #[test]
    fn test_invalid_settings() {
        let settings = PlannerSettings {
            row_tolerance_factor: -1.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(PlannerSettings::default().validate().is_ok());
    }

    fn sample_strategy() -> impl Strategy<Value = Vec<SamplePoint>> {
        // grid nodes with random holes, plus a little jitter in y
        prop::collection::vec((0u8..12, 0u8..12, -0.4f64..0.4), 0..120).prop_map(|cells| {
            cells
                .into_iter()
                .map(|(i, j, jitter)| foam(i as f64 * 4.0, j as f64 * 4.0 + jitter))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_every_sample_used_once(samples in sample_strategy()) {
            let paths = plan_paths(&samples, 4.0, &PlannerSettings::default());
            let planned = sorted_xy(paths.into_iter().flatten());
            prop_assert_eq!(planned, sorted_xy(samples));
        }

        #[test]
        fn prop_rows_respect_tolerance(samples in sample_strategy()) {
            let rows = group_rows(&samples, 2.0);
            for row in &rows {
                let min = row.iter().map(|s| s.position.y).fold(f64::INFINITY, f64::min);
                let max = row.iter().map(|s| s.position.y).fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(max - min <= 2.0);
            }
            for pair in rows.windows(2) {
                let top = pair[0].iter().map(|s| s.position.y).fold(f64::NEG_INFINITY, f64::max);
                let bottom = pair[1].iter().map(|s| s.position.y).fold(f64::INFINITY, f64::min);
                prop_assert!(bottom - top > 2.0);
            }
        }
    }
}
