//! Smoothed path geometry
//!
//! Turns an ordered, already-normalized point sequence into a renderable
//! path: subsample to display density, detect closed loops, interpolate with
//! a local Catmull-Rom spline, and break the path instead of bridging across
//! genuine discontinuities (missing telemetry, pit-lane splits).

use crate::model::Point2D;
use serde::{Deserialize, Serialize};

/// One path segment operation. `MoveTo` starts a new disconnected subpath.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo(Point2D),
    LineTo(Point2D),
}

impl PathCommand {
    pub fn point(&self) -> Point2D {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => *p,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, PathCommand::MoveTo(_))
    }
}

/// Renderer-agnostic smoothed path. Immutable once produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathResult {
    pub commands: Vec<PathCommand>,
    pub is_closed: bool,
}

impl PathResult {
    /// Serialize to an SVG-style command string. Boundary concern only; the
    /// smoothing algorithm never deals in strings.
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(self.commands.len() * 18);
        for cmd in &self.commands {
            let (letter, p) = match cmd {
                PathCommand::MoveTo(p) => ('M', p),
                PathCommand::LineTo(p) => ('L', p),
            };
            out.push(letter);
            out.push_str(&format!("{:.3} {:.3}", p.x, p.y));
        }
        if self.is_closed {
            out.push('Z');
        }
        out
    }
}

/// Tuning for [`smooth_path`].
#[derive(Debug, Clone, Copy)]
pub struct SmoothOptions {
    /// Raw distance between consecutive points beyond which the path breaks
    /// instead of interpolating (viewport units).
    pub max_gap: f64,

    /// First/last distance below which the sequence is treated as a closed
    /// ring (viewport units).
    pub close_threshold: f64,

    /// Interpolated points generated per input segment.
    pub samples_per_segment: usize,

    /// Target point density after subsampling; raw GPS-grade input is far
    /// denser than a display path needs.
    pub target_points: usize,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            max_gap: 50.0,
            close_threshold: 200.0,
            samples_per_segment: 4,
            target_points: 1200,
        }
    }
}

/// Catmull-Rom basis at parameter `t`, applied componentwise to the 4-point
/// neighborhood.
fn catmull_rom(p0: Point2D, p1: Point2D, p2: Point2D, p3: Point2D, t: f64) -> Point2D {
    let t2 = t * t;
    let t3 = t2 * t;
    let f1 = -0.5 * t3 + t2 - 0.5 * t;
    let f2 = 1.5 * t3 - 2.5 * t2 + 1.0;
    let f3 = -1.5 * t3 + 2.0 * t2 + 0.5 * t;
    let f4 = 0.5 * t3 - 0.5 * t2;
    Point2D::new(
        p0.x * f1 + p1.x * f2 + p2.x * f3 + p3.x * f4,
        p0.y * f1 + p1.y * f2 + p2.y * f3 + p3.y * f4,
    )
}

/// Take every Nth point so the sequence stays near the target density,
/// preserving order.
fn subsample(points: &[Point2D], target: usize) -> Vec<Point2D> {
    if target == 0 || points.len() <= target {
        return points.to_vec();
    }
    let step = points.len().div_ceil(target);
    points.iter().copied().step_by(step).collect()
}

/// Smooth an ordered point sequence into a display path.
///
/// Never fails: fewer than 4 points fall back to straight segments, and an
/// empty input yields an empty result.
pub fn smooth_path(points: &[Point2D], opts: &SmoothOptions) -> PathResult {
    if points.is_empty() {
        return PathResult::default();
    }

    let pts = subsample(points, opts.target_points);
    let n = pts.len();

    // Closure check runs on the subsampled sequence, matching the geometry
    // the spline will actually see.
    let mut is_closed = n > 2 && pts[0].distance(&pts[n - 1]) < opts.close_threshold;

    if n < 4 {
        let mut commands = Vec::with_capacity(n);
        for (i, p) in pts.iter().enumerate() {
            if i == 0 || pts[i - 1].distance(p) > opts.max_gap {
                commands.push(PathCommand::MoveTo(*p));
            } else {
                commands.push(PathCommand::LineTo(*p));
            }
        }
        return PathResult { commands, is_closed };
    }

    let samples = opts.samples_per_segment.max(1);
    let mut commands = Vec::with_capacity(n * samples);

    // Index helpers: closed rings wrap, open sequences clamp at the ends.
    let closed = is_closed;
    let at = |i: isize| -> Point2D {
        if closed {
            pts[i.rem_euclid(n as isize) as usize]
        } else {
            pts[i.clamp(0, n as isize - 1) as usize]
        }
    };

    for i in 0..n {
        let p1 = pts[i];
        let p2 = at(i as isize + 1);

        // A raw gap wider than max_gap is a genuine discontinuity; break the
        // path rather than bridging it with a curve.
        if p1.distance(&p2) > opts.max_gap {
            commands.push(PathCommand::MoveTo(p2));
            if i == n - 1 {
                is_closed = false;
            }
            continue;
        }

        let p0 = at(i as isize - 1);
        let p3 = at(i as isize + 2);
        for t_idx in 0..samples {
            let t = t_idx as f64 / samples as f64;
            let p = catmull_rom(p0, p1, p2, p3, t);
            if commands.is_empty() {
                commands.push(PathCommand::MoveTo(p));
            } else {
                commands.push(PathCommand::LineTo(p));
            }
        }
    }

    PathResult { commands, is_closed }
}
