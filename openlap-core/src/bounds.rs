//! Viewport-fitting affine transform
//!
//! Track coordinates arrive in an arbitrary planar unit with an arbitrary
//! origin. A `Bounds` maps them into a fixed padded viewport: uniform scale,
//! centered offset. The transform is computed once per session from a
//! representative early sample and then applied verbatim to every later point;
//! recomputing mid-stream would invalidate points already normalized, so the
//! caller caches the result per session key.

use crate::error::GeometryError;
use crate::model::Point2D;
use serde::{Deserialize, Serialize};

/// Fixed display viewport the transform targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
            padding: 50.0,
        }
    }
}

/// Affine transform (uniform scale + offset) from raw track coordinates into
/// viewport space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Bounds {
    /// Compute the transform from a bounding box over `points`.
    ///
    /// Degenerate ranges (all points on one axis) are widened to a nominal
    /// span of 1 unit before the scale computation, so `scale` is always
    /// positive and finite.
    pub fn compute(points: &[Point2D], viewport: &Viewport) -> Result<Bounds, GeometryError> {
        if points.is_empty() {
            return Err(GeometryError::InsufficientData(
                "no coordinate-bearing points in sample window".into(),
            ));
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let mut x_range = max_x - min_x;
        let mut y_range = max_y - min_y;
        if x_range <= 0.0 {
            x_range = 1.0;
        }
        if y_range <= 0.0 {
            y_range = 1.0;
        }

        let scale = ((viewport.width - 2.0 * viewport.padding) / x_range)
            .min((viewport.height - 2.0 * viewport.padding) / y_range);

        // Center the scaled bounding box within the viewport
        let offset_x = (viewport.width - x_range * scale) / 2.0;
        let offset_y = (viewport.height - y_range * scale) / 2.0;

        Ok(Bounds {
            min_x,
            max_x,
            min_y,
            max_y,
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Apply the transform to a point. Pure and total over finite inputs;
    /// points outside the original bounding box map outside the padded
    /// region rather than erroring.
    pub fn normalize(&self, p: Point2D) -> Point2D {
        Point2D::new(
            (p.x - self.min_x) * self.scale + self.offset_x,
            (p.y - self.min_y) * self.scale + self.offset_y,
        )
    }

    /// The identity transform: normalize() returns its input unchanged.
    pub fn identity() -> Bounds {
        Bounds {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}
