//! Warping one polygon into the frame of another.
//!
//! Hole shapes and default UV layouts are authored in a unit frame and then
//! mapped onto an arbitrary target polygon. The mapping is a projective
//! transform (homography) estimated from corner correspondences, so a square
//! hole drawn into a trapezoidal wall follows the wall's perspective.

use crate::errors::{ModelError, ModelResult};
use crate::float_types::{Real, tolerance};
use nalgebra::{DMatrix, DVector, Matrix3, Point2};

use super::signed_area2;

/// The point-correspondence warp used for hole placement and UV generation.
///
/// `source` points are expressed in the unit frame `[0, 1]²`; the result holds
/// one warped point per source point, in the target's coordinate frame.
pub trait Fitter {
    fn fit(&self, source: &[Point2<Real>], target: &[Point2<Real>]) -> ModelResult<Vec<Point2<Real>>>;
}

/// Least-squares homography fit.
///
/// * Quadrilateral targets pin each unit-square corner to the target vertex
///   nearest the same corner of the target's bounding box. Targets where that
///   does not give a clean loop walk counter-clockwise from the vertex nearest
///   the bounding-box minimum instead.
/// * Triangles and N-gons with N > 4 use the target's vertices normalized to
///   its bounding box as the unit-frame controls, which maps the unit frame
///   onto the target's extents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectiveFitter;

impl Fitter for ProjectiveFitter {
    fn fit(&self, source: &[Point2<Real>], target: &[Point2<Real>]) -> ModelResult<Vec<Point2<Real>>> {
        if target.len() < 3 {
            return Err(ModelError::fit(format!(
                "target polygon needs at least 3 vertices, got {}",
                target.len()
            )));
        }
        if signed_area2(target).abs() < tolerance() {
            return Err(ModelError::fit("target polygon has zero area"));
        }

        let controls = control_points(target)?;
        let h = if target.len() == 3 {
            solve_affine(&controls, target)?
        } else {
            solve_homography(&controls, target)?
        };

        source.iter().map(|p| apply(&h, p)).collect()
    }
}

/// Unit-frame positions paired index-for-index with the target's vertices.
fn control_points(target: &[Point2<Real>]) -> ModelResult<Vec<Point2<Real>>> {
    let (min, max) = bounds(target);
    let (w, h) = (max.x - min.x, max.y - min.y);

    if target.len() == 4 {
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        if let Some(controls) = nearest_corner_controls(target, min, max, &corners) {
            return Ok(controls);
        }

        let n = target.len();
        let start = nearest_to(target, &min);
        let ccw = signed_area2(target) >= 0.0;
        let mut controls = vec![Point2::origin(); n];
        for (step, corner) in corners.iter().enumerate() {
            let idx = if ccw { (start + step) % n } else { (start + n - step) % n };
            controls[idx] = *corner;
        }
        return Ok(controls);
    }

    if w < tolerance() || h < tolerance() {
        return Err(ModelError::fit("target polygon has a collapsed bounding box"));
    }
    Ok(target
        .iter()
        .map(|p| Point2::new((p.x - min.x) / w, (p.y - min.y) / h))
        .collect())
}

/// Pin each unit corner to the target vertex nearest the matching corner of
/// the target's bounding box.
///
/// Only accepted when the four picks are distinct and follow the loop in one
/// direction; the assignment then mirrors exactly when the target is mirrored.
fn nearest_corner_controls(
    target: &[Point2<Real>],
    min: Point2<Real>,
    max: Point2<Real>,
    corners: &[Point2<Real>; 4],
) -> Option<Vec<Point2<Real>>> {
    let box_corners = [
        Point2::new(min.x, min.y),
        Point2::new(max.x, min.y),
        Point2::new(max.x, max.y),
        Point2::new(min.x, max.y),
    ];
    let picks = box_corners.map(|c| nearest_to(target, &c));
    let step = (picks[1] + 4 - picks[0]) % 4;
    if step != 1 && step != 3 {
        return None;
    }
    if (0..4).any(|i| (picks[(i + 1) % 4] + 4 - picks[i]) % 4 != step) {
        return None;
    }

    let mut controls = vec![Point2::origin(); 4];
    for (idx, corner) in picks.iter().zip(corners) {
        controls[*idx] = *corner;
    }
    Some(controls)
}

fn nearest_to(points: &[Point2<Real>], to: &Point2<Real>) -> usize {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            nalgebra::distance_squared(*a, to).total_cmp(&nalgebra::distance_squared(*b, to))
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn bounds(points: &[Point2<Real>]) -> (Point2<Real>, Point2<Real>) {
    let mut min = Point2::new(Real::MAX, Real::MAX);
    let mut max = Point2::new(-Real::MAX, -Real::MAX);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

/// Direct linear transform with `h33 = 1`: exact for four correspondences,
/// least squares for more.
fn solve_homography(src: &[Point2<Real>], dst: &[Point2<Real>]) -> ModelResult<Matrix3<Real>> {
    let rows = src.len() * 2;
    let mut a = DMatrix::<Real>::zeros(rows, 8);
    let mut b = DVector::<Real>::zeros(rows);

    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let (x, y) = (s.x, s.y);
        let r = 2 * i;
        a.row_mut(r)
            .copy_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -x * d.x, -y * d.x]);
        a.row_mut(r + 1)
            .copy_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -x * d.y, -y * d.y]);
        b[r] = d.x;
        b[r + 1] = d.y;
    }

    let h = if rows == 8 {
        a.lu()
            .solve(&b)
            .ok_or_else(|| ModelError::fit("corner correspondences are singular"))?
    } else {
        a.svd(true, true)
            .solve(&b, tolerance())
            .map_err(|e| ModelError::fit(format!("least-squares fit failed: {e}")))?
    };

    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}

/// Affine map from three correspondences, as a homography with a fixed last row.
fn solve_affine(src: &[Point2<Real>], dst: &[Point2<Real>]) -> ModelResult<Matrix3<Real>> {
    let mut a = DMatrix::<Real>::zeros(6, 6);
    let mut b = DVector::<Real>::zeros(6);
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        a.row_mut(2 * i).copy_from_slice(&[s.x, s.y, 1.0, 0.0, 0.0, 0.0]);
        a.row_mut(2 * i + 1).copy_from_slice(&[0.0, 0.0, 0.0, s.x, s.y, 1.0]);
        b[2 * i] = d.x;
        b[2 * i + 1] = d.y;
    }
    let h = a
        .lu()
        .solve(&b)
        .ok_or_else(|| ModelError::fit("triangle correspondences are singular"))?;
    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], 0.0, 0.0, 1.0))
}

fn apply(h: &Matrix3<Real>, p: &Point2<Real>) -> ModelResult<Point2<Real>> {
    let w = h[(2, 0)] * p.x + h[(2, 1)] * p.y + h[(2, 2)];
    if w.abs() < tolerance() {
        return Err(ModelError::fit("point maps to infinity under the fitted transform"));
    }
    let x = (h[(0, 0)] * p.x + h[(0, 1)] * p.y + h[(0, 2)]) / w;
    let y = (h[(1, 0)] * p.x + h[(1, 1)] * p.y + h[(1, 2)]) / w;
    if !x.is_finite() || !y.is_finite() {
        return Err(ModelError::fit("fitted transform produced a non-finite point"));
    }
    Ok(Point2::new(x, y))
}
