//! Planar geometry helpers for polygon bookkeeping and container walls.

use std::f32::consts::PI;

use nalgebra::{Point2, Vector2};

/// Signed area of a polygon; positive for counter-clockwise winding.
pub fn signed_area(verts: &[Point2<f32>]) -> f32 {
    let mut acc = 0.0;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        acc += a.x * b.y - b.x * a.y;
    }
    acc / 2.0
}

pub fn area_of_poly(verts: &[Point2<f32>]) -> f32 {
    signed_area(verts).abs()
}

pub fn poly_is_ccw(verts: &[Point2<f32>]) -> bool {
    signed_area(verts) > 0.0
}

/// Area-weighted polygon centroid, falling back to the vertex average
/// for (near-)degenerate outlines such as straight polylines.
pub fn centroid_of_poly(verts: &[Point2<f32>]) -> Point2<f32> {
    let area = signed_area(verts);
    if area.abs() < 1e-9 {
        let mut sum = Vector2::zeros();
        for v in verts {
            sum += v.coords;
        }
        return Point2::from(sum / verts.len() as f32);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Shifts vertices so their centroid sits at the origin; returns the
/// removed centroid.
pub fn recenter_poly(verts: &mut [Point2<f32>]) -> Point2<f32> {
    let center = centroid_of_poly(verts);
    for v in verts.iter_mut() {
        *v = Point2::from(v.coords - center.coords);
    }
    center
}

fn is_left(start: (f32, f32), end: (f32, f32), test: (f32, f32)) -> bool {
    let seg1 = (end.0 - start.0, end.1 - start.1);
    let seg2 = (test.0 - start.0, test.1 - start.1);
    seg1.0 * seg2.1 - seg1.1 * seg2.0 > 0.0
}

/// Expands a connected polyline of wall midpoints with a half-width `r`
/// into a list of convex quads, one per segment, mitred at the joints.
pub fn segs_to_poly(points: &[Point2<f32>], r: f32) -> Vec<Vec<Point2<f32>>> {
    debug_assert!(points.len() >= 2);

    // Initial edge: cap perpendicular to the first segment's direction.
    let iseg = points[1] - points[0];
    let ipt = points[0];
    let iang = iseg.y.atan2(iseg.x);
    let (mut prev1, mut prev2) = if (-3.0 * PI / 4.0..=-PI / 4.0).contains(&iang) {
        // Going downwards
        ((ipt.x - r, ipt.y), (ipt.x + r, ipt.y))
    } else if (PI / 4.0..=3.0 * PI / 4.0).contains(&iang) {
        // Going upwards
        ((ipt.x + r, ipt.y), (ipt.x - r, ipt.y))
    } else if (-PI / 4.0..=PI / 4.0).contains(&iang) {
        // Going rightwards
        ((ipt.x, ipt.y - r), (ipt.x, ipt.y + r))
    } else {
        // Going leftwards
        ((ipt.x, ipt.y + r), (ipt.x, ipt.y - r))
    };

    let mut polys = Vec::new();
    for i in 1..points.len() - 1 {
        let pi = points[i];
        let sm = points[i - 1] - pi;
        let sp = points[i + 1] - pi;
        // Bisect the joint angle and push the mitre corners out along it.
        let angm = sm.y.atan2(sm.x);
        let angp = sp.y.atan2(sp.x);
        let angi = (angm - angp).rem_euclid(2.0 * PI);
        let angn = (angp + angi / 2.0).rem_euclid(2.0 * PI);
        let unitn = Vector2::new(angn.cos(), angn.sin());
        let xdiff = if unitn.x >= 0.0 { r } else { -r };
        let ydiff = if unitn.y >= 0.0 { r } else { -r };
        let mut next3 = (pi.x + xdiff, pi.y + ydiff);
        let mut next4 = (pi.x - xdiff, pi.y - ydiff);
        // Keep the winding consistent: next3 stays left of next4.
        if is_left(prev2, next3, next4) {
            std::mem::swap(&mut next3, &mut next4);
        }
        polys.push(vec![
            Point2::new(prev1.0, prev1.1),
            Point2::new(prev2.0, prev2.1),
            Point2::new(next3.0, next3.1),
            Point2::new(next4.0, next4.1),
        ]);
        prev1 = next4;
        prev2 = next3;
    }

    // Final edge: cap perpendicular to the last segment's direction.
    let fseg = points[points.len() - 2] - points[points.len() - 1];
    let fpt = points[points.len() - 1];
    let fang = fseg.y.atan2(fseg.x);
    let (next3, next4) = if (-3.0 * PI / 4.0..=-PI / 4.0).contains(&fang) {
        // Coming from downwards
        ((fpt.x - r, fpt.y), (fpt.x + r, fpt.y))
    } else if (PI / 4.0..=3.0 * PI / 4.0).contains(&fang) {
        // Coming from upwards
        ((fpt.x + r, fpt.y), (fpt.x - r, fpt.y))
    } else if (-PI / 4.0..=PI / 4.0).contains(&fang) {
        // Coming from rightwards
        ((fpt.x, fpt.y - r), (fpt.x, fpt.y + r))
    } else {
        // Coming from leftwards
        ((fpt.x, fpt.y + r), (fpt.x, fpt.y - r))
    };
    polys.push(vec![
        Point2::new(prev1.0, prev1.1),
        Point2::new(prev2.0, prev2.1),
        Point2::new(next3.0, next3.1),
        Point2::new(next4.0, next4.1),
    ]);
    polys
}
