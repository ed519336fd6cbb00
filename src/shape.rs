//! Shapes and narrow-phase tests.
//!
//! `Polygon` is fixed-capacity (`arrayvec`, cap 8) to mirror the original's
//! `sx_vec2 verts[8]` — no heap allocation per shape, same as the C layout.
//! The SAT routine is a standalone pure function, tested with tabulated
//! geometry, treated as a leaf utility independent of entity storage.

use arrayvec::ArrayVec;

use crate::math::{Aabb, Rotation2D, Transform, Vec2, Vec3};

pub const MAX_POLY_VERTS: usize = 8;

/// Convex polygon, up to 8 vertices, CCW winding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    pub verts: ArrayVec<Vec2, MAX_POLY_VERTS>,
    /// Precomputed edge normals as supplied by the caller. The narrow phase
    /// recomputes its own edge normals from vertex differences rather than
    /// trusting these — `norms` exists to keep the shape format
    /// wire-compatible for `get_entity_data`.
    pub norms: ArrayVec<Vec2, MAX_POLY_VERTS>,
}

impl Polygon {
    pub fn new(verts: &[Vec2]) -> Self {
        let verts: ArrayVec<Vec2, MAX_POLY_VERTS> = verts.iter().copied().collect();
        let norms = compute_edge_normals(&verts);
        Polygon { verts, norms }
    }

    pub fn bbox(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for &v in &self.verts {
            aabb.add_point(v);
        }
        aabb
    }

    fn edge_normal(&self, i: usize) -> Vec2 {
        let n = self.verts.len();
        let a = self.verts[i];
        let b = self.verts[(i + 1) % n];
        let e = b.sub(a);
        let len = (e.x * e.x + e.y * e.y).sqrt();
        if len < 1e-12 {
            Vec2::ZERO
        } else {
            Vec2::new(e.y / len, -e.x / len)
        }
    }
}

fn compute_edge_normals(verts: &ArrayVec<Vec2, MAX_POLY_VERTS>) -> ArrayVec<Vec2, MAX_POLY_VERTS> {
    let n = verts.len();
    let mut out = ArrayVec::new();
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let e = b.sub(a);
        let len = (e.x * e.x + e.y * e.y).sqrt();
        out.push(if len < 1e-12 { Vec2::ZERO } else { Vec2::new(e.y / len, -e.x / len) });
    }
    out
}

/// Oriented box in 2.5D: half-extents `(ex, ey, ez)` plus a rigid transform.
/// `ex+ey+ez == 0` historically encoded "this is a static polygon, not a
/// box"; the Rust port replaces the sentinel with
/// [`crate::context::ShapeKind`], but the half-extents themselves are kept
/// verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Box2D {
    pub tx: Transform,
    pub half_extents: Vec3,
}

impl Box2D {
    pub fn new(tx: Transform, half_extents: Vec3) -> Self {
        Box2D { tx, half_extents }
    }

    /// Local-space AABB (ignores rotation, matches `sx_aabb_from_box` which
    /// is computed before any world transform is applied).
    pub fn local_aabb(&self) -> Aabb {
        let e = self.half_extents;
        Aabb::from_points(Vec2::new(-e.x, -e.y), Vec2::new(e.x, e.y))
    }

    /// Transformed AABB in world space.
    pub fn world_aabb(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for v in box_corners(self) {
            aabb.add_point(v);
        }
        aabb
    }
}

fn box_corners(b: &Box2D) -> [Vec2; 4] {
    let e = b.half_extents;
    let local = [
        Vec2::new(e.x, e.y),
        Vec2::new(-e.x, e.y),
        Vec2::new(-e.x, -e.y),
        Vec2::new(e.x, -e.y),
    ];
    let mut out = [Vec2::ZERO; 4];
    for (i, v) in local.iter().enumerate() {
        out[i] = b.tx.rot.mul_vec2(*v).add(b.tx.pos.xy());
    }
    out
}

/// Diagonal corner normal magnitude, `1/sqrt(2)`, used for every rotated-box
/// polygon regardless of actual half-extents — deliberately preserved, not
/// a bug: SAT recomputes real edge normals from vertex differences and
/// never reads these.
const DIAG: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Builds the 4-vertex "rotated box polygon" SAT consumes for a box entity,
/// together with the 2D transform (rotation + position) to apply to it.
/// Direct port of `coll__calc_poly_from_box`.
pub fn box_to_polygon(b: &Box2D) -> (Polygon, Transform) {
    let e = b.half_extents;
    let verts: ArrayVec<Vec2, MAX_POLY_VERTS> = [
        Vec2::new(e.x, e.y),
        Vec2::new(-e.x, e.y),
        Vec2::new(-e.x, -e.y),
        Vec2::new(e.x, -e.y),
    ]
    .into_iter()
    .collect();
    let norms: ArrayVec<Vec2, MAX_POLY_VERTS> = [
        Vec2::new(DIAG, DIAG),
        Vec2::new(-DIAG, DIAG),
        Vec2::new(-DIAG, -DIAG),
        Vec2::new(DIAG, -DIAG),
    ]
    .into_iter()
    .collect();

    let theta = b.tx.rot.angle();
    let rot = Rotation2D::from_angle(theta);
    let tx = Transform::new(Vec3::new(b.tx.pos.x, b.tx.pos.y, 0.0), rot);
    (Polygon { verts, norms }, tx)
}

#[inline]
fn transform_vert(v: Vec2, tx: Option<&Transform>) -> Vec2 {
    match tx {
        Some(t) => t.rot.mul_vec2(v).add(t.pos.xy()),
        None => v,
    }
}

#[inline]
fn transform_normal(n: Vec2, tx: Option<&Transform>) -> Vec2 {
    match tx {
        Some(t) => t.rot.mul_vec2(n),
        None => n,
    }
}

/// Separating-axis convex-polygon/convex-polygon overlap test.
///
/// Tests every edge normal of both polygons (recomputed from consecutive
/// vertex differences, not the shapes' stored `norms`) as a candidate
/// separating axis. `a_tx`/`b_tx` are `None` for shapes already expressed in
/// world space (static polygons).
pub fn poly_poly_intersect(a: &Polygon, a_tx: Option<&Transform>, b: &Polygon, b_tx: Option<&Transform>) -> bool {
    !separating_axis_exists(a, a_tx, b, b_tx) && !separating_axis_exists(b, b_tx, a, a_tx)
}

fn separating_axis_exists(a: &Polygon, a_tx: Option<&Transform>, b: &Polygon, b_tx: Option<&Transform>) -> bool {
    let na = a.verts.len();
    for i in 0..na {
        let axis = transform_normal(a.edge_normal(i), a_tx);
        if axis == Vec2::ZERO {
            continue;
        }
        let (amin, amax) = project(a, a_tx, axis);
        let (bmin, bmax) = project(b, b_tx, axis);
        if amax < bmin || bmax < amin {
            return true;
        }
    }
    false
}

fn project(poly: &Polygon, tx: Option<&Transform>, axis: Vec2) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for &v in &poly.verts {
        let p = transform_vert(v, tx).dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Circle/convex-polygon overlap test (used by `query_sphere`).
pub fn circle_poly_intersect(center: Vec2, radius: f32, poly: &Polygon, tx: Option<&Transform>) -> bool {
    let n = poly.verts.len();
    if n == 0 {
        return false;
    }

    let mut best_sep = f32::MIN;
    let mut best_edge = 0usize;
    for i in 0..n {
        let v = transform_vert(poly.verts[i], tx);
        let normal = transform_normal(poly.edge_normal(i), tx);
        let s = normal.dot(center.sub(v));
        if s > radius {
            return false;
        }
        if s > best_sep {
            best_sep = s;
            best_edge = i;
        }
    }

    if best_sep < 0.0 {
        // center lies inside the polygon
        return true;
    }

    let v1 = transform_vert(poly.verts[best_edge], tx);
    let v2 = transform_vert(poly.verts[(best_edge + 1) % n], tx);
    let u1 = center.sub(v1).dot(v2.sub(v1));
    let u2 = center.sub(v2).dot(v1.sub(v2));

    let closest = if u1 <= 0.0 {
        v1
    } else if u2 <= 0.0 {
        v2
    } else {
        let edge = v2.sub(v1);
        let denom = edge.dot(edge);
        let t = if denom > 1e-12 { u1 / denom } else { 0.0 };
        v1.add(edge.mulf(t))
    };

    let d = center.sub(closest);
    d.dot(d) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f32, cy: f32, half: f32) -> Polygon {
        Polygon::new(&[
            Vec2::new(cx + half, cy + half),
            Vec2::new(cx - half, cy + half),
            Vec2::new(cx - half, cy - half),
            Vec2::new(cx + half, cy - half),
        ])
    }

    #[test]
    fn overlapping_squares_intersect() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(0.5, 0.0, 0.5);
        assert!(poly_poly_intersect(&a, None, &b, None));
    }

    #[test]
    fn disjoint_squares_do_not_intersect() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(10.0, 0.0, 0.5);
        assert!(!poly_poly_intersect(&a, None, &b, None));
    }

    #[test]
    fn touching_squares_intersect_at_boundary() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(1.0, 0.0, 0.5);
        assert!(poly_poly_intersect(&a, None, &b, None));
    }

    #[test]
    fn rotated_box_polygon_catches_diagonal_overlap() {
        let box_a = Box2D::new(Transform::new(Vec3::ZERO, Rotation2D::from_angle(0.0)), Vec3::new(1.0, 1.0, 0.0));
        let box_b = Box2D::new(
            Transform::new(Vec3::new(1.9, 1.9, 0.0), Rotation2D::from_angle(std::f32::consts::FRAC_PI_4)),
            Vec3::new(1.0, 1.0, 0.0),
        );
        let (poly_a, tx_a) = box_to_polygon(&box_a);
        let (poly_b, tx_b) = box_to_polygon(&box_b);
        assert!(poly_poly_intersect(&poly_a, Some(&tx_a), &poly_b, Some(&tx_b)));
    }

    #[test]
    fn box_to_polygon_uses_fixed_diagonal_normals_regardless_of_extents() {
        let b = Box2D::new(Transform::IDENTITY, Vec3::new(3.0, 0.5, 0.0));
        let (poly, _) = box_to_polygon(&b);
        for n in &poly.norms {
            assert!((n.x.abs() - DIAG).abs() < 1e-6);
            assert!((n.y.abs() - DIAG).abs() < 1e-6);
        }
    }

    #[test]
    fn circle_inside_polygon_intersects() {
        let poly = square(0.0, 0.0, 1.0);
        assert!(circle_poly_intersect(Vec2::new(0.0, 0.0), 0.1, &poly, None));
    }

    #[test]
    fn circle_touching_edge_intersects() {
        let poly = square(0.0, 0.0, 1.0);
        assert!(circle_poly_intersect(Vec2::new(1.5, 0.0), 0.5, &poly, None));
    }

    #[test]
    fn circle_near_corner_uses_vertex_distance() {
        let poly = square(0.0, 0.0, 1.0);
        let center = Vec2::new(1.4, 1.4);
        assert!(!circle_poly_intersect(center, 0.5, &poly, None));
        assert!(circle_poly_intersect(center, 0.6, &poly, None));
    }

    #[test]
    fn circle_far_from_polygon_does_not_intersect() {
        let poly = square(0.0, 0.0, 1.0);
        assert!(!circle_poly_intersect(Vec2::new(100.0, 100.0), 1.0, &poly, None));
    }
}
