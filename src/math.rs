//! Minimal 2.5D vector/transform math used by the collision engine.
//!
//! Kept hand-rolled rather than pulled from a general-purpose math crate:
//! every operation here is a direct, literal translation of the `sx_vec2`/
//! `sx_vec3`/`sx_mat3`/`sx_tx3d` arithmetic in the original C engine, and
//! pulling in a generic vector-math dependency would buy nothing since none
//! of its extra surface (SIMD, quaternions, projective transforms) is used.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    #[inline]
    pub fn dot(self, o: Vec2) -> f32 {
        self.x * o.x + self.y * o.y
    }

    #[inline]
    pub fn sub(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x - o.x, self.y - o.y)
    }

    #[inline]
    pub fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }

    #[inline]
    pub fn mulf(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

/// A 2.5D vector: X/Y drive every geometric test, Z is carried data only
/// (never compared, rotated about, or clipped against).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    #[inline]
    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    #[inline]
    pub fn mulf(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    #[inline]
    pub fn get(self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// A 2D rotation, stored as its cos/sin rather than an angle so composing
/// and inverting never re-invokes `atan2`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rotation2D {
    pub cos: f32,
    pub sin: f32,
}

impl Rotation2D {
    pub const IDENTITY: Rotation2D = Rotation2D { cos: 1.0, sin: 0.0 };

    #[inline]
    pub fn from_angle(theta: f32) -> Self {
        Rotation2D { cos: theta.cos(), sin: theta.sin() }
    }

    /// Recovers the rotation's angle the way the original narrow-phase does:
    /// `atan2` of the upper-left 2x2 of the transform's rotation matrix.
    #[inline]
    pub fn angle(self) -> f32 {
        self.sin.atan2(self.cos)
    }

    #[inline]
    pub fn mul_vec2(self, v: Vec2) -> Vec2 {
        Vec2::new(self.cos * v.x - self.sin * v.y, self.sin * v.x + self.cos * v.y)
    }

    #[inline]
    pub fn mul_vec2_inverse(self, v: Vec2) -> Vec2 {
        // transpose of the rotation matrix == its inverse
        Vec2::new(self.cos * v.x + self.sin * v.y, -self.sin * v.x + self.cos * v.y)
    }

    #[inline]
    pub fn mul(self, o: Rotation2D) -> Rotation2D {
        Rotation2D::from_angle(self.angle() + o.angle())
    }
}

/// A rigid transform: 2D rotation (about Z) plus a 2.5D translation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    pub pos: Vec3,
    pub rot: Rotation2D,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { pos: Vec3::ZERO, rot: Rotation2D::IDENTITY };

    #[inline]
    pub fn new(pos: Vec3, rot: Rotation2D) -> Self {
        Transform { pos, rot }
    }

    /// World-space point from a point in this transform's local space.
    #[inline]
    pub fn mul_point(self, p: Vec3) -> Vec3 {
        let xy = self.rot.mul_vec2(p.xy());
        Vec3::new(xy.x + self.pos.x, xy.y + self.pos.y, p.z + self.pos.z)
    }

    /// Local-space point from a point in world space (inverse transform).
    #[inline]
    pub fn mul_point_inverse(self, p: Vec3) -> Vec3 {
        let local_xy = p.xy().sub(self.pos.xy());
        let xy = self.rot.mul_vec2_inverse(local_xy);
        Vec3::new(xy.x, xy.y, p.z - self.pos.z)
    }

    /// Composes `self` (outer) with `inner`: mirrors `sx_tx3d_mul`, used to
    /// fold a box's local transform into an entity's world transform.
    #[inline]
    pub fn mul(self, inner: Transform) -> Transform {
        Transform::new(self.mul_point(inner.pos), self.rot.mul(inner.rot))
    }

    /// Rotates a direction vector (no translation) into world space. Z never
    /// rotates, since the engine only rotates about the Z axis.
    #[inline]
    pub fn rotate_vec3(self, v: Vec3) -> Vec3 {
        let xy = self.rot.mul_vec2(v.xy());
        Vec3::new(xy.x, xy.y, v.z)
    }

    /// Inverse of [`Transform::rotate_vec3`].
    #[inline]
    pub fn rotate_vec3_inverse(self, v: Vec3) -> Vec3 {
        let xy = self.rot.mul_vec2_inverse(v.xy());
        Vec3::new(xy.x, xy.y, v.z)
    }
}

/// An axis-aligned bounding box on the X-Y plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    #[inline]
    pub fn empty() -> Self {
        Aabb { min: Vec2::new(f32::MAX, f32::MAX), max: Vec2::new(f32::MIN, f32::MIN) }
    }

    #[inline]
    pub fn add_point(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    #[inline]
    pub fn test(&self, o: &Aabb) -> bool {
        self.min.x <= o.max.x && self.max.x >= o.min.x && self.min.y <= o.max.y && self.max.y >= o.min.y
    }

    #[inline]
    pub fn from_points(min: Vec2, max: Vec2) -> Self {
        Aabb { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_round_trips_through_inverse() {
        let r = Rotation2D::from_angle(0.7);
        let v = Vec2::new(3.0, -2.0);
        let back = r.mul_vec2_inverse(r.mul_vec2(v));
        assert!((back.x - v.x).abs() < 1e-5);
        assert!((back.y - v.y).abs() < 1e-5);
    }

    #[test]
    fn transform_point_round_trips() {
        let t = Transform::new(Vec3::new(5.0, -3.0, 1.0), Rotation2D::from_angle(1.2));
        let p = Vec3::new(1.0, 2.0, 0.5);
        let world = t.mul_point(p);
        let back = t.mul_point_inverse(world);
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
        assert!((back.z - p.z).abs() < 1e-4);
    }

    #[test]
    fn aabb_test_overlap() {
        let a = Aabb::from_points(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let b = Aabb::from_points(Vec2::new(0.5, 0.5), Vec2::new(2.0, 2.0));
        let c = Aabb::from_points(Vec2::new(2.0, 2.0), Vec2::new(3.0, 3.0));
        assert!(a.test(&b));
        assert!(!a.test(&c));
    }
}
