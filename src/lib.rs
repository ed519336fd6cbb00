//! A broad/narrow-phase 2.5D collision engine over a uniform-grid spatial
//! hash, for modular game engines built in a plugin style: entities register
//! box or static-polygon shapes, move around, and ask the engine which pairs
//! overlap or what a ray hits.
//!
//! The grid ([`grid::SpatialGrid`]) buckets entities into fixed-size cells
//! and only touches the cells whose membership actually changes on a move.
//! Narrow phase is separating-axis for polygon/polygon and a clamp-to-edge
//! test for circle/polygon ([`shape`]). Ray queries clip against the map
//! rectangle, walk a Bresenham-style supercover line across the grid, then
//! run a slab test against each candidate box ([`raycast`]).
//!
//! [`context::CollisionContext`] is the entry point: it owns one grid, one
//! entity pool, and the handle bookkeeping that lets callers refer to
//! entities by their own ids rather than internal slots.

pub mod context;
#[cfg(feature = "debug-visualizer")]
pub mod debug;
pub mod error;
pub mod grid;
pub mod handle;
pub mod math;
pub mod raycast;
pub mod shape;

pub use context::{CollisionContext, EntityData, Pair, RayHit, ShapeKind};
pub use error::CollisionError;
pub use handle::{EntityHandle, EntityId};
pub use math::{Aabb, Rotation2D, Transform, Vec2, Vec3};
pub use shape::{Box2D, Polygon};
