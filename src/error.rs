//! Error types for the collision engine's fallible construction path.
//!
//! Everything downstream of construction follows a "soft failure, logged
//! and skipped" policy (see `context` module) rather than `Result` — only
//! grid construction has a real precondition worth a typed error.

/// Failure constructing a [`crate::context::CollisionContext`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CollisionError {
    #[error(
        "map_size_x ({map_size_x}) is not evenly divisible by cell_size ({cell_size})"
    )]
    NonDivisibleGridX { map_size_x: f32, cell_size: f32 },

    #[error(
        "map_size_y ({map_size_y}) is not evenly divisible by cell_size ({cell_size})"
    )]
    NonDivisibleGridY { map_size_y: f32, cell_size: f32 },

    #[error("cell_size ({cell_size}) must be strictly positive")]
    NonPositiveCellSize { cell_size: f32 },
}
