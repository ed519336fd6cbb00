//! Uniform spatial grid: fixed-size dense cell bucketing with incremental
//! membership maintenance under transform updates.
//!
//! Unlike `flat_spatial`'s resizable `SparseStorage`/`DenseStorage`
//! abstraction, this grid never grows past its construction-time bounds —
//! the original engine allocates `num_cells_x * num_cells_y` cells once and
//! never resizes, so a single concrete `Vec<Cell>` is the direct port. See
//! DESIGN.md.

use crate::error::CollisionError;
use crate::handle::EntityHandle;
use crate::math::{Aabb, Vec2};

/// Inclusive rectangle of cell coordinates, `[min, max]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

/// One bucket of the uniform grid.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub center: Vec2,
    pub coord: (i32, i32),
    pub handles: Vec<EntityHandle>,
    #[cfg(feature = "debug-visualizer")]
    pub num_raymarches: u32,
    #[cfg(feature = "debug-visualizer")]
    pub num_rayhits: u32,
    #[cfg(feature = "debug-visualizer")]
    pub num_collisions: u32,
}

impl Cell {
    fn reset_debug_counters(&mut self) {
        #[cfg(feature = "debug-visualizer")]
        {
            self.num_raymarches = 0;
            self.num_rayhits = 0;
            self.num_collisions = 0;
        }
    }
}

/// Fixed-size uniform spatial hash over `[-map_size/2, +map_size/2]` on each
/// axis.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    map_size_x: f32,
    map_size_y: f32,
    cell_size: f32,
    num_cells_x: i32,
    num_cells_y: i32,
    cells: Vec<Cell>,
}

impl SpatialGrid {
    pub fn new(map_size_x: f32, map_size_y: f32, cell_size: f32) -> Result<Self, CollisionError> {
        if cell_size <= 0.0 {
            return Err(CollisionError::NonPositiveCellSize { cell_size });
        }
        if (map_size_x / cell_size).fract() != 0.0 {
            return Err(CollisionError::NonDivisibleGridX { map_size_x, cell_size });
        }
        if (map_size_y / cell_size).fract() != 0.0 {
            return Err(CollisionError::NonDivisibleGridY { map_size_y, cell_size });
        }

        let num_cells_x = (map_size_x / cell_size) as i32;
        let num_cells_y = (map_size_y / cell_size) as i32;
        let mut cells = Vec::with_capacity((num_cells_x * num_cells_y) as usize);
        for cy in 0..num_cells_y {
            for cx in 0..num_cells_x {
                let center = Vec2::new(
                    (cx as f32 - num_cells_x as f32 / 2.0 + 0.5) * cell_size,
                    (cy as f32 - num_cells_y as f32 / 2.0 + 0.5) * cell_size,
                );
                cells.push(Cell { center, coord: (cx, cy), ..Default::default() });
            }
        }

        Ok(SpatialGrid { map_size_x, map_size_y, cell_size, num_cells_x, num_cells_y, cells })
    }

    pub fn num_cells_x(&self) -> i32 {
        self.num_cells_x
    }

    pub fn num_cells_y(&self) -> i32 {
        self.num_cells_y
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn map_extent(&self) -> Aabb {
        Aabb::from_points(
            Vec2::new(-self.map_size_x / 2.0, -self.map_size_y / 2.0),
            Vec2::new(self.map_size_x / 2.0, self.map_size_y / 2.0),
        )
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinates a point hashes into, clamped to grid bounds.
    /// Out-of-map coordinates saturate rather than error.
    pub fn hash_point(&self, p: Vec2) -> (i32, i32) {
        let hx = (p.x / self.cell_size + self.num_cells_x as f32 / 2.0).floor() as i32;
        let hy = (p.y / self.cell_size + self.num_cells_y as f32 / 2.0).floor() as i32;
        (hx.clamp(0, self.num_cells_x - 1), hy.clamp(0, self.num_cells_y - 1))
    }

    #[inline]
    pub fn cell_id_of(&self, cx: i32, cy: i32) -> usize {
        (cy * self.num_cells_x + cx) as usize
    }

    /// Inclusive rectangle of cell coordinates an AABB overlaps.
    pub fn hash_aabb(&self, aabb: &Aabb) -> CellRect {
        let (min_x, min_y) = self.hash_point(aabb.min);
        let (max_x, max_y) = self.hash_point(aabb.max);
        CellRect { min_x, min_y, max_x, max_y }
    }

    pub fn cell(&self, id: usize) -> &Cell {
        &self.cells[id]
    }

    pub fn cell_rect(&self, id: usize) -> Aabb {
        let c = &self.cells[id];
        let half = self.cell_size / 2.0;
        Aabb::from_points(
            Vec2::new(c.center.x - half, c.center.y - half),
            Vec2::new(c.center.x + half, c.center.y + half),
        )
    }

    fn for_each_cell_in_rect(&self, rect: CellRect, mut f: impl FnMut(usize)) {
        for cy in rect.min_y..=rect.max_y {
            for cx in rect.min_x..=rect.max_x {
                f(self.cell_id_of(cx, cy));
            }
        }
    }

    fn rect_contains(rect: CellRect, cx: i32, cy: i32) -> bool {
        cx >= rect.min_x && cx <= rect.max_x && cy >= rect.min_y && cy <= rect.max_y
    }

    /// Adds `handle` to every cell in `rect`.
    pub fn insert_rect(&mut self, handle: EntityHandle, rect: CellRect) {
        for cy in rect.min_y..=rect.max_y {
            for cx in rect.min_x..=rect.max_x {
                let id = self.cell_id_of(cx, cy);
                self.cells[id].handles.push(handle);
            }
        }
    }

    /// Removes `handle` from every cell in `rect` (linear scan per cell;
    /// order within a cell is never meaningful).
    pub fn remove_rect(&mut self, handle: EntityHandle, rect: CellRect) {
        for cy in rect.min_y..=rect.max_y {
            for cx in rect.min_x..=rect.max_x {
                let id = self.cell_id_of(cx, cy);
                if let Some(pos) = self.cells[id].handles.iter().position(|&h| h == handle) {
                    self.cells[id].handles.swap_remove(pos);
                }
            }
        }
    }

    /// Diff-updates cell membership from `old_rect` to `new_rect`, touching
    /// only cells that actually gain or lose the handle. `old_rect` is
    /// `None` for a brand new entity (insert-only).
    pub fn update_membership(&mut self, handle: EntityHandle, old_rect: Option<CellRect>, new_rect: CellRect) {
        if let Some(old) = old_rect {
            for cy in old.min_y..=old.max_y {
                for cx in old.min_x..=old.max_x {
                    if !Self::rect_contains(new_rect, cx, cy) {
                        let id = self.cell_id_of(cx, cy);
                        if let Some(pos) = self.cells[id].handles.iter().position(|&h| h == handle) {
                            self.cells[id].handles.swap_remove(pos);
                        }
                    }
                }
            }
        }

        for cy in new_rect.min_y..=new_rect.max_y {
            for cx in new_rect.min_x..=new_rect.max_x {
                if old_rect.is_none() || !Self::rect_contains(old_rect.unwrap(), cx, cy) {
                    let id = self.cell_id_of(cx, cy);
                    self.cells[id].handles.push(handle);
                }
            }
        }
    }

    /// Appends every handle found in `rect`'s cells to `out` (no dedup —
    /// callers sort/unique, matching the original's candidate-gather step).
    pub fn gather_candidates(&self, rect: CellRect, out: &mut Vec<EntityHandle>) {
        self.for_each_cell_in_rect(rect, |id| out.extend_from_slice(&self.cells[id].handles));
    }

    #[cfg(feature = "debug-visualizer")]
    pub fn mark_raymarch(&mut self, id: usize) {
        self.cells[id].num_raymarches += 1;
    }

    #[cfg(feature = "debug-visualizer")]
    pub fn mark_rayhit(&mut self, id: usize) {
        self.cells[id].num_rayhits += 1;
    }

    #[cfg(feature = "debug-visualizer")]
    pub fn mark_collision(&mut self, id: usize) {
        self.cells[id].num_collisions += 1;
    }

    #[cfg(feature = "debug-visualizer")]
    pub fn clear_debug_counters(&mut self) {
        for cell in &mut self.cells {
            cell.reset_debug_counters();
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.handles.clear();
            cell.reset_debug_counters();
        }
    }
}
