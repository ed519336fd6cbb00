//! The collision engine itself: entity storage, mutation, and
//! the broad+narrow-phase queries built on top of [`crate::grid::SpatialGrid`].

use fnv::FnvHashSet;
use slotmapd::SlotMap;

use crate::error::CollisionError;
use crate::grid::SpatialGrid;
use crate::handle::{EntityHandle, EntityId, EntityMap};
use crate::math::{Aabb, Transform, Vec2, Vec3};
use crate::raycast;
use crate::shape::{self, Box2D, Polygon};

#[cfg(feature = "debug-visualizer")]
use crate::debug::RaySample;

/// Tags which shape an entity carries — a sum type in place of the
/// original's sentinel half-extent encoding.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    Box(Box2D),
    StaticPoly(Polygon),
}

struct EntityRecord {
    entity: EntityId,
    mask: u32,
    kind: ShapeKind,
    aabb_local: Aabb,
    aabb_world: Aabb,
    /// World-space box, present only for `ShapeKind::Box` entities.
    box_world: Option<Box2D>,
}

/// Unordered overlapping pair returned by [`CollisionContext::detect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub mask_a: u32,
    pub mask_b: u32,
}

/// A single ray/box intersection: `0 < t <= ray.len`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub normal: Vec3,
    pub t: f32,
}

/// Snapshot returned by [`CollisionContext::get_entity_data`].
#[derive(Debug, Clone)]
pub struct EntityData {
    pub shape: ShapeKind,
    pub aabb: Aabb,
    pub mask: u32,
    pub is_static: bool,
}

/// Reused per-call scratch space — RAII buffer reuse stands in for the
/// original's push/pop temp allocator.
#[derive(Default)]
struct ScratchBuffers {
    candidates: Vec<EntityHandle>,
    seen: FnvHashSet<EntityHandle>,
    pairs_this_call: Vec<Pair>,
}

impl ScratchBuffers {
    fn dedup_candidates(&mut self) {
        self.seen.clear();
        self.seen.extend(self.candidates.drain(..));
    }
}

/// A collision context: one independent spatial hash plus its entities.
/// Single-threaded per instance — `Send` but not `Sync`.
pub struct CollisionContext {
    grid: SpatialGrid,
    storage: SlotMap<EntityHandle, EntityRecord>,
    entity_map: EntityMap,
    updated: Vec<EntityHandle>,
    scratch: ScratchBuffers,
    #[cfg(feature = "debug-visualizer")]
    pub(crate) ray_log: Vec<RaySample>,
}

impl CollisionContext {
    /// Creates a new context over a `map_size_x` by `map_size_y` map, cut
    /// into `cell_size`-wide square cells. Fails if either dimension does
    /// not divide evenly by `cell_size`.
    pub fn new(map_size_x: f32, map_size_y: f32, cell_size: f32) -> Result<Self, CollisionError> {
        Ok(CollisionContext {
            grid: SpatialGrid::new(map_size_x, map_size_y, cell_size)?,
            storage: SlotMap::with_key(),
            entity_map: EntityMap::new(),
            updated: Vec::new(),
            scratch: ScratchBuffers::default(),
            #[cfg(feature = "debug-visualizer")]
            ray_log: Vec::new(),
        })
    }

    /// Convenience wrapper around [`CollisionContext::new`] for call sites
    /// that want the original's fail-fast-on-bad-dimensions behavior
    /// verbatim (examples, benches).
    pub fn new_or_panic(map_size_x: f32, map_size_y: f32, cell_size: f32) -> Self {
        Self::new(map_size_x, map_size_y, cell_size).expect("invalid collision grid parameters")
    }

    // ---- mutation -------------------------------------------------------

    /// Adds oriented box entities. Parallel slices must have equal length.
    /// Newly added entities are **not** part of the updated set until
    /// `update_transforms` runs on them.
    pub fn add_boxes(&mut self, ids: &[EntityId], boxes: &[Box2D], masks: &[u32], transforms: &[Transform]) {
        assert_eq!(ids.len(), boxes.len());
        assert_eq!(ids.len(), masks.len());
        assert_eq!(ids.len(), transforms.len());

        for i in 0..ids.len() {
            let local = boxes[i];
            let world_box = Box2D::new(transforms[i].mul(local.tx), local.half_extents);
            let aabb_local = local.local_aabb();
            let aabb_world = world_box.world_aabb();

            let handle = self.storage.insert(EntityRecord {
                entity: ids[i],
                mask: masks[i],
                kind: ShapeKind::Box(local),
                aabb_local,
                aabb_world,
                box_world: Some(world_box),
            });
            self.entity_map.insert(ids[i], handle);

            let rect = self.grid.hash_aabb(&aabb_world);
            self.grid.insert_rect(handle, rect);
        }
    }

    /// Adds static convex polygons, already expressed in world space.
    pub fn add_static_polys(&mut self, ids: &[EntityId], polys: &[Polygon], masks: &[u32]) {
        assert_eq!(ids.len(), polys.len());
        assert_eq!(ids.len(), masks.len());

        for i in 0..ids.len() {
            let aabb = polys[i].bbox();

            let handle = self.storage.insert(EntityRecord {
                entity: ids[i],
                mask: masks[i],
                kind: ShapeKind::StaticPoly(polys[i].clone()),
                aabb_local: aabb,
                aabb_world: aabb,
                box_world: None,
            });
            self.entity_map.insert(ids[i], handle);

            let rect = self.grid.hash_aabb(&aabb);
            self.grid.insert_rect(handle, rect);
        }
    }

    /// Re-transforms entities, re-bucketing their cell membership and
    /// marking them in the updated set for the next `detect()`. Unknown
    /// ids are logged and skipped; the rest of the batch still runs.
    pub fn update_transforms(&mut self, ids: &[EntityId], transforms: &[Transform]) {
        assert_eq!(ids.len(), transforms.len());

        for i in 0..ids.len() {
            let Some(handle) = self.entity_map.find(ids[i]) else {
                log::warn!("update_transforms: unknown entity id {}", ids[i]);
                continue;
            };

            let record = self.storage.get_mut(handle).expect("handle in entity map must be live");

            if let ShapeKind::Box(local) = record.kind.clone_box() {
                let new_world_box = Box2D::new(transforms[i].mul(local.tx), local.half_extents);
                let new_aabb_world = new_world_box.world_aabb();
                let old_rect = self.grid.hash_aabb(&record.aabb_world);
                let new_rect = self.grid.hash_aabb(&new_aabb_world);
                self.grid.update_membership(handle, Some(old_rect), new_rect);

                record.box_world = Some(new_world_box);
                record.aabb_world = new_aabb_world;
            }

            self.updated.push(handle);
        }
    }

    /// Removes entities by id. Unknown ids are logged and skipped.
    pub fn remove(&mut self, ids: &[EntityId]) {
        for &id in ids {
            let Some(handle) = self.entity_map.remove(id) else {
                log::warn!("remove: unknown entity id {}", id);
                continue;
            };
            if let Some(record) = self.storage.remove(handle) {
                let rect = self.grid.hash_aabb(&record.aabb_world);
                self.grid.remove_rect(handle, rect);
            }
        }
    }

    /// Clears every entity, cell list, and the handle pool.
    pub fn remove_all(&mut self) {
        self.storage.clear();
        self.entity_map.clear();
        self.grid.clear();
        self.updated.clear();
    }

    // ---- queries ----------------------------------------------------------

    /// Runs narrow-phase detection over the updated set, returning every
    /// overlapping unordered pair and clearing the updated set.
    pub fn detect(&mut self) -> Vec<Pair> {
        let updated = std::mem::take(&mut self.updated);
        let mut pairs = Vec::new();

        for &a_handle in &updated {
            let Some(a) = self.storage.get(a_handle) else { continue };

            let rect = self.grid.hash_aabb(&a.aabb_world);
            self.scratch.candidates.clear();
            self.grid.gather_candidates(rect, &mut self.scratch.candidates);
            self.scratch.dedup_candidates();

            for &b_handle in self.scratch.seen.iter() {
                if b_handle == a_handle {
                    continue;
                }
                let Some(b) = self.storage.get(b_handle) else { continue };
                if (a.mask & b.mask) == 0 {
                    continue;
                }
                if !a.aabb_world.test(&b.aabb_world) {
                    continue;
                }
                if !narrow_phase_pair(a, b) {
                    continue;
                }

                let already_reported = pairs.iter().any(|p: &Pair| {
                    (p.entity_a == a.entity && p.entity_b == b.entity) || (p.entity_a == b.entity && p.entity_b == a.entity)
                });
                if already_reported {
                    continue;
                }

                #[cfg(feature = "debug-visualizer")]
                {
                    let rect_a = self.grid.hash_aabb(&a.aabb_world);
                    let rect_b = self.grid.hash_aabb(&b.aabb_world);
                    for cy in rect_a.min_y..=rect_a.max_y {
                        for cx in rect_a.min_x..=rect_a.max_x {
                            self.grid.mark_collision(self.grid.cell_id_of(cx, cy));
                        }
                    }
                    for cy in rect_b.min_y..=rect_b.max_y {
                        for cx in rect_b.min_x..=rect_b.max_x {
                            self.grid.mark_collision(self.grid.cell_id_of(cx, cy));
                        }
                    }
                }

                pairs.push(Pair { entity_a: a.entity, entity_b: b.entity, mask_a: a.mask, mask_b: b.mask });
            }
        }

        pairs
    }

    /// Returns all entity ids whose shape overlaps the sphere
    /// `(center, radius)` and whose mask shares a bit with `mask`. No
    /// ordering guarantee.
    pub fn query_sphere(&mut self, center: Vec2, radius: f32, mask: u32) -> Vec<EntityId> {
        let query_aabb = Aabb::from_points(Vec2::new(center.x - radius, center.y - radius), Vec2::new(center.x + radius, center.y + radius));
        let rect = self.grid.hash_aabb(&query_aabb);

        self.scratch.candidates.clear();
        self.grid.gather_candidates(rect, &mut self.scratch.candidates);
        self.scratch.dedup_candidates();

        let mut out = Vec::new();
        for &handle in self.scratch.seen.iter() {
            let Some(record) = self.storage.get(handle) else { continue };
            if (record.mask & mask) == 0 {
                continue;
            }
            if !record.aabb_world.test(&query_aabb) {
                continue;
            }
            let hit = match &record.kind {
                ShapeKind::Box(_) => {
                    let (poly, tx) = shape::box_to_polygon(record.box_world.as_ref().unwrap());
                    shape::circle_poly_intersect(center, radius, &poly, Some(&tx))
                }
                ShapeKind::StaticPoly(poly) => shape::circle_poly_intersect(center, radius, poly, None),
            };
            if hit {
                out.push(record.entity);
            }
        }
        out
    }

    /// Returns all entity ids whose shape overlaps `poly` (already in world
    /// space) and whose mask shares a bit with `mask`.
    pub fn query_poly(&mut self, poly: &Polygon, mask: u32) -> Vec<EntityId> {
        let query_aabb = poly.bbox();
        let rect = self.grid.hash_aabb(&query_aabb);

        self.scratch.candidates.clear();
        self.grid.gather_candidates(rect, &mut self.scratch.candidates);
        self.scratch.dedup_candidates();

        let mut out = Vec::new();
        for &handle in self.scratch.seen.iter() {
            let Some(record) = self.storage.get(handle) else { continue };
            if (record.mask & mask) == 0 {
                continue;
            }
            if !record.aabb_world.test(&query_aabb) {
                continue;
            }
            let hit = match &record.kind {
                ShapeKind::Box(_) => {
                    let (other, tx) = shape::box_to_polygon(record.box_world.as_ref().unwrap());
                    shape::poly_poly_intersect(poly, None, &other, Some(&tx))
                }
                ShapeKind::StaticPoly(other) => shape::poly_poly_intersect(poly, None, other, None),
            };
            if hit {
                out.push(record.entity);
            }
        }
        out
    }

    /// Casts a ray against box entities only — static polygons are ignored
    /// by the ray path. Returns hits sorted ascending by `t`.
    pub fn query_ray(&mut self, origin: Vec3, dir: Vec3, len: f32, mask: u32) -> Vec<RayHit> {
        #[cfg(feature = "debug-visualizer")]
        self.ray_log.push(RaySample { origin, dir, len });

        let Some(clipped) = raycast::clip_ray_to_map(origin, dir, len, self.grid.map_extent()) else {
            return Vec::new();
        };

        let target = Vec2::new(clipped.origin.x + clipped.dir.x * clipped.len, clipped.origin.y + clipped.dir.y * clipped.len);
        let cells = raycast::dda_visit_cells(&self.grid, clipped.origin.xy(), target);

        self.scratch.candidates.clear();
        for &(cx, cy) in &cells {
            let id = self.grid.cell_id_of(cx, cy);
            #[cfg(feature = "debug-visualizer")]
            self.grid.mark_raymarch(id);
            self.scratch.candidates.extend_from_slice(&self.grid.cell(id).handles);
        }
        self.scratch.dedup_candidates();

        let mut hits = Vec::new();
        for &handle in self.scratch.seen.iter() {
            let Some(record) = self.storage.get(handle) else { continue };
            if (record.mask & mask) == 0 {
                continue;
            }
            let ShapeKind::Box(_) = &record.kind else { continue };
            let Some(box_world) = &record.box_world else { continue };

            if let Some((t, normal)) = raycast::ray_cast_box(box_world, clipped.origin, clipped.dir, clipped.len) {
                #[cfg(feature = "debug-visualizer")]
                {
                    let rect = self.grid.hash_aabb(&record.aabb_world);
                    for cy in rect.min_y..=rect.max_y {
                        for cx in rect.min_x..=rect.max_x {
                            self.grid.mark_rayhit(self.grid.cell_id_of(cx, cy));
                        }
                    }
                }
                hits.push(RayHit { entity: record.entity, normal, t });
            }
        }

        hits.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    // ---- introspection ------------------------------------------------

    /// `(total_cells, num_cells_x, num_cells_y)`.
    pub fn num_cells(&self) -> (usize, i32, i32) {
        (self.grid.total_cells(), self.grid.num_cells_x(), self.grid.num_cells_y())
    }

    /// World-space rectangle of the cell at `idx`.
    pub fn cell_rect(&self, idx: usize) -> Aabb {
        self.grid.cell_rect(idx)
    }

    /// Current shape/aabb/mask snapshot for an entity, or `None` if `id` is
    /// unknown.
    pub fn get_entity_data(&self, id: EntityId) -> Option<EntityData> {
        let handle = self.entity_map.find(id)?;
        let record = self.storage.get(handle)?;
        Some(EntityData {
            shape: record.kind.clone_box(),
            aabb: record.aabb_world,
            mask: record.mask,
            is_static: matches!(record.kind, ShapeKind::StaticPoly(_)),
        })
    }

    pub(crate) fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    #[cfg(feature = "debug-visualizer")]
    pub(crate) fn grid_mut(&mut self) -> &mut SpatialGrid {
        &mut self.grid
    }

    #[cfg(feature = "debug-visualizer")]
    pub(crate) fn entities(&self) -> impl Iterator<Item = (EntityId, &ShapeKind, Aabb, u32)> {
        self.storage.values().map(|r| (r.entity, &r.kind, r.aabb_world, r.mask))
    }
}

impl ShapeKind {
    fn clone_box(&self) -> ShapeKind {
        match self {
            ShapeKind::Box(b) => ShapeKind::Box(*b),
            ShapeKind::StaticPoly(p) => ShapeKind::StaticPoly(p.clone()),
        }
    }
}

fn narrow_phase_pair(a: &EntityRecord, b: &EntityRecord) -> bool {
    match (&a.kind, &b.kind) {
        (ShapeKind::Box(_), ShapeKind::Box(_)) => {
            let (poly_a, tx_a) = shape::box_to_polygon(a.box_world.as_ref().unwrap());
            let (poly_b, tx_b) = shape::box_to_polygon(b.box_world.as_ref().unwrap());
            shape::poly_poly_intersect(&poly_a, Some(&tx_a), &poly_b, Some(&tx_b))
        }
        (ShapeKind::Box(_), ShapeKind::StaticPoly(poly_b)) => {
            let (poly_a, tx_a) = shape::box_to_polygon(a.box_world.as_ref().unwrap());
            shape::poly_poly_intersect(&poly_a, Some(&tx_a), poly_b, None)
        }
        (ShapeKind::StaticPoly(poly_a), ShapeKind::Box(_)) => {
            let (poly_b, tx_b) = shape::box_to_polygon(b.box_world.as_ref().unwrap());
            shape::poly_poly_intersect(poly_a, None, &poly_b, Some(&tx_b))
        }
        (ShapeKind::StaticPoly(poly_a), ShapeKind::StaticPoly(poly_b)) => shape::poly_poly_intersect(poly_a, None, poly_b, None),
    }
}
