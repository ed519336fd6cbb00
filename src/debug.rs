//! Debug visualization hooks, compiled only under the `debug-visualizer`
//! feature. The engine never draws anything itself — it hands geometry to
//! a caller-supplied [`DebugSink`], the trait-object analogue of the
//! original's function-pointer table seam between the collision plugin and
//! its rendering host.

use crate::context::{CollisionContext, ShapeKind};
use crate::math::{Aabb, Vec2, Vec3};
use crate::shape;

/// A logged `query_ray` call, retained so `debug_raycast` can redraw past
/// rays alongside the current grid state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RaySample {
    pub origin: Vec3,
    pub dir: Vec3,
    pub len: f32,
}

/// Minimal immediate-mode draw surface the debug views render through.
/// Implementations typically forward these to a game's existing debug-draw
/// layer (`dd_*` in the original engine).
pub trait DebugSink {
    fn draw_rect_outline(&mut self, min: Vec2, max: Vec2, color: [f32; 4]);
    fn draw_rect_filled(&mut self, min: Vec2, max: Vec2, color: [f32; 4]);
    fn draw_line(&mut self, a: Vec2, b: Vec2, color: [f32; 4]);
    fn draw_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]);
    fn draw_quad(&mut self, verts: &[Vec2], color: [f32; 4]);
}

/// Which collision-debug overlay to draw, mirrors `rizz_coll_debug_collision_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionDebugMode {
    /// Outline every entity that collided this frame.
    Collisions,
    /// Shade cells by how many `mark_collision` hits they accumulated.
    CollisionHeatmap,
    /// Shade cells by how many entities currently occupy them.
    EntityHeatmap,
}

/// Which raycast-debug overlay to draw, mirrors `rizz_coll_debug_raycast_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaycastDebugMode {
    /// Outline every box a logged ray actually hit.
    Rayhits,
    /// Shade cells by accumulated ray-hit count.
    RayhitHeatmap,
    /// Shade cells by accumulated ray-march (DDA visit) count.
    RaymarchHeatmap,
}

/// Maps a `0.0..=1.0` load factor to an HSV-ramp heatmap color (blue for
/// idle, red for the hottest), matching the original's debug-overlay
/// palette (green-to-red in the original; blue-to-red here so an empty
/// cell and a lightly loaded one are visually distinct).
pub fn heatmap_color(t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    let hue = (1.0 - t) * 240.0; // 240 = blue, 0 = red
    hsv_to_rgba(hue, 0.85, 0.95)
}

fn hsv_to_rgba(h: f32, s: f32, v: f32) -> [f32; 4] {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [r1 + m, g1 + m, b1 + m, 1.0]
}

impl CollisionContext {
    /// Draws the current collision state: entity shapes plus one of three
    /// overlays selected by `mode`. `alpha` controls the heatmap fill
    /// opacity, `size` the drawn circle/line thickness passed to the sink
    /// (both forwarded verbatim, never interpreted by the engine).
    pub fn debug_collisions<S: DebugSink>(&self, sink: &mut S, alpha: f32, mode: CollisionDebugMode, size: f32) {
        let grid = self.grid();
        let (total, _, _) = self.num_cells();

        match mode {
            CollisionDebugMode::Collisions => {
                for (_, kind, _, _) in self.entities() {
                    draw_shape(sink, kind, [0.2, 0.8, 0.2, alpha]);
                }
            }
            CollisionDebugMode::CollisionHeatmap => {
                let busiest = (0..total).map(|id| grid.cell(id).num_collisions).max().unwrap_or(0).max(1);
                for id in 0..total {
                    let load = grid.cell(id).num_collisions as f32 / busiest as f32;
                    if load > 0.0 {
                        let rect = self.cell_rect(id);
                        sink.draw_rect_filled(rect.min, rect.max, with_alpha(heatmap_color(load), alpha));
                    }
                }
            }
            CollisionDebugMode::EntityHeatmap => {
                let busiest = (0..total).map(|id| grid.cell(id).handles.len()).max().unwrap_or(0).max(1);
                for id in 0..total {
                    let load = grid.cell(id).handles.len() as f32 / busiest as f32;
                    if load > 0.0 {
                        let rect = self.cell_rect(id);
                        sink.draw_rect_filled(rect.min, rect.max, with_alpha(heatmap_color(load), alpha));
                    }
                }
            }
        }

        for id in 0..total {
            let rect = self.cell_rect(id);
            sink.draw_rect_outline(rect.min, rect.max, [0.3, 0.3, 0.3, size.max(1.0).min(4.0) / 4.0]);
        }
    }

    /// Draws every `query_ray` call logged since the last `remove_all`,
    /// plus one of three grid overlays selected by `mode`.
    pub fn debug_raycast<S: DebugSink>(&self, sink: &mut S, alpha: f32, mode: RaycastDebugMode, size: f32) {
        let grid = self.grid();
        let (total, _, _) = self.num_cells();

        match mode {
            RaycastDebugMode::Rayhits => {
                for id in 0..total {
                    if grid.cell(id).num_rayhits > 0 {
                        let rect = self.cell_rect(id);
                        sink.draw_rect_outline(rect.min, rect.max, with_alpha([1.0, 0.0, 0.0, 1.0], alpha));
                    }
                }
            }
            RaycastDebugMode::RayhitHeatmap => {
                let busiest = (0..total).map(|id| grid.cell(id).num_rayhits).max().unwrap_or(0).max(1);
                for id in 0..total {
                    let load = grid.cell(id).num_rayhits as f32 / busiest as f32;
                    if load > 0.0 {
                        let rect = self.cell_rect(id);
                        sink.draw_rect_filled(rect.min, rect.max, with_alpha(heatmap_color(load), alpha));
                    }
                }
            }
            RaycastDebugMode::RaymarchHeatmap => {
                let busiest = (0..total).map(|id| grid.cell(id).num_raymarches).max().unwrap_or(0).max(1);
                for id in 0..total {
                    let load = grid.cell(id).num_raymarches as f32 / busiest as f32;
                    if load > 0.0 {
                        let rect = self.cell_rect(id);
                        sink.draw_rect_filled(rect.min, rect.max, with_alpha(heatmap_color(load), alpha));
                    }
                }
            }
        }

        for sample in &self.ray_log {
            let end = Vec2::new(sample.origin.x + sample.dir.x * sample.len, sample.origin.y + sample.dir.y * sample.len);
            sink.draw_line(sample.origin.xy(), end, [1.0, 1.0, 0.0, 1.0]);
            sink.draw_circle(end, size.max(0.05), [1.0, 1.0, 0.0, 1.0]);
        }
    }

    /// Clears the retained ray log and per-cell debug counters without
    /// touching entities or cell membership.
    pub fn debug_clear(&mut self) {
        self.ray_log.clear();
        self.grid_mut().clear_debug_counters();
    }
}

fn draw_shape<S: DebugSink>(sink: &mut S, kind: &ShapeKind, color: [f32; 4]) {
    match kind {
        ShapeKind::Box(b) => {
            let (poly, tx) = shape::box_to_polygon(b);
            let verts: Vec<Vec2> = poly.verts.iter().map(|&v| tx.rot.mul_vec2(v).add(tx.pos.xy())).collect();
            sink.draw_quad(&verts, color);
        }
        ShapeKind::StaticPoly(poly) => {
            let verts: Vec<Vec2> = poly.verts.iter().copied().collect();
            sink.draw_quad(&verts, color);
        }
    }
}

fn with_alpha(mut color: [f32; 4], alpha: f32) -> [f32; 4] {
    color[3] = alpha;
    color
}

/// Converts a world AABB to a screen rectangle under an orthographic
/// camera, mapping one world unit to `pixels_per_unit` screen pixels
/// centered on `camera_center`. Used by host applications that don't
/// already have their own camera math wired into [`DebugSink`].
pub fn project_to_screen(aabb: Aabb, camera_center: Vec2, pixels_per_unit: f32) -> (Vec2, Vec2) {
    let to_screen = |p: Vec2| Vec2::new((p.x - camera_center.x) * pixels_per_unit, (camera_center.y - p.y) * pixels_per_unit);
    (to_screen(aabb.min), to_screen(aabb.max))
}
