//! End-to-end scenarios and randomized invariant checks against the public
//! API, as opposed to the unit tests inside each module.

use collision::{CollisionContext, EntityId, Polygon, Rotation2D, Transform, Vec2, Vec3};
use rand::Rng;

fn unit_box_transform(pos: Vec3) -> (collision::Box2D, Transform) {
    (collision::Box2D::new(Transform::IDENTITY, Vec3::new(0.5, 0.5, 0.5)), Transform::new(pos, Rotation2D::IDENTITY))
}

#[test]
fn s2_basic_overlap_after_update() {
    let mut ctx = CollisionContext::new(200.0, 200.0, 4.0).unwrap();
    let (box_a, tx_a) = unit_box_transform(Vec3::new(0.0, 0.0, 0.0));
    let (box_b, tx_b) = unit_box_transform(Vec3::new(0.9, 0.0, 0.0));

    ctx.add_boxes(&[1, 2], &[box_a, box_b], &[0xFFFF_FFFF, 0xFFFF_FFFF], &[tx_a, tx_b]);
    assert!(ctx.detect().is_empty(), "freshly added entities must not collide before an update");

    ctx.update_transforms(&[1, 2], &[tx_a, tx_b]);
    let pairs = ctx.detect();
    assert_eq!(pairs.len(), 1);
    let p = pairs[0];
    assert!((p.entity_a == 1 && p.entity_b == 2) || (p.entity_a == 2 && p.entity_b == 1));
}

#[test]
fn s3_mask_gate_blocks_otherwise_overlapping_pair() {
    let mut ctx = CollisionContext::new(200.0, 200.0, 4.0).unwrap();
    let (box_a, tx_a) = unit_box_transform(Vec3::new(0.0, 0.0, 0.0));
    let (box_b, tx_b) = unit_box_transform(Vec3::new(0.5, 0.0, 0.0));

    ctx.add_boxes(&[1, 2], &[box_a, box_b], &[0b01, 0b10], &[tx_a, tx_b]);
    ctx.update_transforms(&[1, 2], &[tx_a, tx_b]);
    assert!(ctx.detect().is_empty());

    ctx.remove(&[1, 2]);
    ctx.add_boxes(&[1, 2], &[box_a, box_b], &[0b01, 0b11], &[tx_a, tx_b]);
    ctx.update_transforms(&[1, 2], &[tx_a, tx_b]);
    assert_eq!(ctx.detect().len(), 1);
}

#[test]
fn s4_and_s5_ray_against_single_box() {
    let mut ctx = CollisionContext::new(100.0, 100.0, 10.0).unwrap();
    let (box_a, tx_a) = unit_box_transform(Vec3::ZERO);
    ctx.add_boxes(&[1], &[box_a], &[0xFFFF_FFFF], &[tx_a]);
    ctx.update_transforms(&[1], &[tx_a]);

    let hits = ctx.query_ray(Vec3::new(-60.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 200.0, 0xFFFF_FFFF);
    assert_eq!(hits.len(), 1);
    assert!((hits[0].t - 49.5).abs() < 1e-2);

    let empty = ctx.query_ray(Vec3::new(1000.0, 1000.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0, 0xFFFF_FFFF);
    assert!(empty.is_empty());
}

#[test]
fn s6_moving_entity_rebuckets_and_detects_new_neighbor() {
    let mut ctx = CollisionContext::new(200.0, 200.0, 4.0).unwrap();
    let (box_a, tx_a) = unit_box_transform(Vec3::ZERO);
    let (box_b, tx_b) = unit_box_transform(Vec3::new(40.0, 0.0, 0.0));

    ctx.add_boxes(&[1, 2], &[box_a, box_b], &[0xFFFF_FFFF, 0xFFFF_FFFF], &[tx_a, tx_b]);
    ctx.update_transforms(&[1, 2], &[tx_a, tx_b]);
    assert!(ctx.detect().is_empty());

    let moved = Transform::new(Vec3::new(40.2, 0.0, 0.0), Rotation2D::IDENTITY);
    ctx.update_transforms(&[1], &[moved]);
    let pairs = ctx.detect();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn static_polygon_blocks_ray_free_but_still_collides() {
    let mut ctx = CollisionContext::new(200.0, 200.0, 4.0).unwrap();
    let wall = Polygon::new(&[Vec2::new(11.0, 5.0), Vec2::new(9.0, 5.0), Vec2::new(9.0, -5.0), Vec2::new(11.0, -5.0)]);
    ctx.add_static_polys(&[99], &[wall], &[0xFFFF_FFFF]);

    // query_ray never reports static polygons as hits.
    let hits = ctx.query_ray(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 50.0, 0xFFFF_FFFF);
    assert!(hits.is_empty());

    // but a box overlapping it is still detected via detect().
    let (box_a, tx_a) = unit_box_transform(Vec3::new(10.0, 0.0, 0.0));
    ctx.add_boxes(&[1], &[box_a], &[0xFFFF_FFFF], &[tx_a]);
    ctx.update_transforms(&[1], &[tx_a]);
    let pairs = ctx.detect();
    assert_eq!(pairs.len(), 1);
    assert!((pairs[0].entity_a == 99 && pairs[0].entity_b == 1) || (pairs[0].entity_a == 1 && pairs[0].entity_b == 99));
}

#[test]
fn removed_entity_is_absent_from_every_query() {
    let mut ctx = CollisionContext::new(200.0, 200.0, 4.0).unwrap();
    let (box_a, tx_a) = unit_box_transform(Vec3::ZERO);
    ctx.add_boxes(&[1], &[box_a], &[0xFFFF_FFFF], &[tx_a]);
    ctx.update_transforms(&[1], &[tx_a]);
    ctx.remove(&[1]);

    assert!(ctx.get_entity_data(1).is_none());
    assert!(ctx.query_sphere(Vec2::ZERO, 5.0, 0xFFFF_FFFF).is_empty());
    assert!(ctx.query_ray(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 20.0, 0xFFFF_FFFF).is_empty());
}

#[test]
fn invalid_grid_dimensions_are_rejected() {
    assert!(CollisionContext::new(201.0, 200.0, 4.0).is_err());
    assert!(CollisionContext::new(200.0, 200.0, -1.0).is_err());
}

/// Randomized sweep of moving boxes: whatever `detect()` reports must be
/// symmetric, mask-respecting, and agree with a brute-force AABB check.
#[test]
fn detect_matches_brute_force_aabb_overlap() {
    let mut rng = rand::thread_rng();
    let map = 400.0;
    let mut ctx = CollisionContext::new(map, map, 8.0).unwrap();

    let n = 120;
    let ids: Vec<EntityId> = (0..n as u64).collect();
    let boxes: Vec<_> = (0..n)
        .map(|_| collision::Box2D::new(Transform::IDENTITY, Vec3::new(rng.gen_range(0.2, 1.5), rng.gen_range(0.2, 1.5), 0.5)))
        .collect();
    let masks: Vec<u32> = (0..n).map(|_| if rng.gen_bool(0.5) { 0x01 } else { 0x02 }).collect();
    let transforms: Vec<_> = (0..n)
        .map(|_| Transform::new(Vec3::new(rng.gen_range(-map / 2.0, map / 2.0), rng.gen_range(-map / 2.0, map / 2.0), 0.0), Rotation2D::IDENTITY))
        .collect();

    ctx.add_boxes(&ids, &boxes, &masks, &transforms);
    ctx.update_transforms(&ids, &transforms);
    let pairs = ctx.detect();

    for pair in &pairs {
        assert_ne!(pair.mask_a & pair.mask_b, 0, "reported pair must share a mask bit");
        assert_ne!(pair.entity_a, pair.entity_b, "no entity pairs with itself");
    }

    // brute-force AABB overlap using axis-aligned extents (unrotated boxes here,
    // so world AABB == local AABB translated by position)
    let mut expected_aabb_overlaps = std::collections::HashSet::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if masks[i] & masks[j] == 0 {
                continue;
            }
            let ai = &boxes[i].half_extents;
            let aj = &boxes[j].half_extents;
            let pi = transforms[i].pos;
            let pj = transforms[j].pos;
            let overlap_x = (pi.x - pj.x).abs() <= ai.x + aj.x;
            let overlap_y = (pi.y - pj.y).abs() <= ai.y + aj.y;
            if overlap_x && overlap_y {
                expected_aabb_overlaps.insert((ids[i], ids[j]));
            }
        }
    }

    // every reported pair's AABBs must actually overlap
    for pair in &pairs {
        let (lo, hi) = if pair.entity_a < pair.entity_b { (pair.entity_a, pair.entity_b) } else { (pair.entity_b, pair.entity_a) };
        assert!(expected_aabb_overlaps.contains(&(lo, hi)), "reported pair {lo}/{hi} has disjoint AABBs");
    }
}
