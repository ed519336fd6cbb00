//! Headless port of the original engine's `collideboxes` sample: scatters
//! boxes across a map, oscillates each one between two random points, and
//! reports how many pairs collide and how many the camera ray hits per
//! tick. No rendering — this drives the library the way the graphical demo
//! drove the plugin, minus sokol/imgui.

use collision::{CollisionContext, EntityId, Rotation2D, Transform, Vec3};

const MAP_SIZE_X: f32 = 200.0;
const MAP_SIZE_Y: f32 = 200.0;
const CELL_SIZE: f32 = 4.0;
const NUM_SHAPES: usize = 2000;
const NUM_TICKS: usize = 50;

struct Entity {
    half_extents: Vec3,
    p1: Vec3,
    p2: Vec3,
    tm: f32,
}

fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t, a.z + (b.z - a.z) * t)
}

fn main() {
    env_logger::init();

    let mut rng_state = 0x2545_F491_4F6C_DD1Du64;
    let mut rand_f32 = move || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 7;
        rng_state ^= rng_state << 17;
        (rng_state >> 40) as f32 / ((1u64 << 24) as f32)
    };

    let mut ctx = CollisionContext::new_or_panic(MAP_SIZE_X, MAP_SIZE_Y, CELL_SIZE);

    let mut entities = Vec::with_capacity(NUM_SHAPES);
    let mut ids: Vec<EntityId> = Vec::with_capacity(NUM_SHAPES);
    let mut boxes = Vec::with_capacity(NUM_SHAPES);
    let mut masks = Vec::with_capacity(NUM_SHAPES);
    let mut init_transforms = Vec::with_capacity(NUM_SHAPES);

    for i in 0..NUM_SHAPES {
        let half_extents = Vec3::new(rand_f32() * 0.5 + 0.2, rand_f32() * 0.5 + 0.2, rand_f32() * 0.5 + 0.2);
        let pos = Vec3::new(
            (rand_f32() * 2.0 - 1.0) * MAP_SIZE_X * 0.5,
            (rand_f32() * 2.0 - 1.0) * MAP_SIZE_Y * 0.5,
            half_extents.z * 0.5,
        );

        let move_range = rand_f32() * 8.0;
        let theta = rand_f32() * std::f32::consts::TAU;
        let p1 = Vec3::new(pos.x + move_range * theta.cos(), pos.y + move_range * theta.sin(), pos.z);
        let p2 = Vec3::new(pos.x + move_range * (std::f32::consts::PI - theta).cos(), pos.y + move_range * (std::f32::consts::PI - theta).sin(), pos.z);

        entities.push(Entity { half_extents, p1, p2, tm: rand_f32() * std::f32::consts::TAU });
        ids.push(i as EntityId);
        boxes.push(collision::Box2D::new(Transform::IDENTITY, half_extents));
        masks.push(0xFFFF_FFFFu32);
        init_transforms.push(Transform::new(pos, Rotation2D::from_angle(rand_f32() * std::f32::consts::TAU)));
    }

    ctx.add_boxes(&ids, &boxes, &masks, &init_transforms);

    let dt = 1.0 / 60.0;
    for tick in 0..NUM_TICKS {
        let transforms: Vec<Transform> = entities
            .iter_mut()
            .map(|ent| {
                ent.tm += dt;
                let t = ent.tm.sin() * 0.5 + 0.5;
                Transform::new(lerp(ent.p1, ent.p2, t), Rotation2D::IDENTITY)
            })
            .collect();

        ctx.update_transforms(&ids, &transforms);
        let pairs = ctx.detect();

        let ray_origin = Vec3::new(0.0, 0.0, 1.0);
        let ray_dir = Vec3::new(0.0, 1.0, 0.0);
        let hits = ctx.query_ray(ray_origin, ray_dir, 50.0, 0xFFFF_FFFF);

        println!("tick {tick}: {} colliding pairs, {} ray hits", pairs.len(), hits.len());
    }
}
