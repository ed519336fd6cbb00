use std::time::{Duration, Instant};

use collision::{CollisionContext, EntityId, Rotation2D, Transform, Vec3};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const MAP_SIZE: f32 = 500.0;
const CELL_SIZE: f32 = 5.0;

fn random_transform() -> Transform {
    let pos = Vec3::new(MAP_SIZE * (rand::random::<f32>() - 0.5), MAP_SIZE * (rand::random::<f32>() - 0.5), 0.0);
    Transform::new(pos, Rotation2D::from_angle(rand::random::<f32>() * std::f32::consts::TAU))
}

fn populated_context(n: usize) -> (CollisionContext, Vec<EntityId>) {
    let mut ctx = CollisionContext::new_or_panic(MAP_SIZE, MAP_SIZE, CELL_SIZE);
    let ids: Vec<EntityId> = (0..n as u64).collect();
    let boxes: Vec<_> = (0..n).map(|_| collision::Box2D::new(Transform::IDENTITY, Vec3::new(0.5, 0.5, 0.5))).collect();
    let masks = vec![0xFFFF_FFFFu32; n];
    let transforms: Vec<_> = (0..n).map(|_| random_transform()).collect();
    ctx.add_boxes(&ids, &boxes, &masks, &transforms);
    ctx.update_transforms(&ids, &transforms);
    (ctx, ids)
}

fn update_and_detect(n: usize, iter: u64) -> Duration {
    let (mut ctx, ids) = populated_context(n);
    let start = Instant::now();
    for _ in 0..iter {
        let transforms: Vec<_> = ids.iter().map(|_| random_transform()).collect();
        ctx.update_transforms(&ids, &transforms);
        black_box(ctx.detect());
    }
    start.elapsed()
}

fn query_ray(n: usize, iter: u64) -> Duration {
    let (mut ctx, _) = populated_context(n);
    let start = Instant::now();
    for _ in 0..iter {
        let origin = Vec3::new(MAP_SIZE * (rand::random::<f32>() - 0.5), MAP_SIZE * (rand::random::<f32>() - 0.5), 0.0);
        black_box(ctx.query_ray(origin, Vec3::new(1.0, 0.0, 0.0), 100.0, 0xFFFF_FFFF));
    }
    start.elapsed()
}

fn detect_throughput(c: &mut Criterion) {
    let mut g = c.benchmark_group("detect");
    g.bench_function("update+detect 1k entities", |b| b.iter_custom(|iter| update_and_detect(1_000, iter)));
    g.bench_function("update+detect 10k entities", |b| b.iter_custom(|iter| update_and_detect(10_000, iter)));
    g.finish();
}

fn query_ray_throughput(c: &mut Criterion) {
    let mut g = c.benchmark_group("query_ray");
    g.bench_function("query_ray 1k entities", |b| b.iter_custom(|iter| query_ray(1_000, iter)));
    g.bench_function("query_ray 10k entities", |b| b.iter_custom(|iter| query_ray(10_000, iter)));
    g.finish();
}

criterion_group!(benches, detect_throughput, query_ray_throughput);
criterion_main!(benches);
