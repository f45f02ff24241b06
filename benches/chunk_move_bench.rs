use chunked_ecs::World;
use criterion::{criterion_group, criterion_main, Criterion};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

fn bench_add_remove_component(c: &mut Criterion) {
    c.bench_function("add_remove_component_1000", |b| {
        b.iter(|| {
            let mut world = World::new();
            let entities: Vec<_> = (0..1000)
                .map(|_| {
                    let e = world.create_entity().unwrap();
                    world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
                    e
                })
                .collect();
            for &e in &entities {
                world.add_component(e, Velocity { dx: 1.0, dy: 1.0 }).unwrap();
            }
            for &e in &entities {
                world.remove_component::<Velocity>(e).unwrap();
            }
        });
    });
}

fn bench_spawn_destroy(c: &mut Criterion) {
    c.bench_function("spawn_destroy_10000", |b| {
        b.iter(|| {
            let mut world = World::new();
            let entities: Vec<_> = (0..10_000).map(|_| world.create_entity().unwrap()).collect();
            for e in entities {
                world.destroy_entity(e, false).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_add_remove_component, bench_spawn_destroy);
criterion_main!(benches);
