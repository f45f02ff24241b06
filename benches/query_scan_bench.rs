use chunked_ecs::{BitMask, Query, World};
use criterion::{criterion_group, criterion_main, Criterion};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy)]
struct Tag;

fn build_world(n: usize) -> World {
    let mut world = World::new();
    for i in 0..n {
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: i as f32, y: 0.0 }).unwrap();
        if i % 2 == 0 {
            world.add_tag::<Tag>(e).unwrap();
        }
    }
    world
}

fn bench_query_update(c: &mut Criterion) {
    let world = build_world(50_000);
    let pos_index = world.component_index::<Position>().unwrap();
    let mut mask = BitMask::EMPTY;
    mask.set(pos_index);

    c.bench_function("query_update_50000", |b| {
        b.iter(|| {
            let mut query = Query::new(mask);
            query.update(&world);
            let _ = query.entities().unwrap().len();
        });
    });
}

criterion_group!(benches, bench_query_update);
criterion_main!(benches);
