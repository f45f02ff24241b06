// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spawns a small hierarchy of entities, mutates their components and
//! enable state, and walks the results with a `Query`.

use chunked_ecs::{BitMask, Query, World};

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

fn main() {
    let mut world = World::new();

    world.on_entity_destroyed.subscribe(0, |id, _| {
        println!("destroyed {id}");
    });

    let root = world.create_entity().unwrap();
    world.add_component(root, Position { x: 0.0, y: 0.0 }).unwrap();

    let mut movers = Vec::new();
    for i in 0..5 {
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: i as f32, y: 0.0 }).unwrap();
        world.add_component(e, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
        world.set_parent(e, Some(root)).unwrap();
        movers.push(e);
    }

    let pos_index = world.component_index::<Position>().unwrap();
    let vel_index = world.component_index::<Velocity>().unwrap();
    let mut moving_mask = BitMask::EMPTY;
    moving_mask.set(pos_index);
    moving_mask.set(vel_index);

    let mut query = Query::new(moving_mask);
    query.update(&world);
    for &id in query.entities().unwrap() {
        let dx = world.get_component::<Velocity>(id).unwrap().dx;
        world.get_component_mut::<Position>(id).unwrap().x += dx;
    }

    world.set_enabled(root, false).unwrap();
    println!("root enabled: {}", world.is_enabled(root).unwrap());
    for &id in &movers {
        println!("mover {id} enabled: {}", world.is_enabled(id).unwrap());
    }

    world.destroy_entity(root, true).unwrap();
    println!("entities left: {}", {
        let mut all = Query::new(BitMask::EMPTY);
        all.update(&world);
        all.entities().unwrap().len()
    });
}
