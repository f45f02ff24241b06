use chunked_ecs::{EcsError, World};

#[test]
fn create_write_and_read_back_an_array() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.create_array::<u32>(e, 3).unwrap();

    let slice = world.get_array_mut::<u32>(e).unwrap();
    slice.copy_from_slice(&[10, 20, 30]);

    assert_eq!(world.get_array::<u32>(e).unwrap(), &[10, 20, 30]);
}

#[test]
fn growing_an_array_preserves_the_existing_elements() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.create_array::<u32>(e, 3).unwrap();
    world.get_array_mut::<u32>(e).unwrap().copy_from_slice(&[10, 20, 30]);

    let element_index = world.array_element_index::<u32>().unwrap();
    world.resize_array(e, element_index, 5).unwrap();

    let grown = world.get_array::<u32>(e).unwrap();
    assert_eq!(&grown[..3], &[10, 20, 30]);
    assert_eq!(&grown[3..], &[0, 0]);
}

#[test]
fn shrinking_an_array_truncates_it() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.create_array::<u32>(e, 4).unwrap();
    world.get_array_mut::<u32>(e).unwrap().copy_from_slice(&[1, 2, 3, 4]);

    let element_index = world.array_element_index::<u32>().unwrap();
    world.resize_array(e, element_index, 2).unwrap();
    assert_eq!(world.get_array::<u32>(e).unwrap(), &[1, 2]);
}

#[test]
fn destroying_an_array_removes_it_from_the_entity() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.create_array::<u32>(e, 3).unwrap();
    let element_index = world.array_element_index::<u32>().unwrap();

    world.destroy_array(e, element_index).unwrap();
    assert!(!world.contains_array(e, element_index).unwrap());
    assert!(matches!(world.get_array::<u32>(e), Err(EcsError::Missing)));
}

#[test]
fn creating_the_same_array_twice_is_already_present() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.create_array::<u32>(e, 3).unwrap();
    assert!(matches!(world.create_array::<u32>(e, 3), Err(EcsError::AlreadyPresent)));
}
