use chunked_ecs::{EcsError, World};

#[test]
fn handles_are_one_based_and_stable() {
    let mut world = World::new();
    let a = world.create_entity().unwrap();
    let b = world.create_entity().unwrap();
    let handle = world.add_reference(a, b).unwrap();
    assert_eq!(handle, 1);
    assert_eq!(world.get_reference(a, handle).unwrap(), Some(b));
}

#[test]
fn handle_zero_and_out_of_range_handles_are_invalid_not_missing() {
    let mut world = World::new();
    let a = world.create_entity().unwrap();
    let b = world.create_entity().unwrap();
    world.add_reference(a, b).unwrap();

    assert!(matches!(world.get_reference(a, 0), Err(EcsError::Invalid(_))));
    assert!(matches!(world.get_reference(a, 5), Err(EcsError::Invalid(_))));
}

#[test]
fn removing_one_reference_does_not_shift_the_handle_of_another() {
    let mut world = World::new();
    let a = world.create_entity().unwrap();
    let b = world.create_entity().unwrap();
    let c = world.create_entity().unwrap();
    let handle_b = world.add_reference(a, b).unwrap();
    let handle_c = world.add_reference(a, c).unwrap();

    world.remove_reference(a, handle_b).unwrap();

    assert!(!world.contains_reference(a, handle_b).unwrap());
    assert_eq!(world.get_reference(a, handle_c).unwrap(), Some(c));
}

#[test]
fn set_reference_overwrites_the_target_in_place() {
    let mut world = World::new();
    let a = world.create_entity().unwrap();
    let b = world.create_entity().unwrap();
    let c = world.create_entity().unwrap();
    let handle = world.add_reference(a, b).unwrap();

    world.set_reference(a, handle, c).unwrap();
    assert_eq!(world.get_reference(a, handle).unwrap(), Some(c));
}

#[test]
fn a_removed_reference_reads_as_none_but_the_handle_stays_valid() {
    let mut world = World::new();
    let a = world.create_entity().unwrap();
    let b = world.create_entity().unwrap();
    let handle = world.add_reference(a, b).unwrap();

    world.remove_reference(a, handle).unwrap();
    assert_eq!(world.get_reference(a, handle).unwrap(), None);
}
