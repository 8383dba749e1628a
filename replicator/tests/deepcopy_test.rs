//! Whole-subtree copy and delete through the world wrapper

use glam::Vec3;
use replicator::core::entity::{Entity, Name, Transform, World};
use replicator::graphics::{Mesh, Model, ShaderProgram};

fn spawn(world: &mut World, name: &str, parent: Option<Entity>) -> Entity {
    let entity = world.spawn((Name::new(name), Transform::default()));
    world.attach(entity, parent).unwrap();
    entity
}

/// Names of the subtree in pre-order, with nesting depth
fn outline(world: &World, entity: Entity) -> Vec<(usize, String)> {
    fn walk(world: &World, entity: Entity, depth: usize, out: &mut Vec<(usize, String)>) {
        out.push((depth, world.get::<Name>(entity).unwrap().0.clone()));
        for child in world.children(entity) {
            walk(world, child, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(world, entity, 0, &mut out);
    out
}

#[test]
fn test_deepdelete_removes_exactly_the_subtree() {
    let mut world = World::new();
    let r = spawn(&mut world, "R", None);
    let a = spawn(&mut world, "A", Some(r));
    let b = spawn(&mut world, "B", Some(r));
    let c = spawn(&mut world, "C", Some(a));
    let bystander = spawn(&mut world, "X", None);
    world.update();

    assert_eq!(world.deepdelete(r), 4);
    for gone in [r, a, b, c] {
        assert!(!world.contains(gone));
    }
    assert!(world.contains(bystander));
    assert_eq!(world.len(), 1);

    world.update();
    assert_eq!(world.order(), &[bystander]);
}

#[test]
fn test_deepcopy_matches_shape_and_count() {
    let mut world = World::new();
    let r = spawn(&mut world, "R", None);
    let a = spawn(&mut world, "A", Some(r));
    spawn(&mut world, "B", Some(r));
    spawn(&mut world, "C", Some(a));
    spawn(&mut world, "D", Some(a));
    let holder = spawn(&mut world, "H", None);

    let copy = world.deepcopy(r, Some(holder)).unwrap();

    assert_eq!(outline(&world, copy), outline(&world, r));
    assert_eq!(world.descendants(copy).count(), world.descendants(r).count());
    assert_eq!(world.parent(copy), Some(holder));
    assert!(world.validate().is_empty());

    world.update();
    assert_eq!(world.order().len(), 11);
}

#[test]
fn test_copy_is_independent_of_source() {
    let mut world = World::new();
    let r = spawn(&mut world, "R", None);
    let a = spawn(&mut world, "A", Some(r));
    let copy = world.deepcopy(r, None).unwrap();
    let copied_a = world.children(copy).next().unwrap();

    world
        .get_mut::<Transform>(copied_a)
        .unwrap()
        .translate(Vec3::new(1.0, 2.0, 3.0));
    world.get_mut::<Name>(copied_a).unwrap().0.push_str("'");
    world.update();

    assert_eq!(world.get::<Transform>(a).unwrap().translation, Vec3::ZERO);
    assert_eq!(world.get::<Name>(a).unwrap().0, "A");
    assert_eq!(world.get::<Name>(copied_a).unwrap().0, "A'");
    assert_eq!(
        world.get::<Transform>(copied_a).unwrap().world_position(),
        Vec3::new(1.0, 2.0, 3.0)
    );
}

#[test]
fn test_copies_share_graphics_resources() {
    let mut world = World::new();
    let model = Model::new(Mesh::cube(1.0), ShaderProgram::new("lit"));
    let r = world.spawn((Transform::default(), model.clone()));
    world.attach(r, None).unwrap();
    drop(model);

    let copy = world.deepcopy(r, None).unwrap();
    {
        let source_model = world.get::<Model>(r).unwrap();
        let copy_model = world.get::<Model>(copy).unwrap();
        assert!(source_model.shares_resources_with(&copy_model));
        assert_eq!(source_model.mesh.handle_count(), 2);
    }

    world.deepdelete(r);
    assert_eq!(world.get::<Model>(copy).unwrap().mesh.handle_count(), 1);
}

#[test]
fn test_copy_into_own_subtree() {
    let mut world = World::new();
    let r = spawn(&mut world, "R", None);
    let a = spawn(&mut world, "A", Some(r));
    spawn(&mut world, "B", Some(a));

    let copy = world.deepcopy(r, Some(a)).unwrap();

    assert_eq!(world.len(), 6);
    assert_eq!(world.parent(copy), Some(a));
    assert_eq!(
        outline(&world, r),
        vec![
            (0, "R".to_string()),
            (1, "A".to_string()),
            (2, "B".to_string()),
            (2, "R".to_string()),
            (3, "A".to_string()),
            (4, "B".to_string()),
        ]
    );
}

#[test]
fn test_dead_entities() {
    let mut world = World::new();
    let r = spawn(&mut world, "R", None);
    world.despawn(r).unwrap();

    assert!(world.deepcopy(r, None).is_err());
    assert_eq!(world.deepdelete(r), 0);
}
