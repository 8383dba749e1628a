//! Ordering guarantees of the hierarchy under arbitrary attach/detach edits

use proptest::prelude::*;
use replicator::config::SceneConfig;
use glam::Vec3;
use replicator::core::entity::{Entity, HierarchyError, OrderStrategy, Transform, World};
use std::collections::HashMap;

const ENTITY_COUNT: usize = 8;

#[derive(Debug, Clone)]
enum Edit {
    Attach(usize, Option<usize>),
    Detach(usize),
    Update,
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0..ENTITY_COUNT, proptest::option::of(0..ENTITY_COUNT))
            .prop_map(|(entity, parent)| Edit::Attach(entity, parent)),
        2 => (0..ENTITY_COUNT).prop_map(Edit::Detach),
        1 => Just(Edit::Update),
    ]
}

fn world_with(strategy: OrderStrategy) -> (World, Vec<Entity>) {
    let mut world = World::with_config(SceneConfig {
        order_strategy: strategy,
        ..SceneConfig::default()
    });
    let entities: Vec<Entity> = (0..ENTITY_COUNT)
        .map(|_| world.spawn((Transform::default(),)))
        .collect();
    for &entity in &entities {
        world.attach(entity, None).unwrap();
    }
    (world, entities)
}

fn apply(world: &mut World, entities: &[Entity], edits: &[Edit]) {
    for edit in edits {
        match *edit {
            Edit::Attach(entity, parent) => {
                // Cycles are rejected and leave the world untouched
                let _ = world.attach(entities[entity], parent.map(|p| entities[p]));
            }
            Edit::Detach(entity) => {
                world.detach(entities[entity]);
            }
            Edit::Update => {
                world.update();
            }
        }
    }
    world.update();
}

fn positions(world: &World) -> HashMap<Entity, usize> {
    world
        .order()
        .iter()
        .enumerate()
        .map(|(index, &entity)| (entity, index))
        .collect()
}

proptest! {
    #[test]
    fn parents_precede_children(edits in prop::collection::vec(edit(), 0..40)) {
        let (mut world, entities) = world_with(OrderStrategy::DepthFirst);
        apply(&mut world, &entities, &edits);

        let position = positions(&world);
        prop_assert_eq!(position.len(), ENTITY_COUNT);
        for &entity in &entities {
            if let Some(parent) = world.parent(entity) {
                prop_assert!(position[&parent] < position[&entity]);
            }
        }
        prop_assert!(world.validate().is_empty());
    }

    #[test]
    fn siblings_follow_list_order(edits in prop::collection::vec(edit(), 0..40)) {
        let (mut world, entities) = world_with(OrderStrategy::DepthFirst);
        apply(&mut world, &entities, &edits);

        let position = positions(&world);
        for &entity in &entities {
            let kids: Vec<usize> = world.children(entity).map(|c| position[&c]).collect();
            prop_assert!(kids.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn strategies_agree(edits in prop::collection::vec(edit(), 0..40)) {
        let (mut dfs, dfs_entities) = world_with(OrderStrategy::DepthFirst);
        let (mut sorted, sorted_entities) = world_with(OrderStrategy::Comparator);
        apply(&mut dfs, &dfs_entities, &edits);
        apply(&mut sorted, &sorted_entities, &edits);

        let index_of = |entities: &[Entity], entity: Entity| {
            entities.iter().position(|&e| e == entity)
        };
        let dfs_order: Vec<_> = dfs.order().iter().map(|&e| index_of(&dfs_entities, e)).collect();
        let sorted_order: Vec<_> = sorted
            .order()
            .iter()
            .map(|&e| index_of(&sorted_entities, e))
            .collect();
        prop_assert_eq!(dfs_order, sorted_order);
    }

    #[test]
    fn reattach_moves_to_tail(count in 2..6usize, pick in 0..6usize) {
        let mut world = World::new();
        let parent = world.spawn((Transform::default(),));
        world.attach(parent, None).unwrap();
        let kids: Vec<Entity> = (0..count)
            .map(|_| {
                let child = world.spawn((Transform::default(),));
                world.attach(child, Some(parent)).unwrap();
                child
            })
            .collect();
        let moved = kids[pick % count];

        world.detach(moved);
        world.attach(moved, Some(parent)).unwrap();

        let mut expected: Vec<Entity> = kids.iter().copied().filter(|&k| k != moved).collect();
        expected.push(moved);
        prop_assert_eq!(world.children(parent).collect::<Vec<_>>(), expected.clone());

        world.update();
        prop_assert_eq!(&world.order()[1..], expected.as_slice());
    }
}

#[test]
fn test_reparenting_moves_whole_subtree() {
    let mut world = World::new();
    let [a, b, c, d] = [(); 4].map(|_| world.spawn((Transform::default(),)));
    world.attach(a, None).unwrap();
    world.attach(b, None).unwrap();
    world.attach(c, Some(a)).unwrap();
    world.attach(d, Some(c)).unwrap();
    world.update();
    assert_eq!(world.order(), &[a, c, d, b]);

    world.attach(c, Some(b)).unwrap();
    world.update();

    assert_eq!(world.order(), &[a, b, c, d]);
    assert_eq!(world.children(b).collect::<Vec<_>>(), vec![c]);
    assert_eq!(world.children(c).collect::<Vec<_>>(), vec![d]);
    assert!(world.validate().is_empty());
}

#[test]
fn test_order_is_not_rebuilt_without_changes() {
    let mut world = World::new();
    let root = world.spawn((Transform::default(),));
    world.attach(root, None).unwrap();

    assert!(world.refresh_order());
    assert!(!world.refresh_order());

    let child = world.spawn((Transform::default(),));
    world.attach(child, Some(root)).unwrap();
    assert!(world.refresh_order());
    assert_eq!(world.order(), &[root, child]);
}

#[test]
fn test_self_attach_is_a_cycle() {
    let mut world = World::new();
    let lonely = world.spawn((Transform::default(),));
    assert!(world.attach(lonely, Some(lonely)).is_err());
}

const DEEP_CAP: usize = 256;

/// Chain reaching exactly `DEEP_CAP` levels below its root, plus a second root
fn deep_world(strategy: OrderStrategy) -> (World, Vec<Entity>, Entity) {
    let mut world = World::with_config(SceneConfig {
        order_strategy: strategy,
        max_hierarchy_depth: DEEP_CAP,
        ..SceneConfig::default()
    });
    let chain: Vec<Entity> = (0..=DEEP_CAP)
        .map(|_| world.spawn((Transform::from_translation(Vec3::X),)))
        .collect();
    world.attach(chain[0], None).unwrap();
    for pair in chain.windows(2) {
        world.attach(pair[1], Some(pair[0])).unwrap();
    }
    let other = world.spawn((Transform::default(),));
    world.attach(other, None).unwrap();
    (world, chain, other)
}

#[test]
fn test_chain_at_depth_cap_orders_and_propagates() {
    for strategy in [OrderStrategy::DepthFirst, OrderStrategy::Comparator] {
        let (mut world, chain, other) = deep_world(strategy);
        world.update();

        let mut expected = chain.clone();
        expected.push(other);
        assert_eq!(world.order(), expected.as_slice(), "{strategy:?}");

        let leaf = world.get::<Transform>(chain[DEEP_CAP]).unwrap().world_position();
        assert!((leaf.x - (DEEP_CAP + 1) as f32).abs() < 1e-3);
    }
}

#[test]
fn test_edits_past_depth_cap_leave_order_intact() {
    for strategy in [OrderStrategy::DepthFirst, OrderStrategy::Comparator] {
        let (mut world, chain, other) = deep_world(strategy);
        world.update();
        let before = world.order().to_vec();
        let leaf = chain[DEEP_CAP];

        assert_eq!(
            world.attach(chain[0], Some(leaf)),
            Err(HierarchyError::CycleDetected { entity: chain[0], parent: leaf })
        );
        assert_eq!(
            world.attach(other, Some(leaf)),
            Err(HierarchyError::DepthExceeded {
                entity: other,
                parent: Some(leaf),
                max_depth: DEEP_CAP,
            })
        );
        // Moving the head of the chain under another root would push the leaf too deep
        assert!(world.attach(chain[0], Some(other)).is_err());

        world.mark_hierarchy_changed();
        world.update();
        assert_eq!(world.order(), before.as_slice(), "{strategy:?}");
        assert!(world.validate().is_empty());
    }
}

#[test]
fn test_default_depth_cap_rejects_cycle_on_long_chain() {
    let mut world = World::new();
    let cap = world.config().max_hierarchy_depth;
    let nodes: Vec<Entity> = (0..cap + 50)
        .map(|_| world.spawn((Transform::default(),)))
        .collect();
    world.attach(nodes[0], None).unwrap();

    let mut deepest = 0;
    for i in 1..nodes.len() {
        match world.attach(nodes[i], Some(nodes[i - 1])) {
            Ok(_) => deepest = i,
            Err(err) => {
                assert!(matches!(err, HierarchyError::DepthExceeded { .. }));
                break;
            }
        }
    }
    assert_eq!(deepest, cap);

    assert!(world.attach(nodes[0], Some(nodes[deepest])).is_err());
    assert!(world.is_ancestor_of(nodes[0], nodes[deepest]));
    world.update();
    let positions = positions(&world);
    for pair in nodes[..=deepest].windows(2) {
        assert!(positions[&pair[0]] < positions[&pair[1]]);
    }
    assert!(world.validate().is_empty());
}
