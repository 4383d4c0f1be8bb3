//! Contact lifecycle tests against the Rapier backend
//!
//! Gravity is off and bodies are teleported into and out of overlap, so the
//! outcome does not depend on solver tuning.

use void_physics_bridge::prelude::*;

const FRAME: f32 = 1.0 / 60.0;

fn world() -> PhysicsWorld {
    PhysicsWorld::new(PhysicsConfig::default().with_gravity(0.0, 0.0, 0.0)).unwrap()
}

fn spawn_sphere(world: &mut PhysicsWorld, index: u32, desc: BodyDesc) -> Entity {
    let entity = Entity::new(index, 0);
    world.add_body(entity, desc).unwrap();
    world
        .add_collider(entity, ColliderDesc::new(ColliderShape::sphere(1.0)))
        .unwrap();
    entity
}

fn two_spheres(world: &mut PhysicsWorld) -> (Entity, Entity) {
    let a = spawn_sphere(world, 1, BodyDesc::dynamic().with_position(0.0, 0.0, 3.0));
    let b = spawn_sphere(world, 2, BodyDesc::dynamic().with_position(0.0, 0.0, -3.0));
    (a, b)
}

fn overlap(world: &mut PhysicsWorld, a: Entity, b: Entity) {
    world.set_position(a, [0.0, 0.0, 0.1]).unwrap();
    world.set_position(b, [0.0, 0.0, -0.1]).unwrap();
}

fn separate(world: &mut PhysicsWorld, a: Entity, b: Entity) {
    world.set_position(a, [0.0, 0.0, 10.0]).unwrap();
    world.set_position(b, [0.0, 0.0, -10.0]).unwrap();
}

fn kinds(report: &StepReport) -> Vec<ContactEventKind> {
    report.events.iter().map(|e| e.kind).collect()
}

/// INVARIANT: begin, during, end, each once and in order
#[test]
fn begin_during_end_sequence() {
    let mut world = world();
    let (a, b) = two_spheres(&mut world);

    let report = world.step(FRAME).unwrap();
    assert!(report.events.is_empty());

    overlap(&mut world, a, b);
    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::Begin]);
    assert_eq!(report.events[0].entity_a, a);
    assert_eq!(report.events[0].entity_b, b);
    assert_eq!(world.contact_state(a, b), ContactState::Began);

    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::During]);
    assert_eq!(world.contact_state(b, a), ContactState::During);

    separate(&mut world, a, b);
    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::End]);

    let report = world.step(FRAME).unwrap();
    assert!(report.events.is_empty());
    assert!(world.tracked_contacts().is_empty());
}

/// INVARIANT: a zero mask stops new contacts but keeps earlier events
#[test]
fn zero_mask_suppresses_re_overlap() {
    let mut world = world();
    let (a, b) = two_spheres(&mut world);
    world.step(FRAME).unwrap();

    let mut begins = 0;
    let mut count = |report: &StepReport| {
        begins += report
            .events
            .iter()
            .filter(|e| e.kind == ContactEventKind::Begin)
            .count();
    };

    overlap(&mut world, a, b);
    count(&world.step(FRAME).unwrap());
    count(&world.step(FRAME).unwrap());

    world.set_collision_groups(a, CollisionGroups::ALL.with_mask(0));
    world.set_collision_groups(b, CollisionGroups::ALL.with_mask(0));
    count(&world.step(FRAME).unwrap());

    separate(&mut world, a, b);
    count(&world.step(FRAME).unwrap());
    overlap(&mut world, a, b);
    count(&world.step(FRAME).unwrap());
    count(&world.step(FRAME).unwrap());

    assert_eq!(begins, 1);
    assert_eq!(world.contact_state(a, b), ContactState::None);
}

/// INVARIANT: removing a collider mid-contact ends the contact
#[test]
fn removed_collider_ends_contact() {
    let mut world = world();
    let (a, b) = two_spheres(&mut world);
    world.step(FRAME).unwrap();

    overlap(&mut world, a, b);
    world.step(FRAME).unwrap();
    world.step(FRAME).unwrap();
    assert_eq!(world.contact_state(a, b), ContactState::During);

    world.remove_collider(b);
    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::End]);
    assert!(world.tracked_contacts().is_empty());

    // The body is still there, only the collider went away
    assert!(world.lookup_body(b).is_some());
    assert!(world.step(FRAME).unwrap().events.is_empty());
}

/// INVARIANT: removing the whole entity ends the contact too
#[test]
fn removed_entity_ends_contact() {
    let mut world = world();
    let (a, b) = two_spheres(&mut world);
    world.step(FRAME).unwrap();

    overlap(&mut world, a, b);
    world.step(FRAME).unwrap();

    world.remove_entity(a);
    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::End]);
    assert_eq!(world.backend().body_count(), 1);
    assert_eq!(world.backend().collider_count(), 1);
}

/// INVARIANT: two static bodies never report contacts
#[test]
fn static_static_is_silent() {
    let mut world = world();
    let a = spawn_sphere(&mut world, 1, BodyDesc::fixed());
    let b = spawn_sphere(&mut world, 2, BodyDesc::fixed().with_position(0.5, 0.0, 0.0));
    let k = spawn_sphere(&mut world, 3, BodyDesc::kinematic().with_position(10.0, 0.0, 0.0));

    for _ in 0..3 {
        assert!(world.step(FRAME).unwrap().events.is_empty());
    }
    assert_eq!(world.contact_state(a, b), ContactState::None);

    // A kinematic body does generate contacts with a static one
    world.set_position(k, [1.0, 0.0, 0.0]).unwrap();
    let report = world.step(FRAME).unwrap();
    assert!(report
        .events
        .iter()
        .all(|e| e.kind == ContactEventKind::Begin && e.involves(k)));
    assert_eq!(report.events.len(), 2);
}

/// INVARIANT: sensors report overlaps through the same lifecycle
#[test]
fn sensor_overlap_lifecycle() {
    let mut world = world();
    let trigger = Entity::new(1, 0);
    world
        .add_collider(trigger, ColliderDesc::sensor(ColliderShape::sphere(2.0)))
        .unwrap();
    let ball = spawn_sphere(&mut world, 2, BodyDesc::dynamic().with_position(0.0, 10.0, 0.0));
    world.step(FRAME).unwrap();

    world.set_position(ball, [0.0, 0.5, 0.0]).unwrap();
    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::Begin]);
    assert_eq!(report.events[0].entity_a, trigger);

    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::During]);

    world.set_position(ball, [0.0, 10.0, 0.0]).unwrap();
    let report = world.step(FRAME).unwrap();
    assert_eq!(kinds(&report), vec![ContactEventKind::End]);
}
