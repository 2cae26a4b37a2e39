use bevy::math::Vec2;
use bungee::{Constraint, Point, PointArena};

#[test]
fn free_fall_gravity() {
    let mut p = Point::new(Vec2::new(0.0, 100.0));
    let g = Vec2::new(0.0, -9.81);
    let dt = 1.0 / 60.0;

    for _ in 0..60 {
        p.integrate(dt, g, 1.0);
    }

    let expected_y = 100.0 - 0.5 * 9.81;
    assert!(
        (p.pos.y - expected_y).abs() < 1.0,
        "pos.y = {}, expected ~ {}",
        p.pos.y,
        expected_y
    );
}

#[test]
fn pinned_point_stays_fixed() {
    let mut p = Point::pinned(Vec2::new(5.0, 5.0));
    p.apply_impulse(Vec2::new(1000.0, 1000.0), 1.0 / 60.0);
    p.integrate(1.0 / 60.0, Vec2::new(0.0, -980.0), 1.0);
    assert_eq!(p.pos, Vec2::new(5.0, 5.0));
}

#[test]
fn impulse_scales_with_weight() {
    let dt = 1.0 / 60.0;
    let kick = Vec2::new(100.0, 0.0);

    let mut mobile = Point::new(Vec2::ZERO);
    let mut stiff = Point::new(Vec2::ZERO).with_weight(0.25);

    mobile.apply_impulse(kick, dt);
    stiff.apply_impulse(kick, dt);
    mobile.integrate(dt, Vec2::ZERO, 1.0);
    stiff.integrate(dt, Vec2::ZERO, 1.0);

    assert!(stiff.pos.x > 0.0, "stiff point should still move");
    assert!(
        mobile.pos.x > stiff.pos.x,
        "lighter point should move farther: mobile {} vs stiff {}",
        mobile.pos.x,
        stiff.pos.x
    );
}

#[test]
fn gravity_opt_out() {
    let mut p = Point::new(Vec2::new(3.0, 4.0));
    p.gravity_enabled = false;
    for _ in 0..10 {
        p.integrate(1.0 / 60.0, Vec2::new(0.0, -980.0), 1.0);
    }
    assert_eq!(p.pos, Vec2::new(3.0, 4.0));
}

#[test]
fn moving_pin_keeps_implicit_velocity() {
    let mut p = Point::pinned(Vec2::ZERO);
    p.pin_to(Vec2::new(1.0, 0.0));
    p.integrate(1.0 / 60.0, Vec2::ZERO, 1.0);
    assert_eq!(p.pos, Vec2::new(1.0, 0.0));
    assert_eq!(p.velocity(), Vec2::new(1.0, 0.0));
}

#[test]
fn stale_handles_are_inert() {
    let mut arena = PointArena::new();
    let a = arena.insert(Point::new(Vec2::ZERO));
    let b = arena.insert(Point::new(Vec2::new(30.0, 0.0)));

    arena
        .get_mut(a)
        .unwrap()
        .add_constraint(Constraint::distance(b, 10.0));

    // Partner vanishes: the constraint must stop doing anything.
    arena.remove(b);
    assert!(arena.get(b).is_none());

    arena.satisfy_constraints(a);
    assert_eq!(arena.get(a).unwrap().pos, Vec2::ZERO);

    // A fully stale owner is just as harmless.
    arena.remove(a);
    arena.satisfy_constraints(a);
    assert!(arena.is_empty());
}

#[test]
fn slot_reuse_bumps_generation() {
    let mut arena = PointArena::new();
    let a = arena.insert(Point::new(Vec2::ZERO));
    arena.remove(a);
    let b = arena.insert(Point::new(Vec2::new(1.0, 1.0)));

    // b reuses a's slot, but a's handle must not resolve to it.
    assert!(arena.get(a).is_none());
    assert_eq!(arena.get(b).unwrap().pos, Vec2::new(1.0, 1.0));
}

#[test]
fn constraint_graph_edits() {
    let mut arena = PointArena::new();
    let a = arena.insert(Point::new(Vec2::ZERO));
    let b = arena.insert(Point::new(Vec2::new(10.0, 0.0)));
    let c = arena.insert(Point::new(Vec2::new(20.0, 0.0)));

    let p = arena.get_mut(a).unwrap();
    p.add_constraint(Constraint::distance(b, 10.0));
    assert!(p.has_constraint(b));
    assert!(!p.has_constraint(c));
    assert_eq!(p.constraint_to(b).unwrap().rest_length, 10.0);

    assert!(p.change_rest_length(b, 12.0));
    assert_eq!(p.constraint_to(b).unwrap().rest_length, 12.0);

    // Atomic re-point: still exactly one constraint afterwards.
    assert!(p.change_constraint_and_length(b, c, 7.5));
    assert_eq!(p.constraints().len(), 1);
    assert!(!p.has_constraint(b));
    assert_eq!(p.constraint_to(c).unwrap().rest_length, 7.5);

    assert_eq!(p.remove_constraint_to(c), 1);
    assert!(p.constraints().is_empty());
    assert!(p.remove_constraint_at(0).is_none());
}
