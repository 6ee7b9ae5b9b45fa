use nalgebra::Point2;
use puzzle_phys::{noisify_world, Color, NoiseParams, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn base_world() -> World {
    let mut world = World::new((200.0, 200.0), 200.0).unwrap();
    world
        .add_ball("Ball", Point2::new(100.0, 150.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world
        .add_box("Shelf", [40.0, 40.0, 60.0, 44.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();
    world
        .add_box_goal("Goal", [150.0, 0.0, 190.0, 20.0], Color::GREEN)
        .unwrap();
    world.attach_specific_in_goal("Goal", "Ball", 1.0).unwrap();
    world
}

#[test]
fn test_zero_noise_is_identity() {
    let world = base_world();
    let mut rng = StdRng::seed_from_u64(42);
    let noisy = noisify_world(&world, &NoiseParams::default(), &mut rng).unwrap();
    assert!(noisy.moving_noise_applied);
    assert_eq!(world.to_spec(), noisy.world.to_spec());
}

#[test]
fn test_gravity_noise_scales_but_stays_nonnegative() {
    let world = base_world();
    let params = NoiseParams {
        gravity: 0.5,
        ..NoiseParams::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let mut saw_change = false;
    for _ in 0..50 {
        let noisy = noisify_world(&world, &params, &mut rng).unwrap();
        let g = noisy.world.gravity();
        assert!(g >= 0.0, "gravity went negative: {g}");
        if (g - world.gravity()).abs() > 1e-3 {
            saw_change = true;
        }
    }
    assert!(saw_change, "gravity noise never changed gravity");
}

#[test]
fn test_static_noise_moves_touching_objects_together() {
    let mut world = World::new((200.0, 200.0), 200.0).unwrap();
    // Two overlapping static boxes form one group; a third stands alone.
    world
        .add_box("Lower", [40.0, 40.0, 60.0, 50.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();
    world
        .add_box("Upper", [40.0, 49.0, 60.0, 60.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();
    world
        .add_box("Lone", [140.0, 100.0, 160.0, 110.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();

    let params = NoiseParams {
        position_static: 3.0,
        ..NoiseParams::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let noisy = noisify_world(&world, &params, &mut rng).unwrap();

    let offset_of = |w: &World, name: &str| {
        let spec = w.to_spec();
        match &spec.objects[name] {
            puzzle_phys::world::ObjectSpec::Poly { vertices, .. } => vertices[0],
            other => panic!("unexpected spec for {name}: {other:?}"),
        }
    };
    let base_lower = offset_of(&world, "Lower");
    let base_upper = offset_of(&world, "Upper");
    let base_lone = offset_of(&world, "Lone");
    let noisy_lower = offset_of(&noisy.world, "Lower");
    let noisy_upper = offset_of(&noisy.world, "Upper");
    let noisy_lone = offset_of(&noisy.world, "Lone");

    let d_lower = [noisy_lower[0] - base_lower[0], noisy_lower[1] - base_lower[1]];
    let d_upper = [noisy_upper[0] - base_upper[0], noisy_upper[1] - base_upper[1]];
    let d_lone = [noisy_lone[0] - base_lone[0], noisy_lone[1] - base_lone[1]];

    // The touching pair shares one offset draw.
    assert!((d_lower[0] - d_upper[0]).abs() < 1e-4);
    assert!((d_lower[1] - d_upper[1]).abs() < 1e-4);
    // The lone box gets its own draw.
    assert!(
        (d_lone[0] - d_lower[0]).abs() > 1e-4 || (d_lone[1] - d_lower[1]).abs() > 1e-4,
        "independent groups drew the same offset"
    );
}

#[test]
fn test_static_noise_leaves_goals_in_place() {
    let world = base_world();
    let params = NoiseParams {
        position_static: 3.0,
        ..NoiseParams::default()
    };
    let mut rng = StdRng::seed_from_u64(9);
    let noisy = noisify_world(&world, &params, &mut rng).unwrap();

    let spec = world.to_spec();
    let noisy_spec = noisy.world.to_spec();
    assert_eq!(spec.objects["Goal"], noisy_spec.objects["Goal"]);
    // The shelf, by contrast, moved.
    assert_ne!(spec.objects["Shelf"], noisy_spec.objects["Shelf"]);
}

#[test]
fn test_moving_noise_jitters_free_ball() {
    // The ball floats clear of everything, so any jitter is acceptable
    // and the attempt loop should succeed immediately.
    let world = base_world();
    let params = NoiseParams {
        position_moving: 2.0,
        ..NoiseParams::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let noisy = noisify_world(&world, &params, &mut rng).unwrap();
    assert!(noisy.moving_noise_applied);

    let before = world
        .object("Ball")
        .unwrap()
        .position(world.space())
        .unwrap();
    let after = noisy
        .world
        .object("Ball")
        .unwrap()
        .position(noisy.world.space())
        .unwrap();
    assert!(
        (after - before).norm() > 1e-4,
        "moving noise left the ball exactly in place"
    );
    // Velocities come back essentially untouched (zero here).
    let vel = noisy
        .world
        .object("Ball")
        .unwrap()
        .velocity(noisy.world.space())
        .unwrap();
    assert!(vel.norm() < 1e-2, "restored velocity drifted: {vel:?}");
}

#[test]
fn test_moving_noise_does_not_create_new_contacts() {
    let world = base_world();
    let params = NoiseParams {
        position_moving: 0.5,
        ..NoiseParams::default()
    };
    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let noisy = noisify_world(&world, &params, &mut rng).unwrap();
        if !noisy.moving_noise_applied {
            continue;
        }
        // The ball started free of contacts and must stay that way.
        let w = &noisy.world;
        let ball = w.object("Ball").unwrap();
        for name in w.object_names() {
            if name == "Ball" {
                continue;
            }
            let other = w.object(name).unwrap();
            assert!(
                !ball.check_contact(other, w.space()),
                "seed {seed}: noise pushed the ball into {name}"
            );
        }
    }
}

#[test]
fn test_collision_noise_spreads_bounce_outcomes() {
    // Drop the same ball twice under heavy collision noise: separate
    // noisy copies should disagree about where it ends up.
    let mut world = World::new((200.0, 200.0), 200.0).unwrap();
    world
        .add_ball(
            "Ball",
            Point2::new(100.0, 120.0),
            5.0,
            Color::RED,
            None,
            Some(0.9),
            None,
        )
        .unwrap();
    let params = NoiseParams {
        collision_direction: 0.3,
        collision_elasticity: 0.3,
        ..NoiseParams::default()
    };

    let mut rng_a = StdRng::seed_from_u64(100);
    let mut rng_b = StdRng::seed_from_u64(200);
    let mut a = noisify_world(&world, &params, &mut rng_a).unwrap().world;
    let mut b = noisify_world(&world, &params, &mut rng_b).unwrap().world;
    a.step(4.0);
    b.step(4.0);

    let pa = a.object("Ball").unwrap().position(a.space()).unwrap();
    let pb = b.object("Ball").unwrap().position(b.space()).unwrap();
    assert!(
        (pa - pb).norm() > 1e-2,
        "collision noise produced identical trajectories: {pa:?} vs {pb:?}"
    );
}

#[test]
fn test_property_knobs_are_inert() {
    let world = base_world();
    let params = NoiseParams {
        object_friction: 1.0,
        object_density: 1.0,
        object_elasticity: 1.0,
        ..NoiseParams::default()
    };
    let mut rng = StdRng::seed_from_u64(8);
    let noisy = noisify_world(&world, &params, &mut rng).unwrap();
    assert_eq!(world.to_spec(), noisy.world.to_spec());
}
