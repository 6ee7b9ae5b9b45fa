use nalgebra::{Point2, Vector2};
use puzzle_phys::{
    filter_collision_events, Color, CollisionPhase, Error, World, WALL_NAMES,
};

fn closed_world() -> World {
    World::new((200.0, 200.0), 200.0).unwrap()
}

#[test]
fn test_closed_world_has_boundary_walls() {
    let world = closed_world();
    for wall in WALL_NAMES {
        let obj = world.object(wall).unwrap();
        assert!(obj.is_static(), "wall {wall} should be static");
    }
}

#[test]
fn test_open_world_has_no_walls() {
    let world = World::with_config(
        (200.0, 200.0),
        200.0,
        [false; 4],
        0.01,
        puzzle_phys::WorldDefaults::default(),
    )
    .unwrap();
    assert!(world.object("_LeftWall").is_err());
    assert_eq!(world.object_names().count(), 0);
}

#[test]
fn test_duplicate_names_are_rejected() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 100.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    let err = world
        .add_ball("Ball", Point2::new(50.0, 50.0), 5.0, Color::RED, None, None, None)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)));
}

#[test]
fn test_unknown_object_lookup_fails() {
    let world = closed_world();
    assert!(matches!(
        world.object("Nothing"),
        Err(Error::UnknownObject(_))
    ));
}

#[test]
fn test_static_objects_have_no_kinematics() {
    let mut world = closed_world();
    world
        .add_box("Shelf", [40.0, 40.0, 60.0, 44.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();
    let shelf = world.object("Shelf").unwrap();
    assert!(shelf.is_static());
    assert!(matches!(
        shelf.position(world.space()),
        Err(Error::StaticState(_))
    ));
    assert!(matches!(
        shelf.velocity(world.space()),
        Err(Error::StaticState(_))
    ));
    assert_eq!(shelf.mass(world.space()), 0.0);
}

#[test]
fn test_gravity_pulls_dynamic_ball_down() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 150.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.step(0.5);
    let pos = world
        .object("Ball")
        .unwrap()
        .position(world.space())
        .unwrap();
    assert!(pos.y < 150.0, "ball did not fall: y = {}", pos.y);
    assert!((world.time() - 0.5).abs() < 1e-5);
}

#[test]
fn test_falling_ball_logs_collision_with_floor() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 50.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.step(3.0);

    let events = world.collision_events();
    let hit_floor = events.iter().any(|e| {
        e.phase == CollisionPhase::Begin
            && ((e.first == "Ball" && e.second == "_BottomWall")
                || (e.first == "_BottomWall" && e.second == "Ball"))
    });
    assert!(hit_floor, "no Ball/_BottomWall begin event in {events:?}");

    let intervals = filter_collision_events(events, 0.2001);
    assert!(intervals
        .iter()
        .any(|iv| iv.first == "Ball" || iv.second == "Ball"));

    world.reset_collisions();
    assert!(world.collision_events().is_empty());
}

#[test]
fn test_wall_on_wall_contacts_are_not_logged() {
    // Boundary walls overlap at the corners but are all static.
    let mut world = closed_world();
    world.step(0.1);
    assert!(world.collision_events().is_empty());
}

#[test]
fn test_check_collision_probe() {
    let mut world = closed_world();
    world
        .add_box("Block", [40.0, 40.0, 60.0, 60.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();

    let square = vec![
        Point2::new(-5.0, -5.0),
        Point2::new(-5.0, 5.0),
        Point2::new(5.0, 5.0),
        Point2::new(5.0, -5.0),
    ];
    assert!(world
        .check_collision(Point2::new(50.0, 50.0), &square)
        .unwrap());
    assert!(!world
        .check_collision(Point2::new(150.0, 150.0), &square)
        .unwrap());

    assert!(world.check_circle_collision(Point2::new(55.0, 55.0), 3.0));
    assert!(!world.check_circle_collision(Point2::new(150.0, 150.0), 3.0));
}

#[test]
fn test_probe_leaves_no_trace() {
    let mut world = closed_world();
    let square = vec![
        Point2::new(-5.0, -5.0),
        Point2::new(-5.0, 5.0),
        Point2::new(5.0, 5.0),
        Point2::new(5.0, -5.0),
    ];
    // Repeated probes at the same clear spot keep giving the same answer.
    for _ in 0..3 {
        assert!(!world
            .check_collision(Point2::new(100.0, 100.0), &square)
            .unwrap());
    }
}

#[test]
fn test_blockers_block_placement_but_not_motion() {
    let mut world = closed_world();
    world
        .add_block("NoGo", [90.0, 90.0, 110.0, 110.0], Color::NONE)
        .unwrap();

    // Placement over the blocker is rejected.
    let err = world
        .place_ball("Tool", Point2::new(100.0, 100.0), 5.0, Color::BLUE, None, None, None)
        .unwrap_err();
    assert!(matches!(err, Error::PlacementCollision));

    // A ball dropped from above falls straight through the blocker.
    world
        .add_ball("Ball", Point2::new(100.0, 150.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.step(1.0);
    let pos = world
        .object("Ball")
        .unwrap()
        .position(world.space())
        .unwrap();
    assert!(pos.y < 90.0, "ball stopped at y = {}", pos.y);
}

#[test]
fn test_placement_over_existing_object_fails() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 100.0), 10.0, Color::RED, None, None, None)
        .unwrap();
    let err = world
        .place_ball("Tool", Point2::new(105.0, 100.0), 10.0, Color::BLUE, None, None, None)
        .unwrap_err();
    assert!(matches!(err, Error::PlacementCollision));

    // A clear spot works, and the object lands in the registry.
    world
        .place_ball("Tool", Point2::new(50.0, 100.0), 10.0, Color::BLUE, None, None, None)
        .unwrap();
    assert!(!world.object("Tool").unwrap().is_static());
}

#[test]
fn test_kick_applies_impulse() {
    let mut world = World::with_config(
        (200.0, 200.0),
        0.0,
        [true; 4],
        0.01,
        puzzle_phys::WorldDefaults::default(),
    )
    .unwrap();
    world
        .add_ball("Ball", Point2::new(100.0, 100.0), 5.0, Color::RED, None, None, None)
        .unwrap();

    // Kicking at a point off the object is rejected.
    assert!(world
        .kick("Ball", Vector2::new(100.0, 0.0), Point2::new(0.0, 0.0))
        .is_err());

    world
        .kick("Ball", Vector2::new(10000.0, 0.0), Point2::new(100.0, 100.0))
        .unwrap();
    let vel = world
        .object("Ball")
        .unwrap()
        .velocity(world.space())
        .unwrap();
    assert!(vel.x > 0.0, "impulse did not speed the ball up: {vel:?}");

    // The unchecked variant accepts points off the object.
    world
        .kick_unchecked("Ball", Vector2::new(0.0, 10000.0), Point2::new(0.0, 0.0))
        .unwrap();
    let vel = world
        .object("Ball")
        .unwrap()
        .velocity(world.space())
        .unwrap();
    assert!(vel.y > 0.0, "unchecked impulse had no effect: {vel:?}");

    assert!(matches!(
        world.kick("Ghost", Vector2::zeros(), Point2::origin()),
        Err(Error::UnknownObject(_))
    ));
}

#[test]
fn test_distance_from_point_is_negative_inside() {
    let mut world = closed_world();
    world
        .add_box_goal("Goal", [80.0, 0.0, 120.0, 30.0], Color::GREEN)
        .unwrap();
    let goal = world.object("Goal").unwrap();

    let inside = goal.distance_from_point(world.space(), Point2::new(100.0, 9.9));
    assert!(
        (inside + 9.9).abs() < 1e-3,
        "inside point should be -9.9 from the boundary, got {inside}"
    );

    let outside = goal.distance_from_point(world.space(), Point2::new(100.0, 40.0));
    assert!(
        (outside - 10.0).abs() < 1e-3,
        "outside point should be +10 from the boundary, got {outside}"
    );
}

#[test]
fn test_placed_pair_contacts_are_not_routed() {
    let mut world = closed_world();
    world
        .place_ball("ToolA", Point2::new(100.0, 40.0), 5.0, Color::BLUE, None, None, None)
        .unwrap();
    world
        .place_ball("ToolB", Point2::new(100.0, 60.0), 5.0, Color::BLUE, None, None, None)
        .unwrap();
    // ToolB lands on ToolA, ToolA lands on the floor.
    world.step(3.0);

    let events = world.collision_events();
    assert!(
        !events.iter().any(|e| {
            (e.first == "ToolA" && e.second == "ToolB")
                || (e.first == "ToolB" && e.second == "ToolA")
        }),
        "placed-placed contact was logged: {events:?}"
    );
    // Placed-on-solid contacts still route.
    assert!(
        events
            .iter()
            .any(|e| e.first == "ToolA" || e.second == "ToolA"),
        "placed-solid contact missing from {events:?}"
    );
}

#[test]
fn test_collision_begin_end_and_goal_hooks_fire() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 40.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world
        .add_box_goal("Goal", [80.0, 0.0, 120.0, 30.0], Color::GREEN)
        .unwrap();

    let begins = Rc::new(RefCell::new(Vec::new()));
    let ends = Rc::new(RefCell::new(Vec::new()));
    let entries = Rc::new(RefCell::new(Vec::new()));
    let begin_log = begins.clone();
    let end_log = ends.clone();
    let entry_log = entries.clone();
    world.set_solid_collision_begin(move |a, b| {
        begin_log.borrow_mut().push((a.to_owned(), b.to_owned()));
    });
    world.set_solid_collision_end(move |a, b| {
        end_log.borrow_mut().push((a.to_owned(), b.to_owned()));
    });
    world.set_goal_collision_begin(move |obj, goal| {
        entry_log.borrow_mut().push((obj.to_owned(), goal.to_owned()));
    });

    world.step(3.0);

    let floor_pair = |(a, b): &(String, String)| {
        (a == "Ball" && b == "_BottomWall") || (a == "_BottomWall" && b == "Ball")
    };
    assert!(begins.borrow().iter().any(floor_pair), "{:?}", begins.borrow());
    // The ball bounces, so at least one separation is reported.
    assert!(ends.borrow().iter().any(floor_pair), "{:?}", ends.borrow());
    assert!(
        entries
            .borrow()
            .iter()
            .any(|(obj, goal)| obj == "Ball" && goal == "Goal"),
        "goal entry hook never fired: {:?}",
        entries.borrow()
    );
}

#[test]
fn test_specific_in_goal_win_via_simulation() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 80.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world
        .add_box_goal("Goal", [80.0, 0.0, 120.0, 30.0], Color::GREEN)
        .unwrap();
    world.attach_specific_in_goal("Goal", "Ball", 1.0).unwrap();

    use std::cell::Cell;
    use std::rc::Rc;
    let fired = Rc::new(Cell::new(0usize));
    let counter = fired.clone();
    world.set_win_callback(move || counter.set(counter.get() + 1));

    let won_at = world.run_until(10.0, None);
    assert!(won_at.is_some(), "ball never settled into the goal");
    assert!(world.check_end());
    assert!(fired.get() > 0, "win callback never fired");
    assert!(
        world.distance_to_goal(
            world
                .object("Ball")
                .unwrap()
                .position(world.space())
                .unwrap()
        )
        .unwrap()
            < 1e-3
    );
}

#[test]
fn test_any_touch_win_via_simulation() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 60.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.attach_any_touch("Ball", 0.5).unwrap();

    let won_at = world.run_until(10.0, None);
    assert!(won_at.is_some(), "ball never rested on the floor");
}

#[test]
fn test_attach_validates_names() {
    let mut world = closed_world();
    assert!(matches!(
        world.attach_specific_in_goal("NoGoal", "NoBall", 1.0),
        Err(Error::UnknownObject(_))
    ));
    assert!(matches!(
        world.attach_any_touch("NoBall", 1.0),
        Err(Error::UnknownObject(_))
    ));
}

#[test]
fn test_container_catches_ball() {
    let mut world = closed_world();
    // U-shaped basin under the ball.
    world
        .add_container(
            "Cup",
            vec![
                Point2::new(80.0, 60.0),
                Point2::new(80.0, 20.0),
                Point2::new(120.0, 20.0),
                Point2::new(120.0, 60.0),
            ],
            5.0,
            Color::GREEN,
            Color::BLACK,
            Some(0.0),
            None,
            None,
        )
        .unwrap();
    world
        .add_ball("Ball", Point2::new(100.0, 120.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.attach_any_in_goal("Cup", 1.0, vec![]).unwrap();

    let won_at = world.run_until(10.0, None);
    assert!(won_at.is_some(), "ball never came to rest in the container");

    let ball_pos = world
        .object("Ball")
        .unwrap()
        .position(world.space())
        .unwrap();
    assert!(
        world.object("Cup").unwrap().point_in(world.space(), ball_pos),
        "ball at {ball_pos:?} is outside the basin"
    );
}

#[test]
fn test_solve_hooks_see_contacting_pairs() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 20.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    // Let the ball come to rest on the floor first.
    world.step(3.0);

    let pre = Rc::new(RefCell::new(Vec::new()));
    let post = Rc::new(RefCell::new(Vec::new()));
    let pre_log = pre.clone();
    let post_log = post.clone();
    world.add_pre_solve_hook(move |a, b| {
        pre_log.borrow_mut().push((a.to_owned(), b.to_owned()));
    });
    world.add_post_solve_hook(move |a, b| {
        post_log.borrow_mut().push((a.to_owned(), b.to_owned()));
    });

    world.step(0.1);

    let expected = ("Ball".to_owned(), "_BottomWall".to_owned());
    assert!(
        pre.borrow().contains(&expected),
        "pre-solve hooks saw {:?}",
        pre.borrow()
    );
    assert!(
        post.borrow().contains(&expected),
        "post-solve hooks saw {:?}",
        post.borrow()
    );
    // Resting contact persists, so the hooks fire on every sub-step.
    assert!(pre.borrow().len() >= 10, "only {} pre calls", pre.borrow().len());
}

#[test]
fn test_spec_round_trip_preserves_scene() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 150.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world
        .add_box("Shelf", [40.0, 40.0, 60.0, 44.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();
    world
        .add_segment(
            "Bar",
            Point2::new(10.0, 100.0),
            Point2::new(40.0, 110.0),
            4.0,
            Color::GREY,
            Some(0.0),
            None,
            None,
        )
        .unwrap();
    world
        .add_box_goal("Goal", [150.0, 0.0, 190.0, 20.0], Color::GREEN)
        .unwrap();
    world
        .add_block("NoGo", [0.0, 150.0, 30.0, 180.0], Color::NONE)
        .unwrap();
    world.attach_specific_in_goal("Goal", "Ball", 1.5).unwrap();

    let spec = world.to_spec();
    let rebuilt = World::from_spec(&spec).unwrap();

    assert_eq!(rebuilt.dims(), world.dims());
    assert_eq!(rebuilt.gravity(), world.gravity());
    assert_eq!(rebuilt.basic_timestep(), world.basic_timestep());
    assert_eq!(rebuilt.time(), 0.0);
    let names_a: Vec<_> = world.object_names().collect();
    let names_b: Vec<_> = rebuilt.object_names().collect();
    assert_eq!(names_a, names_b);
    assert!(rebuilt.blocker("NoGo").is_ok());
    assert_eq!(
        rebuilt.goal_condition().unwrap().type_name(),
        "SpecificInGoal"
    );

    // The scene is static-and-resting, so a second snapshot is identical.
    assert_eq!(spec, rebuilt.to_spec());
}

#[test]
fn test_json_round_trip() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 150.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.attach_any_touch("Ball", 0.5).unwrap();

    let json = world.to_json().unwrap();
    let rebuilt = World::from_json(&json).unwrap();
    assert_eq!(world.to_spec(), rebuilt.to_spec());
}

#[test]
fn test_copy_resets_time_and_events() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 50.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world.step(3.0);
    assert!(world.time() > 0.0);
    assert!(!world.collision_events().is_empty());

    let copy = world.copy().unwrap();
    assert_eq!(copy.time(), 0.0);
    assert!(copy.collision_events().is_empty());
    // The copy keeps the settled ball pose.
    let a = world.object("Ball").unwrap().position(world.space()).unwrap();
    let b = copy.object("Ball").unwrap().position(copy.space()).unwrap();
    assert!((a - b).norm() < 1e-3);
}

#[test]
fn test_dynamic_objects_listing() {
    let mut world = closed_world();
    world
        .add_ball("Ball", Point2::new(100.0, 100.0), 5.0, Color::RED, None, None, None)
        .unwrap();
    world
        .add_box("Shelf", [40.0, 40.0, 60.0, 44.0], Color::BLACK, Some(0.0), None, None)
        .unwrap();
    let dynamics = world.dynamic_objects();
    assert_eq!(dynamics.len(), 1);
    assert_eq!(dynamics[0].name, "Ball");
}
