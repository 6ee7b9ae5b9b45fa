//! The puzzle world: object registry, stepping, and collision routing.

mod spec;

pub use self::spec::{BlockSpec, ColorSpec, DefaultsSpec, GoalSpec, ObjectSpec, WorldSpec};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use nalgebra::{Point2, Vector2};
use rapier2d::prelude::{ColliderBuilder, ColliderHandle, SharedShape};

use crate::conditions::GoalCondition;
use crate::engine::{CollisionCategory, CollisionNoise, RawContact, Space};
use crate::error::Error;
use crate::events::{CollisionEvent, CollisionPhase};
use crate::objects::{Color, Material, Object};
use crate::Result;

/// Boundary walls created for closed world edges, in `closed_ends` order.
pub const WALL_NAMES: [&str; 4] = ["_LeftWall", "_BottomWall", "_RightWall", "_TopWall"];

/// Default sub-step length in seconds.
pub const BASIC_TIMESTEP: f32 = 0.01;

/// Duration of the throwaway step used to flush engine transforms before
/// geometric queries.
const REFRESH_DT: f32 = 1e-6;

/// User hook invoked with the names of a contacting solid pair.
type ContactHook = Box<dyn FnMut(&str, &str)>;

/// Material and color fallbacks applied when an object spec omits them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldDefaults {
    pub density: f32,
    pub elasticity: f32,
    pub friction: f32,
    pub color: Color,
    pub bk_color: Color,
}

impl Default for WorldDefaults {
    fn default() -> Self {
        Self {
            density: 1.0,
            elasticity: 0.5,
            friction: 0.5,
            color: Color::BLACK,
            bk_color: Color::WHITE,
        }
    }
}

/// A bounded 2D scene stepped in fixed sub-steps, with named objects,
/// collision logging, and an optional win condition.
pub struct World {
    dims: (f32, f32),
    bts: f32,
    time: f32,
    defaults: WorldDefaults,
    pub(crate) space: Space,
    pub(crate) objects: BTreeMap<String, Object>,
    pub(crate) blockers: BTreeMap<String, Object>,
    /// Collider handle to owning object or blocker name
    lookup: HashMap<ColliderHandle, String>,
    pub(crate) goal_cond: Option<GoalCondition>,
    win_callback: Option<Box<dyn FnMut()>>,
    pre_solve_hooks: Vec<ContactHook>,
    post_solve_hooks: Vec<ContactHook>,
    solid_begin_hook: Option<ContactHook>,
    solid_end_hook: Option<ContactHook>,
    goal_begin_hook: Option<ContactHook>,
    goal_end_hook: Option<ContactHook>,
    collision_events: Vec<CollisionEvent>,
}

impl World {
    /// A closed world with default timestep and material fallbacks.
    pub fn new(dims: (f32, f32), gravity: f32) -> Result<World> {
        Self::with_config(
            dims,
            gravity,
            [true; 4],
            BASIC_TIMESTEP,
            WorldDefaults::default(),
        )
    }

    /// `closed_ends` selects which boundary walls to create, in
    /// left/bottom/right/top order.
    pub fn with_config(
        dims: (f32, f32),
        gravity: f32,
        closed_ends: [bool; 4],
        basic_timestep: f32,
        defaults: WorldDefaults,
    ) -> Result<World> {
        if basic_timestep <= 0.0 {
            return Err(Error::InvalidSpec(
                "basic timestep must be positive".into(),
            ));
        }
        let mut space = Space::new();
        space.set_gravity(gravity);
        let mut world = World {
            dims,
            bts: basic_timestep,
            time: 0.0,
            defaults,
            space,
            objects: BTreeMap::new(),
            blockers: BTreeMap::new(),
            lookup: HashMap::new(),
            goal_cond: None,
            win_callback: None,
            pre_solve_hooks: Vec::new(),
            post_solve_hooks: Vec::new(),
            solid_begin_hook: None,
            solid_end_hook: None,
            goal_begin_hook: None,
            goal_end_hook: None,
            collision_events: Vec::new(),
        };

        let (w, h) = dims;
        let col = defaults.color;
        if closed_ends[0] {
            world.add_box(WALL_NAMES[0], [-1.0, -1.0, 1.0, h + 1.0], col, Some(0.0), None, None)?;
        }
        if closed_ends[1] {
            world.add_box(WALL_NAMES[1], [-1.0, -1.0, w + 1.0, 1.0], col, Some(0.0), None, None)?;
        }
        if closed_ends[2] {
            world.add_box(WALL_NAMES[2], [w - 1.0, -1.0, w + 1.0, h + 1.0], col, Some(0.0), None, None)?;
        }
        if closed_ends[3] {
            world.add_box(WALL_NAMES[3], [-1.0, h - 1.0, w + 1.0, h + 1.0], col, Some(0.0), None, None)?;
        }
        Ok(world)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn dims(&self) -> (f32, f32) {
        self.dims
    }

    pub fn basic_timestep(&self) -> f32 {
        self.bts
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn gravity(&self) -> f32 {
        self.space.gravity()
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.space.set_gravity(gravity);
    }

    pub fn defaults(&self) -> WorldDefaults {
        self.defaults
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn object(&self, name: &str) -> Result<&Object> {
        self.objects
            .get(name)
            .ok_or_else(|| Error::UnknownObject(name.to_owned()))
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn blocker(&self, name: &str) -> Result<&Object> {
        self.blockers
            .get(name)
            .ok_or_else(|| Error::UnknownObject(name.to_owned()))
    }

    pub fn blocker_names(&self) -> impl Iterator<Item = &str> {
        self.blockers.keys().map(String::as_str)
    }

    /// Objects with a rigid body, in name order.
    pub fn dynamic_objects(&self) -> Vec<&Object> {
        self.objects.values().filter(|o| !o.is_static()).collect()
    }

    pub fn goal_condition(&self) -> Option<&GoalCondition> {
        self.goal_cond.as_ref()
    }

    pub fn collision_events(&self) -> &[CollisionEvent] {
        &self.collision_events
    }

    pub fn reset_collisions(&mut self) {
        self.collision_events.clear();
    }

    // ------------------------------------------------------------------
    // Building the scene
    // ------------------------------------------------------------------

    fn material(
        &self,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Material {
        Material {
            density: density.unwrap_or(self.defaults.density),
            elasticity: elasticity.unwrap_or(self.defaults.elasticity),
            friction: friction.unwrap_or(self.defaults.friction),
        }
    }

    fn ensure_free_name(&self, name: &str) -> Result<()> {
        if self.objects.contains_key(name) {
            return Err(Error::DuplicateName(name.to_owned()));
        }
        Ok(())
    }

    fn register_object(&mut self, obj: Object) {
        for handle in obj.all_handles() {
            self.lookup.insert(handle, obj.name.clone());
        }
        self.objects.insert(obj.name.clone(), obj);
    }

    fn register_blocker(&mut self, obj: Object) {
        for handle in obj.all_handles() {
            self.lookup.insert(handle, obj.name.clone());
        }
        self.blockers.insert(obj.name.clone(), obj);
    }

    pub fn add_ball(
        &mut self,
        name: &str,
        position: Point2<f32>,
        radius: f32,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        let material = self.material(density, elasticity, friction);
        let obj = Object::ball(
            &mut self.space,
            name,
            position,
            radius,
            material,
            color,
            CollisionCategory::Solid,
        )?;
        self.register_object(obj);
        Ok(())
    }

    pub fn add_poly(
        &mut self,
        name: &str,
        vertices: Vec<Point2<f32>>,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        let material = self.material(density, elasticity, friction);
        let obj = Object::poly(
            &mut self.space,
            name,
            vertices,
            material,
            color,
            CollisionCategory::Solid,
        )?;
        self.register_object(obj);
        Ok(())
    }

    /// Axis-aligned box from `[left, bottom, right, top]` bounds.
    pub fn add_box(
        &mut self,
        name: &str,
        bounds: [f32; 4],
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        let [l, b, r, t] = bounds;
        let vertices = vec![
            Point2::new(l, b),
            Point2::new(l, t),
            Point2::new(r, t),
            Point2::new(r, b),
        ];
        self.add_poly(name, vertices, color, density, elasticity, friction)
    }

    pub fn add_segment(
        &mut self,
        name: &str,
        p1: Point2<f32>,
        p2: Point2<f32>,
        width: f32,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        let material = self.material(density, elasticity, friction);
        let obj = Object::segment(
            &mut self.space,
            name,
            p1,
            p2,
            width,
            material,
            color,
            CollisionCategory::Solid,
        )?;
        self.register_object(obj);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_container(
        &mut self,
        name: &str,
        points: Vec<Point2<f32>>,
        width: f32,
        inner_color: Color,
        outer_color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        let material = self.material(density, elasticity, friction);
        let obj = Object::container(
            &mut self.space,
            name,
            points,
            width,
            material,
            outer_color,
            inner_color,
            CollisionCategory::Solid,
        )?;
        self.register_object(obj);
        Ok(())
    }

    pub fn add_compound(
        &mut self,
        name: &str,
        polys: Vec<Vec<Point2<f32>>>,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        let material = self.material(density, elasticity, friction);
        let obj = Object::compound(
            &mut self.space,
            name,
            polys,
            material,
            color,
            CollisionCategory::Solid,
        )?;
        self.register_object(obj);
        Ok(())
    }

    pub fn add_poly_goal(
        &mut self,
        name: &str,
        vertices: Vec<Point2<f32>>,
        color: Color,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        let obj = Object::goal(&mut self.space, name, vertices, color)?;
        self.register_object(obj);
        Ok(())
    }

    pub fn add_box_goal(&mut self, name: &str, bounds: [f32; 4], color: Color) -> Result<()> {
        let [l, b, r, t] = bounds;
        let vertices = vec![
            Point2::new(l, b),
            Point2::new(l, t),
            Point2::new(r, t),
            Point2::new(r, b),
        ];
        self.add_poly_goal(name, vertices, color)
    }

    pub fn add_poly_block(
        &mut self,
        name: &str,
        vertices: Vec<Point2<f32>>,
        color: Color,
    ) -> Result<()> {
        if self.blockers.contains_key(name) {
            return Err(Error::DuplicateName(name.to_owned()));
        }
        let obj = Object::blocker(&mut self.space, name, vertices, color)?;
        self.register_blocker(obj);
        Ok(())
    }

    pub fn add_block(&mut self, name: &str, bounds: [f32; 4], color: Color) -> Result<()> {
        let [l, b, r, t] = bounds;
        let vertices = vec![
            Point2::new(l, b),
            Point2::new(l, t),
            Point2::new(r, t),
            Point2::new(r, b),
        ];
        self.add_poly_block(name, vertices, color)
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Adds a user-placed ball, rejecting positions that overlap any
    /// existing shape, blockers included.
    pub fn place_ball(
        &mut self,
        name: &str,
        position: Point2<f32>,
        radius: f32,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        if self.check_circle_collision(position, radius) {
            return Err(Error::PlacementCollision);
        }
        let material = self.material(density, elasticity, friction);
        let obj = Object::ball(
            &mut self.space,
            name,
            position,
            radius,
            material,
            color,
            CollisionCategory::Placed,
        )?;
        self.register_object(obj);
        Ok(())
    }

    /// Adds a user-placed polygon; `vertices` are relative to `position`.
    pub fn place_poly(
        &mut self,
        name: &str,
        position: Point2<f32>,
        vertices: Vec<Point2<f32>>,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        if self.check_collision(position, &vertices)? {
            return Err(Error::PlacementCollision);
        }
        let world_verts: Vec<Point2<f32>> = vertices
            .iter()
            .map(|v| Point2::from(v.coords + position.coords))
            .collect();
        let material = self.material(density, elasticity, friction);
        let obj = Object::poly(
            &mut self.space,
            name,
            world_verts,
            material,
            color,
            CollisionCategory::Placed,
        )?;
        self.register_object(obj);
        Ok(())
    }

    /// Adds a user-placed compound; polygons are relative to `position`.
    pub fn place_compound(
        &mut self,
        name: &str,
        position: Point2<f32>,
        polys: Vec<Vec<Point2<f32>>>,
        color: Color,
        density: Option<f32>,
        elasticity: Option<f32>,
        friction: Option<f32>,
    ) -> Result<()> {
        self.ensure_free_name(name)?;
        for poly in &polys {
            if self.check_collision(position, poly)? {
                return Err(Error::PlacementCollision);
            }
        }
        let world_polys: Vec<Vec<Point2<f32>>> = polys
            .iter()
            .map(|poly| {
                poly.iter()
                    .map(|v| Point2::from(v.coords + position.coords))
                    .collect()
            })
            .collect();
        let material = self.material(density, elasticity, friction);
        let obj = Object::compound(
            &mut self.space,
            name,
            world_polys,
            material,
            color,
            CollisionCategory::Placed,
        )?;
        self.register_object(obj);
        Ok(())
    }

    /// Whether a polygon at `position` would overlap any existing shape.
    /// The probe is a throwaway sensor that is never inserted, so it
    /// leaves no trace in the scene.
    pub fn check_collision(
        &mut self,
        position: Point2<f32>,
        vertices: &[Point2<f32>],
    ) -> Result<bool> {
        let world_verts: Vec<Point2<f32>> = vertices
            .iter()
            .map(|v| Point2::from(v.coords + position.coords))
            .collect();
        let shape = SharedShape::convex_hull(&world_verts)
            .ok_or_else(|| Error::InvalidSpec("degenerate placement polygon".into()))?;
        let probe = ColliderBuilder::new(shape)
            .sensor(true)
            .user_data(CollisionCategory::Checker.tag())
            .build();
        self.refresh();
        Ok(self.space.intersects_any(&probe))
    }

    /// Circle variant of [`World::check_collision`].
    pub fn check_circle_collision(&mut self, position: Point2<f32>, radius: f32) -> bool {
        let probe = ColliderBuilder::new(SharedShape::ball(radius))
            .sensor(true)
            .translation(position.coords)
            .user_data(CollisionCategory::Checker.tag())
            .build();
        self.refresh();
        self.space.intersects_any(&probe)
    }

    /// Throwaway step that flushes pending transforms to the broad
    /// phase without meaningfully advancing the simulation.
    pub(crate) fn refresh(&mut self) {
        self.space.step(REFRESH_DT);
        self.route_contacts();
    }

    // ------------------------------------------------------------------
    // Win conditions
    // ------------------------------------------------------------------

    fn ensure_known(&self, name: &str) -> Result<()> {
        if self.objects.contains_key(name) {
            Ok(())
        } else {
            Err(Error::UnknownObject(name.to_owned()))
        }
    }

    pub fn attach_any_in_goal(
        &mut self,
        goal: &str,
        duration: f32,
        exclusions: Vec<String>,
    ) -> Result<()> {
        self.ensure_known(goal)?;
        self.goal_cond = Some(GoalCondition::any_in_goal(goal, duration, exclusions));
        Ok(())
    }

    pub fn attach_specific_in_goal(
        &mut self,
        goal: &str,
        object: &str,
        duration: f32,
    ) -> Result<()> {
        self.ensure_known(goal)?;
        self.ensure_known(object)?;
        self.goal_cond = Some(GoalCondition::specific_in_goal(goal, object, duration));
        Ok(())
    }

    pub fn attach_many_in_goal(
        &mut self,
        goal: &str,
        objects: Vec<String>,
        duration: f32,
    ) -> Result<()> {
        self.ensure_known(goal)?;
        for obj in &objects {
            self.ensure_known(obj)?;
        }
        self.goal_cond = Some(GoalCondition::many_in_goal(goal, objects, duration));
        Ok(())
    }

    pub fn attach_any_touch(&mut self, object: &str, duration: f32) -> Result<()> {
        self.ensure_known(object)?;
        self.goal_cond = Some(GoalCondition::any_touch(object, duration));
        Ok(())
    }

    pub fn attach_specific_touch(
        &mut self,
        first: &str,
        second: &str,
        duration: f32,
    ) -> Result<()> {
        self.ensure_known(first)?;
        self.ensure_known(second)?;
        self.goal_cond = Some(GoalCondition::specific_touch(first, second, duration));
        Ok(())
    }

    pub fn set_win_callback(&mut self, callback: impl FnMut() + 'static) {
        self.win_callback = Some(Box::new(callback));
    }

    /// Registers a hook called before each sub-step for every solid pair
    /// currently in contact.
    pub fn add_pre_solve_hook(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.pre_solve_hooks.push(Box::new(hook));
    }

    /// Registers a hook called after each sub-step for every solid pair
    /// still in contact.
    pub fn add_post_solve_hook(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.post_solve_hooks.push(Box::new(hook));
    }

    /// Replaces the hook fired when a solid pair comes into contact.
    pub fn set_solid_collision_begin(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.solid_begin_hook = Some(Box::new(hook));
    }

    /// Replaces the hook fired when a solid pair separates.
    pub fn set_solid_collision_end(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.solid_end_hook = Some(Box::new(hook));
    }

    /// Replaces the hook fired when an object enters a goal region,
    /// called with (object, goal).
    pub fn set_goal_collision_begin(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.goal_begin_hook = Some(Box::new(hook));
    }

    /// Replaces the hook fired when an object leaves a goal region,
    /// called with (object, goal).
    pub fn set_goal_collision_end(&mut self, hook: impl FnMut(&str, &str) + 'static) {
        self.goal_end_hook = Some(Box::new(hook));
    }

    pub fn check_end(&self) -> bool {
        self.goal_cond
            .as_ref()
            .map_or(false, |cond| cond.is_won(self.time))
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advances the world by `dt` seconds in basic-timestep sub-steps,
    /// routing collision transitions and re-checking the win condition
    /// after each one. The win callback fires on every sub-step for
    /// which the condition holds.
    pub fn step(&mut self, dt: f32) {
        let nsteps = (dt / self.bts).floor() as usize;
        let remainder = dt - nsteps as f32 * self.bts;
        self.time += dt;
        for _ in 0..nsteps {
            self.run_solid_hooks(true);
            self.space.step(self.bts);
            self.route_contacts();
            self.run_solid_hooks(false);
            self.fire_if_won();
        }
        if remainder / self.bts > 0.01 {
            self.run_solid_hooks(true);
            self.space.step(remainder);
            self.route_contacts();
            self.run_solid_hooks(false);
        }
        self.fire_if_won();
    }

    /// Steps until the win condition holds or `max_time` simulated
    /// seconds have passed; returns the win time if reached. `step_size`
    /// defaults to the basic timestep.
    pub fn run_until(&mut self, max_time: f32, step_size: Option<f32>) -> Option<f32> {
        let dt = step_size.unwrap_or(self.bts);
        let mut elapsed = 0.0;
        while elapsed < max_time {
            self.step(dt);
            elapsed += dt;
            if self.check_end() {
                return Some(self.time);
            }
        }
        None
    }

    fn fire_if_won(&mut self) {
        if self.check_end() {
            if let Some(callback) = self.win_callback.as_mut() {
                callback();
            }
        }
    }

    /// Named solid pairs with an active narrow-phase contact, both-static
    /// pairs excluded, canonically ordered and deduplicated across
    /// multi-collider objects.
    fn solid_pairs_in_contact(&self) -> Vec<(String, String)> {
        let mut pairs = BTreeSet::new();
        for (a, b) in self.space.active_contact_pairs() {
            if !self.solid_route_pair(a, b) {
                continue;
            }
            let (Some(na), Some(nb)) = (self.lookup.get(&a), self.lookup.get(&b)) else {
                continue;
            };
            if na == nb {
                continue;
            }
            let (Some(oa), Some(ob)) = (self.objects.get(na), self.objects.get(nb)) else {
                continue;
            };
            if oa.is_static() && ob.is_static() {
                continue;
            }
            if na <= nb {
                pairs.insert((na.clone(), nb.clone()));
            } else {
                pairs.insert((nb.clone(), na.clone()));
            }
        }
        pairs.into_iter().collect()
    }

    fn run_solid_hooks(&mut self, pre: bool) {
        let empty = if pre {
            self.pre_solve_hooks.is_empty()
        } else {
            self.post_solve_hooks.is_empty()
        };
        if empty {
            return;
        }
        let pairs = self.solid_pairs_in_contact();
        let hooks = if pre {
            &mut self.pre_solve_hooks
        } else {
            &mut self.post_solve_hooks
        };
        for (first, second) in &pairs {
            for hook in hooks.iter_mut() {
                hook(first, second);
            }
        }
    }

    fn category_of(&self, handle: ColliderHandle) -> Option<CollisionCategory> {
        self.space
            .try_collider(handle)
            .and_then(|c| CollisionCategory::from_tag(c.user_data))
    }

    /// Whether a collider pair belongs on the solid route: scene
    /// geometry against scene geometry or a placed object, never two
    /// placed objects.
    fn solid_route_pair(&self, a: ColliderHandle, b: ColliderHandle) -> bool {
        matches!(
            (self.category_of(a), self.category_of(b)),
            (Some(CollisionCategory::Solid), Some(CollisionCategory::Solid))
                | (Some(CollisionCategory::Solid), Some(CollisionCategory::Placed))
                | (Some(CollisionCategory::Placed), Some(CollisionCategory::Solid))
        )
    }

    /// Dispatches the contact transitions recorded by the engine during
    /// the last sub-step: solid pairs feed the event log and the touch
    /// conditions, sensor pairs feed the in-goal conditions.
    fn route_contacts(&mut self) {
        let transitions = self.space.drain_contacts();
        for transition in transitions {
            let Some(first) = self.lookup.get(&transition.first).cloned() else {
                continue;
            };
            let Some(second) = self.lookup.get(&transition.second).cloned() else {
                continue;
            };
            if transition.sensor {
                self.route_sensor(&transition, first, second);
            } else {
                self.route_solid(transition, first, second);
            }
        }
    }

    fn route_sensor(&mut self, transition: &RawContact, first: String, second: String) {
        let cat1 = self.category_of(transition.first);
        let cat2 = self.category_of(transition.second);
        let (obj_name, goal_name) = match (cat1, cat2) {
            (Some(CollisionCategory::Sensor), Some(CollisionCategory::Sensor)) => return,
            (Some(CollisionCategory::Sensor), Some(_)) => (second, first),
            (Some(_), Some(CollisionCategory::Sensor)) => (first, second),
            _ => return,
        };
        // Blockers carry sensors too but are not goal regions.
        if !self.objects.contains_key(&goal_name) || !self.objects.contains_key(&obj_name) {
            return;
        }
        let now = self.time;
        if transition.started {
            if let Some(hook) = self.goal_begin_hook.as_mut() {
                hook(&obj_name, &goal_name);
            }
            if let Some(cond) = self.goal_cond.as_mut() {
                cond.on_sensor_begin(&obj_name, &goal_name, now);
            }
        } else {
            // Guard against shallow-crossing artifacts: only count the
            // exit if the object's center has actually left the region.
            let still_inside = {
                let obj = &self.objects[&obj_name];
                let goal = &self.objects[&goal_name];
                match obj.position(&self.space) {
                    Ok(pos) => goal.point_in(&self.space, pos),
                    Err(_) => false,
                }
            };
            if let Some(hook) = self.goal_end_hook.as_mut() {
                hook(&obj_name, &goal_name);
            }
            if let Some(cond) = self.goal_cond.as_mut() {
                cond.on_sensor_end(&obj_name, &goal_name, still_inside);
            }
        }
    }

    fn route_solid(&mut self, transition: RawContact, first: String, second: String) {
        // Placed-on-placed pairs resolve physically but are not routed.
        if !self.solid_route_pair(transition.first, transition.second) {
            return;
        }
        let (Some(o1), Some(o2)) = (self.objects.get(&first), self.objects.get(&second)) else {
            return;
        };
        // Wall-on-wall and other fully static contacts are not logged.
        let loggable = !(o1.is_static() && o2.is_static());
        let now = self.time;
        if loggable {
            let phase = if transition.started {
                CollisionPhase::Begin
            } else {
                CollisionPhase::End
            };
            self.collision_events.push(CollisionEvent::new(
                first.clone(),
                second.clone(),
                now,
                phase,
                transition.info,
            ));
        }
        if let Some(cond) = self.goal_cond.as_mut() {
            if transition.started {
                cond.on_solid_begin(&first, &second, now);
            } else {
                cond.on_solid_end(&first, &second);
            }
        }
        let hook = if transition.started {
            self.solid_begin_hook.as_mut()
        } else {
            self.solid_end_hook.as_mut()
        };
        if let Some(hook) = hook {
            hook(&first, &second);
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Applies an impulse to a named object at a world point on it.
    pub fn kick(
        &mut self,
        name: &str,
        impulse: Vector2<f32>,
        point: Point2<f32>,
    ) -> Result<()> {
        let obj = self
            .objects
            .get(name)
            .ok_or_else(|| Error::UnknownObject(name.to_owned()))?;
        obj.kick(&mut self.space, impulse, point)
    }

    /// [`World::kick`] without the point-on-object check.
    pub fn kick_unchecked(
        &mut self,
        name: &str,
        impulse: Vector2<f32>,
        point: Point2<f32>,
    ) -> Result<()> {
        let obj = self
            .objects
            .get(name)
            .ok_or_else(|| Error::UnknownObject(name.to_owned()))?;
        obj.kick_unchecked(&mut self.space, impulse, point)
    }

    /// Distance from a point to the goal region, clamped at zero. For
    /// two-object touch goals this is instead the gap between the two
    /// targets' origin distances.
    pub fn distance_to_goal(&self, point: Point2<f32>) -> Result<f32> {
        let cond = self.goal_cond.as_ref().ok_or_else(|| {
            Error::InvalidSpec("no goal condition attached".into())
        })?;
        match cond {
            GoalCondition::SpecificTouch { first, second, .. } => {
                let o1 = self.object(first)?;
                let o2 = self.object(second)?;
                let origin = Point2::origin();
                Ok((o1.distance_from_point(&self.space, origin)
                    - o2.distance_from_point(&self.space, origin))
                .abs())
            }
            GoalCondition::AnyTouch { object, .. } => {
                let target = self.object(object)?;
                Ok(target.distance_from_point(&self.space, point).max(0.0))
            }
            _ => {
                let goal = cond.goal_name().unwrap_or_default();
                let target = self.object(goal)?;
                Ok(target.distance_from_point(&self.space, point).max(0.0))
            }
        }
    }

    // ------------------------------------------------------------------
    // Noise support
    // ------------------------------------------------------------------

    /// Whether the two named scene elements currently overlap.
    pub(crate) fn contact_between(&self, a: &str, b: &str) -> bool {
        let Some(oa) = self.objects.get(a) else {
            return false;
        };
        let Some(ob) = self.objects.get(b) else {
            return false;
        };
        oa.check_contact(ob, &self.space)
    }

    /// Moves a world-fixed object by destroying and rebuilding its
    /// colliders, keeping the handle lookup current.
    pub(crate) fn apply_static_offset(
        &mut self,
        name: &str,
        offset: Vector2<f32>,
    ) -> Result<()> {
        let obj = self
            .objects
            .get_mut(name)
            .ok_or_else(|| Error::UnknownObject(name.to_owned()))?;
        for handle in obj.all_handles() {
            self.lookup.remove(&handle);
        }
        obj.translate_static(&mut self.space, offset)?;
        for handle in obj.all_handles() {
            self.lookup.insert(handle, obj.name.clone());
        }
        Ok(())
    }

    /// Steps the raw engine to let perturbed objects come to rest,
    /// without advancing world time or logging the resulting contacts.
    pub(crate) fn settle(&mut self, steps: usize, dt: f32) {
        for _ in 0..steps {
            self.space.step(dt);
        }
        self.space.discard_contacts();
    }

    pub(crate) fn install_collision_noise(
        &mut self,
        config: CollisionNoise,
        rng: rand::rngs::StdRng,
    ) {
        self.space.set_collision_noise(config, rng);
    }
}
