use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rapier2d::parry::bounding_volume::Aabb;
use rapier2d::parry::query::intersection_test;
use rapier2d::prelude::*;

use super::collector::{ContactCollector, RawContact};
use super::perturb::{CollisionNoise, SolverPerturbation};

/// Narrow wrapper around one rapier2d physics space.
///
/// Everything above this type talks in collider/body handles and plain
/// geometry; no rapier internals leak past this module's re-exports.
/// Each `Space` is exclusively owned by one `World` and never shared.
pub struct Space {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    pipeline: PhysicsPipeline,
    integration: IntegrationParameters,
    gravity: Vector2<f32>,
    time: f32,
    collector: ContactCollector,
    perturbation: SolverPerturbation,
}

impl Space {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            pipeline: PhysicsPipeline::new(),
            integration: IntegrationParameters::default(),
            gravity: Vector2::new(0.0, 0.0),
            time: 0.0,
            collector: ContactCollector::default(),
            perturbation: SolverPerturbation::default(),
        }
    }

    /// Advances the space by one sub-step of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration.dt = dt;
        // The perturbation hook gates itself on the time at the end of
        // the sub-step being solved.
        self.perturbation.time = self.time + dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.perturbation,
            &self.collector,
        );
        self.time += dt;
    }

    /// Gravity magnitude, positive downward.
    pub fn gravity(&self) -> f32 {
        -self.gravity.y
    }

    pub fn set_gravity(&mut self, magnitude: f32) {
        self.gravity = Vector2::new(0.0, -magnitude);
    }

    /// Total simulated time this space has been stepped through.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Takes the contact transitions recorded since the last drain.
    pub fn drain_contacts(&mut self) -> Vec<RawContact> {
        self.collector.drain()
    }

    /// Drops recorded contact transitions without routing them.
    pub fn discard_contacts(&mut self) {
        let _ = self.collector.drain();
    }

    /// Collider pairs with at least one active contact in the narrow phase.
    pub fn active_contact_pairs(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .map(|pair| (pair.collider1, pair.collider2))
            .collect()
    }

    /// Installs solver-contact perturbation with its own RNG stream.
    pub fn set_collision_noise(&mut self, config: CollisionNoise, rng: StdRng) {
        self.perturbation.config = Some(config);
        self.perturbation.rng = std::sync::Mutex::new(rng);
    }

    // ------------------------------------------------------------------
    // Shape registration
    // ------------------------------------------------------------------

    /// Registers a world-fixed collider (no rigid body attached).
    pub fn insert_static(&mut self, collider: Collider) -> ColliderHandle {
        self.colliders.insert(collider)
    }

    pub fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    pub fn attach(&mut self, collider: Collider, body: RigidBodyHandle) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    /// Removes a collider, waking whatever it touched.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, true);
    }

    // ------------------------------------------------------------------
    // State access
    // ------------------------------------------------------------------

    pub fn body(&self, handle: RigidBodyHandle) -> &RigidBody {
        &self.bodies[handle]
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> &mut RigidBody {
        &mut self.bodies[handle]
    }

    /// Non-panicking collider access; `None` once a handle is stale.
    pub fn try_collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Signed distance from a point to a collider: negative inside.
    pub fn signed_distance(&self, handle: ColliderHandle, point: Point2<f32>) -> f32 {
        let collider = &self.colliders[handle];
        // A non-solid query measures to the boundary, already negative
        // for interior points.
        collider
            .shape()
            .distance_to_point(collider.position(), &point, false)
    }

    pub fn contains_point(&self, handle: ColliderHandle, point: Point2<f32>) -> bool {
        let collider = &self.colliders[handle];
        collider.shape().contains_point(collider.position(), &point)
    }

    /// Whether the two colliders' shapes currently overlap.
    pub fn pair_intersects(&self, a: ColliderHandle, b: ColliderHandle) -> bool {
        let ca = &self.colliders[a];
        let cb = &self.colliders[b];
        intersection_test(ca.position(), ca.shape(), cb.position(), cb.shape()).unwrap_or(false)
    }

    /// Whether an un-inserted probe collider overlaps anything persisted
    /// in the space, sensors included.
    pub fn intersects_any(&self, probe: &Collider) -> bool {
        self.colliders.iter().any(|(_, c)| {
            intersection_test(probe.position(), probe.shape(), c.position(), c.shape())
                .unwrap_or(false)
        })
    }

    /// World-space AABB of a collider.
    pub fn collider_aabb(&self, handle: ColliderHandle) -> Aabb {
        self.colliders[handle].compute_aabb()
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}
