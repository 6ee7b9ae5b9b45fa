//! Noise injection: builds a perturbed copy of a world for stochastic
//! simulation.
//!
//! Three noise families are supported. Perceptual noise jitters object
//! positions (static objects move in touching groups, moving objects
//! move individually under a contact-preservation constraint). Collision
//! noise perturbs solver contacts as they happen. Property noise scales
//! gravity; the per-object property knobs are accepted but inert.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::engine::CollisionNoise;
use crate::objects::ObjectKind;
use crate::world::{World, WALL_NAMES};
use crate::Result;

/// Default standardized truncation bound when a side is unbounded.
const TRUNC_DEFAULT_BOUND: f32 = 20.0;

/// Attempts allowed for the moving-noise placement loop before the
/// perturbation is abandoned.
const MAX_MOVING_ATTEMPTS: usize = 500;

/// Standard deviations for every supported noise source. Zero disables
/// a source; all sources default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseParams {
    /// Positional sd for world-fixed objects, applied per touching group
    pub position_static: f32,
    /// Positional sd for dynamic objects, applied individually
    pub position_moving: f32,
    /// Wrapped-normal sd of contact normal rotation (radians)
    pub collision_direction: f32,
    /// Truncated-normal sd of contact restitution perturbation
    pub collision_elasticity: f32,
    /// Sd of the truncated-normal gravity multiplier (centered at 1,
    /// bounded below by 0)
    pub gravity: f32,
    /// Accepted for forward compatibility; currently inert
    pub object_friction: f32,
    /// Accepted for forward compatibility; currently inert
    pub object_density: f32,
    /// Accepted for forward compatibility; currently inert
    pub object_elasticity: f32,
}

/// A perturbed world plus a record of whether the moving-position noise
/// could actually be applied.
pub struct NoisyWorld {
    pub world: World,
    /// `false` when the placement loop exhausted its attempts and the
    /// dynamic objects were restored to their original poses
    pub moving_noise_applied: bool,
}

/// Draws from a normal truncated to `[lower, upper]`; an unbounded side
/// truncates at twenty standard deviations.
pub fn trunc_norm<R: Rng + ?Sized>(
    mu: f32,
    sigma: f32,
    lower: Option<f32>,
    upper: Option<f32>,
    rng: &mut R,
) -> f32 {
    let a = match lower {
        Some(l) => (l - mu) / sigma,
        None => -TRUNC_DEFAULT_BOUND,
    };
    let b = match upper {
        Some(u) => (u - mu) / sigma,
        None => TRUNC_DEFAULT_BOUND,
    };
    for _ in 0..1000 {
        let z: f32 = rng.sample(StandardNormal);
        if z >= a && z <= b {
            return mu + sigma * z;
        }
    }
    // Degenerate bounds; fall back to the nearest bound.
    let z: f32 = rng.sample(StandardNormal);
    mu + sigma * z.clamp(a, b)
}

/// Draws from a normal wrapped onto `[0, 2*pi)`.
pub fn wrapped_norm<R: Rng + ?Sized>(mu: f32, sigma: f32, rng: &mut R) -> f32 {
    let z: f32 = rng.sample(StandardNormal);
    (mu + sigma * z).rem_euclid(2.0 * std::f32::consts::PI)
}

/// Builds a perturbed copy of `world` according to `params`.
///
/// The copy is made through the spec round trip, so velocities and the
/// collision log start fresh. Gravity is switched off while positions
/// are adjusted and restored (possibly scaled) afterwards.
pub fn noisify_world<R: Rng + ?Sized>(
    world: &World,
    params: &NoiseParams,
    rng: &mut R,
) -> Result<NoisyWorld> {
    let mut noisy = world.copy()?;

    let gravity = if params.gravity > 0.0 {
        noisy.gravity() * trunc_norm(1.0, params.gravity, Some(0.0), None, rng)
    } else {
        noisy.gravity()
    };
    noisy.set_gravity(0.0);

    if params.position_static > 0.0 {
        apply_static_noise(&mut noisy, params.position_static, rng)?;
    }

    let mut moving_noise_applied = true;
    if params.position_moving > 0.0 {
        moving_noise_applied = apply_moving_noise(&mut noisy, params.position_moving, rng)?;
    }

    if params.collision_direction > 0.0 || params.collision_elasticity > 0.0 {
        noisy.install_collision_noise(
            CollisionNoise {
                direction_sd: params.collision_direction,
                elasticity_sd: params.collision_elasticity,
            },
            StdRng::seed_from_u64(rng.gen()),
        );
    }

    noisy.set_gravity(gravity);
    noisy.refresh();
    Ok(NoisyWorld {
        world: noisy,
        moving_noise_applied,
    })
}

fn gaussian_offset<R: Rng + ?Sized>(sd: f32, rng: &mut R) -> Vector2<f32> {
    let dx: f32 = rng.sample(StandardNormal);
    let dy: f32 = rng.sample(StandardNormal);
    Vector2::new(sd * dx, sd * dy)
}

fn shift_dynamic(world: &mut World, name: &str, offset: Vector2<f32>) -> Result<()> {
    let pos = world.objects[name].position(&world.space)?;
    world.objects[name].set_position(&mut world.space, pos + offset)
}

/// Partitions the non-wall objects into groups connected by current
/// contact, walls excluded so scenery does not chain through them.
fn contact_groups(world: &World) -> Vec<Vec<String>> {
    let names: Vec<String> = world
        .object_names()
        .filter(|n| !WALL_NAMES.contains(n))
        .map(str::to_owned)
        .collect();

    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut groups = Vec::new();
    for seed in &names {
        if visited.contains(seed) {
            continue;
        }
        let mut group = Vec::new();
        let mut queue = VecDeque::from([seed.clone()]);
        visited.insert(seed.clone());
        while let Some(current) = queue.pop_front() {
            for other in &names {
                if !visited.contains(other) && world.contact_between(&current, other) {
                    visited.insert(other.clone());
                    queue.push_back(other.clone());
                }
            }
            group.push(current);
        }
        groups.push(group);
    }
    groups
}

/// Moves each touching group of objects by one shared offset, so stacks
/// and leaning arrangements stay intact. Goal regions stay put.
fn apply_static_noise<R: Rng + ?Sized>(
    world: &mut World,
    sd: f32,
    rng: &mut R,
) -> Result<()> {
    for group in contact_groups(world) {
        let offset = gaussian_offset(sd, rng);
        for name in group {
            let (kind, is_static) = {
                let obj = &world.objects[&name];
                (obj.kind, obj.is_static())
            };
            if kind == ObjectKind::Goal {
                continue;
            }
            if is_static {
                world.apply_static_offset(&name, offset)?;
            } else {
                shift_dynamic(world, &name, offset)?;
            }
        }
    }
    Ok(())
}

/// Jitters each dynamic object while preserving its original contact
/// set. Objects whose contacts survive a perturbation are frozen in
/// place; the rest revert and retry. Returns `false` if the attempt
/// budget runs out, in which case every dynamic object is restored.
fn apply_moving_noise<R: Rng + ?Sized>(
    world: &mut World,
    sd: f32,
    rng: &mut R,
) -> Result<bool> {
    let all_names: Vec<String> = world.object_names().map(str::to_owned).collect();
    let mut free: Vec<String> = world
        .dynamic_objects()
        .iter()
        .map(|o| o.name.clone())
        .collect();

    let mut orig_pos = BTreeMap::new();
    let mut orig_vel = BTreeMap::new();
    let mut touching: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for name in &free {
        orig_pos.insert(name.clone(), world.objects[name].position(&world.space)?);
        orig_vel.insert(name.clone(), world.objects[name].velocity(&world.space)?);
        world.objects[name].set_velocity(&mut world.space, Vector2::zeros())?;
        let touches: BTreeSet<String> = all_names
            .iter()
            .filter(|other| *other != name && world.contact_between(name, other))
            .cloned()
            .collect();
        touching.insert(name.clone(), touches);
    }

    let mut attempts = 0;
    while !free.is_empty() && attempts < MAX_MOVING_ATTEMPTS {
        attempts += 1;

        for name in &free {
            let offset = gaussian_offset(sd, rng);
            shift_dynamic(world, name, offset)?;
        }
        // Coarse steps with gravity off let the solver push apart any
        // overlaps the jitter introduced.
        world.settle(10, 0.1);

        let mut matched = Vec::new();
        for name in &free {
            let wanted = &touching[name];
            let preserved = all_names.iter().filter(|o| *o != name).all(|other| {
                world.contact_between(name, other) == wanted.contains(other)
            });
            if preserved {
                matched.push(name.clone());
            } else {
                let pos = orig_pos[name];
                world.objects[name].set_position(&mut world.space, pos)?;
            }
        }

        // Freeze settled objects so later retries cannot disturb them.
        for name in &matched {
            world.objects[name].sleep(&mut world.space);
        }
        free.retain(|name| !matched.contains(name));
    }

    let exhausted = !free.is_empty();
    for (name, vel) in &orig_vel {
        world.objects[name].wake(&mut world.space);
        world.objects[name].set_velocity(&mut world.space, *vel)?;
    }
    if exhausted {
        for (name, pos) in &orig_pos {
            world.objects[name].set_position(&mut world.space, *pos)?;
        }
        return Ok(false);
    }
    Ok(true)
}
