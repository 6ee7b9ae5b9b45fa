use std::sync::Mutex;

use nalgebra::Rotation2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rapier2d::prelude::*;

use crate::noise::{trunc_norm, wrapped_norm};

/// Contact noise does not apply until simulated time has begun advancing,
/// so that contacts present in the initial configuration stay untouched.
const MIN_NOISE_TIME: f32 = 1e-3;

/// Standard deviations for solver-contact perturbation.
#[derive(Debug, Clone, Copy)]
pub struct CollisionNoise {
    /// Wrapped-normal sd of the contact normal rotation (radians)
    pub direction_sd: f32,
    /// Truncated-normal sd of the additive restitution perturbation
    pub elasticity_sd: f32,
}

/// rapier physics hook that perturbs restitution and contact normals on
/// the first contact of each arbiter. Inert until configured by the
/// noise injector.
pub(crate) struct SolverPerturbation {
    pub(crate) config: Option<CollisionNoise>,
    pub(crate) rng: Mutex<StdRng>,
    /// Simulated time at the end of the sub-step being solved
    pub(crate) time: f32,
}

impl Default for SolverPerturbation {
    fn default() -> Self {
        Self {
            config: None,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            time: 0.0,
        }
    }
}

impl PhysicsHooks for SolverPerturbation {
    fn filter_contact_pair(&self, _context: &PairFilterContext) -> Option<SolverFlags> {
        Some(SolverFlags::COMPUTE_IMPULSES)
    }

    fn filter_intersection_pair(&self, _context: &PairFilterContext) -> bool {
        true
    }

    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let Some(config) = self.config else { return };
        if self.time <= MIN_NOISE_TIME {
            return;
        }
        // The manifold user data persists while the contact lasts; a
        // nonzero value marks an arbiter already perturbed.
        if *context.user_data != 0 {
            return;
        }
        *context.user_data = 1;

        let Ok(mut rng) = self.rng.lock() else { return };

        if config.elasticity_sd > 0.0 {
            for contact in context.solver_contacts.iter_mut() {
                let bump = trunc_norm(
                    0.0,
                    config.elasticity_sd,
                    Some(-contact.restitution),
                    None,
                    &mut *rng,
                );
                contact.restitution = (contact.restitution + bump).max(0.0);
            }
        }

        if config.direction_sd > 0.0 {
            let angle = wrapped_norm(0.0, config.direction_sd, &mut *rng);
            *context.normal = Rotation2::new(angle) * *context.normal;
        }
    }
}
