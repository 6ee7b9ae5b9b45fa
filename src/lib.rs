pub mod engine;
pub mod objects;
pub mod world;
pub mod conditions;
pub mod events;
pub mod noise;

/// Re-export common types for easier usage
pub use crate::world::{World, WorldDefaults, WorldSpec, WALL_NAMES};
pub use crate::objects::{Color, Material, Object, ObjectKind};
pub use crate::conditions::GoalCondition;
pub use crate::events::{
    filter_collision_events, CollisionEvent, CollisionPhase, ContactInterval,
};
pub use crate::noise::{noisify_world, NoiseParams, NoisyWorld};
pub use crate::engine::CollisionCategory;

/// Error types for the puzzle simulation kernel
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        /// An attempted placement overlaps existing geometry. Callers
        /// should treat this as an illegal action, not a crash.
        #[error("Illegal object placement")]
        PlacementCollision,

        /// A kinematic accessor was called on a static object.
        #[error("Static object '{0}' has no kinematic state")]
        StaticState(String),

        /// Object names are unique within a world and never reused.
        #[error("Name already taken: {0}")]
        DuplicateName(String),

        #[error("No object by that name: {0}")]
        UnknownObject(String),

        /// Malformed specification: degenerate geometry, bad property
        /// values, or an unresolvable reference.
        #[error("Invalid specification: {0}")]
        InvalidSpec(String),

        #[error("Specification parse error: {0}")]
        Spec(#[from] serde_json::Error),
    }
}

pub use crate::error::Error;

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, error::Error>;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
