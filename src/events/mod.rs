//! Collision event records and post-hoc filtering.

mod filter;

pub use self::filter::filter_collision_events;

use serde::{Deserialize, Serialize};

/// Which side of a contact's lifetime an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPhase {
    Begin,
    End,
}

/// One manifold point captured at event time, in world coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub point_a: [f32; 2],
    pub point_b: [f32; 2],
    /// Separation along the normal; negative when penetrating
    pub distance: f32,
}

/// Contact manifold snapshot attached to begin events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// World-space contact normal, from the first collider to the second
    pub normal: [f32; 2],
    /// Averaged restitution of the two shapes
    pub restitution: f32,
    pub points: Vec<ContactPoint>,
}

/// A named collision transition recorded by the world during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub first: String,
    pub second: String,
    pub time: f32,
    pub phase: CollisionPhase,
    pub info: ContactInfo,
}

impl CollisionEvent {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        time: f32,
        phase: CollisionPhase,
        info: ContactInfo,
    ) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            time,
            phase,
            info,
        }
    }
}

/// A merged span of continuous contact between two named objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInterval {
    pub first: String,
    pub second: String,
    pub start: f32,
    /// `None` when the pair never separated before the run ended
    pub end: Option<f32>,
    /// Manifold snapshot from the begin event that opened the interval.
    /// The normal is directional, so it is flipped when canonical name
    /// ordering swapped the pair.
    #[serde(rename = "contactInfoAtStart")]
    pub info: ContactInfo,
}
