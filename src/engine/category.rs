/// Collision category tagged onto every shape registered with a [`Space`].
///
/// The category decides how the collision router treats a contact, not
/// whether the engine resolves it physically.
///
/// [`Space`]: super::Space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionCategory {
    /// Pre-existing physical scene geometry
    Solid,

    /// Objects inserted by a user action
    Placed,

    /// Non-colliding trigger volumes: goals, blockers, container interiors
    Sensor,

    /// Ephemeral placement probes; never persisted in a space
    Checker,
}

impl CollisionCategory {
    /// Encodes the category into a collider's `user_data` tag.
    pub(crate) fn tag(self) -> u128 {
        match self {
            CollisionCategory::Solid => 1,
            CollisionCategory::Placed => 2,
            CollisionCategory::Sensor => 3,
            CollisionCategory::Checker => 4,
        }
    }

    /// Decodes a collider `user_data` tag back into a category.
    pub(crate) fn from_tag(raw: u128) -> Option<Self> {
        match raw {
            1 => Some(CollisionCategory::Solid),
            2 => Some(CollisionCategory::Placed),
            3 => Some(CollisionCategory::Sensor),
            4 => Some(CollisionCategory::Checker),
            _ => None,
        }
    }
}
