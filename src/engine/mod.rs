pub mod category;
pub mod collector;
pub mod perturb;
pub mod space;

pub use self::category::CollisionCategory;
pub use self::collector::RawContact;
pub use self::perturb::CollisionNoise;
pub use self::space::Space;
