pub mod geometry;
mod object;

pub use self::object::{Color, Material, Object, ObjectKind, ObjectShape};
