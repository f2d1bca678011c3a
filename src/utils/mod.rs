//! Various utilities functions and types

mod geometry;
pub(crate) mod ids;
mod liveness;

pub use self::geometry::{Coordinate, Logical, Point, Rectangle, Size};
pub use self::liveness::IsAlive;
pub(crate) use self::liveness::Liveness;
