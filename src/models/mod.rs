mod matrix;
pub use self::matrix::*;

mod primitives;
pub use self::primitives::*;

mod problem;
pub use self::problem::*;

mod circle_sector;
pub use self::circle_sector::*;
