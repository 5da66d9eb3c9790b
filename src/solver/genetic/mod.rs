mod clustering;
pub use self::clustering::*;
mod decomposition;
pub use self::decomposition::*;
mod genetic;
pub use self::genetic::*;
mod individual;
pub use self::individual::*;
mod population;
pub use self::population::*;
mod split;
pub use self::split::*;
