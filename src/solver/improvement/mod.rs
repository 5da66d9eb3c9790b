mod linked_list;
pub use self::linked_list::*;

mod local_search;
pub use self::local_search::*;

mod moves;
pub use self::moves::*;
