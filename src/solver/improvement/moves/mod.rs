mod relocation;
pub use self::relocation::*;

mod swap;
pub use self::swap::*;

mod swap_star;
pub use self::swap_star::*;

mod two_opt;
pub use self::two_opt::*;

use crate::models::FloatType;
use crate::solver::improvement::{LinkNode, LocalSearch};
use crate::solver::Context;

/// A move of the route improvement neighbourhood. `delta` evaluates the
/// change in penalised cost without touching the routes; `perform` applies
/// the relinking and refreshes the affected routes.
pub trait Move {
    fn move_name(&self) -> &'static str;
    unsafe fn delta(
        &self,
        ls: &LocalSearch,
        ctx: &Context,
        node_u: *mut LinkNode,
        node_v: *mut LinkNode,
    ) -> FloatType;
    unsafe fn perform(
        &self,
        ls: &mut LocalSearch,
        ctx: &Context,
        node_u: *mut LinkNode,
        node_v: *mut LinkNode,
    );
}

/// The move registry, split by the kind of anchor the second node is:
/// a correlated customer, the depot ahead of one, or an empty route.
pub struct Moves {
    pub neighbor: Vec<Box<dyn Move>>,
    pub depot: Vec<Box<dyn Move>>,
    pub empty_route: Vec<Box<dyn Move>>,
}

impl Moves {
    pub fn new() -> Self {
        Self {
            neighbor: vec![
                Box::new(RelocateSingle),
                Box::new(RelocateDouble),
                Box::new(RelocateDoubleReverse),
                Box::new(SwapOneWithOne),
                Box::new(SwapTwoWithOne),
                Box::new(SwapTwoWithTwo),
                Box::new(TwoOptIntraReverse),
                Box::new(TwoOptInterReverse),
                Box::new(TwoOptInter),
            ],
            depot: vec![
                Box::new(RelocateSingle),
                Box::new(RelocateDouble),
                Box::new(RelocateDoubleReverse),
                Box::new(TwoOptInterReverse),
                Box::new(TwoOptInter),
            ],
            empty_route: vec![
                Box::new(RelocateSingle),
                Box::new(RelocateDouble),
                Box::new(RelocateDoubleReverse),
                Box::new(TwoOptInter),
            ],
        }
    }

    /// Detached placeholder used while a sweep borrows the registry
    pub fn empty() -> Self {
        Self {
            neighbor: Vec::new(),
            depot: Vec::new(),
            empty_route: Vec::new(),
        }
    }
}
