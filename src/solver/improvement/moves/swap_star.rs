use std::ptr;

use crate::constants::EPSILON;
use crate::models::FloatType;
use crate::solver::improvement::{insert_node, LinkNode, LinkRoute, LocalSearch};
use crate::solver::Context;

/// Best SWAP* move found for a pair of routes: u and v exchange routes with
/// independently chosen insertion positions, or only one of them relocates
pub struct BestSwapStar {
    pub cost: FloatType,
    pub u: *mut LinkNode,
    pub v: *mut LinkNode,
    // Insert u right after pos_u, v right after pos_v
    pub pos_u: *mut LinkNode,
    pub pos_v: *mut LinkNode,
}

impl BestSwapStar {
    pub fn new() -> Self {
        Self {
            cost: FloatType::INFINITY,
            u: ptr::null_mut(),
            v: ptr::null_mut(),
            pos_u: ptr::null_mut(),
            pos_v: ptr::null_mut(),
        }
    }
}

pub struct SwapStar;

impl SwapStar {
    pub fn move_name() -> &'static str {
        "SwapStar"
    }

    /// Evaluates all SWAP* exchanges between two routes with overlapping
    /// circle sectors and performs the best one if it improves the cost
    pub unsafe fn run(
        ls: &mut LocalSearch,
        ctx: &Context,
        r1_ptr: *mut LinkRoute,
        r2_ptr: *mut LinkRoute,
    ) -> bool {
        let mut best_move = BestSwapStar::new();
        let problem = &ctx.problem;
        let r1 = &*r1_ptr;
        let r2 = &*r2_ptr;

        // The three best insertion positions of every node into the other route
        ls.preprocess_insertions(ctx, r1_ptr, r2_ptr);
        ls.preprocess_insertions(ctx, r2_ptr, r1_ptr);

        let penalty_capacity = ls.penalty_capacity;

        // Exchanges of u and v with free insertion positions
        let mut u_ptr = (*r1.start_depot).successor;
        while !(*u_ptr).is_depot() {
            let u = &*u_ptr;
            let u_demand = problem.clients[u.number].demand;
            let u_service = problem.clients[u.number].service_duration;

            let mut v_ptr = (*r2.start_depot).successor;
            while !(*v_ptr).is_depot() {
                let v = &*v_ptr;
                let v_demand = problem.clients[v.number].demand;
                let v_service = problem.clients[v.number].service_duration;

                // Cheap load-penalty bound to filter hopeless pairs
                let delta_penalty_r1 = penalty_capacity
                    * ((r1.overload - u_demand + v_demand).max(0.0) - r1.overload.max(0.0));
                let delta_penalty_r2 = penalty_capacity
                    * ((r2.overload + u_demand - v_demand).max(0.0) - r2.overload.max(0.0));

                if u.delta_removal + v.delta_removal + delta_penalty_r1 + delta_penalty_r2 <= 0.0 {
                    let mut candidate = BestSwapStar::new();
                    candidate.u = u_ptr;
                    candidate.v = v_ptr;

                    let (pos_u, delta_insert_u) =
                        ls.cheapest_insert_and_removal(ctx, u_ptr, v_ptr);
                    let (pos_v, delta_insert_v) =
                        ls.cheapest_insert_and_removal(ctx, v_ptr, u_ptr);
                    candidate.pos_u = pos_u;
                    candidate.pos_v = pos_v;

                    let distance_one = r1.distance + u.delta_removal + delta_insert_v;
                    let distance_two = r2.distance + v.delta_removal + delta_insert_u;
                    candidate.cost = ls.route_cost_of(
                        distance_one,
                        r1.load - u_demand + v_demand,
                        r1.service - u_service + v_service,
                    ) + ls.route_cost_of(
                        distance_two,
                        r2.load + u_demand - v_demand,
                        r2.service + u_service - v_service,
                    ) - r1.cost
                        - r2.cost;

                    if candidate.cost < best_move.cost {
                        best_move = candidate;
                    }
                }

                v_ptr = v.successor;
            }
            u_ptr = u.successor;
        }

        // Relocations of u into route 2: the insertion positions are already
        // preprocessed, so these come almost for free
        let mut u_ptr = (*r1.start_depot).successor;
        while !(*u_ptr).is_depot() {
            let u = &*u_ptr;
            let u_demand = problem.clients[u.number].demand;
            let u_service = problem.clients[u.number].service_duration;

            let best_insert = ls.best_inserts.get(r2.index, u.number).locations[0];
            let mut candidate = BestSwapStar::new();
            candidate.u = u_ptr;
            candidate.pos_u = best_insert.node;
            candidate.cost = ls.route_cost_of(
                r1.distance + u.delta_removal,
                r1.load - u_demand,
                r1.service - u_service,
            ) + ls.route_cost_of(
                r2.distance + best_insert.cost,
                r2.load + u_demand,
                r2.service + u_service,
            ) - r1.cost
                - r2.cost;

            if candidate.cost < best_move.cost {
                best_move = candidate;
            }

            u_ptr = u.successor;
        }

        // Relocations of v into route 1
        let mut v_ptr = (*r2.start_depot).successor;
        while !(*v_ptr).is_depot() {
            let v = &*v_ptr;
            let v_demand = problem.clients[v.number].demand;
            let v_service = problem.clients[v.number].service_duration;

            let best_insert = ls.best_inserts.get(r1.index, v.number).locations[0];
            let mut candidate = BestSwapStar::new();
            candidate.v = v_ptr;
            candidate.pos_v = best_insert.node;
            candidate.cost = ls.route_cost_of(
                r1.distance + best_insert.cost,
                r1.load + v_demand,
                r1.service + v_service,
            ) + ls.route_cost_of(
                r2.distance + v.delta_removal,
                r2.load - v_demand,
                r2.service - v_service,
            ) - r1.cost
                - r2.cost;

            if candidate.cost < best_move.cost {
                best_move = candidate;
            }

            v_ptr = v.successor;
        }

        if best_move.cost > -EPSILON {
            return false;
        }

        ls.move_count += 1;

        if !best_move.pos_u.is_null() {
            insert_node(best_move.u, best_move.pos_u);
        }
        if !best_move.pos_v.is_null() {
            insert_node(best_move.v, best_move.pos_v);
        }

        ls.update_route(ctx, r1_ptr);
        ls.update_route(ctx, r2_ptr);

        true
    }
}
