use crate::models::FloatType;
use crate::solver::improvement::{
    backward_reverse, forward_reverse, link_nodes, replace_end_depot, LinkNode, LocalSearch, Move,
};
use crate::solver::Context;

/// M7: reverse the segment between u and v within one route
pub struct TwoOptIntraReverse;

impl Move for TwoOptIntraReverse {
    fn move_name(&self) -> &'static str {
        "TwoOptIntraReverse"
    }

    unsafe fn delta(
        &self,
        ls: &LocalSearch,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) -> FloatType {
        let problem = &ctx.problem;

        let u = &*u_ptr;
        let v = &*v_ptr;
        let r1 = &*u.route;
        let r2 = &*v.route;

        if r1.index != r2.index {
            return 0.0;
        }

        let x = &*u.successor;
        let y = &*v.successor;

        // Nothing happens
        if u.position > v.position || x.number == v.number {
            return 0.0;
        }

        let delta_distance = -problem.distance.get(u.number, x.number)
            - problem.distance.get(v.number, y.number)
            + problem.distance.get(u.number, v.number)
            + problem.distance.get(x.number, y.number);

        ls.route_cost_of(r1.distance + delta_distance, r1.load, r1.service) - r1.cost
    }

    unsafe fn perform(
        &self,
        ls: &mut LocalSearch,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) {
        let r1 = (*u_ptr).route;
        let x_ptr = (*u_ptr).successor;
        let y_ptr = (*v_ptr).successor;
        backward_reverse(v_ptr, x_ptr, std::ptr::null_mut());
        link_nodes(u_ptr, v_ptr);
        link_nodes(x_ptr, y_ptr);
        ls.update_route(ctx, r1);
    }
}

/// M8: 2-opt* between two routes, reversing both tails
pub struct TwoOptInterReverse;

impl Move for TwoOptInterReverse {
    fn move_name(&self) -> &'static str {
        "TwoOptInterReverse"
    }

    unsafe fn delta(
        &self,
        ls: &LocalSearch,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) -> FloatType {
        let problem = &ctx.problem;

        let u = &*u_ptr;
        let v = &*v_ptr;
        let r1 = &*u.route;
        let r2 = &*v.route;

        if r1.index == r2.index {
            return 0.0;
        }

        let x = &*u.successor;
        let y = &*v.successor;

        // Head of route 1 joined with the reversed head of route 2
        let distance_one =
            u.cum_distance + v.cum_distance + problem.distance.get(u.number, v.number);
        let load_one = u.cum_load + v.cum_load;
        let service_one = u.cum_service + v.cum_service;

        // Both tails joined, reversed
        let distance_two = r1.distance - x.cum_distance + r2.distance - y.cum_distance
            + problem.distance.get(x.number, y.number);
        let load_two = r1.load - u.cum_load + r2.load - v.cum_load;
        let service_two = r1.service - u.cum_service + r2.service - v.cum_service;

        ls.route_cost_of(distance_one, load_one, service_one)
            + ls.route_cost_of(distance_two, load_two, service_two)
            - r1.cost
            - r2.cost
    }

    unsafe fn perform(
        &self,
        ls: &mut LocalSearch,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) {
        let r1 = (*u_ptr).route;
        let r2 = (*v_ptr).route;
        let mut v_ptr = v_ptr;
        let mut x_ptr = (*u_ptr).successor;
        let y_ptr = (*v_ptr).successor;
        if !(*v_ptr).is_depot() {
            backward_reverse(v_ptr, std::ptr::null_mut(), (*r1).end_depot);
        } else {
            v_ptr = (*r1).end_depot;
        }
        link_nodes(u_ptr, v_ptr);
        if !(*x_ptr).is_depot() {
            forward_reverse(x_ptr, std::ptr::null_mut(), (*r2).start_depot);
        } else {
            x_ptr = (*r2).start_depot;
        }
        link_nodes(x_ptr, y_ptr);

        ls.update_route(ctx, r1);
        ls.update_route(ctx, r2);
    }
}

/// M9: 2-opt* between two routes, exchanging the tails
pub struct TwoOptInter;

impl Move for TwoOptInter {
    fn move_name(&self) -> &'static str {
        "TwoOptInter"
    }

    unsafe fn delta(
        &self,
        ls: &LocalSearch,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) -> FloatType {
        let problem = &ctx.problem;

        let u = &*u_ptr;
        let v = &*v_ptr;
        let r1 = &*u.route;
        let r2 = &*v.route;

        if r1.index == r2.index {
            return 0.0;
        }

        let x = &*u.successor;
        let y = &*v.successor;

        // Head of route 1 with the tail of route 2
        let distance_one = u.cum_distance + r2.distance - y.cum_distance
            + problem.distance.get(u.number, y.number);
        let load_one = u.cum_load + r2.load - v.cum_load;
        let service_one = u.cum_service + r2.service - v.cum_service;

        // Head of route 2 with the tail of route 1
        let distance_two = v.cum_distance + r1.distance - x.cum_distance
            + problem.distance.get(v.number, x.number);
        let load_two = v.cum_load + r1.load - u.cum_load;
        let service_two = v.cum_service + r1.service - u.cum_service;

        ls.route_cost_of(distance_one, load_one, service_one)
            + ls.route_cost_of(distance_two, load_two, service_two)
            - r1.cost
            - r2.cost
    }

    unsafe fn perform(
        &self,
        ls: &mut LocalSearch,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) {
        let r1 = (*u_ptr).route;
        let r2 = (*v_ptr).route;
        let x_ptr = (*u_ptr).successor;
        let y_ptr = (*v_ptr).successor;
        link_nodes(u_ptr, y_ptr);
        link_nodes(v_ptr, x_ptr);
        replace_end_depot(v_ptr, (*r2).end_depot);
        replace_end_depot(u_ptr, (*r1).end_depot);
        ls.update_route(ctx, r1);
        ls.update_route(ctx, r2);
    }
}
