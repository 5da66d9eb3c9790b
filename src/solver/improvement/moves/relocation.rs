use crate::models::FloatType;
use crate::solver::improvement::{link_nodes, LinkNode, LocalSearch, Move};
use crate::solver::Context;

/// M1: relocate u after v
pub struct RelocateSingle;

impl Move for RelocateSingle {
    fn move_name(&self) -> &'static str {
        "RelocateSingle"
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
        let u_prev = &*u.predecessor;
        let x = &*u.successor;
        let v = &*v_ptr;
        let y = &*v.successor;

        let r1 = &*u.route;
        let r2 = &*v.route;

        // Nothing happens
        if y.number == u.number {
            return 0.0;
        }

        let distance_one = r1.distance
            - problem.distance.get(u_prev.number, u.number)
            - problem.distance.get(u.number, x.number)
            + problem.distance.get(u_prev.number, x.number);

        let distance_two = r2.distance - problem.distance.get(v.number, y.number)
            + problem.distance.get(v.number, u.number)
            + problem.distance.get(u.number, y.number);

        if r1.index == r2.index {
            let new_distance = distance_one + distance_two - r1.distance;
            return ls.route_cost_of(new_distance, r1.load, r1.service) - r1.cost;
        }

        let u_demand = problem.clients[u.number].demand;
        let u_service = problem.clients[u.number].service_duration;
        ls.route_cost_of(distance_one, r1.load - u_demand, r1.service - u_service)
            + ls.route_cost_of(distance_two, r2.load + u_demand, r2.service + u_service)
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

        let u_prev_ptr = (*u_ptr).predecessor;
        let x_ptr = (*u_ptr).successor;
        let y_ptr = (*v_ptr).successor;

        // (up, u, x) -> (up, x)
        link_nodes(u_prev_ptr, x_ptr);

        // (v, y) -> (v, u, y)
        link_nodes(v_ptr, u_ptr);
        link_nodes(u_ptr, y_ptr);

        ls.update_route(ctx, r1);
        if (*r1).index != (*r2).index {
            ls.update_route(ctx, r2);
        }
    }
}

/// M2: relocate the pair (u, succ u) after v
pub struct RelocateDouble;

impl Move for RelocateDouble {
    fn move_name(&self) -> &'static str {
        "RelocateDouble"
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
        let u_prev = &*u.predecessor;
        let x = &*u.successor;
        if x.is_depot() {
            return 0.0;
        }
        let x_next = &*x.successor;

        let v = &*v_ptr;
        let y = &*v.successor;

        let r1 = &*u.route;
        let r2 = &*v.route;

        // Nothing happens
        if u.number == y.number || v.number == x.number {
            return 0.0;
        }

        let distance_one = r1.distance
            - problem.distance.get(u_prev.number, u.number)
            - problem.distance.get(u.number, x.number)
            - problem.distance.get(x.number, x_next.number)
            + problem.distance.get(u_prev.number, x_next.number);

        let distance_two = r2.distance - problem.distance.get(v.number, y.number)
            + problem.distance.get(v.number, u.number)
            + problem.distance.get(u.number, x.number)
            + problem.distance.get(x.number, y.number);

        if r1.index == r2.index {
            let new_distance = distance_one + distance_two - r1.distance;
            return ls.route_cost_of(new_distance, r1.load, r1.service) - r1.cost;
        }

        let moved_demand = problem.clients[u.number].demand + problem.clients[x.number].demand;
        let moved_service = problem.clients[u.number].service_duration
            + problem.clients[x.number].service_duration;
        ls.route_cost_of(distance_one, r1.load - moved_demand, r1.service - moved_service)
            + ls.route_cost_of(distance_two, r2.load + moved_demand, r2.service + moved_service)
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

        let u_prev_ptr = (*u_ptr).predecessor;
        let x_ptr = (*u_ptr).successor;
        let x_next_ptr = (*x_ptr).successor;
        let y_ptr = (*v_ptr).successor;

        // (up, u, x, xn) -> (up, xn)
        link_nodes(u_prev_ptr, x_next_ptr);

        // (v, y) -> (v, u, x, y)
        link_nodes(v_ptr, u_ptr);
        link_nodes(x_ptr, y_ptr);

        ls.update_route(ctx, r1);
        if (*r1).index != (*r2).index {
            ls.update_route(ctx, r2);
        }
    }
}

/// M3: relocate the pair (u, succ u) after v, reversing it
pub struct RelocateDoubleReverse;

impl Move for RelocateDoubleReverse {
    fn move_name(&self) -> &'static str {
        "RelocateDoubleReverse"
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
        let u_prev = &*u.predecessor;
        let x = &*u.successor;
        if x.is_depot() {
            return 0.0;
        }
        let x_next = &*x.successor;

        let v = &*v_ptr;
        let y = &*v.successor;

        let r1 = &*u.route;
        let r2 = &*v.route;

        // Nothing happens
        if u.number == y.number || v.number == x.number {
            return 0.0;
        }

        let distance_one = r1.distance
            - problem.distance.get(u_prev.number, u.number)
            - problem.distance.get(u.number, x.number)
            - problem.distance.get(x.number, x_next.number)
            + problem.distance.get(u_prev.number, x_next.number);

        let distance_two = r2.distance - problem.distance.get(v.number, y.number)
            + problem.distance.get(v.number, x.number)
            + problem.distance.get(x.number, u.number)
            + problem.distance.get(u.number, y.number);

        if r1.index == r2.index {
            let new_distance = distance_one + distance_two - r1.distance;
            return ls.route_cost_of(new_distance, r1.load, r1.service) - r1.cost;
        }

        let moved_demand = problem.clients[u.number].demand + problem.clients[x.number].demand;
        let moved_service = problem.clients[u.number].service_duration
            + problem.clients[x.number].service_duration;
        ls.route_cost_of(distance_one, r1.load - moved_demand, r1.service - moved_service)
            + ls.route_cost_of(distance_two, r2.load + moved_demand, r2.service + moved_service)
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

        let u_prev_ptr = (*u_ptr).predecessor;
        let x_ptr = (*u_ptr).successor;
        let x_next_ptr = (*x_ptr).successor;
        let y_ptr = (*v_ptr).successor;

        // (up, u, x, xn) -> (up, xn) and (v, y) -> (v, x, u, y)
        link_nodes(u_prev_ptr, x_next_ptr);
        link_nodes(v_ptr, x_ptr);
        link_nodes(x_ptr, u_ptr);
        link_nodes(u_ptr, y_ptr);

        ls.update_route(ctx, r1);
        if (*r1).index != (*r2).index {
            ls.update_route(ctx, r2);
        }
    }
}
