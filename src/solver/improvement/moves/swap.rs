use crate::models::FloatType;
use crate::solver::improvement::{link_nodes, LinkNode, LocalSearch, Move};
use crate::solver::Context;

/// M4: swap u and v
pub struct SwapOneWithOne;

impl Move for SwapOneWithOne {
    fn move_name(&self) -> &'static str {
        "SwapOneWithOne"
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
        let v_prev = &*v.predecessor;
        let y = &*v.successor;

        let r1 = &*u.route;
        let r2 = &*v.route;

        // Nothing happens
        if u.number == y.number || u.number == v_prev.number {
            return 0.0;
        }

        let distance_one = r1.distance
            - problem.distance.get(u_prev.number, u.number)
            - problem.distance.get(u.number, x.number)
            + problem.distance.get(u_prev.number, v.number)
            + problem.distance.get(v.number, x.number);

        let distance_two = r2.distance
            - problem.distance.get(v_prev.number, v.number)
            - problem.distance.get(v.number, y.number)
            + problem.distance.get(v_prev.number, u.number)
            + problem.distance.get(u.number, y.number);

        if r1.index == r2.index {
            let new_distance = distance_one + distance_two - r1.distance;
            return ls.route_cost_of(new_distance, r1.load, r1.service) - r1.cost;
        }

        let delta_demand = problem.clients[v.number].demand - problem.clients[u.number].demand;
        let delta_service = problem.clients[v.number].service_duration
            - problem.clients[u.number].service_duration;
        ls.route_cost_of(distance_one, r1.load + delta_demand, r1.service + delta_service)
            + ls.route_cost_of(distance_two, r2.load - delta_demand, r2.service - delta_service)
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
        let v_prev_ptr = (*v_ptr).predecessor;
        let y_ptr = (*v_ptr).successor;

        link_nodes(u_prev_ptr, v_ptr);
        link_nodes(v_ptr, x_ptr);
        link_nodes(v_prev_ptr, u_ptr);
        link_nodes(u_ptr, y_ptr);

        ls.update_route(ctx, r1);
        if (*r1).index != (*r2).index {
            ls.update_route(ctx, r2);
        }
    }
}

/// M5: swap the pair (u, succ u) with v
pub struct SwapTwoWithOne;

impl Move for SwapTwoWithOne {
    fn move_name(&self) -> &'static str {
        "SwapTwoWithOne"
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
        let v_prev = &*v.predecessor;
        let y = &*v.successor;

        let r1 = &*u.route;
        let r2 = &*v.route;

        // Nothing happens
        if u.number == v_prev.number || x.number == v_prev.number || u.number == y.number {
            return 0.0;
        }

        let distance_one = r1.distance
            - problem.distance.get(u_prev.number, u.number)
            - problem.distance.get(u.number, x.number)
            - problem.distance.get(x.number, x_next.number)
            + problem.distance.get(u_prev.number, v.number)
            + problem.distance.get(v.number, x_next.number);

        let distance_two = r2.distance
            - problem.distance.get(v_prev.number, v.number)
            - problem.distance.get(v.number, y.number)
            + problem.distance.get(v_prev.number, u.number)
            + problem.distance.get(u.number, x.number)
            + problem.distance.get(x.number, y.number);

        if r1.index == r2.index {
            let new_distance = distance_one + distance_two - r1.distance;
            return ls.route_cost_of(new_distance, r1.load, r1.service) - r1.cost;
        }

        let delta_demand = problem.clients[v.number].demand
            - problem.clients[u.number].demand
            - problem.clients[x.number].demand;
        let delta_service = problem.clients[v.number].service_duration
            - problem.clients[u.number].service_duration
            - problem.clients[x.number].service_duration;
        ls.route_cost_of(distance_one, r1.load + delta_demand, r1.service + delta_service)
            + ls.route_cost_of(distance_two, r2.load - delta_demand, r2.service - delta_service)
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
        let v_prev_ptr = (*v_ptr).predecessor;
        let y_ptr = (*v_ptr).successor;

        link_nodes(u_prev_ptr, v_ptr);
        link_nodes(v_ptr, x_next_ptr);
        link_nodes(v_prev_ptr, u_ptr);
        link_nodes(x_ptr, y_ptr);

        ls.update_route(ctx, r1);
        if (*r1).index != (*r2).index {
            ls.update_route(ctx, r2);
        }
    }
}

/// M6: swap the pair (u, succ u) with the pair (v, succ v)
pub struct SwapTwoWithTwo;

impl Move for SwapTwoWithTwo {
    fn move_name(&self) -> &'static str {
        "SwapTwoWithTwo"
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
        let v_prev = &*v.predecessor;
        let y = &*v.successor;
        if y.is_depot() {
            return 0.0;
        }
        let y_next = &*y.successor;

        let r1 = &*u.route;
        let r2 = &*v.route;

        // Nothing happens
        if u.number == y.number
            || v.number == x.number
            || y.number == u_prev.number
            || v.number == x_next.number
        {
            return 0.0;
        }

        let distance_one = r1.distance
            - problem.distance.get(u_prev.number, u.number)
            - problem.distance.get(u.number, x.number)
            - problem.distance.get(x.number, x_next.number)
            + problem.distance.get(u_prev.number, v.number)
            + problem.distance.get(v.number, y.number)
            + problem.distance.get(y.number, x_next.number);

        let distance_two = r2.distance
            - problem.distance.get(v_prev.number, v.number)
            - problem.distance.get(v.number, y.number)
            - problem.distance.get(y.number, y_next.number)
            + problem.distance.get(v_prev.number, u.number)
            + problem.distance.get(u.number, x.number)
            + problem.distance.get(x.number, y_next.number);

        if r1.index == r2.index {
            let new_distance = distance_one + distance_two - r1.distance;
            return ls.route_cost_of(new_distance, r1.load, r1.service) - r1.cost;
        }

        let delta_demand = problem.clients[v.number].demand + problem.clients[y.number].demand
            - problem.clients[u.number].demand
            - problem.clients[x.number].demand;
        let delta_service = problem.clients[v.number].service_duration
            + problem.clients[y.number].service_duration
            - problem.clients[u.number].service_duration
            - problem.clients[x.number].service_duration;
        ls.route_cost_of(distance_one, r1.load + delta_demand, r1.service + delta_service)
            + ls.route_cost_of(distance_two, r2.load - delta_demand, r2.service - delta_service)
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
        let v_prev_ptr = (*v_ptr).predecessor;
        let y_ptr = (*v_ptr).successor;
        let y_next_ptr = (*y_ptr).successor;

        link_nodes(u_prev_ptr, v_ptr);
        link_nodes(y_ptr, x_next_ptr);
        link_nodes(v_prev_ptr, u_ptr);
        link_nodes(x_ptr, y_next_ptr);

        ls.update_route(ctx, r1);
        if (*r1).index != (*r2).index {
            ls.update_route(ctx, r2);
        }
    }
}
