use std::collections::HashSet;
use std::ptr;

use ahash::RandomState;

use crate::constants::EPSILON;
use crate::models::{FloatType, IntType, Matrix};
use crate::solver::genetic::Individual;
use crate::solver::improvement::{link_nodes, LinkNode, LinkRoute, Moves, SwapStar};
use crate::solver::{route_cost, Context};

/// Cost of inserting directly after `node`
#[derive(Debug, Clone, Copy)]
pub struct InsertLocation {
    pub cost: FloatType,
    pub node: *mut LinkNode,
}

impl InsertLocation {
    pub fn new() -> Self {
        Self {
            cost: FloatType::INFINITY,
            node: ptr::null_mut(),
        }
    }

    pub fn reset(&mut self) {
        self.cost = FloatType::INFINITY;
        self.node = ptr::null_mut();
    }
}

/// The three cheapest insertion positions of a node into a route, kept
/// ascending on cost. SWAP* falls back on the second and third position when
/// the best one is invalidated by the customer leaving the route.
#[derive(Debug, Clone, Copy)]
pub struct ThreeBestInserts {
    pub locations: [InsertLocation; 3],
    pub last_calculated: IntType,
}

impl ThreeBestInserts {
    pub fn new() -> Self {
        Self {
            locations: [InsertLocation::new(); 3],
            last_calculated: 0,
        }
    }

    pub fn reset(&mut self) {
        for location in self.locations.iter_mut() {
            location.reset();
        }
    }

    pub fn add(&mut self, location: InsertLocation) {
        if location.cost > self.locations[2].cost {
        } else if location.cost > self.locations[1].cost {
            self.locations[2] = location;
        } else if location.cost > self.locations[0].cost {
            self.locations[2] = self.locations[1];
            self.locations[1] = location;
        } else {
            self.locations[2] = self.locations[1];
            self.locations[1] = self.locations[0];
            self.locations[0] = location;
        }
    }
}

/// Granular local search over the linked route representation. One `run`
/// repeats full sweeps over the customers in random order, applying the
/// first improving move found, until a sweep passes without improvement.
pub struct LocalSearch {
    pub routes: Vec<LinkRoute>,
    pub customers: Vec<usize>,

    pub move_count: IntType,
    pub moves: Moves,

    // Three best insert locations per route and node, used by SWAP*
    pub best_inserts: Matrix<ThreeBestInserts>,

    // Node arenas; the vectors never grow, so the raw links stay valid
    pub nodes: Vec<LinkNode>,
    pub start_depots: Vec<LinkNode>,
    pub end_depots: Vec<LinkNode>,

    pub empty_routes: HashSet<usize, RandomState>,

    // Problem constants and the penalties of the current run
    vehicle_capacity: FloatType,
    duration_limit: FloatType,
    pub penalty_capacity: FloatType,
    pub penalty_duration: FloatType,
}

impl LocalSearch {
    pub fn new(ctx: &Context) -> Self {
        let problem = &ctx.problem;
        let nodes: Vec<LinkNode> = problem
            .clients
            .iter()
            .map(|client| LinkNode::new(client.id, client.polar_angle))
            .collect();

        let customers: Vec<usize> = (1..problem.dim()).collect();
        let num_vehicles = problem.num_vehicles;

        let mut start_depots = Vec::with_capacity(num_vehicles);
        let mut end_depots = Vec::with_capacity(num_vehicles);
        for _ in 0..num_vehicles {
            start_depots.push(LinkNode::new(0, 0));
            end_depots.push(LinkNode::new(0, 0));
        }
        let mut routes = Vec::with_capacity(num_vehicles);
        for route_index in 0..num_vehicles {
            let start_depot_ptr = &mut start_depots[route_index] as *mut LinkNode;
            let end_depot_ptr = &mut end_depots[route_index] as *mut LinkNode;
            routes.push(LinkRoute::new(route_index, start_depot_ptr, end_depot_ptr));
        }

        Self {
            moves: Moves::new(),
            nodes,
            customers,
            best_inserts: Matrix::init(ThreeBestInserts::new(), num_vehicles, problem.dim()),
            routes,
            move_count: 0,
            empty_routes: HashSet::with_capacity_and_hasher(
                num_vehicles,
                ctx.random.random_state(),
            ),
            start_depots,
            end_depots,
            vehicle_capacity: problem.vehicle_capacity,
            duration_limit: problem.duration_limit,
            penalty_capacity: 0.0,
            penalty_duration: 0.0,
        }
    }

    /// Penalised cost of a route with the given totals under the penalties
    /// of the current run
    #[inline]
    pub fn route_cost_of(
        &self,
        distance: FloatType,
        load: FloatType,
        service: FloatType,
    ) -> FloatType {
        route_cost(
            distance,
            load - self.vehicle_capacity,
            distance + service - self.duration_limit,
            self.penalty_capacity,
            self.penalty_duration,
        )
    }

    pub fn run(
        &mut self,
        ctx: &Context,
        individual: &mut Individual,
        penalty_capacity: FloatType,
        penalty_duration: FloatType,
    ) {
        self.penalty_capacity = penalty_capacity;
        self.penalty_duration = penalty_duration;
        self.reset();
        self.load_individual(ctx, individual);
        unsafe {
            self.search(ctx);
        }
        self.update_individual(ctx, individual);
    }

    fn reset(&mut self) {
        self.move_count = 0;
        for node in self.nodes.iter_mut() {
            node.last_tested = -1;
        }
    }

    fn load_individual(&mut self, ctx: &Context, individual: &Individual) {
        debug_assert_eq!(self.routes.len(), individual.phenotype.len());
        unsafe {
            for (route_index, route) in individual.phenotype.iter().enumerate() {
                let mut last_node = &mut self.start_depots[route_index] as *mut LinkNode;
                for &node_index in route.iter() {
                    let node = &mut self.nodes[node_index] as *mut LinkNode;
                    link_nodes(last_node, node);
                    last_node = node;
                }
                let depot_end = &mut self.end_depots[route_index] as *mut LinkNode;
                link_nodes(last_node, depot_end);

                let route_ptr = &mut self.routes[route_index] as *mut LinkRoute;
                (*route_ptr).last_tested_swap_star = -1;
                for node_number in 0..self.nodes.len() {
                    let best_insert = self.best_inserts.get_mut(route_index, node_number);
                    best_insert.reset();
                    best_insert.last_calculated = -1;
                }
                self.update_route(ctx, route_ptr);
            }
        }
    }

    unsafe fn search(&mut self, ctx: &Context) {
        let swap_star_enabled =
            ctx.config.borrow().swap_star && ctx.problem.coordinates_provided;

        // The registry is detached for the sweep so moves can borrow the
        // search mutably
        let moves = std::mem::replace(&mut self.moves, Moves::empty());

        let mut loop_count = 0;
        let mut improvement = true;
        while improvement {
            improvement = false;

            // Visit the customers in a fresh random order every sweep
            ctx.random.shuffle(self.customers.as_mut_slice());
            let order = self.customers.clone();

            for &u_index in order.iter() {
                let u = &mut self.nodes[u_index] as *mut LinkNode;
                let last_test_u = (*u).last_tested;
                (*u).last_tested = self.move_count;
                let mut route_u = (*u).route;

                'v_loop: for &v_index in ctx.problem.neighbors[u_index].iter() {
                    let v = &mut self.nodes[v_index] as *mut LinkNode;
                    let route_v = (*v).route;

                    // Skip the pair when neither route changed since the
                    // last time u was the anchor
                    if loop_count > 0
                        && (*route_u).last_modified.max((*route_v).last_modified) <= last_test_u
                    {
                        continue;
                    }

                    for m in moves.neighbor.iter() {
                        let delta = m.delta(self, ctx, u, v);
                        if delta < -EPSILON {
                            self.move_count += 1;
                            m.perform(self, ctx, u, v);
                            route_u = (*u).route;
                            improvement = true;
                            continue 'v_loop;
                        }
                    }

                    // When v starts its route, also anchor on the depot
                    // before it so insertions at the route head are reached
                    let v_prev = (*v).predecessor;
                    if (*v_prev).is_depot() {
                        for m in moves.depot.iter() {
                            let delta = m.delta(self, ctx, u, v_prev);
                            if delta < -EPSILON {
                                self.move_count += 1;
                                m.perform(self, ctx, u, v_prev);
                                route_u = (*u).route;
                                improvement = true;
                                continue 'v_loop;
                            }
                        }
                    }
                }

                // From the second sweep on, try opening one empty route
                if loop_count > 0 && !self.empty_routes.is_empty() {
                    let empty_route_index =
                        *self.empty_routes.iter().next().expect("No empty route");
                    let route_v = &mut self.routes[empty_route_index] as *mut LinkRoute;
                    let v = (*route_v).start_depot;
                    for m in moves.empty_route.iter() {
                        let delta = m.delta(self, ctx, u, v);
                        if delta < -EPSILON {
                            self.move_count += 1;
                            m.perform(self, ctx, u, v);
                            improvement = true;
                            break;
                        }
                    }
                }
            }

            if swap_star_enabled {
                for r1_index in 0..self.routes.len() {
                    let r1_ptr = &mut self.routes[r1_index] as *mut LinkRoute;
                    if (*r1_ptr).is_empty() {
                        continue;
                    }
                    let last_tested = (*r1_ptr).last_tested_swap_star;
                    (*r1_ptr).last_tested_swap_star = self.move_count;
                    for r2_index in (r1_index + 1)..self.routes.len() {
                        let r2_ptr = &mut self.routes[r2_index] as *mut LinkRoute;
                        if (*r2_ptr).is_empty() {
                            continue;
                        }
                        if loop_count > 0
                            && (*r1_ptr).last_modified.max((*r2_ptr).last_modified) <= last_tested
                        {
                            continue;
                        }
                        if (*r1_ptr).sector.overlaps(&(*r2_ptr).sector) {
                            if SwapStar::run(self, ctx, r1_ptr, r2_ptr) {
                                improvement = true;
                            }
                        }
                    }
                }
            }

            loop_count += 1;
        }

        self.moves = moves;
    }

    /// Rebuild the individual's routes and giant tour from the linked
    /// representation. Empty routes keep their positions.
    fn update_individual(&self, ctx: &Context, individual: &mut Individual) {
        individual.genotype.clear();
        unsafe {
            for (route_index, route) in self.routes.iter().enumerate() {
                let mut customers: Vec<usize> = Vec::with_capacity(route.num_customers);
                let mut next_node = route.start_depot;
                while !next_node.is_null() {
                    let node = &*next_node;
                    if !node.is_depot() {
                        customers.push(node.number);
                    }
                    next_node = node.successor;
                }
                individual.genotype.extend(customers.iter().copied());
                individual.phenotype[route_index] = customers;
            }
        }
        individual.evaluate(ctx);
    }

    /// Refresh every cached quantity of a route after its links changed
    pub fn update_route(&mut self, ctx: &Context, route_ptr: *mut LinkRoute) {
        let problem = &ctx.problem;
        unsafe {
            let mut distance = 0.0;
            let mut load = 0.0;
            let mut service = 0.0;
            let mut num_customers = 0;

            let mut prev_node_ptr = (*route_ptr).start_depot;
            (*prev_node_ptr).route = route_ptr;
            (*prev_node_ptr).position = 0;
            (*prev_node_ptr).cum_distance = 0.0;
            (*prev_node_ptr).cum_load = 0.0;
            (*prev_node_ptr).cum_service = 0.0;

            (*route_ptr).sector.reset();

            let mut node_ptr = (*prev_node_ptr).successor;
            let mut position = 1;
            while !node_ptr.is_null() {
                distance += problem
                    .distance
                    .get((*prev_node_ptr).number, (*node_ptr).number);
                load += problem.clients[(*node_ptr).number].demand;
                service += problem.clients[(*node_ptr).number].service_duration;

                if !(*node_ptr).is_depot() {
                    (*route_ptr).sector.extend((*node_ptr).angle);
                    num_customers += 1;
                }

                (*node_ptr).cum_distance = distance;
                (*node_ptr).cum_load = load;
                (*node_ptr).cum_service = service;
                (*node_ptr).route = route_ptr;
                (*node_ptr).position = position;

                position += 1;
                prev_node_ptr = node_ptr;
                node_ptr = (*node_ptr).successor;
            }

            (*route_ptr).distance = distance;
            (*route_ptr).load = load;
            (*route_ptr).service = service;
            (*route_ptr).overload = load - self.vehicle_capacity;
            (*route_ptr).last_modified = self.move_count;
            (*route_ptr).num_customers = num_customers;
            (*route_ptr).cost = self.route_cost_of(distance, load, service);

            // The sentinels never carry links beyond the route
            self.start_depots[(*route_ptr).index].predecessor = ptr::null_mut();
            self.end_depots[(*route_ptr).index].successor = ptr::null_mut();

            if (*route_ptr).is_empty() {
                self.empty_routes.insert((*route_ptr).index);
            } else {
                self.empty_routes.remove(&(*route_ptr).index);
            }
        }
    }

    /// Preprocess the three cheapest insertions of every customer of `r1`
    /// into `r2`, and the distance saved by removing it from `r1`
    pub unsafe fn preprocess_insertions(
        &mut self,
        ctx: &Context,
        r1_ptr: *mut LinkRoute,
        r2_ptr: *mut LinkRoute,
    ) {
        let problem = &ctx.problem;
        let r1 = &*r1_ptr;
        let r2 = &*r2_ptr;

        let mut u_ptr = (*r1.start_depot).successor;
        while !(*u_ptr).is_depot() {
            let u = &*u_ptr;
            let u_prev = &*u.predecessor;
            let x = &*u.successor;

            let delta_removal = problem.distance.get(u_prev.number, x.number)
                - problem.distance.get(u_prev.number, u.number)
                - problem.distance.get(u.number, x.number);
            (*u_ptr).delta_removal = delta_removal;

            // Only recalculate when the route changed since last time
            if r2.last_modified > self.best_inserts.get(r2.index, u.number).last_calculated {
                let best_insert = self.best_inserts.get_mut(r2.index, u.number);
                best_insert.reset();
                best_insert.last_calculated = self.move_count;

                // Insertion between the depot and the first node
                let mut v_ptr = (*r2.start_depot).successor;
                let cost = problem.distance.get(0, u.number)
                    + problem.distance.get(u.number, (*v_ptr).number)
                    - problem.distance.get(0, (*v_ptr).number);
                best_insert.add(InsertLocation {
                    cost,
                    node: r2.start_depot,
                });

                // Remaining positions of route 2
                while !(*v_ptr).is_depot() {
                    let v = &*v_ptr;
                    let y = &*v.successor;
                    let delta_insert = problem.distance.get(v.number, u.number)
                        + problem.distance.get(u.number, y.number)
                        - problem.distance.get(v.number, y.number);
                    self.best_inserts.get_mut(r2.index, u.number).add(InsertLocation {
                        cost: delta_insert,
                        node: v_ptr,
                    });
                    v_ptr = v.successor;
                }
            }
            u_ptr = u.successor;
        }
    }

    /// Cheapest insertion of `u` into the route of `v` given that `v` leaves
    /// that route at the same time. Returns the node to insert after and the
    /// change in route distance.
    pub unsafe fn cheapest_insert_and_removal(
        &mut self,
        ctx: &Context,
        u_ptr: *mut LinkNode,
        v_ptr: *mut LinkNode,
    ) -> (*mut LinkNode, FloatType) {
        let u = &*u_ptr;
        let v = &*v_ptr;
        let r2 = &*v.route;
        let problem = &ctx.problem;

        let best_insertion = self.best_inserts.get(r2.index, u.number);
        let mut best_node = best_insertion.locations[0].node;
        let mut best_cost = best_insertion.locations[0].cost;

        // Positions directly before or after v become illegal once v is
        // removed; fall through to the runner-up positions
        let mut found =
            (*best_node).number != v.number && (*(*best_node).successor).number != v.number;
        if !found && !best_insertion.locations[1].node.is_null() {
            best_node = best_insertion.locations[1].node;
            best_cost = best_insertion.locations[1].cost;
            found = (*best_node).number != v.number && (*(*best_node).successor).number != v.number;
            if !found && !best_insertion.locations[2].node.is_null() {
                best_node = best_insertion.locations[2].node;
                best_cost = best_insertion.locations[2].cost;
                found = true;
            }
        }

        // Inserting exactly in place of v is always legal
        let v_prev = &*v.predecessor;
        let y = &*v.successor;
        let delta_in_place = problem.distance.get(v_prev.number, u.number)
            + problem.distance.get(u.number, y.number)
            - problem.distance.get(v_prev.number, y.number);

        if !found || delta_in_place < best_cost {
            best_node = v.predecessor;
            best_cost = delta_in_place;
        }

        (best_node, best_cost)
    }
}

impl Drop for LocalSearch {
    fn drop(&mut self) {
        for node in self.nodes.iter_mut() {
            node.route = ptr::null_mut();
            node.predecessor = ptr::null_mut();
            node.successor = ptr::null_mut();
        }
        for node in self.start_depots.iter_mut() {
            node.route = ptr::null_mut();
            node.predecessor = ptr::null_mut();
            node.successor = ptr::null_mut();
        }
        for node in self.end_depots.iter_mut() {
            node.route = ptr::null_mut();
            node.predecessor = ptr::null_mut();
            node.successor = ptr::null_mut();
        }
    }
}
