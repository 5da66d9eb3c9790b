use std::fmt;
use std::ptr;

use crate::models::{CircleSector, FloatType, IntType};

/// Node of the intrusive doubly linked route representation the local search
/// operates on. Raw links keep relinking O(1); every pointer is owned by the
/// `LocalSearch` arenas and reset between runs.
#[derive(Debug)]
pub struct LinkNode {
    pub number: usize,
    pub angle: i32,
    pub successor: *mut LinkNode,
    pub predecessor: *mut LinkNode,
    pub route: *mut LinkRoute,
    pub position: usize,
    pub last_tested: IntType,
    // Cumulative quantities from the route start up to this node
    pub cum_distance: FloatType,
    pub cum_load: FloatType,
    pub cum_service: FloatType,
    // Change in route distance when removing the node
    pub delta_removal: FloatType,
}

impl LinkNode {
    pub fn new(number: usize, angle: i32) -> Self {
        Self {
            number,
            angle,
            successor: ptr::null_mut(),
            predecessor: ptr::null_mut(),
            route: ptr::null_mut(),
            position: 0,
            last_tested: 0,
            cum_distance: 0.0,
            cum_load: 0.0,
            cum_service: 0.0,
            delta_removal: 0.0,
        }
    }

    pub fn is_depot(&self) -> bool {
        self.number == 0
    }
}

/// Links together two nodes
#[inline]
pub unsafe fn link_nodes(node_one: *mut LinkNode, node_two: *mut LinkNode) {
    (*node_one).successor = node_two;
    (*node_two).predecessor = node_one;
}

/// Unlink `node_one` from its position and insert it directly after `node_two`
#[inline]
pub unsafe fn insert_node(node_one: *mut LinkNode, node_two: *mut LinkNode) {
    let node_one_prev = (*node_one).predecessor;
    let node_one_next = (*node_one).successor;
    let node_two_next = (*node_two).successor;
    link_nodes(node_one_prev, node_one_next);
    link_nodes(node_two, node_one);
    link_nodes(node_one, node_two_next);
}

/// Reverse the sequence going forward from `from_node`, stopping at
/// `to_node` when given, and attach `new_first_node` at the former end
pub unsafe fn forward_reverse(
    mut from_node: *mut LinkNode,
    to_node: *mut LinkNode,
    new_first_node: *mut LinkNode,
) {
    let mut node = (*from_node).successor;
    while !node.is_null() {
        let next_node = (*node).successor;

        if next_node.is_null() && !new_first_node.is_null() {
            link_nodes(new_first_node, from_node);
        } else {
            link_nodes(node, from_node);
        }
        if !to_node.is_null() && (*node).number == (*to_node).number {
            break;
        }
        from_node = node;
        node = next_node;
    }
}

/// Reverse the sequence going backward from `from_node`, stopping at
/// `to_node` when given, and attach `new_last_node` at the former start
pub unsafe fn backward_reverse(
    mut from_node: *mut LinkNode,
    to_node: *mut LinkNode,
    new_last_node: *mut LinkNode,
) {
    let mut node = (*from_node).predecessor;
    while !node.is_null() {
        let next_node = (*node).predecessor;

        if next_node.is_null() && !new_last_node.is_null() {
            link_nodes(from_node, new_last_node);
        } else {
            link_nodes(from_node, node);
        }
        if !to_node.is_null() && (*node).number == (*to_node).number {
            break;
        }
        from_node = node;
        node = next_node;
    }
}

/// Walk forward from `from_node` and close the sequence with `end_depot`
#[inline]
pub unsafe fn replace_end_depot(mut from_node: *mut LinkNode, end_depot: *mut LinkNode) {
    let mut next_node = (*from_node).successor;
    while !next_node.is_null() {
        if (*next_node).successor.is_null() {
            link_nodes(from_node, end_depot);
        }
        from_node = next_node;
        next_node = (*next_node).successor;
    }
}

/// Route header of the linked representation, caching the aggregate
/// quantities every move delta needs
#[derive(Debug)]
pub struct LinkRoute {
    pub index: usize,

    // The depot sentinels bracketing the customer sequence
    pub start_depot: *mut LinkNode,
    pub end_depot: *mut LinkNode,

    pub num_customers: usize,

    // Timestamps in move counts, used to skip unchanged route pairs
    pub last_modified: IntType,
    pub last_tested_swap_star: IntType,

    // Circle sector spanned by the route's customers
    pub sector: CircleSector,

    pub distance: FloatType,
    pub load: FloatType,
    pub service: FloatType,
    // load - capacity, negative when there is slack
    pub overload: FloatType,

    // Penalised cost under the penalties of the current run
    pub cost: FloatType,
}

impl LinkRoute {
    pub fn new(index: usize, start_depot: *mut LinkNode, end_depot: *mut LinkNode) -> Self {
        Self {
            index,
            start_depot,
            end_depot,
            num_customers: 0,
            last_modified: 0,
            last_tested_swap_star: 0,
            sector: CircleSector::new(),
            distance: 0.0,
            load: 0.0,
            service: 0.0,
            overload: 0.0,
            cost: FloatType::INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_customers == 0
    }
}

impl fmt::Display for LinkRoute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut customers: Vec<usize> = Vec::new();
        let mut next_node_ptr = self.start_depot;
        while !next_node_ptr.is_null() {
            unsafe {
                let node = &*next_node_ptr;
                if !node.is_depot() {
                    customers.push(node.number);
                }
                next_node_ptr = node.successor;
            }
        }
        write!(f, "{:?}", customers)
    }
}
