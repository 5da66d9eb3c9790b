//! C ABI of the solver, mirroring the library entry points of the original
//! HGS-CVRP distribution. Callers release returned solutions through
//! `delete_solution`.

use std::os::raw::{c_char, c_double, c_int};
use std::slice;

use instant::Instant;

use crate::config::Config;
use crate::models::{FloatType, Matrix, ProblemBuilder};
use crate::solver::genetic::GeneticAlgorithm;
use crate::solver::Context;

#[repr(C)]
pub struct SolutionRoute {
    pub length: c_int,
    // Customer indices, 1-based as in the instance format
    pub path: *mut c_int,
}

#[repr(C)]
pub struct Solution {
    pub cost: c_double,
    pub time: c_double,
    pub n_routes: c_int,
    pub routes: *mut SolutionRoute,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct AlgorithmParameters {
    pub nb_granular: c_int,
    pub mu: c_int,
    pub lambda: c_int,
    pub nb_elite: c_int,
    pub nb_close: c_int,
    pub target_feasible: c_double,
    pub seed: c_int,
    pub nb_iter: c_int,
    pub time_limit: c_double,
    pub use_swap_star: c_char,
    pub use_decomposition: c_char,
    pub deco_iterations: c_int,
    pub deco_target_size: c_int,
    pub deco_nb_iter: c_int,
}

#[no_mangle]
pub extern "C" fn default_algorithm_parameters() -> AlgorithmParameters {
    AlgorithmParameters {
        nb_granular: 20,
        mu: 25,
        lambda: 40,
        nb_elite: 4,
        nb_close: 5,
        target_feasible: 0.2,
        seed: 0,
        nb_iter: 20_000,
        time_limit: 0.0,
        use_swap_star: 1,
        use_decomposition: 0,
        deco_iterations: 0,
        deco_target_size: 100,
        deco_nb_iter: 0,
    }
}

fn config_from_parameters(ap: &AlgorithmParameters) -> Config {
    let mut config = Config::default();
    config.granularity = ap.nb_granular as u64;
    config.min_population_size = ap.mu as u64;
    config.population_lambda = ap.lambda as u64;
    config.num_elites = ap.nb_elite as u64;
    config.num_diversity_closest = ap.nb_close as u64;
    config.target_feasible = ap.target_feasible as FloatType;
    config.seed = ap.seed as u64;
    config.max_iterations_without_improvement = ap.nb_iter as u64;
    config.time_limit = if ap.time_limit > 0.0 {
        Some(ap.time_limit as FloatType)
    } else {
        None
    };
    config.swap_star = ap.use_swap_star != 0;
    config.use_decomposition = ap.use_decomposition != 0;
    config.decomposition_interval = ap.deco_iterations as u64;
    config.decomposition_target_size = ap.deco_target_size as u64;
    config.decomposition_iterations = if ap.deco_nb_iter > 0 {
        Some(ap.deco_nb_iter as u64)
    } else {
        None
    };
    config.log_enabled = false;
    config
}

/// Solve from coordinates; the euclidean matrix is built internally and
/// optionally rounded to integers.
///
/// # Safety
/// `n` counts every node including the depot; `x`, `y`, `serv_time` and
/// `dem` must point to `n` readable doubles each (depot first); `ap` must be
/// null or point to a valid parameter block.
#[no_mangle]
pub unsafe extern "C" fn solve_cvrp(
    n: c_int,
    x: *const c_double,
    y: *const c_double,
    serv_time: *const c_double,
    dem: *const c_double,
    vehicle_capacity: c_double,
    duration_limit: c_double,
    is_rounding_integer: c_char,
    is_duration_constraint: c_char,
    max_nb_veh: c_int,
    ap: *const AlgorithmParameters,
    verbose: c_char,
) -> *mut Solution {
    let dim = n as usize;
    let coordinates = slice::from_raw_parts(x, dim)
        .iter()
        .zip(slice::from_raw_parts(y, dim).iter())
        .map(|(&x, &y)| (x as FloatType, y as FloatType))
        .collect();

    let mut builder = ProblemBuilder::new();
    builder.coordinates = Some(coordinates);
    builder.service_durations = slice::from_raw_parts(serv_time, dim).to_vec();
    builder.demands = slice::from_raw_parts(dem, dim).to_vec();
    builder.vehicle_capacity = Some(vehicle_capacity as FloatType);
    builder.duration_limit = if is_duration_constraint != 0 {
        Some(duration_limit as FloatType)
    } else {
        None
    };
    builder.round_distances = is_rounding_integer != 0;
    builder.num_vehicles = max_nb_veh as i64;

    solve_with_builder(builder, ap, verbose)
}

/// Solve from an explicit row-major `n x n` distance matrix, `n` counting
/// every node including the depot. `x` and `y` may be null, in which case
/// SWAP* and the decomposition are disabled.
///
/// # Safety
/// `dist_mtx` must point to `n * n` readable doubles; `serv_time` and `dem`
/// to `n` each; `x`/`y` to `n` when non-null; `ap` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn solve_cvrp_dist_mtx(
    n: c_int,
    x: *const c_double,
    y: *const c_double,
    dist_mtx: *const c_double,
    serv_time: *const c_double,
    dem: *const c_double,
    vehicle_capacity: c_double,
    duration_limit: c_double,
    is_duration_constraint: c_char,
    max_nb_veh: c_int,
    ap: *const AlgorithmParameters,
    verbose: c_char,
) -> *mut Solution {
    let dim = n as usize;

    let mut builder = ProblemBuilder::new();
    if !x.is_null() && !y.is_null() {
        builder.coordinates = Some(
            slice::from_raw_parts(x, dim)
                .iter()
                .zip(slice::from_raw_parts(y, dim).iter())
                .map(|(&x, &y)| (x as FloatType, y as FloatType))
                .collect(),
        );
    }

    let mut matrix = Matrix::new(dim, dim);
    let values = slice::from_raw_parts(dist_mtx, dim * dim);
    for row in 0..dim {
        for col in 0..dim {
            matrix.set(row, col, values[row * dim + col] as FloatType);
        }
    }
    builder.distances = Some(matrix);
    builder.service_durations = slice::from_raw_parts(serv_time, dim).to_vec();
    builder.demands = slice::from_raw_parts(dem, dim).to_vec();
    builder.vehicle_capacity = Some(vehicle_capacity as FloatType);
    builder.duration_limit = if is_duration_constraint != 0 {
        Some(duration_limit as FloatType)
    } else {
        None
    };
    builder.num_vehicles = max_nb_veh as i64;

    solve_with_builder(builder, ap, verbose)
}

unsafe fn solve_with_builder(
    mut builder: ProblemBuilder,
    ap: *const AlgorithmParameters,
    verbose: c_char,
) -> *mut Solution {
    let parameters = if ap.is_null() {
        default_algorithm_parameters()
    } else {
        *ap
    };
    let mut config = config_from_parameters(&parameters);
    config.log_enabled = verbose != 0;
    builder.granularity = config.granularity as usize;

    let problem = match builder.build() {
        Ok(problem) => problem,
        Err(error) => {
            log::error!("{:#}", error);
            return std::ptr::null_mut();
        }
    };

    let start_time = Instant::now();
    let ctx = Context::new(problem, config, start_time);
    let mut algorithm = GeneticAlgorithm::new(&ctx);
    algorithm.run(&ctx);

    let solution = match algorithm.best() {
        Some(best) => {
            let routes: Vec<SolutionRoute> = best
                .phenotype
                .iter()
                .filter(|route| !route.is_empty())
                .map(|route| {
                    let mut path: Box<[c_int]> = route
                        .iter()
                        .map(|&customer| customer as c_int)
                        .collect::<Vec<c_int>>()
                        .into_boxed_slice();
                    let route = SolutionRoute {
                        length: path.len() as c_int,
                        path: path.as_mut_ptr(),
                    };
                    std::mem::forget(path);
                    route
                })
                .collect();
            let mut routes = routes.into_boxed_slice();
            let solution = Solution {
                cost: best.penalized_cost() as c_double,
                time: ctx.elapsed_as_secs_f64() as c_double,
                n_routes: routes.len() as c_int,
                routes: routes.as_mut_ptr(),
            };
            std::mem::forget(routes);
            solution
        }
        None => Solution {
            cost: 0.0,
            time: ctx.elapsed_as_secs_f64() as c_double,
            n_routes: 0,
            routes: std::ptr::null_mut(),
        },
    };

    Box::into_raw(Box::new(solution))
}

/// Release a solution returned by `solve_cvrp` or `solve_cvrp_dist_mtx`.
///
/// # Safety
/// `solution` must come from one of the solve entry points and must not be
/// released twice.
#[no_mangle]
pub unsafe extern "C" fn delete_solution(solution: *mut Solution) {
    if solution.is_null() {
        return;
    }
    let solution = Box::from_raw(solution);
    if !solution.routes.is_null() {
        let num_routes = solution.n_routes as usize;
        for index in 0..num_routes {
            let route = &*solution.routes.add(index);
            if !route.path.is_null() {
                drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    route.path,
                    route.length as usize,
                )));
            }
        }
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            solution.routes,
            num_routes,
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_and_release_through_the_c_interface() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let y = [5.0, 4.0, 3.0, 2.0, 1.0, 9.0, 8.0, 7.0, 6.0, 5.0];
        let service = [0.0; 10];
        let demand = [0.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0];

        let mut ap = default_algorithm_parameters();
        ap.time_limit = 1.0;
        ap.nb_iter = 2000;

        let solution = unsafe {
            solve_cvrp(
                10,
                x.as_ptr(),
                y.as_ptr(),
                service.as_ptr(),
                demand.as_ptr(),
                10.0,
                0.0,
                1,
                0,
                2,
                &ap,
                0,
            )
        };
        assert!(!solution.is_null());

        unsafe {
            let solution_ref = &*solution;
            assert!(solution_ref.cost > 0.0);
            assert_eq!(2, solution_ref.n_routes);

            // Every customer appears exactly once across the routes
            let mut seen = vec![false; 10];
            for index in 0..solution_ref.n_routes as usize {
                let route = &*solution_ref.routes.add(index);
                let path = slice::from_raw_parts(route.path, route.length as usize);
                for &customer in path.iter() {
                    assert!(customer >= 1 && customer <= 9);
                    assert!(!seen[customer as usize]);
                    seen[customer as usize] = true;
                }
            }
            assert!(seen[1..].iter().all(|&visited| visited));

            delete_solution(solution);
        }
    }

    #[test]
    fn null_coordinates_with_a_matrix_are_accepted() {
        let demand = [0.0, 2.0, 3.0, 1.0];
        let service = [0.0; 4];
        let mut matrix = [0.0f64; 16];
        let coords = [(0.0, 0.0), (0.0, 5.0), (5.0, 5.0), (5.0, 0.0)];
        for i in 0..4 {
            for j in 0..4 {
                let dx: f64 = coords[i].0 - coords[j].0;
                let dy: f64 = coords[i].1 - coords[j].1;
                matrix[i * 4 + j] = (dx * dx + dy * dy).sqrt().round();
            }
        }

        let mut ap = default_algorithm_parameters();
        ap.nb_iter = 200;

        let solution = unsafe {
            solve_cvrp_dist_mtx(
                4,
                std::ptr::null(),
                std::ptr::null(),
                matrix.as_ptr(),
                service.as_ptr(),
                demand.as_ptr(),
                10.0,
                0.0,
                0,
                -1,
                &ap,
                0,
            )
        };
        assert!(!solution.is_null());
        unsafe {
            assert!((*solution).n_routes >= 1);
            delete_solution(solution);
        }
    }
}
