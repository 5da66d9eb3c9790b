use anyhow::Result;
use instant::Instant;

use hgsvrp::cli::Args;
use hgsvrp::config::Config;
use hgsvrp::solver::genetic::GeneticAlgorithm;
use hgsvrp::solver::Context;
use hgsvrp::utils;

fn main() -> Result<()> {
    // Start time of program
    let start_time = Instant::now();

    // Parse command line arguments and load the config, CLI values last
    let args = Args::parse();
    let mut config = Config::load()?;
    config.update_from_args(&args);

    // Initialize logger
    env_logger::Builder::from_default_env()
        .format_module_path(false)
        .filter_level(if config.log_enabled {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    log::info!("Loading problem file: {}", config.instance_path);
    let mut builder = utils::parse_instance(&config.instance_path)?;
    builder.num_vehicles = config.num_vehicles;
    builder.round_distances = config.round_distances;
    builder.granularity = config.granularity as usize;
    let problem = builder.build()?;
    log::info!(
        "Instance loaded with {} clients and {} vehicles",
        problem.num_customers(),
        problem.num_vehicles
    );

    let ctx = Context::new(problem, config, start_time);
    let mut solver = GeneticAlgorithm::new(&ctx);
    solver.run(&ctx);
    log::info!("Time {:.2}s, completed", ctx.elapsed_as_secs_f64());

    let config = ctx.config.borrow();
    if let Some(best) = solver.best() {
        if let Some(solution_path) = config.solution_path.as_ref() {
            utils::write_solution_file(solution_path, &best.phenotype, best.penalized_cost())?;
            utils::write_search_progress(
                &format!("{}.PG.csv", solution_path),
                &config.instance_path,
                config.seed,
                ctx.search_history.borrow().progress(),
            )?;
        }
        if let Some(best_known_path) = config.best_known_path.as_ref() {
            utils::update_best_known(best_known_path, &best.phenotype, best.penalized_cost())?;
        }
    } else {
        log::warn!("No feasible solution found");
    }

    Ok(())
}
