use clap::{App, Arg};

use crate::models::FloatType;

/// Representing the resulting command line arguments
pub struct Args {
    pub instance_path: String,
    pub solution_path: String,
    pub time_limit: Option<FloatType>,
    pub max_iterations: Option<u64>,
    pub seed: Option<u64>,
    pub num_vehicles: Option<i64>,
    pub rounded: Option<bool>,
    pub log_enabled: Option<bool>,
    pub best_known_path: Option<String>,
    pub use_decomposition: bool,
    pub decomposition_interval: Option<u64>,
    pub decomposition_target_size: Option<u64>,
    pub decomposition_iterations: Option<u64>,
}

impl Args {
    /// Setup the clap app and parse the command line arguments
    pub fn parse() -> Self {
        let matches = App::new("hgsvrp")
            .version("0.1")
            .about("Hybrid Genetic Search solver for the Capacitated Vehicle Routing Problem")
            .arg(
                Arg::with_name("instance_path")
                    .required(true)
                    .help("Path to problem instance"),
            )
            .arg(
                Arg::with_name("solution_path")
                    .required(true)
                    .help("Path to solution output"),
            )
            .arg(
                Arg::with_name("time_limit")
                    .short("t")
                    .takes_value(true)
                    .help("Time limit in seconds"),
            )
            .arg(
                Arg::with_name("iterations")
                    .long("it")
                    .takes_value(true)
                    .help("Maximum number of iterations without improvement"),
            )
            .arg(
                Arg::with_name("seed")
                    .long("seed")
                    .takes_value(true)
                    .help("Seed for the random number generator"),
            )
            .arg(
                Arg::with_name("vehicles")
                    .long("veh")
                    .takes_value(true)
                    .allow_hyphen_values(true)
                    .help("Maximum number of vehicles, -1 for unlimited"),
            )
            .arg(
                Arg::with_name("round")
                    .long("round")
                    .takes_value(true)
                    .possible_values(&["0", "1"])
                    .help("Round distances computed from coordinates to integers"),
            )
            .arg(
                Arg::with_name("log")
                    .long("log")
                    .takes_value(true)
                    .possible_values(&["0", "1"])
                    .help("Enable console progress traces"),
            )
            .arg(
                Arg::with_name("bks")
                    .long("bks")
                    .takes_value(true)
                    .help("Best known solution file to check and update"),
            )
            .arg(
                Arg::with_name("use_decomposition")
                    .long("useDec")
                    .help("Enable the barycentre clustering decomposition"),
            )
            .arg(
                Arg::with_name("decomposition_interval")
                    .long("decIt")
                    .takes_value(true)
                    .help("Iterations between decomposition rounds"),
            )
            .arg(
                Arg::with_name("decomposition_target_size")
                    .long("decSz")
                    .takes_value(true)
                    .help("Target number of customers per sub-instance"),
            )
            .arg(
                Arg::with_name("decomposition_iterations")
                    .long("decNbIter")
                    .takes_value(true)
                    .help("Non-productive iteration limit of sub-solves"),
            )
            .get_matches();

        let instance_path = matches
            .value_of("instance_path")
            .expect("Instance path is not provided")
            .to_owned();

        let solution_path = matches
            .value_of("solution_path")
            .expect("Solution path is not provided")
            .to_owned();

        Self {
            instance_path,
            solution_path,
            time_limit: parse_flag(&matches, "time_limit"),
            max_iterations: parse_flag(&matches, "iterations"),
            seed: parse_flag(&matches, "seed"),
            num_vehicles: parse_flag(&matches, "vehicles"),
            rounded: parse_flag::<u8>(&matches, "round").map(|value| value != 0),
            log_enabled: parse_flag::<u8>(&matches, "log").map(|value| value != 0),
            best_known_path: matches.value_of("bks").map(String::from),
            use_decomposition: matches.is_present("use_decomposition"),
            decomposition_interval: parse_flag(&matches, "decomposition_interval"),
            decomposition_target_size: parse_flag(&matches, "decomposition_target_size"),
            decomposition_iterations: parse_flag(&matches, "decomposition_iterations"),
        }
    }
}

fn parse_flag<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).map(|value| {
        value
            .parse::<T>()
            .unwrap_or_else(|_| panic!("Invalid {} argument: {}", name, value))
    })
}
