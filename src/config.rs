use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::Args;
use crate::models::FloatType;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    // General
    pub instance_path: String,
    pub solution_path: Option<String>,
    pub best_known_path: Option<String>,
    pub time_limit: Option<FloatType>,
    pub max_iterations_without_improvement: u64,
    pub num_vehicles: i64,
    pub round_distances: bool,
    pub log_enabled: bool,
    pub seed: u64,

    // Genetic algorithm
    pub min_population_size: u64,
    pub population_lambda: u64,
    pub num_elites: u64,
    pub num_diversity_closest: u64,
    pub target_feasible: FloatType,
    pub repair_probability: FloatType,

    // Local search
    pub granularity: u64,
    pub swap_star: bool,

    // Penalties
    pub penalty_capacity: FloatType,
    pub penalty_duration: FloatType,
    pub penalty_update_interval: u64,
    pub penalty_inc_multiplier: FloatType,
    pub penalty_dec_multiplier: FloatType,
    pub log_interval: u64,

    // Decomposition
    pub use_decomposition: bool,
    pub decomposition_interval: u64,
    pub decomposition_target_size: u64,
    pub decomposition_iterations: Option<u64>,
}

impl Config {
    pub fn default() -> Self {
        Self {
            // General
            instance_path: String::new(),
            solution_path: None,
            best_known_path: None,
            time_limit: None,
            max_iterations_without_improvement: 20_000,
            num_vehicles: -1,
            // CVRPLIB convention: euclidean distances rounded to integers
            round_distances: true,
            log_enabled: true,
            seed: 0,

            // Genetic Algorithm
            min_population_size: 25,
            population_lambda: 40,
            num_elites: 4,
            num_diversity_closest: 5,
            target_feasible: 0.2,
            repair_probability: 0.5,

            // Local search
            granularity: 20,
            swap_star: true,

            // Penalties
            penalty_capacity: 100.0,
            penalty_duration: 1.0,
            penalty_update_interval: 100,
            penalty_inc_multiplier: 1.2,
            penalty_dec_multiplier: 0.85,
            log_interval: 500,

            // Decomposition
            use_decomposition: false,
            decomposition_interval: 0,
            decomposition_target_size: 100,
            decomposition_iterations: None,
        }
    }

    pub fn update_from_args(&mut self, args: &Args) {
        self.instance_path = args.instance_path.clone();
        self.solution_path = Some(args.solution_path.clone());
        if let Some(time_limit) = args.time_limit {
            self.time_limit = Some(time_limit);
        }
        if let Some(max_iterations) = args.max_iterations {
            self.max_iterations_without_improvement = max_iterations;
        }
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(num_vehicles) = args.num_vehicles {
            self.num_vehicles = num_vehicles;
        }
        if let Some(rounded) = args.rounded {
            self.round_distances = rounded;
        }
        if let Some(log_enabled) = args.log_enabled {
            self.log_enabled = log_enabled;
        }
        if let Some(best_known_path) = args.best_known_path.as_ref() {
            self.best_known_path = Some(best_known_path.clone());
        }
        if args.use_decomposition {
            self.use_decomposition = true;
        }
        if let Some(interval) = args.decomposition_interval {
            self.decomposition_interval = interval;
        }
        if let Some(target_size) = args.decomposition_target_size {
            self.decomposition_target_size = target_size;
        }
        if let Some(iterations) = args.decomposition_iterations {
            self.decomposition_iterations = Some(iterations);
        }
    }

    /// Iterations between decomposition rounds; 0 picks the size-based default
    pub fn decomposition_interval_for(&self, num_customers: usize) -> u64 {
        if self.decomposition_interval > 0 {
            self.decomposition_interval
        } else if num_customers <= 1000 {
            5000
        } else {
            2500
        }
    }

    /// Non-productive iteration limit for decomposition sub-solves
    pub fn decomposition_iterations(&self) -> u64 {
        self.decomposition_iterations
            .unwrap_or(self.max_iterations_without_improvement)
    }

    fn read_yaml_file(filepath: &str) -> Result<Value> {
        let file =
            File::open(filepath).with_context(|| format!("Cannot open file {}", filepath))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).with_context(|| format!("Failed to read {}", filepath))
    }

    /// Loads defaults patched with the values found in a YAML file
    pub fn load_yaml_file(filepath: &str) -> Result<Self> {
        let mut config = Self::default();
        config.patch(&Self::read_yaml_file(filepath)?)?;
        Ok(config)
    }

    /// Loads defaults, patched from `config.yml` if one is present
    pub fn load() -> Result<Self> {
        if Path::new("config.yml").exists() {
            Self::load_yaml_file("config.yml")
        } else {
            Ok(Self::default())
        }
    }

    pub fn patch(&mut self, values: &Value) -> Result<()> {
        let mut config: Value =
            serde_json::to_value(&self).context("Failed to serialize config")?;
        match values {
            Value::Object(values_map) => {
                // Every key addresses a top-level config field as a JSON pointer
                for (key, value) in values_map.iter() {
                    let root_key = format!("/{}", key);
                    if let Some(config_value) = config.pointer_mut(&root_key) {
                        *config_value = value.clone();
                    } else {
                        bail!("Unknown config key: {}", key);
                    }
                }
            }
            _ => bail!("Cannot patch config: expected a mapping"),
        }
        *self = serde_json::from_value(config).context("Failed to deserialize patched config")?;
        Ok(())
    }
}
