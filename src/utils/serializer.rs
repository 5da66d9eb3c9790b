use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use anyhow::{Context as _, Result};

use crate::models::FloatType;
use crate::solver::cost_improves;

/// Formats routes and cost in the CVRPLIB solution format:
/// one `Route #k: ...` line per non-empty route, then a `Cost` line.
pub fn format_solution(routes: &[Vec<usize>], cost: FloatType) -> String {
    let mut out = String::new();
    let mut route_number = 0;
    for route in routes.iter() {
        if route.is_empty() {
            continue;
        }
        route_number += 1;
        out.push_str(&format!("Route #{}:", route_number));
        for &customer in route.iter() {
            out.push_str(&format!(" {}", customer));
        }
        out.push('\n');
    }
    out.push_str(&format!("Cost {}\n", cost));
    out
}

pub fn write_solution_file(path: &str, routes: &[Vec<usize>], cost: FloatType) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Cannot open solution file: {}", path))?;
    file.write_all(format_solution(routes, cost).as_bytes())
        .with_context(|| format!("Failed to write solution to {}", path))?;
    Ok(())
}

/// Appends one `instance;seed;cost;time_seconds` row per new overall best
pub fn write_search_progress(
    path: &str,
    instance: &str,
    seed: u64,
    progress: &[(FloatType, FloatType)],
) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Cannot open progress file: {}", path))?;
    for &(cost, time) in progress.iter() {
        writeln!(file, "{};{};{};{}", instance, seed, cost, time)
            .with_context(|| format!("Failed to write progress to {}", path))?;
    }
    Ok(())
}

/// Reads the `Cost` line of an existing solution file
fn read_solution_cost(path: &str) -> Option<FloatType> {
    let file = File::open(path).ok()?;
    let reader = BufReader::new(file);
    for line in reader.lines().filter_map(|line| line.ok()) {
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("Cost") {
            return tokens.next()?.parse::<FloatType>().ok();
        }
    }
    None
}

/// Overwrites the best known solution file if this run produced a better one
pub fn update_best_known(path: &str, routes: &[Vec<usize>], cost: FloatType) -> Result<()> {
    match read_solution_cost(path) {
        Some(best_known) if !cost_improves(cost, best_known) => {
            log::info!("Best known solution {} not improved", best_known);
            Ok(())
        }
        _ => {
            log::info!("New best known solution: {}", cost);
            write_solution_file(path, routes, cost)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_nonempty_routes_with_cost() {
        let routes = vec![vec![5, 3, 8], vec![], vec![2, 7, 1]];
        let formatted = format_solution(&routes, 123.45);
        assert_eq!("Route #1: 5 3 8\nRoute #2: 2 7 1\nCost 123.45\n", formatted);
    }

    #[test]
    fn integral_cost_prints_without_fraction() {
        let formatted = format_solution(&[vec![1]], 29.0);
        assert!(formatted.ends_with("Cost 29\n"));
    }

    #[test]
    fn best_known_round_trip() {
        let path = std::env::temp_dir().join("hgsvrp_bks_test.sol");
        let path = path.to_str().unwrap();
        write_solution_file(path, &[vec![1, 2]], 50.0).unwrap();
        update_best_known(path, &[vec![2, 1]], 60.0).unwrap();
        assert_eq!(Some(50.0), read_solution_cost(path));
        update_best_known(path, &[vec![2, 1]], 40.0).unwrap();
        assert_eq!(Some(40.0), read_solution_cost(path));
    }
}
