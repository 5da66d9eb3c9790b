use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::models::{FloatType, ProblemBuilder};

/// Parses a CVRPLIB/TSPLIB instance into a `ProblemBuilder`.
///
/// Recognised keywords are DIMENSION, EDGE_WEIGHT_TYPE, CAPACITY, DISTANCE
/// (enables the route duration constraint) and SERVICE_TIME, followed by the
/// NODE_COORD_SECTION, DEMAND_SECTION and DEPOT_SECTION sections. Any other
/// keyword is a fatal parse error.
pub fn parse_instance(path: &str) -> Result<ProblemBuilder> {
    let filepath = Path::new(path);
    let file = File::open(filepath)
        .with_context(|| format!("Cannot open instance file: {}", path))?;
    let reader = BufReader::new(file);

    let lines: Vec<Vec<String>> = reader
        .lines()
        .filter_map(|line| line.ok())
        .map(|line| {
            line.split(&[' ', '\t', ':'][..])
                .filter(|value| !value.is_empty())
                .map(|value| value.to_owned())
                .collect::<Vec<String>>()
        })
        .filter(|tokens| !tokens.is_empty())
        .collect();

    let mut dimension: Option<usize> = None;
    let mut capacity: Option<FloatType> = None;
    let mut duration_limit: Option<FloatType> = None;
    let mut service_time: FloatType = 0.0;

    let mut line_number = 0;
    while line_number < lines.len() {
        let tokens = &lines[line_number];
        match tokens[0].as_str() {
            // Header lines carry no data used by the solver
            "NAME" | "COMMENT" | "TYPE" => {}
            "DIMENSION" => {
                dimension = Some(
                    parse_value(tokens, path)?
                        .parse::<usize>()
                        .with_context(|| format!("Invalid DIMENSION in {}", path))?,
                );
            }
            "EDGE_WEIGHT_TYPE" => {
                // Only euclidean instances are read; the value is not used
                parse_value(tokens, path)?;
            }
            "CAPACITY" => {
                capacity = Some(
                    parse_value(tokens, path)?
                        .parse::<FloatType>()
                        .with_context(|| format!("Invalid CAPACITY in {}", path))?,
                );
            }
            "DISTANCE" => {
                duration_limit = Some(
                    parse_value(tokens, path)?
                        .parse::<FloatType>()
                        .with_context(|| format!("Invalid DISTANCE in {}", path))?,
                );
            }
            "SERVICE_TIME" => {
                service_time = parse_value(tokens, path)?
                    .parse::<FloatType>()
                    .with_context(|| format!("Invalid SERVICE_TIME in {}", path))?;
            }
            "NODE_COORD_SECTION" => break,
            keyword => bail!("Unexpected data in input file: {}", keyword),
        }
        line_number += 1;
    }

    let dimension = match dimension {
        Some(dimension) if dimension > 1 => dimension,
        _ => bail!("Number of clients is undefined"),
    };
    if capacity.is_none() {
        bail!("Vehicle capacity is undefined");
    }

    if line_number >= lines.len() || lines[line_number][0] != "NODE_COORD_SECTION" {
        bail!("Missing NODE_COORD_SECTION");
    }
    line_number += 1;

    let mut coordinates: Vec<(FloatType, FloatType)> = Vec::with_capacity(dimension);
    for i in 0..dimension {
        let tokens = lines
            .get(line_number + i)
            .filter(|tokens| tokens.len() >= 3)
            .with_context(|| format!("Truncated NODE_COORD_SECTION in {}", path))?;
        let x = tokens[1]
            .parse::<FloatType>()
            .with_context(|| format!("Invalid coordinate in {}", path))?;
        let y = tokens[2]
            .parse::<FloatType>()
            .with_context(|| format!("Invalid coordinate in {}", path))?;
        coordinates.push((x, y));
    }
    line_number += dimension;

    if lines.get(line_number).map(|tokens| tokens[0].as_str()) != Some("DEMAND_SECTION") {
        bail!("Missing DEMAND_SECTION");
    }
    line_number += 1;

    let mut demands: Vec<FloatType> = Vec::with_capacity(dimension);
    for i in 0..dimension {
        let tokens = lines
            .get(line_number + i)
            .filter(|tokens| tokens.len() >= 2)
            .with_context(|| format!("Truncated DEMAND_SECTION in {}", path))?;
        demands.push(
            tokens[1]
                .parse::<FloatType>()
                .with_context(|| format!("Invalid demand in {}", path))?,
        );
    }
    line_number += dimension;

    if lines.get(line_number).map(|tokens| tokens[0].as_str()) != Some("DEPOT_SECTION") {
        bail!("Missing DEPOT_SECTION");
    }
    line_number += 1;

    // The depot must be node 1; the section is closed by -1 and EOF
    match lines.get(line_number).map(|tokens| tokens[0].as_str()) {
        Some("1") => {}
        Some(other) => bail!("Expected depot index 1 instead of {}", other),
        None => bail!("Truncated DEPOT_SECTION in {}", path),
    }
    line_number += 1;
    while let Some(tokens) = lines.get(line_number) {
        match tokens[0].as_str() {
            "-1" | "EOF" => line_number += 1,
            other => bail!("Unexpected data in input file: {}", other),
        }
    }

    let mut builder = ProblemBuilder::new();
    builder.coordinates = Some(coordinates);
    builder.demands = demands;
    builder.service_durations = std::iter::once(0.0)
        .chain((1..dimension).map(|_| service_time))
        .collect();
    builder.vehicle_capacity = capacity;
    builder.duration_limit = duration_limit;
    Ok(builder)
}

fn parse_value<'a>(tokens: &'a [String], path: &str) -> Result<&'a String> {
    tokens
        .get(1)
        .with_context(|| format!("Missing keyword value in {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL_INSTANCE: &str = "\
NAME : toy-n5
COMMENT : parser test
TYPE : CVRP
DIMENSION : 5
EDGE_WEIGHT_TYPE : EUC_2D
CAPACITY : 10
NODE_COORD_SECTION
1 0 0
2 0 2
3 2 2
4 2 0
5 1 1
DEMAND_SECTION
1 0
2 3
3 3
4 3
5 1
DEPOT_SECTION
1
-1
EOF
";

    fn write_instance(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_small_instance() {
        let path = write_instance("hgsvrp_parser_ok.vrp", SMALL_INSTANCE);
        let builder = parse_instance(path.to_str().unwrap()).unwrap();
        assert_eq!(Some(10.0), builder.vehicle_capacity);
        assert_eq!(5, builder.demands.len());
        assert_eq!(0.0, builder.demands[0]);
        assert_eq!(Some((0.0, 0.0)), builder.coordinates.as_ref().map(|c| c[0]));
        assert!(builder.duration_limit.is_none());
        let problem = {
            let mut builder = builder;
            builder.num_vehicles = 2;
            builder.build().unwrap()
        };
        assert_eq!(4, problem.num_customers());
    }

    #[test]
    fn rejects_unknown_keyword() {
        let content = SMALL_INSTANCE.replace("CAPACITY", "WEIGHT");
        let path = write_instance("hgsvrp_parser_keyword.vrp", &content);
        assert!(parse_instance(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn rejects_wrong_depot() {
        let content = SMALL_INSTANCE.replace("DEPOT_SECTION\n1", "DEPOT_SECTION\n2");
        let path = write_instance("hgsvrp_parser_depot.vrp", &content);
        assert!(parse_instance(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn duration_keyword_enables_constraint() {
        let content = SMALL_INSTANCE.replace(
            "CAPACITY : 10",
            "CAPACITY : 10\nDISTANCE : 40\nSERVICE_TIME : 2",
        );
        let path = write_instance("hgsvrp_parser_duration.vrp", &content);
        let builder = parse_instance(path.to_str().unwrap()).unwrap();
        assert_eq!(Some(40.0), builder.duration_limit);
        assert_eq!(0.0, builder.service_durations[0]);
        assert_eq!(2.0, builder.service_durations[1]);
    }
}
