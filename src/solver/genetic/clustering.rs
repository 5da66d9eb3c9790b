use crate::models::FloatType;
use crate::utils::Random;

// Lloyd iterations are capped to sidestep numerical stability issues
const MAX_ITERATIONS: usize = 100;
// Centres moving less than this per axis count as converged
const MOVE_THRESHOLD: FloatType = 1e-2;

#[derive(Clone, Copy, Debug)]
pub struct Point {
    pub x: FloatType,
    pub y: FloatType,
}

#[inline]
fn distance_sq(a: Point, b: Point) -> FloatType {
    (a.x - b.x) * (a.x - b.x) + (a.y - b.y) * (a.y - b.y)
}

/// k-means over `points` with k-means++ seeding, returning clusters of point
/// indices. The indices in `disregard` are excluded from the clustering and
/// afterwards distributed round-robin over the resulting clusters — they
/// correspond to empty routes whose placement carries no information.
pub fn k_means(
    random: &Random,
    k: usize,
    points: &[Point],
    disregard: &[usize],
) -> Vec<Vec<usize>> {
    let candidates: Vec<usize> = (0..points.len())
        .filter(|index| !disregard.contains(index))
        .collect();
    let k = k.min(candidates.len());

    if k <= 1 {
        return vec![(0..points.len()).collect()];
    }

    let mut centres = initial_centres(random, k, points, &candidates);
    let mut clusters = assign(points, &candidates, &centres);

    for _ in 0..MAX_ITERATIONS {
        let new_centres = cluster_centres(points, &clusters, &centres);
        if !moved(&centres, &new_centres) {
            break;
        }
        centres = new_centres;
        clusters = assign(points, &candidates, &centres);
    }

    for (offset, &index) in disregard.iter().enumerate() {
        clusters[offset % k].push(index);
    }

    clusters
}

/// k-means++ seeding: the first centre is uniform, every further centre is
/// drawn by roulette wheel on the squared distance to the nearest centre
fn initial_centres(
    random: &Random,
    k: usize,
    points: &[Point],
    candidates: &[usize],
) -> Vec<Point> {
    let mut remaining: Vec<usize> = candidates.to_vec();
    let mut centres = Vec::with_capacity(k);

    let first = random.range_usize(0, remaining.len());
    centres.push(points[remaining.swap_remove(first)]);

    while centres.len() < k {
        let weights: Vec<FloatType> = remaining
            .iter()
            .map(|&index| nearest_distance_sq(points[index], &centres))
            .collect();
        let chosen = roulette_wheel(random, &weights);
        centres.push(points[remaining.swap_remove(chosen)]);
    }

    centres
}

fn nearest_distance_sq(point: Point, centres: &[Point]) -> FloatType {
    centres
        .iter()
        .map(|&centre| distance_sq(point, centre))
        .fold(FloatType::INFINITY, FloatType::min)
}

/// Index drawn with probability proportional to its weight
fn roulette_wheel(random: &Random, weights: &[FloatType]) -> usize {
    let total: FloatType = weights.iter().sum();
    let pivot = random.real() * total;
    let mut accumulated = 0.0;
    for (index, &weight) in weights.iter().enumerate().take(weights.len() - 1) {
        accumulated += weight;
        if accumulated >= pivot {
            return index;
        }
    }
    weights.len() - 1
}

fn assign(points: &[Point], candidates: &[usize], centres: &[Point]) -> Vec<Vec<usize>> {
    let mut clusters = vec![Vec::new(); centres.len()];
    for &index in candidates.iter() {
        let mut nearest = 0;
        let mut nearest_distance = distance_sq(points[index], centres[0]);
        for (centre_index, &centre) in centres.iter().enumerate().skip(1) {
            let distance = distance_sq(points[index], centre);
            if distance < nearest_distance {
                nearest = centre_index;
                nearest_distance = distance;
            }
        }
        clusters[nearest].push(index);
    }
    clusters
}

/// Centre of mass per cluster; an empty cluster keeps its previous centre
fn cluster_centres(points: &[Point], clusters: &[Vec<usize>], previous: &[Point]) -> Vec<Point> {
    clusters
        .iter()
        .zip(previous.iter())
        .map(|(cluster, &old)| {
            if cluster.is_empty() {
                return old;
            }
            let mut x = 0.0;
            let mut y = 0.0;
            for &index in cluster.iter() {
                x += points[index].x;
                y += points[index].y;
            }
            Point {
                x: x / cluster.len() as FloatType,
                y: y / cluster.len() as FloatType,
            }
        })
        .collect()
}

fn moved(old: &[Point], new: &[Point]) -> bool {
    old.iter().zip(new.iter()).any(|(a, b)| {
        (a.x - b.x).abs() > MOVE_THRESHOLD && (a.y - b.y).abs() > MOVE_THRESHOLD
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cluster_holds_everything() {
        let random = Random::from_seed(0);
        let points = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 1.0, y: 1.0 },
            Point { x: 2.0, y: 2.0 },
        ];
        let clusters = k_means(&random, 1, &points, &[]);
        assert_eq!(1, clusters.len());
        assert_eq!(vec![0, 1, 2], clusters[0]);
    }

    #[test]
    fn separates_two_distant_groups() {
        let random = Random::from_seed(1);
        let mut points = Vec::new();
        for i in 0..4 {
            points.push(Point {
                x: i as FloatType,
                y: 0.0,
            });
        }
        for i in 0..4 {
            points.push(Point {
                x: 1000.0 + i as FloatType,
                y: 0.0,
            });
        }
        let clusters = k_means(&random, 2, &points, &[]);
        assert_eq!(2, clusters.len());
        let mut sides: Vec<Vec<usize>> = clusters
            .into_iter()
            .map(|mut cluster| {
                cluster.sort();
                cluster
            })
            .collect();
        sides.sort();
        assert_eq!(vec![0, 1, 2, 3], sides[0]);
        assert_eq!(vec![4, 5, 6, 7], sides[1]);
    }

    #[test]
    fn disregarded_points_are_spread_round_robin() {
        let random = Random::from_seed(2);
        let points = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 0.0, y: 0.0 },
            Point { x: 1.0, y: 0.0 },
            Point { x: 500.0, y: 0.0 },
            Point { x: 501.0, y: 0.0 },
        ];
        let clusters = k_means(&random, 2, &points, &[0, 1]);
        assert_eq!(2, clusters.len());
        let in_first = clusters[0].iter().filter(|&&i| i <= 1).count();
        let in_second = clusters[1].iter().filter(|&&i| i <= 1).count();
        assert_eq!(1, in_first);
        assert_eq!(1, in_second);
    }

    #[test]
    fn caps_k_at_the_number_of_candidates() {
        let random = Random::from_seed(3);
        let points = vec![Point { x: 0.0, y: 0.0 }, Point { x: 9.0, y: 9.0 }];
        let clusters = k_means(&random, 5, &points, &[]);
        assert_eq!(2, clusters.len());
    }
}
