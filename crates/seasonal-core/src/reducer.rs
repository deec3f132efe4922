//! Color reduction: k-means over the sampled HSV pixels.
//!
//! Samples are collapsed into unique colors with multiplicities before
//! clustering. Weighted k-means over the unique colors has the same objective
//! as plain k-means over every pixel, and skin samples repeat heavily.
//!
//! The dominant color is the first centroid of the best run. That is a fixed
//! contract, not the largest cluster: see [`Clustering::sizes`] for membership.

use crate::config::ReducerConfig;
use crate::types::Hsv;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

type Point = [f64; 3];

#[derive(Error, Debug)]
pub enum ReduceError {
    #[error("no pixels to cluster")]
    EmptySample,
    #[error("cluster count must be positive")]
    NoClusters,
}

/// Outcome of clustering the skin samples.
#[derive(Debug, Clone, Serialize)]
pub struct Clustering {
    /// Centroids in the order the best run produced them, truncated to integers.
    pub centroids: Vec<Hsv>,
    /// Pixels assigned to each centroid.
    pub sizes: Vec<usize>,
    /// Sum of squared distances from each pixel to its centroid.
    pub inertia: f64,
}

impl Clustering {
    pub fn dominant(&self) -> Hsv {
        self.centroids[0]
    }
}

/// Cluster `samples` into `config.clusters` centroids.
///
/// With fewer samples than clusters, clustering is skipped: the distinct
/// samples in first-seen order become the centroids, repeated in turn until
/// there are enough of them.
pub fn reduce(samples: &[Hsv], config: &ReducerConfig) -> Result<Clustering, ReduceError> {
    let k = config.clusters;
    if k == 0 {
        return Err(ReduceError::NoClusters);
    }
    if samples.is_empty() {
        return Err(ReduceError::EmptySample);
    }

    let mut histogram: IndexMap<Hsv, usize> = IndexMap::new();
    for hsv in samples {
        *histogram.entry(*hsv).or_insert(0) += 1;
    }

    if samples.len() < k {
        tracing::warn!(
            samples = samples.len(),
            clusters = k,
            "too few skin samples to cluster; using samples as centroids"
        );
        return Ok(replicate(&histogram, k));
    }

    let points: Vec<Point> = histogram.keys().map(|hsv| to_point(*hsv)).collect();
    let weights: Vec<f64> = histogram.values().map(|&c| c as f64).collect();
    let tolerance = config.tolerance * mean_variance(&points, &weights);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let runs = config.runs.max(ReducerConfig::MIN_RUNS);

    let mut best: Option<(Vec<Point>, Vec<usize>, f64)> = None;
    for run in 0..runs {
        let seeds = seed_plus_plus(&points, &weights, k, &mut rng);
        let (centers, labels, inertia) =
            lloyd(&points, &weights, seeds, config.max_iterations, tolerance);
        tracing::trace!(run, inertia, "k-means run finished");

        if best.as_ref().map_or(true, |(_, _, b)| inertia < *b) {
            best = Some((centers, labels, inertia));
        }
    }

    let (centers, labels, inertia) = best.ok_or(ReduceError::EmptySample)?;
    let mut sizes = vec![0usize; k];
    for (label, count) in labels.iter().zip(histogram.values()) {
        sizes[*label] += count;
    }

    let clustering = Clustering {
        centroids: centers.iter().map(|c| truncate(*c)).collect(),
        sizes,
        inertia,
    };
    tracing::debug!(
        centroids = ?clustering.centroids,
        sizes = ?clustering.sizes,
        inertia = clustering.inertia,
        "clustered skin samples"
    );
    Ok(clustering)
}

fn replicate(histogram: &IndexMap<Hsv, usize>, k: usize) -> Clustering {
    let distinct: Vec<(Hsv, usize)> = histogram.iter().map(|(h, c)| (*h, *c)).collect();
    let centroids = (0..k).map(|i| distinct[i % distinct.len()].0).collect();
    let sizes = (0..k)
        .map(|i| if i < distinct.len() { distinct[i].1 } else { 0 })
        .collect();
    Clustering {
        centroids,
        sizes,
        inertia: 0.0,
    }
}

fn to_point(hsv: Hsv) -> Point {
    hsv.to_array().map(f64::from)
}

/// Integer centroid by truncation toward zero.
fn truncate(p: Point) -> Hsv {
    let [h, s, v] = p.map(|c| c.clamp(0.0, 255.0) as u8);
    Hsv::new(h, s, v)
}

fn dist2(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn mean_variance(points: &[Point], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    let mut mean = [0.0f64; 3];
    for (p, w) in points.iter().zip(weights) {
        for c in 0..3 {
            mean[c] += p[c] * w / total;
        }
    }
    let mut var = [0.0f64; 3];
    for (p, w) in points.iter().zip(weights) {
        for c in 0..3 {
            var[c] += (p[c] - mean[c]).powi(2) * w / total;
        }
    }
    var.iter().sum::<f64>() / 3.0
}

/// Draw an index with probability proportional to `weights`; uniform if all zero.
fn sample_index(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }
    let mut target = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if target < *w {
            return i;
        }
        target -= w;
    }
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

/// k-means++ seeding over weighted points.
fn seed_plus_plus(points: &[Point], weights: &[f64], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centers = vec![points[sample_index(weights, rng)]];
    let mut nearest: Vec<f64> = points.iter().map(|p| dist2(p, &centers[0])).collect();

    while centers.len() < k {
        let scores: Vec<f64> = nearest.iter().zip(weights).map(|(d, w)| d * w).collect();
        let next = points[sample_index(&scores, rng)];
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = (*d).min(dist2(p, &next));
        }
        centers.push(next);
    }
    centers
}

fn assign(points: &[Point], centers: &[Point]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (i, c) in centers.iter().enumerate() {
                let d = dist2(p, c);
                if d < best_d {
                    best = i;
                    best_d = d;
                }
            }
            best
        })
        .collect()
}

/// Lloyd iterations; empty clusters keep their previous center.
fn lloyd(
    points: &[Point],
    weights: &[f64],
    mut centers: Vec<Point>,
    max_iterations: usize,
    tolerance: f64,
) -> (Vec<Point>, Vec<usize>, f64) {
    for _ in 0..max_iterations {
        let labels = assign(points, &centers);

        let mut sums = vec![[0.0f64; 3]; centers.len()];
        let mut mass = vec![0.0f64; centers.len()];
        for ((p, w), &label) in points.iter().zip(weights).zip(&labels) {
            for c in 0..3 {
                sums[label][c] += p[c] * w;
            }
            mass[label] += w;
        }

        let mut shift = 0.0;
        for (i, center) in centers.iter_mut().enumerate() {
            if mass[i] > 0.0 {
                let updated = sums[i].map(|s| s / mass[i]);
                shift += dist2(center, &updated);
                *center = updated;
            }
        }

        if shift <= tolerance {
            break;
        }
    }

    let labels = assign(points, &centers);
    let inertia = points
        .iter()
        .zip(weights)
        .zip(&labels)
        .map(|((p, w), &label)| dist2(p, &centers[label]) * w)
        .sum();
    (centers, labels, inertia)
}
