//! K-means over embedding vectors

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::Embedding;

/// Partitions `points` into `k` groups, returning each point's cluster index.
///
/// Centroids start as a random selection of distinct input points. Empty
/// clusters are reseeded with a random point. Always runs `iterations`
/// rounds.
pub fn kmeans<R>(points: &[&Embedding], k: usize, iterations: usize, rng: &mut R) -> Result<Vec<usize>>
where
	R: Rng,
{
	if k == 0 {
		anyhow::bail!("k must be positive");
	}
	if points.is_empty() {
		anyhow::bail!("No points to cluster");
	}
	if points.len() < k {
		anyhow::bail!("Cannot form {} clusters from {} points", k, points.len());
	}

	let dim = points[0].len();
	if points.iter().any(|p| p.len() != dim) {
		anyhow::bail!("Embeddings have mismatched dimensions");
	}

	let n = points.len();
	let mut order: Vec<usize> = (0..n).collect();
	order.shuffle(rng);

	let mut centroids: Vec<Vec<f32>> = order[..k]
		.iter()
		.map(|&i| points[i].as_slice().to_vec())
		.collect();
	let mut assignments = vec![0usize; n];

	for _ in 0..iterations.max(1) {
		for (i, point) in points.iter().enumerate() {
			assignments[i] = nearest(point, &centroids);
		}

		let mut sums = vec![vec![0.0f32; dim]; k];
		let mut counts = vec![0usize; k];
		for (i, point) in points.iter().enumerate() {
			let c = assignments[i];
			counts[c] += 1;
			for (sum, value) in sums[c].iter_mut().zip(point.as_slice()) {
				*sum += value;
			}
		}

		for c in 0..k {
			if counts[c] == 0 {
				let pick = rng.random_range(0..n);
				centroids[c] = points[pick].as_slice().to_vec();
			} else {
				let size = counts[c] as f32;
				centroids[c] = sums[c].iter().map(|s| s / size).collect();
			}
		}
	}

	Ok(assignments)
}

/// Groups point indices by assignment, dropping empty clusters.
pub fn groups(assignments: &[usize]) -> Vec<Vec<usize>> {
	let k = assignments.iter().copied().max().map(|m| m + 1).unwrap_or(0);
	let mut groups = vec![Vec::new(); k];
	for (i, &c) in assignments.iter().enumerate() {
		groups[c].push(i);
	}
	groups.retain(|g| !g.is_empty());
	groups
}

fn nearest(point: &Embedding, centroids: &[Vec<f32>]) -> usize {
	let mut best = 0;
	let mut best_dist = f32::INFINITY;
	for (c, centroid) in centroids.iter().enumerate() {
		let dist = point.distance_sq(centroid);
		if dist < best_dist {
			best_dist = dist;
			best = c;
		}
	}
	best
}
