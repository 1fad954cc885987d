//! Embedding vectors for semantic similarity

use serde::{Deserialize, Serialize};

/// Raw embedding vector of a file's diff text
///
/// Stored exactly as the embedding service returned it; similarity divides
/// by the norms, so no normalization is applied on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
	pub fn new(data: Vec<f32>) -> Self {
		Self(data)
	}

	/// Get raw vector
	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Cosine similarity, 0.0 for zero or mismatched vectors
	pub fn similarity(&self, other: &Self) -> f32 {
		cosine_similarity(&self.0, &other.0)
	}

	/// Squared Euclidean distance
	pub fn distance_sq(&self, other: &[f32]) -> f32 {
		self.0
			.iter()
			.zip(other.iter())
			.map(|(a, b)| (a - b) * (a - b))
			.sum()
	}
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
	let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a * norm_b)
}

/// Average pairwise similarity within a set of embeddings
pub fn cohesion(embeddings: &[&Embedding]) -> f32 {
	if embeddings.len() < 2 {
		return 1.0;
	}

	let mut total = 0.0;
	let mut count = 0;

	for i in 0..embeddings.len() {
		for j in (i + 1)..embeddings.len() {
			total += embeddings[i].similarity(embeddings[j]);
			count += 1;
		}
	}

	total / count as f32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cosine_of_identical_and_orthogonal_vectors() {
		assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
		assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), 0.0);
	}

	#[test]
	fn cosine_with_zero_or_mismatched_vector_is_zero() {
		assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
		assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
		assert_eq!(cosine_similarity(&[], &[]), 0.0);
	}

	#[test]
	fn cohesion_averages_pairs() {
		let a = Embedding::new(vec![1.0, 0.0]);
		let b = Embedding::new(vec![1.0, 0.0]);
		let c = Embedding::new(vec![0.0, 1.0]);
		let value = cohesion(&[&a, &b, &c]);
		assert!((value - 1.0 / 3.0).abs() < 1e-6);
		assert_eq!(cohesion(&[&a]), 1.0);
	}
}
