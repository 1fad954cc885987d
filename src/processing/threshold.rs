//! Similarity-cutoff grouping with a variable cluster count

use crate::core::Embedding;

/// First-fit grouping: each point joins the first group whose seed it is at
/// least `threshold` similar to, or seeds a new group.
pub fn cluster(points: &[&Embedding], threshold: f32) -> Vec<Vec<usize>> {
	let mut groups: Vec<Vec<usize>> = Vec::new();

	for (i, point) in points.iter().enumerate() {
		let home = groups
			.iter_mut()
			.find(|g| points[g[0]].similarity(point) >= threshold);

		match home {
			Some(group) => group.push(i),
			None => groups.push(vec![i]),
		}
	}

	groups
}
