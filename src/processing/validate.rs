//! Cluster validation by path homogeneity

use crate::core::similarity::group_similarity;
use crate::core::Group;

/// Accepts a clustering only if every multi-file group scores at least `threshold`.
pub fn validate(groups: &[Group], root: &str, threshold: f32) -> bool {
	groups
		.iter()
		.filter(|g| g.len() > 1)
		.all(|g| group_similarity(g, root) >= threshold)
}

/// Breaks every multi-file group scoring below `threshold` into singletons.
pub fn split_failing(groups: Vec<Group>, root: &str, threshold: f32) -> Vec<Group> {
	let mut result = Vec::with_capacity(groups.len());
	for group in groups {
		if group.len() > 1 && group_similarity(&group, root) < threshold {
			result.extend(group.into_iter().map(|f| vec![f]));
		} else {
			result.push(group);
		}
	}
	result
}
