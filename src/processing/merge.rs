//! Cluster-count reduction by merging the two smallest groups

use crate::core::Group;

/// Repeatedly folds the smallest group into the next smallest until at most
/// `target` groups remain. A target of 0 leaves the groups untouched.
pub fn merge_smallest(mut groups: Vec<Group>, target: usize) -> Vec<Group> {
	if target == 0 {
		return groups;
	}

	while groups.len() > target && groups.len() > 1 {
		let smallest = smallest_index(&groups);
		let taken = groups.remove(smallest);
		let next = smallest_index(&groups);
		groups[next].extend(taken);
	}

	groups
}

fn smallest_index(groups: &[Group]) -> usize {
	let mut best = 0;
	for (i, group) in groups.iter().enumerate() {
		if group.len() < groups[best].len() {
			best = i;
		}
	}
	best
}
