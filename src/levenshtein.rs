//! Edit distance between short identifiers, used to suggest the closest
//! known unit or rank when a user makes a typo.

/// Similar to `edit_distance`, but takes in a preallocated vec so consecutive calls are efficient.
pub fn edit_distance_with(a: &str, b: &str, cur: &mut Vec<usize>) -> usize {
	let len_a = a.chars().count();
	let len_b = b.chars().count();
	if len_a < len_b {
		return edit_distance_with(b, a, cur);
	}

	if len_a == 0 {
		return len_b;
	} else if len_b == 0 {
		return len_a;
	}

	let len_b = len_b + 1;

	cur.clear();
	cur.resize(len_b, 0);
	for (i, cell) in cur.iter_mut().enumerate() {
		*cell = i;
	}

	for (i, ca) in a.chars().enumerate() {
		let mut pre = cur[0];
		cur[0] = i + 1;
		for (j, cb) in b.chars().enumerate() {
			let tmp = cur[j + 1];
			cur[j + 1] = (tmp + 1) // deletion
				.min(cur[j] + 1) // insertion
				.min(pre + usize::from(ca != cb)); // substitution
			pre = tmp;
		}
	}

	cur[len_b - 1]
}

/// Returns the edit distance between strings `a` and `b`.
#[inline]
pub fn edit_distance(a: &str, b: &str) -> usize {
	edit_distance_with(a, b, &mut Vec::new())
}

/// Picks the candidate closest to `query` (case-insensitively), as long as it
/// is within a third of the query's length. Ties go to the earliest candidate.
pub fn closest_match<'a>(
	query: &str,
	candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
	let query = query.to_lowercase();
	let threshold = 1.max(query.chars().count() / 3);
	let mut buffer = Vec::with_capacity(8);

	candidates
		.into_iter()
		.map(|candidate| {
			let distance = edit_distance_with(&query, &candidate.to_lowercase(), &mut buffer);
			(distance, candidate)
		})
		.filter(|(distance, _)| *distance <= threshold)
		.min_by_key(|(distance, _)| *distance)
		.map(|(_, candidate)| candidate)
}

// }}}
