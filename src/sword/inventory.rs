use std::collections::BTreeMap;
use std::fmt::Write;

use crate::error::DomainError;
use crate::sword::ladder::{RankLadder, Tier};

/// How many swords of each rank somebody owns. Ranks that are not listed are
/// not owned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
	counts: BTreeMap<Tier, u64>,
}

impl Inventory {
	#[inline]
	pub fn get(&self, tier: Tier) -> u64 {
		self.counts.get(&tier).copied().unwrap_or(0)
	}

	/// Sets the count for a rank, returning the previous one.
	#[inline]
	pub fn insert(&mut self, tier: Tier, count: u64) -> Option<u64> {
		self.counts.insert(tier, count)
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Iterates from the lowest rank up.
	#[inline]
	pub fn iter(&self) -> impl Iterator<Item = (Tier, u64)> + '_ {
		self.counts.iter().map(|(tier, count)| (*tier, *count))
	}

	// {{{ Parsing
	/// Parses text such as `g:1, ss:2`.
	///
	/// The whole text is checked for shape (`rank:count` entries with
	/// non-negative integer counts) before any rank name gets resolved, so
	/// malformed text is always reported as such. Blank text is an empty
	/// inventory.
	pub fn parse(ladder: &RankLadder, text: &str) -> Result<Self, DomainError> {
		if text.trim().is_empty() {
			return Ok(Self::default());
		}

		let entries = text
			.split(',')
			.map(parse_entry)
			.collect::<Result<Vec<_>, _>>()?;

		let mut inventory = Self::default();
		for (name, count) in entries {
			let tier = ladder.tier(name)?;
			if inventory.insert(tier, count).is_some() {
				return Err(DomainError::malformed(format!(
					"rank `{}` is listed more than once",
					ladder.name(tier)
				)));
			}
		}

		Ok(inventory)
	}
	// }}}

	/// Renders the inventory back into the `rank:count` syntax.
	pub fn display(&self, ladder: &RankLadder) -> String {
		let mut out = String::new();
		for (i, (tier, count)) in self.iter().enumerate() {
			if i > 0 {
				out.push_str(", ");
			}

			// Writing to a string cannot fail
			let _ = write!(out, "{}:{}", ladder.name(tier), count);
		}

		out
	}
}

/// Splits one `rank:count` entry, without resolving the rank.
fn parse_entry(entry: &str) -> Result<(&str, u64), DomainError> {
	let entry = entry.trim();
	if entry.is_empty() {
		return Err(DomainError::malformed(
			"empty entry (check for stray commas)",
		));
	}

	let (name, count) = entry.split_once(':').ok_or_else(|| {
		DomainError::malformed(format!(
			"`{entry}` is missing a count (expected `rank:count`)"
		))
	})?;

	let name = name.trim();
	if name.is_empty() {
		return Err(DomainError::malformed(format!("`{entry}` is missing a rank")));
	}

	let count = count.trim();
	let count = count.parse::<u64>().map_err(|_| {
		DomainError::malformed(format!("`{count}` is not a non-negative whole number"))
	})?;

	Ok((name, count))
}

// }}}
