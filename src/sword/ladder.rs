//! Sword ranks form a ladder where a fixed number of swords of one rank
//! combine into a single sword of the next rank.

use std::sync::LazyLock;

use anyhow::bail;

use crate::error::DomainError;
use crate::levenshtein::closest_match;
use crate::sword::inventory::Inventory;

// {{{ Constants
/// Every sword rank, from lowest to highest.
pub const SWORD_RANKS: [&str; 26] = [
	"e", "d", "c", "b", "a", "s", "ss", "g", "n", "n+", "m", "m+", "gm", "gm+", "ugm", "ugm+",
	"hgm", "hgm+", "r", "r+", "mr", "mr+", "gr", "gr+", "ur", "ur+",
];

/// How many swords of one rank combine into a sword of the next rank.
pub const PROMOTION_RATIO: u64 = 3;
// }}}
// {{{ Tier
/// A position on a [RankLadder]. Tiers are only meaningful for the ladder
/// that produced them, and compare by height on that ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tier(usize);

impl Tier {
	#[inline]
	pub fn index(self) -> usize {
		self.0
	}
}
// }}}
// {{{ Shortage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortage {
	/// Base swords one target sword is made of
	pub required: u64,
	/// Owned swords, expressed in base swords
	pub owned: u64,
	/// Base swords still missing
	pub needed: u64,
}
// }}}
// {{{ Ladder
#[derive(Debug, Clone)]
pub struct RankLadder {
	names: Vec<&'static str>,
	ratio: u64,
}

impl RankLadder {
	pub fn new(
		names: impl IntoIterator<Item = &'static str>,
		ratio: u64,
	) -> Result<Self, anyhow::Error> {
		let names: Vec<_> = names.into_iter().collect();

		if ratio < 2 {
			bail!("Promotion ratio must be at least 2, got {ratio}");
		}

		if names.is_empty() {
			bail!("A rank ladder needs at least one rank");
		}

		for (i, name) in names.iter().enumerate() {
			if name.trim().is_empty() {
				bail!("Rank #{} has an empty name", i + 1);
			}

			if names[..i].iter().any(|other| other.eq_ignore_ascii_case(name)) {
				bail!("Rank {name} appears twice");
			}
		}

		Ok(Self { names, ratio })
	}

	/// The ladder built from [SWORD_RANKS] and [PROMOTION_RATIO].
	pub fn swords() -> &'static Self {
		static SWORDS: LazyLock<RankLadder> = LazyLock::new(|| {
			RankLadder::new(SWORD_RANKS, PROMOTION_RATIO).expect("Invalid sword rank table")
		});

		&SWORDS
	}

	// {{{ Lookups
	/// Case-insensitive lookup of a rank name.
	pub fn tier(&self, name: &str) -> Result<Tier, DomainError> {
		let name = name.trim();
		self.names
			.iter()
			.position(|candidate| candidate.eq_ignore_ascii_case(name))
			.map(Tier)
			.ok_or_else(|| DomainError::InvalidTier {
				name: name.to_owned(),
				suggestion: closest_match(name, self.names.iter().copied()).map(str::to_owned),
			})
	}

	#[inline]
	pub fn name(&self, tier: Tier) -> &'static str {
		self.names[tier.0]
	}

	#[inline]
	pub fn ratio(&self) -> u64 {
		self.ratio
	}

	#[inline]
	pub fn lowest(&self) -> Tier {
		Tier(0)
	}

	#[inline]
	pub fn tiers(&self) -> impl DoubleEndedIterator<Item = Tier> {
		(0..self.names.len()).map(Tier)
	}
	// }}}
	// {{{ Conversion
	/// Expresses `count` swords of rank `from` as swords of rank `to`.
	///
	/// Going down the ladder always works. Going up fails as soon as any
	/// intermediate rank would end up with a partial sword.
	pub fn convert(&self, from: Tier, to: Tier, count: u64) -> Result<u64, DomainError> {
		let mut total = count;

		if from > to {
			for _ in to.0..from.0 {
				total = total
					.checked_mul(self.ratio)
					.ok_or(DomainError::Overflow)?;
			}
		} else {
			for _ in from.0..to.0 {
				if total % self.ratio != 0 {
					return Err(DomainError::Unconvertible {
						count,
						from: self.name(from).to_owned(),
						to: self.name(to).to_owned(),
					});
				}

				total /= self.ratio;
			}
		}

		Ok(total)
	}

	/// How many `start` swords make up a single `target` sword.
	pub fn total_needed(&self, start: Tier, target: Tier) -> Result<u64, DomainError> {
		if start >= target {
			return Err(DomainError::TargetNotAbove {
				start: self.name(start).to_owned(),
				target: self.name(target).to_owned(),
			});
		}

		self.convert(target, start, 1)
	}
	// }}}
	// {{{ Shortage
	/// How many `base` swords are still missing for a `target` sword, once
	/// everything owned has been broken down into `base` swords.
	///
	/// Owned swords below `base` must combine evenly into `base` swords,
	/// otherwise the whole computation is rejected.
	pub fn shortage(
		&self,
		target: Tier,
		owned: &Inventory,
		base: Tier,
	) -> Result<Shortage, DomainError> {
		let required = self.total_needed(base, target)?;

		let mut owned_total: u64 = 0;
		for (tier, count) in owned.iter() {
			let converted = self.convert(tier, base, count)?;
			owned_total = owned_total
				.checked_add(converted)
				.ok_or(DomainError::Overflow)?;
		}

		Ok(Shortage {
			required,
			owned: owned_total,
			needed: required.saturating_sub(owned_total),
		})
	}

	/// Walks down from `target`, listing for every rank how many more swords
	/// of that rank have to be combined, after using up the ones owned.
	///
	/// The walk stops at the first rank whose owned swords cover everything
	/// still required, since nothing below it is needed anymore. Owned swords
	/// above `target` are not considered.
	pub fn breakdown(
		&self,
		target: Tier,
		owned: &Inventory,
	) -> Result<Vec<(Tier, u64)>, DomainError> {
		let mut steps = Vec::new();
		let mut required = 1u64.saturating_sub(owned.get(target));

		if required == 0 {
			return Ok(steps);
		}

		for tier in (0..target.0).rev().map(Tier) {
			let wanted = required
				.checked_mul(self.ratio)
				.ok_or(DomainError::Overflow)?;

			match wanted.checked_sub(owned.get(tier)) {
				Some(missing) if missing > 0 => {
					steps.push((tier, missing));
					required = missing;
				}
				_ => break,
			}
		}

		Ok(steps)
	}
	// }}}
}
// }}}
