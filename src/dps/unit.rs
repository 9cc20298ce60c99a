//! The table of magnitude units (`K`, `M`, ... `Dc`) a DPS value can be
//! expressed in.

use std::fmt::Display;
use std::sync::LazyLock;

use anyhow::bail;

use crate::error::DomainError;
use crate::levenshtein::closest_match;

// {{{ Unit
/// A symbol standing for the power of ten `10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
	exponent: i32,
	symbol: &'static str,
}

impl Unit {
	#[inline]
	pub fn exponent(self) -> i32 {
		self.exponent
	}

	#[inline]
	pub fn symbol(self) -> &'static str {
		self.symbol
	}
}

impl Display for Unit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.symbol)
	}
}
// }}}
// {{{ Standard table
/// Every unit the bot accepts, from `K` (10^3) up to `Dc` (10^306).
pub const STANDARD_UNITS: [(i32, &str); 102] = [
	(3, "K"),
	(6, "M"),
	(9, "B"),
	(12, "T"),
	(15, "Qa"),
	(18, "Qi"),
	(21, "Sx"),
	(24, "Sp"),
	(27, "Oc"),
	(30, "No"),
	// d
	(33, "Ud"),
	(36, "Dd"),
	(39, "Td"),
	(42, "Qad"),
	(45, "Qid"),
	(48, "Sxd"),
	(51, "Spd"),
	(54, "Ocd"),
	(57, "Nod"),
	(60, "Vg"),
	// vg
	(63, "Uvg"),
	(66, "Dvg"),
	(69, "Tvg"),
	(72, "Qavg"),
	(75, "Qivg"),
	(78, "Sxvg"),
	(81, "Spvg"),
	(84, "Ocvg"),
	(87, "Novg"),
	(90, "Tg"),
	// tg
	(93, "Utg"),
	(96, "Dtg"),
	(99, "Ttg"),
	(102, "Qatg"),
	(105, "Qitg"),
	(108, "Sxtg"),
	(111, "Sptg"),
	(114, "Octg"),
	(117, "Notg"),
	(120, "Qag"),
	// qag
	(123, "Uqag"),
	(126, "Dqag"),
	(129, "Tqag"),
	(132, "Qaqag"),
	(135, "Qiqag"),
	(138, "Sxqag"),
	(141, "Spqag"),
	(144, "Ocqag"),
	(147, "Noqag"),
	(150, "Qig"),
	// qig
	(153, "Uqig"),
	(156, "Dqig"),
	(159, "Tqig"),
	(162, "Qaqig"),
	(165, "Qiqig"),
	(168, "Sxqig"),
	(171, "Spqig"),
	(174, "Ocqig"),
	(177, "Noqig"),
	(180, "Sxg"),
	// sxg
	(183, "Usxg"),
	(186, "Dsxg"),
	(189, "Tsxg"),
	(192, "Qasxg"),
	(195, "Qisxg"),
	(198, "Sxsxg"),
	(201, "Spsxg"),
	(204, "Ocsxg"),
	(207, "Nosxg"),
	(210, "Spg"),
	// spg
	(213, "Uspg"),
	(216, "Dspg"),
	(219, "Tspg"),
	(222, "Qaspg"),
	(225, "Qispg"),
	(228, "Sxspg"),
	(231, "Spspg"),
	(234, "Ocspg"),
	(237, "Nospg"),
	(240, "Ocg"),
	// ocg
	(243, "Uocg"),
	(246, "Docg"),
	(249, "Tocg"),
	(252, "Qaocg"),
	(255, "Qiocg"),
	(258, "Sxocg"),
	(261, "Spocg"),
	(264, "Ococg"),
	(267, "Noocg"),
	(270, "Nog"),
	// nog
	(273, "Unog"),
	(276, "Dnog"),
	(279, "Tnog"),
	(282, "Qanog"),
	(285, "Qinog"),
	(288, "Sxnog"),
	(291, "Spnog"),
	(294, "Ocnog"),
	(297, "Nonog"),
	(300, "c"),
	// c
	(303, "Uc"),
	(306, "Dc"),
];
// }}}
// {{{ Registry
/// How many consecutive units `list_groups` puts in one group by default.
pub const DEFAULT_GROUP_SIZE: usize = 10;

/// A presentation-only slice of the registry.
#[derive(Debug, Clone, Copy)]
pub struct UnitGroup<'a> {
	pub units: &'a [Unit],
}

impl UnitGroup<'_> {
	/// Labels a group by its first and last symbol, e.g. `K - No`.
	pub fn label(&self) -> String {
		match (self.units.first(), self.units.last()) {
			(Some(first), Some(last)) if first != last => format!("{first} - {last}"),
			(Some(first), _) => first.to_string(),
			_ => String::new(),
		}
	}
}

/// An ordered table of units, strictly increasing by exponent, with symbols
/// unique up to case.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
	units: Vec<Unit>,
}

impl UnitRegistry {
	pub fn new(
		entries: impl IntoIterator<Item = (i32, &'static str)>,
	) -> Result<Self, anyhow::Error> {
		let units: Vec<Unit> = entries
			.into_iter()
			.map(|(exponent, symbol)| Unit { exponent, symbol })
			.collect();

		for (i, unit) in units.iter().enumerate() {
			if unit.symbol.trim().is_empty() {
				bail!("Unit with exponent {} has an empty symbol", unit.exponent);
			}

			if let Some(prev) = i.checked_sub(1).map(|j| units[j]) {
				if prev.exponent >= unit.exponent {
					bail!(
						"Unit exponents must be strictly increasing ({} = {}, {} = {})",
						prev.symbol,
						prev.exponent,
						unit.symbol,
						unit.exponent
					);
				}
			}

			if let Some(other) = units[..i]
				.iter()
				.find(|other| other.symbol.eq_ignore_ascii_case(unit.symbol))
			{
				bail!(
					"Unit symbol {} is registered twice (exponents {} and {})",
					unit.symbol,
					other.exponent,
					unit.exponent
				);
			}
		}

		Ok(Self { units })
	}

	/// The registry built from [STANDARD_UNITS], created on first use.
	pub fn standard() -> &'static Self {
		static STANDARD: LazyLock<UnitRegistry> = LazyLock::new(|| {
			UnitRegistry::new(STANDARD_UNITS).expect("Invalid standard unit table")
		});

		&STANDARD
	}

	/// Case-insensitive exact lookup of a symbol.
	pub fn lookup(&self, symbol: &str) -> Result<Unit, DomainError> {
		let symbol = symbol.trim();
		self.units
			.iter()
			.find(|unit| unit.symbol.eq_ignore_ascii_case(symbol))
			.copied()
			.ok_or_else(|| DomainError::InvalidUnit {
				symbol: symbol.to_owned(),
				suggestion: closest_match(symbol, self.symbols()).map(str::to_owned),
			})
	}

	#[inline]
	pub fn units(&self) -> &[Unit] {
		&self.units
	}

	#[inline]
	pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.units.iter().map(|unit| unit.symbol)
	}

	/// Splits the table into consecutive groups of (at most) `group_size` units.
	pub fn list_groups(&self, group_size: usize) -> Vec<UnitGroup<'_>> {
		self.units
			.chunks(group_size.max(1))
			.map(|units| UnitGroup { units })
			.collect()
	}

	/// Units whose symbol starts with `partial`, ignoring case. Used for
	/// autocompletion, where exact-case matches are listed first.
	pub fn search<'a>(&'a self, partial: &'a str) -> impl Iterator<Item = Unit> + 'a {
		let partial = partial.trim();
		let exact = self
			.units
			.iter()
			.filter(move |unit| unit.symbol.starts_with(partial));
		let loose = self.units.iter().filter(move |unit| {
			!unit.symbol.starts_with(partial)
				&& unit
					.symbol
					.to_lowercase()
					.starts_with(&partial.to_lowercase())
		});

		exact.chain(loose).copied()
	}
}
// }}}
