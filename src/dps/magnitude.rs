//! DPS values are stored as a mantissa together with a unit, since the
//! magnitudes involved (up to `10^306` and beyond) are far past the range where
//! a plain float keeps integer precision.

use std::cmp::Ordering;
use std::fmt::Display;

use num::BigInt;

use crate::dps::unit::{Unit, UnitRegistry};
use crate::error::DomainError;

/// A DPS value such as `12345Qi`.
///
/// The mantissa is always finite and the unit always comes from a registry.
/// Equality and ordering compare the represented magnitude, taking the
/// mantissa as the decimal it displays as. So `100K` and `0.1M` are equal even
/// though they display differently.
#[derive(Debug, Clone, Copy)]
pub struct MagnitudeValue {
	mantissa: f64,
	unit: Unit,
}

impl MagnitudeValue {
	/// Validates user input against the registry.
	pub fn create(
		registry: &UnitRegistry,
		mantissa: f64,
		unit: &str,
	) -> Result<Self, DomainError> {
		let unit = registry.lookup(unit)?;
		Self::from_unit(mantissa, unit)
	}

	pub fn from_unit(mantissa: f64, unit: Unit) -> Result<Self, DomainError> {
		if !mantissa.is_finite() {
			return Err(DomainError::malformed(format!(
				"`{mantissa}` is not a finite number"
			)));
		}

		// Get rid of negative zero so it displays as `0`
		let mantissa = if mantissa == 0.0 { 0.0 } else { mantissa };

		Ok(Self { mantissa, unit })
	}

	#[inline]
	pub fn mantissa(&self) -> f64 {
		self.mantissa
	}

	#[inline]
	pub fn unit(&self) -> Unit {
		self.unit
	}

	// {{{ Comparison
	/// Compares `mantissa * 10^exponent` of both values without ever
	/// materializing that product.
	pub fn compare(&self, other: &Self) -> Ordering {
		let (sign, other_sign) = (signum(self.mantissa), signum(other.mantissa));
		if sign != other_sign || sign == 0 {
			return sign.cmp(&other_sign);
		}

		let by_magnitude = compare_magnitudes(
			(self.mantissa.abs(), self.unit.exponent()),
			(other.mantissa.abs(), other.unit.exponent()),
		);

		if sign > 0 {
			by_magnitude
		} else {
			by_magnitude.reverse()
		}
	}
	// }}}
}

#[inline]
fn signum(x: f64) -> i8 {
	if x > 0.0 {
		1
	} else if x < 0.0 {
		-1
	} else {
		0
	}
}

/// The shortest decimal reading back as `x`, which is also how `x` gets
/// displayed, as `(digits, exponent)` with `x = digits * 10^exponent`.
fn to_decimal(x: f64) -> Option<(BigInt, i64)> {
	// Display never switches to scientific notation for floats
	let text = x.to_string();
	let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
	let digits = BigInt::parse_bytes(format!("{whole}{fraction}").as_bytes(), 10)?;
	let exponent = -i64::try_from(fraction.len()).ok()?;

	Some((digits, exponent))
}

/// Compares two positive magnitudes given as `(mantissa, exponent)` pairs.
///
/// Logarithms settle every pair whose orders of magnitude are far apart. The
/// remaining pairs are compared exactly as decimals, since rounding a scaled
/// mantissa would make equality intransitive.
fn compare_magnitudes((a, a_exp): (f64, i32), (b, b_exp): (f64, i32)) -> Ordering {
	let a_log = a.log10() + f64::from(a_exp);
	let b_log = b.log10() + f64::from(b_exp);
	if (a_log - b_log).abs() > 1.0 {
		return a_log.total_cmp(&b_log);
	}

	let (Some((a_digits, a_shift)), Some((b_digits, b_shift))) = (to_decimal(a), to_decimal(b))
	else {
		return a_log.total_cmp(&b_log);
	};

	let a_total = a_shift + i64::from(a_exp);
	let b_total = b_shift + i64::from(b_exp);

	// Close orders of magnitude keep this gap within a few hundred digits
	let Ok(gap) = u32::try_from(a_total.abs_diff(b_total)) else {
		return a_log.total_cmp(&b_log);
	};

	let scale = BigInt::from(10u32).pow(gap);
	if a_total >= b_total {
		(a_digits * scale).cmp(&b_digits)
	} else {
		a_digits.cmp(&(b_digits * scale))
	}
}

impl PartialEq for MagnitudeValue {
	fn eq(&self, other: &Self) -> bool {
		self.compare(other) == Ordering::Equal
	}
}

impl Eq for MagnitudeValue {}

impl PartialOrd for MagnitudeValue {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for MagnitudeValue {
	fn cmp(&self, other: &Self) -> Ordering {
		self.compare(other)
	}
}

impl Display for MagnitudeValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}{}", self.mantissa, self.unit)
	}
}

// }}}
