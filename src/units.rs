//! Conversion between NEAR and yoctoNEAR (10^-24 NEAR).

use thiserror::Error;

use near_primitives::types::Balance;

pub const NEAR_NOMINATION_EXP: usize = 24;

/// 1 NEAR in yoctoNEAR.
pub const ONE_NEAR: Balance = 1_000_000_000_000_000_000_000_000;

pub const ONE_YOCTO: Balance = 1;

#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
	#[error("`{0}` is not a decimal NEAR amount")]
	Malformed(String),

	#[error("`{0}` has more than 24 fractional digits")]
	TooPrecise(String),

	#[error("`{0}` does not fit in 128 bits of yoctoNEAR")]
	Overflow(String),
}

/// Parse a human amount such as `"1.5"` or `"1,000"` into yoctoNEAR.
pub fn parse_near_amount(amount: &str) -> Result<Balance, AmountError> {
	let cleaned: String = amount.trim().chars().filter(|c| *c != ',').collect();
	let (whole, frac) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));

	let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
	if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
		return Err(AmountError::Malformed(amount.to_owned()));
	}
	if frac.len() > NEAR_NOMINATION_EXP {
		return Err(AmountError::TooPrecise(amount.to_owned()));
	}

	let digits = format!("{whole}{frac:0<NEAR_NOMINATION_EXP$}");
	let digits = digits.trim_start_matches('0');
	if digits.is_empty() {
		return Ok(0);
	}
	digits
		.parse::<Balance>()
		.map_err(|_| AmountError::Overflow(amount.to_owned()))
}

/// Render yoctoNEAR as NEAR with trailing fractional zeros dropped.
pub fn format_near_amount(yocto: Balance) -> String {
	let whole = yocto / ONE_NEAR;
	let frac = yocto % ONE_NEAR;
	if frac == 0 {
		return whole.to_string();
	}
	let frac = format!("{frac:0>NEAR_NOMINATION_EXP$}");
	format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_whole_and_fractional_amounts() {
		assert_eq!(parse_near_amount("1").unwrap(), ONE_NEAR);
		assert_eq!(parse_near_amount("10").unwrap(), 10 * ONE_NEAR);
		assert_eq!(parse_near_amount("0.5").unwrap(), ONE_NEAR / 2);
		assert_eq!(parse_near_amount(".25").unwrap(), ONE_NEAR / 4);
		assert_eq!(parse_near_amount("1,000").unwrap(), 1000 * ONE_NEAR);
		assert_eq!(parse_near_amount("0.000000000000000000000001").unwrap(), ONE_YOCTO);
		assert_eq!(parse_near_amount("0").unwrap(), 0);
	}

	#[test]
	fn rejects_bad_amounts() {
		assert!(matches!(parse_near_amount(""), Err(AmountError::Malformed(_))));
		assert!(matches!(parse_near_amount("."), Err(AmountError::Malformed(_))));
		assert!(matches!(parse_near_amount("1.2.3"), Err(AmountError::Malformed(_))));
		assert!(matches!(parse_near_amount("-1"), Err(AmountError::Malformed(_))));
		assert!(matches!(
			parse_near_amount("0.0000000000000000000000001"),
			Err(AmountError::TooPrecise(_))
		));
		assert!(matches!(
			parse_near_amount("999999999999999999999999"),
			Err(AmountError::Overflow(_))
		));
	}

	#[test]
	fn formats_without_trailing_zeros() {
		assert_eq!(format_near_amount(10u128.pow(25)), "10");
		assert_eq!(format_near_amount(ONE_NEAR + ONE_NEAR / 2), "1.5");
		assert_eq!(format_near_amount(ONE_YOCTO), "0.000000000000000000000001");
		assert_eq!(format_near_amount(0), "0");
	}
}
