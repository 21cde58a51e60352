use anyhow::anyhow;
use cosmwasm_std::Uint128;

use crate::{errors::ValidationError, AnyResult};

pub trait IntoUint128 {
    fn as_uint128(&self) -> Uint128;
}

impl IntoUint128 for u64 {
    fn as_uint128(&self) -> Uint128 {
        Uint128::from(*self as u128)
    }
}

pub trait IntoU64 {
    fn as_u64(&self) -> AnyResult<u64>;
}

impl IntoU64 for Uint128 {
    fn as_u64(&self) -> AnyResult<u64> {
        self.u128()
            .try_into()
            .map_err(|_| anyhow!("{} does not fit into u64", self))
    }
}

/// Converts a human entered amount (`"5"`, `"0.25"`) into micro units of a
/// currency with `decimals` fractional digits.
///
/// Arithmetic is done on the decimal digits, so integer and exact fractional
/// inputs never drift. Zero and negative amounts are rejected.
pub fn to_micro_units(amount: &str, decimals: u32) -> Result<u64, ValidationError> {
    let amount = amount.trim();

    if let Some(rest) = amount.strip_prefix('-') {
        if rest.starts_with('-') {
            return Err(ValidationError::MalformedAmount(amount.to_string()));
        }
        return match to_micro_units(rest, decimals) {
            Ok(_) | Err(ValidationError::NonPositiveAmount) => {
                Err(ValidationError::NonPositiveAmount)
            }
            Err(err) => Err(err),
        };
    }

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ValidationError::MalformedAmount(amount.to_string()));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(ValidationError::TooManyDecimals { decimals });
    }

    let scale = 10u64
        .checked_pow(decimals)
        .ok_or(ValidationError::AmountOverflow)?;

    let whole: u64 = match whole.trim_start_matches('0') {
        "" => 0,
        digits => digits
            .parse()
            .map_err(|_| ValidationError::AmountOverflow)?,
    };

    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<width$}", width = decimals as usize)
            .parse()
            .map_err(|_| ValidationError::AmountOverflow)?
    };

    let total = whole
        .checked_mul(scale)
        .and_then(|val| val.checked_add(fraction))
        .ok_or(ValidationError::AmountOverflow)?;

    if total == 0 {
        return Err(ValidationError::NonPositiveAmount);
    }

    Ok(total)
}

#[cfg(test)]
mod test {
    use cosmwasm_std::Uint128;

    use super::*;

    #[test]
    fn integer_amounts_scale_exactly() {
        assert_eq!(to_micro_units("5", 6).unwrap(), 5_000_000);
        assert_eq!(to_micro_units("1", 0).unwrap(), 1);
        assert_eq!(to_micro_units("18446744073709", 6).unwrap(), 18_446_744_073_709_000_000);

        for a in 1..200u64 {
            assert_eq!(to_micro_units(&a.to_string(), 6).unwrap(), a * 1_000_000);
        }
    }

    #[test]
    fn fractional_amounts() {
        assert_eq!(to_micro_units("0.1", 6).unwrap(), 100_000);
        assert_eq!(to_micro_units("1.000001", 6).unwrap(), 1_000_001);
        assert_eq!(to_micro_units(".5", 6).unwrap(), 500_000);
        assert_eq!(to_micro_units("2.50000000", 6).unwrap(), 2_500_000);
        assert_eq!(to_micro_units(" 3 ", 6).unwrap(), 3_000_000);
    }

    #[test]
    fn non_positive_amounts_rejected() {
        assert_eq!(to_micro_units("0", 6), Err(ValidationError::NonPositiveAmount));
        assert_eq!(to_micro_units("0.000", 6), Err(ValidationError::NonPositiveAmount));
        assert_eq!(to_micro_units("-5", 6), Err(ValidationError::NonPositiveAmount));
        assert_eq!(to_micro_units("-0", 6), Err(ValidationError::NonPositiveAmount));
    }

    #[test]
    fn malformed_amounts_rejected() {
        for input in ["", ".", "abc", "1.2.3", "+5", "1e6", "--1"] {
            assert!(
                matches!(
                    to_micro_units(input, 6),
                    Err(ValidationError::MalformedAmount(_))
                ),
                "{input:?} should be malformed"
            );
        }

        assert_eq!(
            to_micro_units("0.0000001", 6),
            Err(ValidationError::TooManyDecimals { decimals: 6 })
        );
        assert_eq!(
            to_micro_units("99999999999999999999", 6),
            Err(ValidationError::AmountOverflow)
        );
    }

    #[test]
    fn u64_conversion() {
        assert_eq!(Uint128::new(42).as_u64().unwrap(), 42);
        assert!(Uint128::MAX.as_u64().is_err());
        assert_eq!(7u64.as_uint128(), Uint128::new(7));
    }
}
