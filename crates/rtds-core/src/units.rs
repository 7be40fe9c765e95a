//! Exact decoding of numeric literals with SI prefixes.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{pow, One};

use crate::error::{Error, Result};

/// Largest decimal exponent accepted after folding in prefix and fraction.
pub const MAX_EXPONENT: u32 = 4096;

/// Decimal exponent of an SI prefix.
///
/// Supported prefixes:
/// - T (tera, 1e12)
/// - G (giga, 1e9)
/// - M (mega, 1e6)
/// - k, K (kilo, 1e3)
/// - m (milli, 1e-3)
/// - u, μ (micro, 1e-6)
/// - n (nano, 1e-9)
/// - p (pico, 1e-12)
pub fn si_exponent(prefix: char) -> Option<i32> {
    match prefix {
        'T' => Some(12),
        'G' => Some(9),
        'M' => Some(6),
        'k' | 'K' => Some(3),
        'm' => Some(-3),
        'u' | 'μ' => Some(-6),
        'n' => Some(-9),
        'p' => Some(-12),
        _ => None,
    }
}

/// Parse a numeric literal exactly: `1.5`, `-2`, `1e-6`, `10u`, `4.7k`.
///
/// Decimal fractions are kept as exact rationals; nothing goes through
/// floating point.
pub fn parse_value(s: &str) -> Result<BigRational> {
    let invalid = || Error::InvalidValue(s.to_string());
    let text = s.trim();

    // Split off an optional SI prefix.
    let prefix = text
        .chars()
        .last()
        .and_then(|c| si_exponent(c).map(|exp| (c, exp)));
    let (number, scale) = match prefix {
        Some((c, exp)) => (&text[..text.len() - c.len_utf8()], exp),
        None => (text, 0),
    };

    let (mantissa, exponent) = match number.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => {
            let exp: i32 = number[pos + 1..].parse().map_err(|_| invalid())?;
            (&number[..pos], exp)
        }
        None => (number, 0),
    };

    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let all_digits = format!("{}{}", int_part, frac_part);
    let mut value = BigRational::from_integer(all_digits.parse::<BigInt>().map_err(|_| invalid())?);
    if negative {
        value = -value;
    }

    let frac_len = i32::try_from(frac_part.len()).map_err(|_| invalid())?;
    let power = exponent
        .checked_add(scale)
        .and_then(|p| p.checked_sub(frac_len))
        .filter(|p| p.unsigned_abs() <= MAX_EXPONENT)
        .ok_or_else(invalid)?;
    Ok(value * power_of_ten(power))
}

fn power_of_ten(power: i32) -> BigRational {
    let magnitude = pow(BigInt::from(10), power.unsigned_abs() as usize);
    if power >= 0 {
        BigRational::from_integer(magnitude)
    } else {
        BigRational::new(BigInt::one(), magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_value("1.5").unwrap(), ratio(3, 2));
        assert_eq!(parse_value("-2").unwrap(), ratio(-2, 1));
        assert_eq!(parse_value("+.25").unwrap(), ratio(1, 4));
        assert_eq!(parse_value("1e-3").unwrap(), ratio(1, 1000));
        assert_eq!(parse_value("2.5E2").unwrap(), ratio(250, 1));
    }

    #[test]
    fn test_parse_with_prefix() {
        assert_eq!(parse_value("1k").unwrap(), ratio(1000, 1));
        assert_eq!(parse_value("4.7K").unwrap(), ratio(4700, 1));
        assert_eq!(parse_value("10m").unwrap(), ratio(1, 100));
        assert_eq!(parse_value("2M").unwrap(), ratio(2_000_000, 1));
        assert_eq!(parse_value("100n").unwrap(), ratio(1, 10_000_000));
        assert_eq!(parse_value("1u").unwrap(), ratio(1, 1_000_000));
        assert_eq!(parse_value("1μ").unwrap(), ratio(1, 1_000_000));
        assert_eq!(parse_value("10p").unwrap(), ratio(1, 100_000_000_000));
    }

    #[test]
    fn test_decimal_is_exact() {
        // 0.1 has no exact binary representation.
        assert_eq!(parse_value("0.1").unwrap(), ratio(1, 10));
        assert_eq!(parse_value("0.1").unwrap() * BigRational::from_integer(BigInt::from(3)), ratio(3, 10));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse_value("abc"), Err(Error::InvalidValue(_))));
        assert!(parse_value("").is_err());
        assert!(parse_value("-").is_err());
        assert!(parse_value("1e").is_err());
        assert!(parse_value("1.2.3").is_err());
        assert!(parse_value("k").is_err());
    }

    #[test]
    fn test_parse_exponent_out_of_range() {
        assert!(matches!(parse_value("1e2147483647k"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_value("1e-2147483648p"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_value("1e99999999"), Err(Error::InvalidValue(_))));
        assert!(parse_value("1e4096").is_ok());
        assert!(parse_value("1e4097").is_err());
        assert_eq!(parse_value("1e-4093m").unwrap(), BigRational::new(BigInt::one(), pow(BigInt::from(10), 4096)));
    }
}
