//! Exact monetary arithmetic.
//!
//! Every monetary value in litesend is either an [`Amount`] (an integer count
//! of litoshis) or an [`ExactDecimal`] (an arbitrary-precision base-10 number
//! used at the boundary, where user input and ledger fee quotes arrive as
//! decimal text). Binary floating point is never involved: `0.1 * 100000000`
//! is exactly `10000000`.
//!
//! [`safe_math`] exposes the decimal operations over strings, the way callers
//! that only hold textual numbers want them.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use crate::constants::{DECIMALS, DIVISION_SCALE, MAX_EXPONENT};
use crate::error::AmountError;

/// `10^n` as a big integer.
fn pow10(n: u32) -> BigInt {
    BigInt::from(10u8).pow(n)
}

/// An arbitrary-precision decimal number: `mantissa * 10^-scale`.
///
/// Always kept normalized (no trailing zeros in the mantissa while
/// `scale > 0`), so structural equality is numeric equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExactDecimal {
    mantissa: BigInt,
    scale: u32,
}

impl ExactDecimal {
    /// Build `mantissa * 10^-scale`, normalizing trailing zeros away.
    pub fn new(mantissa: BigInt, scale: u32) -> Self {
        let mut mantissa = mantissa;
        let mut scale = scale;
        let ten = BigInt::from(10u8);
        while scale > 0 && !mantissa.is_zero() && (&mantissa % &ten).is_zero() {
            mantissa /= &ten;
            scale -= 1;
        }
        if mantissa.is_zero() {
            scale = 0;
        }
        Self { mantissa, scale }
    }

    /// The number zero.
    pub fn zero() -> Self {
        Self::new(BigInt::zero(), 0)
    }

    /// An integral decimal.
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self::new(value.into(), 0)
    }

    /// Number of digits after the decimal point in canonical form.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// Whether the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.scale == 0
    }

    /// Exact conversion to `u64`. `None` if fractional, negative, or too large.
    pub fn to_u64(&self) -> Option<u64> {
        if !self.is_integer() {
            return None;
        }
        self.mantissa.to_u64()
    }

    /// Smallest integer greater than or equal to this value.
    pub fn ceil(&self) -> BigInt {
        if self.scale == 0 {
            return self.mantissa.clone();
        }
        let divisor = pow10(self.scale);
        let truncated = &self.mantissa / &divisor;
        // Integer division truncates toward zero; only positive fractions move up.
        if self.mantissa.is_positive() {
            truncated + 1u32
        } else {
            truncated
        }
    }

    /// Rescale both operands to a common scale.
    fn aligned(&self, other: &Self) -> (BigInt, BigInt, u32) {
        let scale = self.scale.max(other.scale);
        let a = &self.mantissa * pow10(scale - self.scale);
        let b = &other.mantissa * pow10(scale - other.scale);
        (a, b, scale)
    }

    /// Division. Exact when the quotient terminates within
    /// [`DIVISION_SCALE`] fractional digits, otherwise rounded half away from
    /// zero at that scale.
    pub fn checked_div(&self, divisor: &Self) -> Result<Self, AmountError> {
        if divisor.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        // a/b = (ma * 10^sb * 10^P) / (mb * 10^sa) * 10^-P
        let numerator = &self.mantissa * pow10(divisor.scale + DIVISION_SCALE);
        let denominator = &divisor.mantissa * pow10(self.scale);

        let negative = numerator.is_negative() != denominator.is_negative();
        let n = numerator.abs();
        let d = denominator.abs();
        let mut quotient = &n / &d;
        let remainder = &n % &d;
        if remainder * 2u8 >= d {
            quotient += 1u32;
        }
        if negative {
            quotient = -quotient;
        }
        Ok(Self::new(quotient, DIVISION_SCALE))
    }

    /// Raise to an integral power. Negative exponents divide.
    pub fn checked_pow(&self, exponent: &Self) -> Result<Self, AmountError> {
        if !exponent.is_integer() {
            return Err(AmountError::NonIntegerExponent(exponent.to_string()));
        }
        let magnitude = exponent
            .mantissa
            .abs()
            .to_u32()
            .filter(|e| *e <= MAX_EXPONENT)
            .ok_or_else(|| AmountError::ExponentTooLarge(exponent.to_string()))?;
        let scale = self
            .scale
            .checked_mul(magnitude)
            .ok_or_else(|| AmountError::ExponentTooLarge(exponent.to_string()))?;
        let raised = Self::new(self.mantissa.pow(magnitude), scale);
        if exponent.is_negative() {
            Self::from_integer(1u8).checked_div(&raised)
        } else {
            Ok(raised)
        }
    }

    /// Multiply by `10^n` without going through a full multiplication.
    pub fn shift_left(&self, n: u32) -> Self {
        if n <= self.scale {
            Self::new(self.mantissa.clone(), self.scale - n)
        } else {
            Self::new(&self.mantissa * pow10(n - self.scale), 0)
        }
    }
}

impl FromStr for ExactDecimal {
    type Err = AmountError;

    /// Parse `[+-]digits[.digits][(e|E)[+-]digits]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AmountError::Malformed(s.to_string());
        let text = s.trim();

        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            Some(_) => (false, text),
            None => return Err(malformed()),
        };

        let (coefficient, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
            None => (unsigned, None),
        };
        let (int_part, frac_part) = coefficient.split_once('.').unwrap_or((coefficient, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(malformed());
        }

        let exponent: i64 = match exponent {
            Some(e) => {
                let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
                if digits.is_empty() || !all_digits(digits) {
                    return Err(malformed());
                }
                let value: i64 = e
                    .parse()
                    .map_err(|_| AmountError::ExponentTooLarge(e.to_string()))?;
                if value.unsigned_abs() > u64::from(MAX_EXPONENT) {
                    return Err(AmountError::ExponentTooLarge(e.to_string()));
                }
                value
            }
            None => 0,
        };

        let digits = format!("{int_part}{frac_part}");
        let mut mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(malformed)?;
        if negative {
            mantissa = -mantissa;
        }

        let frac_len = i64::try_from(frac_part.len()).map_err(|_| malformed())?;
        let scale = frac_len - exponent;
        if scale < 0 {
            let shift = u32::try_from(-scale).map_err(|_| malformed())?;
            Ok(Self::new(mantissa * pow10(shift), 0))
        } else {
            let scale = u32::try_from(scale).map_err(|_| malformed())?;
            Ok(Self::new(mantissa, scale))
        }
    }
}

impl fmt::Display for ExactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let digits = self.mantissa.abs().to_string();
        if self.scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl Add for &ExactDecimal {
    type Output = ExactDecimal;

    fn add(self, rhs: Self) -> ExactDecimal {
        let (a, b, scale) = self.aligned(rhs);
        ExactDecimal::new(a + b, scale)
    }
}

impl Sub for &ExactDecimal {
    type Output = ExactDecimal;

    fn sub(self, rhs: Self) -> ExactDecimal {
        let (a, b, scale) = self.aligned(rhs);
        ExactDecimal::new(a - b, scale)
    }
}

impl Mul for &ExactDecimal {
    type Output = ExactDecimal;

    fn mul(self, rhs: Self) -> ExactDecimal {
        ExactDecimal::new(&self.mantissa * &rhs.mantissa, self.scale + rhs.scale)
    }
}

impl Neg for ExactDecimal {
    type Output = ExactDecimal;

    fn neg(self) -> ExactDecimal {
        ExactDecimal::new(-self.mantissa, self.scale)
    }
}

/// An arithmetic operation selectable by its symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    /// Apply this operator to two decimals.
    pub fn apply(&self, a: &ExactDecimal, b: &ExactDecimal) -> Result<ExactDecimal, AmountError> {
        match self {
            Operator::Add => Ok(a + b),
            Operator::Sub => Ok(a - b),
            Operator::Mul => Ok(a * b),
            Operator::Div => a.checked_div(b),
            Operator::Pow => a.checked_pow(b),
        }
    }
}

impl FromStr for Operator {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" | "x" => Ok(Operator::Mul),
            "/" | "÷" => Ok(Operator::Div),
            "^" => Ok(Operator::Pow),
            _ => Err(AmountError::UnsupportedOperator(s.to_string())),
        }
    }
}

/// Apply `operation` to two decimal strings and return the exact decimal
/// string result.
///
/// ```
/// use litesend_core::amount::safe_math;
/// assert_eq!(safe_math("0.1", "*", "100000000").unwrap(), "10000000");
/// assert_eq!(safe_math("0.1", "+", "0.2").unwrap(), "0.3");
/// ```
pub fn safe_math(first: &str, operation: &str, second: &str) -> Result<String, AmountError> {
    let a: ExactDecimal = first.parse()?;
    let b: ExactDecimal = second.parse()?;
    let op: Operator = operation.parse()?;
    Ok(op.apply(&a, &b)?.to_string())
}

/// An integer amount of litoshis.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Wrap a litoshi count.
    pub const fn from_minor(litoshis: u64) -> Self {
        Self(litoshis)
    }

    /// The litoshi count.
    pub const fn as_minor(self) -> u64 {
        self.0
    }

    /// Convert a user-facing major-unit decimal string (e.g. `"0.5"`) into
    /// litoshis, exactly.
    pub fn from_major_str(s: &str) -> Result<Self, AmountError> {
        Self::from_major_decimal(&s.parse()?)
    }

    /// Exact major → minor conversion. Rejects negatives, sub-litoshi
    /// precision, and values beyond `u64`.
    pub fn from_major_decimal(value: &ExactDecimal) -> Result<Self, AmountError> {
        if value.is_negative() {
            return Err(AmountError::Negative(value.to_string()));
        }
        let scaled = value.shift_left(DECIMALS);
        if !scaled.is_integer() {
            return Err(AmountError::ExcessPrecision {
                value: value.to_string(),
                max_decimals: DECIMALS,
            });
        }
        scaled
            .to_u64()
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(value.to_string()))
    }

    /// Major → minor conversion rounding any sub-litoshi remainder up.
    pub fn from_major_decimal_ceil(value: &ExactDecimal) -> Result<Self, AmountError> {
        if value.is_negative() {
            return Err(AmountError::Negative(value.to_string()));
        }
        value
            .shift_left(DECIMALS)
            .ceil()
            .to_u64()
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(value.to_string()))
    }

    /// The value in major units as an exact decimal.
    pub fn to_major_decimal(self) -> ExactDecimal {
        ExactDecimal::new(BigInt::from(self.0), DECIMALS)
    }

    /// The value in major units, e.g. `"0.0002"`.
    pub fn to_major_string(self) -> String {
        self.to_major_decimal().to_string()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Sum of an iterator of amounts. `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(iter: I) -> Option<Self> {
        iter.into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(litoshis: u64) -> Self {
        Self(litoshis)
    }
}
