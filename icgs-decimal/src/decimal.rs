use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::error::DecimalError;

/// Maximum scale (digits after the decimal point) ICGS will carry. Chosen as
/// a generous sanity bound, not a mathematical limit of the representation.
pub const MAX_SCALE: u32 = 1_000;

/// An exact, arbitrary-precision fixed-point decimal: `mantissa / 10^scale`.
///
/// Addition, subtraction, and multiplication are always exact. Division
/// requires a target scale and rounds half-to-even, matching IEEE 754's
/// "round to nearest, ties to even" for the single operation spec.md
/// identifies as lossy.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn new(mantissa: BigInt, scale: u32) -> Self {
        Decimal { mantissa, scale }
    }

    pub fn zero() -> Self {
        Decimal {
            mantissa: BigInt::zero(),
            scale: 0,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Decimal {
            mantissa: BigInt::from(value),
            scale: 0,
        }
    }

    pub fn from_i64_scaled(value: i64, scale: u32) -> Self {
        Decimal {
            mantissa: BigInt::from(value),
            scale,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn sign(&self) -> i32 {
        if self.mantissa.is_zero() {
            0
        } else if self.mantissa.is_negative() {
            -1
        } else {
            1
        }
    }

    pub fn abs(&self) -> Self {
        Decimal {
            mantissa: self.mantissa.abs(),
            scale: self.scale,
        }
    }

    pub fn neg(&self) -> Self {
        Decimal {
            mantissa: -&self.mantissa,
            scale: self.scale,
        }
    }

    /// Rescale to (at least) `scale`, padding the mantissa with zeros. Never
    /// loses precision since it only ever increases the scale.
    pub fn rescale(&self, scale: u32) -> Self {
        if scale <= self.scale {
            return self.clone();
        }
        let factor = pow10(scale - self.scale);
        Decimal {
            mantissa: &self.mantissa * factor,
            scale,
        }
    }

    fn align(a: &Decimal, b: &Decimal) -> (BigInt, BigInt, u32) {
        let scale = a.scale.max(b.scale);
        let a_aligned = a.rescale(scale);
        let b_aligned = b.rescale(scale);
        (a_aligned.mantissa, b_aligned.mantissa, scale)
    }

    pub fn checked_add(&self, other: &Decimal) -> Self {
        let (a, b, scale) = Self::align(self, other);
        Decimal {
            mantissa: a + b,
            scale,
        }
    }

    pub fn checked_sub(&self, other: &Decimal) -> Self {
        let (a, b, scale) = Self::align(self, other);
        Decimal {
            mantissa: a - b,
            scale,
        }
    }

    pub fn checked_mul(&self, other: &Decimal) -> Self {
        Decimal {
            mantissa: &self.mantissa * &other.mantissa,
            scale: self.scale + other.scale,
        }
    }

    /// Divide, rounding the quotient half-to-even to `target_scale` digits.
    pub fn checked_div(&self, other: &Decimal, target_scale: u32) -> Result<Self, DecimalError> {
        if other.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        if target_scale > MAX_SCALE {
            return Err(DecimalError::ScaleOverflow(target_scale));
        }
        // value = (mantissa_self * 10^other.scale) / (mantissa_other * 10^self.scale)
        // result_mantissa = round_half_even(numerator * 10^target_scale / denominator)
        let numerator = &self.mantissa * pow10(other.scale) * pow10(target_scale);
        let denominator = &other.mantissa * pow10(self.scale);
        let mantissa = round_half_even_div(&numerator, &denominator);
        Ok(Decimal {
            mantissa,
            scale: target_scale,
        })
    }

    /// Round to `scale` digits, half-to-even, returning a new `Decimal`.
    pub fn round(&self, scale: u32) -> Self {
        if scale >= self.scale {
            return self.rescale(scale);
        }
        let shift = self.scale - scale;
        let divisor = pow10(shift);
        let mantissa = round_half_even_div(&self.mantissa, &divisor);
        Decimal { mantissa, scale }
    }

    /// Compare with a tolerance: `true` if `|self - other| <= epsilon`.
    pub fn approx_eq(&self, other: &Decimal, epsilon: &Decimal) -> bool {
        self.checked_sub(other).abs().le(epsilon)
    }

    pub fn le(&self, other: &Decimal) -> bool {
        self.cmp_exact(other) != Ordering::Greater
    }

    pub fn ge(&self, other: &Decimal) -> bool {
        self.cmp_exact(other) != Ordering::Less
    }

    pub fn lt(&self, other: &Decimal) -> bool {
        self.cmp_exact(other) == Ordering::Less
    }

    pub fn gt(&self, other: &Decimal) -> bool {
        self.cmp_exact(other) == Ordering::Greater
    }

    fn cmp_exact(&self, other: &Decimal) -> Ordering {
        let (a, b, _) = Self::align(self, other);
        a.cmp(&b)
    }

    /// Best-effort lossy conversion for diagnostics/logging only.
    pub fn to_f64_lossy(&self) -> f64 {
        let mantissa = self.mantissa.to_f64().unwrap_or(0.0);
        mantissa / 10f64.powi(self.scale as i32)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_exact(other) == Ordering::Equal
    }
}
impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_exact(other))
    }
}
impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_exact(other)
    }
}

impl std::ops::Add for &Decimal {
    type Output = Decimal;
    fn add(self, rhs: &Decimal) -> Decimal {
        self.checked_add(rhs)
    }
}

impl std::ops::Sub for &Decimal {
    type Output = Decimal;
    fn sub(self, rhs: &Decimal) -> Decimal {
        self.checked_sub(rhs)
    }
}

impl std::ops::Mul for &Decimal {
    type Output = Decimal;
    fn mul(self, rhs: &Decimal) -> Decimal {
        self.checked_mul(rhs)
    }
}

impl std::ops::Neg for &Decimal {
    type Output = Decimal;
    fn neg(self) -> Decimal {
        Decimal::neg(self)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let negative = self.mantissa.is_negative();
        let digits = self.mantissa.abs().to_string();
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let split = padded.len() - scale;
        let (int_part, frac_part) = padded.split_at(split);
        if negative && !self.mantissa.is_zero() {
            write!(f, "-{}.{}", int_part, frac_part)
        } else {
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(DecimalError::Parse(input.to_string()));
        }
        let (sign, rest) = match s.as_bytes()[0] {
            b'+' => (1i32, &s[1..]),
            b'-' => (-1i32, &s[1..]),
            _ => (1i32, s),
        };
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Err(DecimalError::Parse(input.to_string()));
        }
        let mut parts = rest.splitn(2, '.');
        let int_part = parts.next().unwrap_or("");
        let frac_part = parts.next();
        if int_part.is_empty() && frac_part.map(str::is_empty).unwrap_or(true) {
            return Err(DecimalError::Parse(input.to_string()));
        }
        let (digits, scale) = match frac_part {
            Some(frac) => (format!("{int_part}{frac}"), frac.len() as u32),
            None => (int_part.to_string(), 0),
        };
        let digits = if digits.is_empty() { "0" } else { &digits };
        let magnitude = BigInt::from_str(digits).map_err(|_| DecimalError::Parse(input.to_string()))?;
        let mantissa = if sign < 0 { -magnitude } else { magnitude };
        Ok(Decimal { mantissa, scale })
    }
}

fn pow10(n: u32) -> BigInt {
    let mut result = BigInt::from(1);
    let ten = BigInt::from(10);
    for _ in 0..n {
        result *= &ten;
    }
    result
}

/// Round `numerator / denominator` half-to-even to the nearest integer,
/// returning the integer quotient. `denominator` must be non-zero.
fn round_half_even_div(numerator: &BigInt, denominator: &BigInt) -> BigInt {
    let two = BigInt::from(2);
    let one = BigInt::from(1);
    let sign = numerator.signum() * denominator.signum();
    let n_abs = numerator.abs();
    let d_abs = denominator.abs();
    let q = &n_abs / &d_abs;
    let r = &n_abs % &d_abs;
    let twice_r = &r * &two;
    let bump = match twice_r.cmp(&d_abs) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            // ties to even
            (&q % &two) != BigInt::zero()
        }
    };
    let q = if bump { q + &one } else { q };
    sign * q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_canonical() {
        let z1 = Decimal::zero();
        let z2 = Decimal::from_i64(0).neg();
        assert_eq!(z1, z2);
        assert_eq!(z2.sign(), 0);
    }

    #[test]
    fn add_and_sub_are_exact_across_scales() {
        let a: Decimal = "1.5".parse().unwrap();
        let b: Decimal = "2.25".parse().unwrap();
        let sum = a.checked_add(&b);
        assert_eq!(sum.to_string(), "3.75");
        let diff = b.checked_sub(&a);
        assert_eq!(diff.to_string(), "0.75");
    }

    #[test]
    fn mul_is_exact() {
        let a: Decimal = "1.1".parse().unwrap();
        let b: Decimal = "1.1".parse().unwrap();
        let product = a.checked_mul(&b);
        assert_eq!(product.to_string(), "1.21");
    }

    #[test]
    fn div_rounds_half_to_even() {
        let a: Decimal = "1".parse().unwrap();
        let b: Decimal = "8".parse().unwrap();
        // 1/8 = 0.125, rounding to 2dp: 0.12 (round half to even, 2 is even)
        let quotient = a.checked_div(&b, 2).unwrap();
        assert_eq!(quotient.to_string(), "0.12");

        let c: Decimal = "3".parse().unwrap();
        let d: Decimal = "8".parse().unwrap();
        // 3/8 = 0.375, rounding to 2dp: 0.38 (round half to even, 8 is even... tie breaks up since 7->8 even)
        let quotient2 = c.checked_div(&d, 2).unwrap();
        assert_eq!(quotient2.to_string(), "0.38");
    }

    #[test]
    fn div_by_zero_errors() {
        let a = Decimal::from_i64(1);
        let z = Decimal::zero();
        assert!(matches!(a.checked_div(&z, 4), Err(DecimalError::DivisionByZero)));
    }

    #[test]
    fn ordering_ignores_scale_padding() {
        let a = Decimal::from_i64_scaled(100, 2); // 1.00
        let b = Decimal::from_i64(1); // 1
        assert_eq!(a, b);
        assert!(a.le(&b) && a.ge(&b));
    }

    #[test]
    fn negative_parsing_roundtrip() {
        let a: Decimal = "-12.340".parse().unwrap();
        assert_eq!(a.sign(), -1);
        assert_eq!(a.to_string(), "-12.340");
    }

    proptest::proptest! {
        #[test]
        fn add_is_commutative(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let da = Decimal::from_i64(a);
            let db = Decimal::from_i64(b);
            proptest::prop_assert_eq!(da.checked_add(&db), db.checked_add(&da));
        }

        #[test]
        fn mul_distributes_over_add(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
            let da = Decimal::from_i64(a);
            let db = Decimal::from_i64(b);
            let dc = Decimal::from_i64(c);
            let lhs = da.checked_mul(&db.checked_add(&dc));
            let rhs = da.checked_mul(&db).checked_add(&da.checked_mul(&dc));
            proptest::prop_assert_eq!(lhs, rhs);
        }
    }
}
