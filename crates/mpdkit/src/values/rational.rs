use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub},
};

use chrono::TimeDelta;

/// An exact fraction, always kept in lowest terms with a positive denominator.
///
/// All MPD timing is expressed as `value / timescale`. Keeping it rational avoids the
/// drift that floating point accumulates over a long-running live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };

    /// Panics if `den` is zero.
    pub fn new(num: i128, den: i128) -> Self {
        assert!(den != 0, "rational with zero denominator");
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        Self {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    pub fn checked_new(num: i128, den: i128) -> Option<Self> {
        (den != 0).then(|| Self::new(num, den))
    }

    pub const fn from_integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    pub fn numer(&self) -> i128 {
        self.num
    }

    pub fn denom(&self) -> i128 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn abs(self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    pub fn floor(&self) -> i128 {
        self.num.div_euclid(self.den)
    }

    pub fn ceil(&self) -> i128 {
        -(-self.num).div_euclid(self.den)
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Parses a plain decimal literal such as `12`, `-0.5` or `3.`.
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        // i128 holds 38 digits; anything longer is not a realistic MPD value
        if int_part.len() + frac_part.len() > 36 {
            return None;
        }

        let int: i128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        let frac: i128 = if frac_part.is_empty() { 0 } else { frac_part.parse().ok()? };
        let scale = 10i128.pow(frac_part.len() as u32);
        let value = Self::new(int * scale + frac, scale);
        Some(if negative { -value } else { value })
    }

    /// Formats as a decimal number, exact when the expansion terminates within
    /// `max_fraction_digits`, otherwise rounded to that many digits.
    pub fn to_decimal_string(&self, max_fraction_digits: u32) -> String {
        let negative = self.num < 0;
        let abs = self.abs();
        let scale = 10i128.pow(max_fraction_digits);
        let scaled = Rational::new(abs.num * scale, abs.den);
        let rounded = Rational::new(scaled.num * 2 + scaled.den, scaled.den * 2).floor();

        let int = rounded / scale;
        let mut frac = format!("{:0width$}", rounded % scale, width = max_fraction_digits as usize);
        while frac.ends_with('0') {
            frac.pop();
        }

        let sign = if negative && rounded != 0 { "-" } else { "" };
        if frac.is_empty() {
            format!("{sign}{int}")
        } else {
            format!("{sign}{int}.{frac}")
        }
    }

    pub fn from_time_delta(delta: TimeDelta) -> Self {
        let nanos = delta.num_seconds() as i128 * 1_000_000_000 + delta.subsec_nanos() as i128;
        Self::new(nanos, 1_000_000_000)
    }

    /// Rounds to the nearest nanosecond, saturating at the range of [`TimeDelta`].
    pub fn to_time_delta(&self) -> TimeDelta {
        let nanos = Rational::new(self.num * 2_000_000_000 + self.den, self.den * 2).floor();
        let nanos = nanos.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        TimeDelta::nanoseconds(nanos)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for Rational {
    fn from(value: u64) -> Self {
        Self::from_integer(value as i128)
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value as i128)
    }
}

impl From<u32> for Rational {
    fn from(value: u32) -> Self {
        Self::from_integer(value as i128)
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Self) -> Self::Output {
        let g = gcd(self.den, rhs.den);
        Rational::new(
            self.num * (rhs.den / g) + rhs.num * (self.den / g),
            self.den / g * rhs.den,
        )
    }
}

impl AddAssign for Rational {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Self::Output {
        Rational {
            num: -self.num,
            den: self.den,
        }
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Self) -> Self::Output {
        let g1 = gcd(self.num, rhs.den).max(1);
        let g2 = gcd(rhs.num, self.den).max(1);
        Rational::new(
            (self.num / g1) * (rhs.num / g2),
            (self.den / g2) * (rhs.den / g1),
        )
    }
}

impl Div for Rational {
    type Output = Rational;

    /// Panics when dividing by zero, like integer division.
    fn div(self, rhs: Self) -> Self::Output {
        assert!(rhs.num != 0, "division of rational by zero");
        self * Rational::new(rhs.den, rhs.num)
    }
}

impl std::iter::Sum for Rational {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Rational::ZERO, Add::add)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(Rational::new(10, 20), Rational::new(1, 2));
        assert_eq!(Rational::new(3, -6), Rational::new(-1, 2));
        assert_eq!(Rational::new(0, 5), Rational::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let a = Rational::new(1, 3);
        let b = Rational::new(1, 6);
        assert_eq!(a + b, Rational::new(1, 2));
        assert_eq!(a - b, Rational::new(1, 6));
        assert_eq!(a * b, Rational::new(1, 18));
        assert_eq!(a / b, Rational::from_integer(2));
        assert!(b < a);
    }

    #[test]
    fn test_floor_ceil() {
        assert_eq!(Rational::new(7, 2).floor(), 3);
        assert_eq!(Rational::new(7, 2).ceil(), 4);
        assert_eq!(Rational::new(-7, 2).floor(), -4);
        assert_eq!(Rational::new(-7, 2).ceil(), -3);
        assert_eq!(Rational::from_integer(4).ceil(), 4);
    }

    #[test]
    fn test_no_drift() {
        // 30000/1001 fps frames summed a million times stays exact
        let frame = Rational::new(1001, 30000);
        let total: Rational = std::iter::repeat(frame).take(1_000_000).sum();
        assert_eq!(total, Rational::new(1001 * 1_000_000, 30000));
    }

    #[test]
    fn test_decimal() {
        assert_eq!(Rational::from_decimal_str("1.5"), Some(Rational::new(3, 2)));
        assert_eq!(Rational::from_decimal_str("-0.25"), Some(Rational::new(-1, 4)));
        assert_eq!(Rational::from_decimal_str("3."), Some(Rational::from_integer(3)));
        assert_eq!(Rational::from_decimal_str(".5"), Some(Rational::new(1, 2)));
        assert_eq!(Rational::from_decimal_str("abc"), None);
        assert_eq!(Rational::from_decimal_str("."), None);

        assert_eq!(Rational::new(3, 2).to_decimal_string(3), "1.5");
        assert_eq!(Rational::new(1, 3).to_decimal_string(3), "0.333");
        assert_eq!(Rational::new(2, 3).to_decimal_string(3), "0.667");
        assert_eq!(Rational::from_integer(-4).to_decimal_string(3), "-4");
    }

    #[test]
    fn test_time_delta() {
        let delta = TimeDelta::milliseconds(1500);
        assert_eq!(Rational::from_time_delta(delta), Rational::new(3, 2));
        assert_eq!(Rational::new(3, 2).to_time_delta(), delta);
    }
}
