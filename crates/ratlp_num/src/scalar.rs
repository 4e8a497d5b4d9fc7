use std::fmt;
use std::ops::{Div, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Exponent of the bound sentinel: bounds at or beyond `2^1000` are
/// treated as infinite. A power of two is representable bit-for-bit in
/// every flavor, so cross-flavor copies preserve unboundedness exactly.
pub(crate) const UNBOUNDED_EXP: usize = 1000;

/// One numeric flavor of the LP pipeline.
///
/// `Add` and `Mul` come in through [`Zero`] and [`One`]; operands are
/// cloned at call sites, which is the natural cost model for big-number
/// flavors anyway.
pub trait LpScalar:
    Clone
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + PartialOrd
    + Zero
    + One
    + Neg<Output = Self>
    + Sub<Output = Self>
    + Div<Output = Self>
{
    /// Short flavor tag used in problem-copy names and log lines.
    const NAME: &'static str;

    /// The exact value `p / q`. `q` must be nonzero.
    fn from_int_ratio(p: i64, q: u64) -> Self;

    /// Convert from an exact rational, rounding to this flavor's
    /// precision. Identity for the rational flavor itself.
    fn from_rational(q: &BigRational) -> Self;

    /// Exact lift of the currently stored binary value. Never rounds.
    fn to_rational(&self) -> BigRational;

    /// The bound sentinel `2^1000`; see [`UNBOUNDED_EXP`].
    fn infinite_bound() -> Self;

    /// Lossy absolute value, for pivot-size ordering and diagnostics only.
    /// Exact decisions must never be made on this.
    fn magnitude(&self) -> f64;

    fn is_unbounded_above(&self) -> bool {
        *self >= Self::infinite_bound()
    }

    fn is_unbounded_below(&self) -> bool {
        *self <= Self::zero() - Self::infinite_bound()
    }
}

impl LpScalar for f64 {
    const NAME: &'static str = "dbl";

    fn from_int_ratio(p: i64, q: u64) -> Self {
        p as f64 / q as f64
    }

    fn from_rational(q: &BigRational) -> Self {
        q.to_f64().unwrap_or_else(|| {
            if q.is_negative() { f64::NEG_INFINITY } else { f64::INFINITY }
        })
    }

    fn to_rational(&self) -> BigRational {
        BigRational::from_float(*self).unwrap_or_else(|| {
            // Non-finite values saturate to the bound sentinel.
            let huge = BigRational::from(BigInt::one() << UNBOUNDED_EXP);
            if *self < 0.0 { -huge } else { huge }
        })
    }

    fn infinite_bound() -> Self {
        2f64.powi(UNBOUNDED_EXP as i32)
    }

    fn magnitude(&self) -> f64 {
        self.abs()
    }
}

impl LpScalar for BigRational {
    const NAME: &'static str = "mpq";

    fn from_int_ratio(p: i64, q: u64) -> Self {
        BigRational::new(BigInt::from(p), BigInt::from(q))
    }

    fn from_rational(q: &BigRational) -> Self {
        q.clone()
    }

    fn to_rational(&self) -> BigRational {
        self.clone()
    }

    fn infinite_bound() -> Self {
        BigRational::from(BigInt::one() << UNBOUNDED_EXP)
    }

    fn magnitude(&self) -> f64 {
        self.to_f64().map(f64::abs).unwrap_or(f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mpf;

    #[test]
    fn double_lift_is_exact_for_binary_values() {
        let v = 0.375f64;
        assert_eq!(v.to_rational(), BigRational::from_int_ratio(3, 8));
        // 1/3 in double is not 1/3 exactly; its lift must not pretend it is.
        let third = 1.0f64 / 3.0;
        assert_ne!(third.to_rational(), BigRational::from_int_ratio(1, 3));
    }

    #[test]
    fn sentinel_is_identical_across_flavors() {
        let q = BigRational::infinite_bound();
        assert_eq!(f64::infinite_bound().to_rational(), q);
        assert_eq!(Mpf::infinite_bound().to_rational(), q);
        assert!(f64::infinite_bound().is_unbounded_above());
        assert!((-f64::infinite_bound()).is_unbounded_below());
        assert!(!1e12f64.is_unbounded_above());
    }

    #[test]
    fn from_int_ratio_agrees_across_flavors() {
        assert_eq!(f64::from_int_ratio(-3, 4), -0.75);
        assert_eq!(
            Mpf::from_int_ratio(-3, 4).to_rational(),
            BigRational::from_int_ratio(-3, 4)
        );
        assert_eq!(
            BigRational::from_int_ratio(6, 8),
            BigRational::from_int_ratio(3, 4)
        );
    }
}
