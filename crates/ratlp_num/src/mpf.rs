use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::precision::current_precision;
use crate::scalar::{LpScalar, UNBOUNDED_EXP};

/// Extended-precision binary floating point number, `mantissa * 2^exp`.
///
/// The mantissa is a signed big integer kept normalized (odd, or zero with
/// a zero exponent), so equal values always have identical representations.
/// Every arithmetic operation rounds its result to the process-wide
/// precision (see [`crate::set_precision`]) with round-to-nearest,
/// ties-to-even. Lifting to a rational via [`LpScalar::to_rational`] is
/// exact; no information beyond the stored bits exists to lose.
#[derive(Debug, Clone)]
pub struct Mpf {
    mantissa: BigInt,
    exp: i64,
}

/// Round `mag` down by `shift` bits with round-to-nearest, ties-to-even.
fn round_shifted(mag: &BigUint, shift: u64) -> BigUint {
    debug_assert!(shift >= 1);
    let shift = shift as usize;
    let floor: BigUint = mag >> shift;
    let round_bit = ((mag >> (shift - 1)) & BigUint::one()).is_one();
    if !round_bit {
        return floor;
    }
    let tail_mask = (BigUint::one() << (shift - 1)) - BigUint::one();
    let sticky = !(mag & tail_mask).is_zero();
    if sticky || floor.is_odd() {
        floor + BigUint::one()
    } else {
        floor
    }
}

impl Mpf {
    fn raw(mantissa: BigInt, exp: i64) -> Self {
        Self { mantissa, exp }
    }

    /// Strip trailing zero bits so the representation is canonical.
    fn normalized(mut self) -> Self {
        if self.mantissa.is_zero() {
            self.exp = 0;
            return self;
        }
        let tz = self.mantissa.trailing_zeros().unwrap_or(0);
        if tz > 0 {
            self.mantissa >>= tz as usize;
            self.exp += tz as i64;
        }
        self
    }

    /// Round to the current process precision and normalize.
    fn rounded(self) -> Self {
        let prec = current_precision();
        let bits = self.mantissa.magnitude().bits();
        if bits <= prec {
            return self.normalized();
        }
        let shift = bits - prec;
        let mag = round_shifted(self.mantissa.magnitude(), shift);
        let mantissa = BigInt::from_biguint(self.mantissa.sign(), mag);
        Self::raw(mantissa, self.exp + shift as i64).normalized()
    }

    /// Correctly rounded `sign * (num / den) * 2^exp0` at the current
    /// precision. `den` must be nonzero.
    fn from_ratio_parts(sign: Sign, num: BigUint, den: BigUint, exp0: i64) -> Self {
        if num.is_zero() {
            return Self::raw(BigInt::zero(), 0);
        }
        let prec = current_precision();
        let nb = num.bits() as i64;
        let db = den.bits() as i64;
        // Scale so the integer quotient carries at least prec + 1 bits.
        let s = prec as i64 + 1 + db - nb;
        let (num, den) = if s >= 0 {
            (num << s as usize, den)
        } else {
            (num, den << (-s) as usize)
        };
        let exp = exp0 - s;
        let (q, r) = num.div_rem(&den);
        // Fold the remainder into two guard bits (below half / half / above
        // half) so a single nearest-even rounding of the widened mantissa is
        // correct.
        let guard = match (&r + &r).cmp(&den) {
            _ if r.is_zero() => 0u8,
            Ordering::Less => 1,
            Ordering::Equal => 2,
            Ordering::Greater => 3,
        };
        let widened = (q << 2usize) | BigUint::from(guard);
        Self::raw(BigInt::from_biguint(sign, widened), exp - 2).rounded()
    }

    fn cmp_exact(&self, other: &Self) -> Ordering {
        let ls = self.mantissa.sign();
        let rs = other.mantissa.sign();
        if ls != rs {
            return ls.cmp(&rs);
        }
        if ls == Sign::NoSign {
            return Ordering::Equal;
        }
        let d = self.exp - other.exp;
        let (a, b) = if d >= 0 {
            (self.mantissa.magnitude() << d as usize, other.mantissa.magnitude().clone())
        } else {
            (self.mantissa.magnitude().clone(), other.mantissa.magnitude() << (-d) as usize)
        };
        let mag_ord = a.cmp(&b);
        if ls == Sign::Plus { mag_ord } else { mag_ord.reverse() }
    }
}

impl PartialEq for Mpf {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_exact(other) == Ordering::Equal
    }
}

impl PartialOrd for Mpf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_exact(other))
    }
}

impl Neg for Mpf {
    type Output = Mpf;
    fn neg(self) -> Mpf {
        Mpf::raw(-self.mantissa, self.exp)
    }
}

impl Add for Mpf {
    type Output = Mpf;
    fn add(self, rhs: Mpf) -> Mpf {
        if self.mantissa.is_zero() {
            return rhs.rounded();
        }
        if rhs.mantissa.is_zero() {
            return self.rounded();
        }
        let (lo, hi) = if self.exp <= rhs.exp { (self, rhs) } else { (rhs, self) };
        let shift = (hi.exp - lo.exp) as usize;
        let mantissa = (hi.mantissa << shift) + lo.mantissa;
        Mpf::raw(mantissa, lo.exp).rounded()
    }
}

impl Sub for Mpf {
    type Output = Mpf;
    fn sub(self, rhs: Mpf) -> Mpf {
        self + (-rhs)
    }
}

impl Mul for Mpf {
    type Output = Mpf;
    fn mul(self, rhs: Mpf) -> Mpf {
        Mpf::raw(self.mantissa * rhs.mantissa, self.exp + rhs.exp).rounded()
    }
}

impl Div for Mpf {
    type Output = Mpf;
    fn div(self, rhs: Mpf) -> Mpf {
        debug_assert!(!rhs.mantissa.is_zero(), "Mpf division by zero");
        let sign = match (self.mantissa.sign(), rhs.mantissa.sign()) {
            (Sign::NoSign, _) => return Mpf::zero(),
            (a, b) if a == b => Sign::Plus,
            _ => Sign::Minus,
        };
        Mpf::from_ratio_parts(
            sign,
            self.mantissa.magnitude().clone(),
            rhs.mantissa.magnitude().clone(),
            self.exp - rhs.exp,
        )
    }
}

impl Zero for Mpf {
    fn zero() -> Self {
        Mpf::raw(BigInt::zero(), 0)
    }

    fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }
}

impl One for Mpf {
    fn one() -> Self {
        Mpf::raw(BigInt::one(), 0)
    }
}

impl fmt::Display for Mpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mag = self.magnitude();
        let v = if self.mantissa.sign() == Sign::Minus { -mag } else { mag };
        write!(f, "{v:e}")
    }
}

impl LpScalar for Mpf {
    const NAME: &'static str = "mpf";

    fn from_int_ratio(p: i64, q: u64) -> Self {
        Self::from_rational(&BigRational::new(BigInt::from(p), BigInt::from(q)))
    }

    fn from_rational(q: &BigRational) -> Self {
        Self::from_ratio_parts(
            q.numer().sign(),
            q.numer().magnitude().clone(),
            q.denom().magnitude().clone(),
            0,
        )
    }

    fn to_rational(&self) -> BigRational {
        if self.exp >= 0 {
            BigRational::from(self.mantissa.clone() << self.exp as usize)
        } else {
            BigRational::new(self.mantissa.clone(), BigInt::one() << (-self.exp) as usize)
        }
    }

    fn infinite_bound() -> Self {
        Mpf::raw(BigInt::one(), UNBOUNDED_EXP as i64)
    }

    fn magnitude(&self) -> f64 {
        let mag = self.mantissa.magnitude();
        let bits = mag.bits();
        if bits == 0 {
            return 0.0;
        }
        let (top, dropped) = if bits > 53 {
            (mag >> (bits - 53) as usize, bits - 53)
        } else {
            (mag.clone(), 0)
        };
        let t = top.to_f64().unwrap_or(f64::MAX);
        let e = (self.exp + dropped as i64).clamp(-2000, 2000) as i32;
        t * 2f64.powi(e)
    }
}
