//! Numeric flavors for the exact LP toolkit.
//!
//! One trait, [`LpScalar`], spans the three arithmetic flavors the solver
//! pipeline runs in: machine doubles for the cheap first pass, [`Mpf`]
//! extended binary floating point for escalation rounds, and
//! [`BigRational`](num_rational::BigRational) for exact verification.
//! Conversions between flavors go through the rational form: lifting a
//! binary float to a rational is exact, the reverse rounds to the target
//! precision.

mod mpf;
mod precision;
mod scalar;

pub use mpf::Mpf;
pub use precision::{DEFAULT_PRECISION, PrecisionGuard, current_precision, set_precision};
pub use scalar::LpScalar;

pub use num_rational::BigRational;
