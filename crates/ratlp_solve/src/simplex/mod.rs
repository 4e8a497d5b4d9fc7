mod bounded;

pub use bounded::BoundedSimplex;

use ratlp_num::LpScalar;

use crate::basis::Basis;
use crate::error::LpError;
use crate::status::LpStatus;

/// Which simplex variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Primal,
    Dual,
}

/// Contract the escalation driver expects from a simplex implementation.
///
/// After `solve`, the query methods reflect the just-completed run: status
/// first, then (depending on it) primal values, row duals, the
/// infeasibility ray, the final basis, and the iteration count.
pub trait SimplexSolver<R: LpScalar> {
    fn load_basis(&mut self, basis: &Basis) -> Result<(), LpError>;
    fn clear_basis(&mut self);
    fn solve(&mut self, algo: Algorithm) -> Result<(), LpError>;
    fn status(&self) -> LpStatus;
    /// Structural then logical variable values, len `nstruct + nrows`.
    fn x_array(&self) -> Vec<R>;
    /// Row duals, len `nrows`.
    fn pi_array(&self) -> Vec<R>;
    /// Dual ray proving infeasibility, len `nrows`.
    fn infeas_array(&self) -> Vec<R>;
    fn basis(&self) -> Basis;
    fn itcnt(&self) -> u64;
}
