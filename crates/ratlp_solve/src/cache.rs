use ratlp_num::LpScalar;

use crate::status::LpStatus;

/// Verified solution attached to an LP. Written only after a full
/// verification pass succeeds, and always replaced whole, never patched.
#[derive(Debug, Clone)]
pub struct SolutionCache<R: LpScalar> {
    pub status: LpStatus,
    /// Objective value.
    pub val: R,
    /// Structural variable values, len = nstruct.
    pub x: Vec<R>,
    /// Reduced costs of structural variables, len = nstruct.
    pub rc: Vec<R>,
    /// Logical (slack) variable values, len = nrows.
    pub slack: Vec<R>,
    /// Row duals, len = nrows.
    pub pi: Vec<R>,
}
