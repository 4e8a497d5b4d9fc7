use num_traits::{One, Zero};
use ratlp_num::{BigRational, LpScalar};
use thiserror::Error;
use tracing::debug;

use crate::basis::{Basis, ColStatus, RowStatus};
use crate::cache::SolutionCache;
use crate::error::{LpError, SolveError};
use crate::lp::Lp;
use crate::lu::LuCache;
use crate::status::LpStatus;

/// Why a candidate failed exact verification. A rejection is not fatal:
/// it means "this basis is not an exact optimum", and the driver retries
/// at a higher precision.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("variable {name} has an empty feasible range")]
    EmptyBounds { name: String },

    #[error("solution is infeasible for constraint {name}")]
    InfeasibleRow { name: String },

    #[error("logical of constraint {name} violates its bounds")]
    BoundViolation { name: String },

    #[error("variable {name} fails complementary slackness")]
    ComplementarySlackness { name: String },

    #[error("primal and dual objective values differ")]
    ObjectiveMismatch,

    #[error("bound of {name} is infinite but its ray dual is nonzero")]
    UnboundedRayComponent { name: String },

    #[error("dual ray objective is not strictly positive")]
    NonpositiveRayObjective,
}

/// Outcome of rebuilding and checking a basis in exact arithmetic.
#[derive(Debug)]
pub enum BasisVerdict {
    Optimal,
    /// Primal infeasible at zero tolerance; carries the dual ray built
    /// from the first bound-violating basic position.
    Infeasible(Vec<BigRational>),
    Unsolved,
}

fn col_label<R: LpScalar>(lp: &Lp<R>, col: usize) -> String {
    if let Some(i) = lp.structmap.iter().position(|&c| c == col) {
        return lp.colnames[i].clone();
    }
    if let Some(r) = lp.rowmap.iter().position(|&c| c == col) {
        return lp.rownames[r].clone();
    }
    format!("#{col}")
}

/// Verify that `(x, y, basis)` is an exact LP optimum.
///
/// The primal candidate covers structural then logical variables and is
/// projected onto the basis statuses before checking; the logical values
/// are recomputed from the exact row activity. On success the solution
/// cache is replaced with the verified vectors. All arithmetic is exact.
pub fn optimal_test(
    lp: &mut Lp<BigRational>,
    x: &mut [BigRational],
    y: &[BigRational],
    basis: &Basis,
) -> Result<Result<(), Rejection>, LpError> {
    let nstruct = lp.nstruct();
    let nrows = lp.nrows();
    if x.len() != nstruct + nrows {
        return Err(LpError::VectorLength {
            what: "primal candidate",
            expected: nstruct + nrows,
            actual: x.len(),
        });
    }
    if y.len() != nrows {
        return Err(LpError::VectorLength {
            what: "dual candidate",
            expected: nrows,
            actual: y.len(),
        });
    }
    lp.load_basis(basis)?;

    let zero = BigRational::zero();
    let minimize = lp.sense.sign() > 0;
    // `s·v > 0` and `s·v < 0` with s = +1 for minimize, -1 for maximize
    let sense_pos = |v: &BigRational| if minimize { *v > zero } else { *v < zero };
    let sense_neg = |v: &BigRational| if minimize { *v < zero } else { *v > zero };

    // Project primal values onto the basis statuses.
    for i in 0..nstruct {
        let col = lp.structmap[i];
        if lp.lower[col] > lp.upper[col] {
            return Ok(Err(Rejection::EmptyBounds {
                name: lp.colnames[i].clone(),
            }));
        }
        match basis.cstat[i] {
            ColStatus::Basic | ColStatus::Free => {
                if x[i] > lp.upper[col] {
                    x[i] = lp.upper[col].clone();
                } else if x[i] < lp.lower[col] {
                    x[i] = lp.lower[col].clone();
                }
            }
            ColStatus::Upper => x[i] = lp.upper[col].clone(),
            ColStatus::Lower => x[i] = lp.lower[col].clone(),
        }
    }
    for r in 0..nrows {
        let col = lp.rowmap[r];
        if lp.lower[col] > lp.upper[col] {
            return Ok(Err(Rejection::EmptyBounds {
                name: lp.rownames[r].clone(),
            }));
        }
        match basis.rstat[r] {
            RowStatus::Basic => {
                if x[nstruct + r] > lp.upper[col] {
                    x[nstruct + r] = lp.upper[col].clone();
                } else if x[nstruct + r] < lp.lower[col] {
                    x[nstruct + r] = lp.lower[col].clone();
                }
            }
            RowStatus::Upper => x[nstruct + r] = lp.upper[col].clone(),
            RowStatus::Lower => x[nstruct + r] = lp.lower[col].clone(),
        }
    }

    // Actual row activity of the projected structurals.
    let mut activity = vec![BigRational::zero(); nrows];
    for i in 0..nstruct {
        if !x[i].is_zero() {
            lp.mat.axpy_col_into(lp.structmap[i], &x[i], &mut activity);
        }
    }

    let mut p_obj = BigRational::zero();
    let mut d_obj = BigRational::zero();

    // Recompute the logicals row by row. A logical column has exactly one
    // nonzero; a basic logical adopts the computed value, a nonbasic one
    // must already imply it.
    for r in 0..nrows {
        d_obj = d_obj + lp.rhs[r].clone() * y[r].clone();
        let need = lp.rhs[r].clone() - activity[r].clone();
        let col = lp.rowmap[r];
        let (_, val) = lp.mat.col(col);
        debug_assert_eq!(val.len(), 1);
        let coef = val[0].clone();
        if basis.rstat[r] == RowStatus::Basic {
            x[nstruct + r] = need / coef;
        } else {
            let implied = x[nstruct + r].clone() * coef;
            if implied != need {
                debug!(row = %lp.rownames[r], "projected solution misses the row activity");
                return Ok(Err(Rejection::InfeasibleRow {
                    name: lp.rownames[r].clone(),
                }));
            }
        }
        if x[nstruct + r] < lp.lower[col] || x[nstruct + r] > lp.upper[col] {
            return Ok(Err(Rejection::BoundViolation {
                name: lp.rownames[r].clone(),
            }));
        }
    }

    // Reduced costs, bound duals, and complementary slackness for every
    // column. The dual weight lands on the lower bound when s·dz > 0 and
    // on the upper bound otherwise.
    let mut dz = vec![BigRational::zero(); lp.total_cols()];
    for idx in 0..nstruct + nrows {
        let (col, name) = if idx < nstruct {
            (lp.structmap[idx], &lp.colnames[idx])
        } else {
            (lp.rowmap[idx - nstruct], &lp.rownames[idx - nstruct])
        };
        p_obj = p_obj + lp.obj[col].clone() * x[idx].clone();
        dz[col] = lp.obj[col].clone() - lp.mat.col_dot(col, y);
        if sense_pos(&dz[col]) {
            d_obj = d_obj + dz[col].clone() * lp.lower[col].clone();
            let slack = (x[idx].clone() - lp.lower[col].clone()) * dz[col].clone();
            if !slack.is_zero() {
                debug!(var = %name, "lower-bound slack and dual are both nonzero");
                return Ok(Err(Rejection::ComplementarySlackness { name: name.clone() }));
            }
        } else {
            d_obj = d_obj + dz[col].clone() * lp.upper[col].clone();
            if sense_neg(&dz[col]) {
                let slack = (x[idx].clone() - lp.upper[col].clone()) * dz[col].clone();
                if !slack.is_zero() {
                    debug!(var = %name, "upper-bound slack and dual are both nonzero");
                    return Ok(Err(Rejection::ComplementarySlackness { name: name.clone() }));
                }
            }
        }
    }

    if p_obj != d_obj {
        debug!("primal and dual objective values differ");
        return Ok(Err(Rejection::ObjectiveMismatch));
    }

    let cache = SolutionCache {
        status: LpStatus::Optimal,
        val: p_obj,
        x: x[..nstruct].to_vec(),
        rc: (0..nstruct).map(|i| dz[lp.structmap[i]].clone()).collect(),
        slack: x[nstruct..].to_vec(),
        pi: y.to_vec(),
    };
    lp.set_solution(cache);
    Ok(Ok(()))
}

/// Verify that `y` is an exact dual ray proving primal infeasibility.
pub fn infeasible_test(
    lp: &mut Lp<BigRational>,
    y: &[BigRational],
) -> Result<Result<(), Rejection>, LpError> {
    let nrows = lp.nrows();
    if y.len() != nrows {
        return Err(LpError::VectorLength {
            what: "dual ray",
            expected: nrows,
            actual: y.len(),
        });
    }

    let mut d_obj = BigRational::zero();
    for r in 0..nrows {
        d_obj = d_obj + lp.rhs[r].clone() * y[r].clone();
    }

    // Split -Aᵀy into lower-bound duals dl >= 0 and upper-bound duals
    // du <= 0; an infinite bound admits no dual weight.
    let zero = BigRational::zero();
    for col in 0..lp.total_cols() {
        let z = zero.clone() - lp.mat.col_dot(col, y);
        let (dl, du) = if z > zero {
            (z, zero.clone())
        } else {
            (zero.clone(), z)
        };
        if lp.upper[col].is_unbounded_above() && !du.is_zero() {
            return Ok(Err(Rejection::UnboundedRayComponent {
                name: col_label(lp, col),
            }));
        }
        if lp.lower[col].is_unbounded_below() && !dl.is_zero() {
            return Ok(Err(Rejection::UnboundedRayComponent {
                name: col_label(lp, col),
            }));
        }
        if !dl.is_zero() {
            d_obj = d_obj + dl * lp.lower[col].clone();
        }
        if !du.is_zero() {
            d_obj = d_obj + du * lp.upper[col].clone();
        }
    }

    if d_obj <= zero {
        debug!("dual ray is feasible but its objective is not positive");
        return Ok(Err(Rejection::NonpositiveRayObjective));
    }
    lp.status = LpStatus::Infeasible;
    Ok(Ok(()))
}

/// Rebuild the exact basic solution for `basis` and classify it.
///
/// Clears any cached solution first, syncs the factorization cache (which
/// may replay the basis change as spike updates or refactor), recomputes
/// the basic values, row duals, and reduced costs exactly, and checks
/// primal and dual feasibility at zero tolerance. A singular basis
/// surfaces as an error.
pub fn basis_status(
    lp: &mut Lp<BigRational>,
    basis: &Basis,
    lu: &mut LuCache,
) -> Result<BasisVerdict, SolveError> {
    lp.load_basis(basis)?;
    lp.cache = None;
    lp.status = LpStatus::Modified;

    let nstruct = lp.nstruct();
    let nrows = lp.nrows();
    let total = lp.total_cols();

    #[derive(Clone, Copy, PartialEq)]
    enum Nb {
        Lower,
        Upper,
        Free,
    }

    let mut baz: Vec<usize> = Vec::with_capacity(nrows);
    let mut nb_kind: Vec<Option<Nb>> = vec![None; total];
    let mut value = vec![BigRational::zero(); total];
    for i in 0..nstruct {
        let col = lp.structmap[i];
        match basis.cstat[i] {
            ColStatus::Basic => baz.push(col),
            ColStatus::Lower => {
                nb_kind[col] = Some(Nb::Lower);
                value[col] = lp.lower[col].clone();
            }
            ColStatus::Upper => {
                nb_kind[col] = Some(Nb::Upper);
                value[col] = lp.upper[col].clone();
            }
            ColStatus::Free => nb_kind[col] = Some(Nb::Free),
        }
    }
    for r in 0..nrows {
        let col = lp.rowmap[r];
        match basis.rstat[r] {
            RowStatus::Basic => baz.push(col),
            RowStatus::Lower => {
                nb_kind[col] = Some(Nb::Lower);
                value[col] = lp.lower[col].clone();
            }
            RowStatus::Upper => {
                nb_kind[col] = Some(Nb::Upper);
                value[col] = lp.upper[col].clone();
            }
        }
    }
    baz.sort_unstable();
    lu.sync(&lp.mat, &mut baz)?;

    // Basic values from the bound-adjusted right-hand side.
    let mut b_eff = lp.rhs.clone();
    for col in 0..total {
        if nb_kind[col].is_some() && !value[col].is_zero() {
            let (ind, val) = lp.mat.col(col);
            for (i, a) in ind.iter().zip(val) {
                b_eff[*i] = b_eff[*i].clone() - a.clone() * value[col].clone();
            }
        }
    }
    let xbz = lu.ftran(&b_eff)?;

    // Row duals from the basic objective rows.
    let cb: Vec<BigRational> = baz.iter().map(|&c| lp.obj[c].clone()).collect();
    let pi = lu.btran(&cb)?;

    // Dual feasibility at zero tolerance.
    let zero = BigRational::zero();
    let minimize = lp.sense.sign() > 0;
    let mut dz = vec![BigRational::zero(); total];
    let mut dual_ok = true;
    for col in 0..total {
        let Some(kind) = nb_kind[col] else { continue };
        let rc = lp.obj[col].clone() - lp.mat.col_dot(col, &pi);
        let s_rc_pos = if minimize { rc > zero } else { rc < zero };
        let s_rc_neg = if minimize { rc < zero } else { rc > zero };
        let ok = match kind {
            Nb::Lower => !s_rc_neg,
            Nb::Upper => !s_rc_pos,
            Nb::Free => rc.is_zero(),
        };
        dz[col] = rc;
        if !ok {
            dual_ok = false;
        }
    }

    // Primal feasibility at zero tolerance.
    let mut violation: Option<(usize, bool)> = None;
    for (k, &col) in baz.iter().enumerate() {
        if xbz[k] < lp.lower[col] {
            violation = Some((k, true));
            break;
        }
        if xbz[k] > lp.upper[col] {
            violation = Some((k, false));
            break;
        }
    }

    if let Some((k, below)) = violation {
        // Dual ray from the violating basic position: the k-th row of the
        // basis inverse, signed by the violated side.
        let mut e = vec![BigRational::zero(); baz.len()];
        e[k] = BigRational::one();
        let w = lu.btran(&e)?;
        let ray: Vec<BigRational> = if below {
            w.into_iter().map(|v| zero.clone() - v).collect()
        } else {
            w
        };
        debug!(position = k, "basic value violates its bound, reporting infeasibility");
        return Ok(BasisVerdict::Infeasible(ray));
    }
    if !dual_ok {
        debug!("basis is primal feasible but not dual feasible");
        return Ok(BasisVerdict::Unsolved);
    }

    // Optimal: write the exact solution into the cache.
    for (k, &col) in baz.iter().enumerate() {
        value[col] = xbz[k].clone();
    }
    let mut val = BigRational::zero();
    for col in 0..total {
        if !lp.obj[col].is_zero() {
            val = val + lp.obj[col].clone() * value[col].clone();
        }
    }
    let cache = SolutionCache {
        status: LpStatus::Optimal,
        val,
        x: lp.structmap.iter().map(|&c| value[c].clone()).collect(),
        rc: lp.structmap.iter().map(|&c| dz[c].clone()).collect(),
        slack: lp.rowmap.iter().map(|&c| value[c].clone()).collect(),
        pi,
    };
    lp.set_solution(cache);
    Ok(BasisVerdict::Optimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{RowSense, Sense};

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::from_int_ratio(p, q as u64)
    }

    fn neg_inf() -> BigRational {
        BigRational::zero() - BigRational::infinite_bound()
    }

    /// min x,  x >= 1 (row),  0 <= x <= 2.
    fn trivial_lp() -> Lp<BigRational> {
        let mut lp = Lp::new("trivial", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), rat(2, 1), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(1, 1)],
            &[RowSense::Gte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        lp
    }

    fn trivial_optimal_basis() -> Basis {
        Basis {
            cstat: vec![ColStatus::Basic],
            rstat: vec![RowStatus::Upper],
        }
    }

    /// min 0,  x >= 1 (row),  x <= 0.
    fn infeasible_lp() -> Lp<BigRational> {
        let mut lp = Lp::new("empty", Sense::Minimize);
        lp.add_col(rat(0, 1), neg_inf(), rat(0, 1), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(1, 1)],
            &[RowSense::Gte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        lp
    }

    #[test]
    fn exact_optimum_is_accepted_and_cached() {
        let mut lp = trivial_lp();
        let basis = trivial_optimal_basis();
        let mut x = vec![rat(1, 1), rat(0, 1)];
        let y = vec![rat(1, 1)];
        optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap();

        let cache = lp.solution().unwrap();
        assert_eq!(cache.status, LpStatus::Optimal);
        assert_eq!(cache.val, rat(1, 1));
        assert_eq!(cache.x, vec![rat(1, 1)]);
        assert_eq!(cache.pi, vec![rat(1, 1)]);
        assert_eq!(cache.rc, vec![rat(0, 1)]);
        assert_eq!(lp.status(), LpStatus::Optimal);
    }

    #[test]
    fn certification_is_idempotent() {
        let mut lp = trivial_lp();
        let basis = trivial_optimal_basis();
        let mut x = vec![rat(1, 1), rat(0, 1)];
        let y = vec![rat(1, 1)];
        optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap();
        let first = lp.solution().unwrap().clone();
        optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap();
        let second = lp.solution().unwrap();
        assert_eq!(first.val, second.val);
        assert_eq!(first.x, second.x);
        assert_eq!(first.pi, second.pi);
    }

    #[test]
    fn float_rounding_residue_is_rejected() {
        let mut lp = trivial_lp();
        let basis = trivial_optimal_basis();
        // a double-precision artifact: x = 1 + 2^-52
        let eps = BigRational::from_int_ratio(1, 1u64 << 52);
        let mut x = vec![rat(1, 1) + eps, rat(0, 1)];
        let y = vec![rat(1, 1)];
        let rejection = optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap_err();
        assert!(matches!(rejection, Rejection::InfeasibleRow { .. }));
        assert!(lp.solution().is_none());
    }

    #[test]
    fn wrong_dual_fails_complementary_slackness() {
        let mut lp = trivial_lp();
        let basis = trivial_optimal_basis();
        let mut x = vec![rat(1, 1), rat(0, 1)];
        // y = 2 flips x's reduced cost negative, putting dual weight on
        // the upper bound while x sits strictly below it
        let y = vec![rat(2, 1)];
        let rejection = optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap_err();
        assert!(matches!(rejection, Rejection::ComplementarySlackness { .. }));
    }

    #[test]
    fn fixed_variable_projects_to_its_single_value() {
        let mut lp = Lp::new("fixed", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(3, 1), rat(3, 1), Some("x"));
        let basis = Basis {
            cstat: vec![ColStatus::Lower],
            rstat: vec![],
        };
        let mut x = vec![rat(17, 5)];
        let y = vec![];
        optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap();
        assert_eq!(x[0], rat(3, 1));
        assert_eq!(lp.solution().unwrap().val, rat(3, 1));
    }

    #[test]
    fn infeasibility_ray_is_accepted() {
        let mut lp = infeasible_lp();
        let y = vec![rat(1, 1)];
        infeasible_test(&mut lp, &y).unwrap().unwrap();
        assert_eq!(lp.status(), LpStatus::Infeasible);
    }

    #[test]
    fn ray_with_weight_on_an_infinite_bound_is_rejected() {
        let mut lp = infeasible_lp();
        // y = -1 puts lower-bound weight on x, whose lower bound is -inf
        let y = vec![rat(-1, 1)];
        let rejection = infeasible_test(&mut lp, &y).unwrap().unwrap_err();
        assert!(matches!(rejection, Rejection::UnboundedRayComponent { .. }));
    }

    #[test]
    fn zero_ray_objective_is_rejected() {
        let mut lp = infeasible_lp();
        let y = vec![rat(0, 1)];
        let rejection = infeasible_test(&mut lp, &y).unwrap().unwrap_err();
        assert!(matches!(rejection, Rejection::NonpositiveRayObjective));
    }

    #[test]
    fn infinite_upper_bound_without_dual_weight_is_fine() {
        // min 0,  x <= -1 (row),  0 <= x < inf: infeasible, and the ray
        // puts no weight on the infinite upper bound.
        let mut lp = Lp::new("upfree", Sense::Minimize);
        lp.add_col(rat(0, 1), rat(0, 1), BigRational::infinite_bound(), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(-1, 1)],
            &[RowSense::Lte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        let y = vec![rat(-1, 1)];
        infeasible_test(&mut lp, &y).unwrap().unwrap();
    }

    #[test]
    fn basis_status_rebuilds_the_exact_optimum() {
        let mut lp = trivial_lp();
        let basis = trivial_optimal_basis();
        let mut lu = LuCache::default();
        let verdict = basis_status(&mut lp, &basis, &mut lu).unwrap();
        assert!(matches!(verdict, BasisVerdict::Optimal));
        let cache = lp.solution().unwrap();
        assert_eq!(cache.val, rat(1, 1));
        assert_eq!(cache.x, vec![rat(1, 1)]);
        assert_eq!(cache.pi, vec![rat(1, 1)]);

        // and the rebuilt vectors certify on a fresh pass
        let mut x = [cache.x.clone(), cache.slack.clone()].concat();
        let y = cache.pi.clone();
        optimal_test(&mut lp, &mut x, &y, &basis).unwrap().unwrap();
    }

    #[test]
    fn basis_status_builds_a_working_ray_for_infeasible_problems() {
        let mut lp = infeasible_lp();
        let basis = Basis {
            cstat: vec![ColStatus::Upper],
            rstat: vec![RowStatus::Basic],
        };
        let mut lu = LuCache::default();
        let verdict = basis_status(&mut lp, &basis, &mut lu).unwrap();
        let BasisVerdict::Infeasible(ray) = verdict else {
            panic!("expected an infeasibility verdict");
        };
        infeasible_test(&mut lp, &ray).unwrap().unwrap();
        assert_eq!(lp.status(), LpStatus::Infeasible);
    }

    #[test]
    fn suboptimal_feasible_basis_is_unsolved() {
        // min x, 0 <= x <= 2, row x <= 3 slack basic; x parked at its
        // upper bound is feasible but not dual feasible.
        let mut lp = Lp::new("suboptimal", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), rat(2, 1), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(3, 1)],
            &[RowSense::Lte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        let basis = Basis {
            cstat: vec![ColStatus::Upper],
            rstat: vec![RowStatus::Basic],
        };
        let mut lu = LuCache::default();
        let verdict = basis_status(&mut lp, &basis, &mut lu).unwrap();
        assert!(matches!(verdict, BasisVerdict::Unsolved));
        assert!(lp.solution().is_none());
        assert_eq!(lp.status(), LpStatus::Modified);
    }
}
