use ratlp_num::{BigRational, LpScalar, Mpf, PrecisionGuard};
use tracing::{debug, info};

use crate::basis::Basis;
use crate::certify::{self, BasisVerdict};
use crate::error::{SolveError, SolveResult};
use crate::lp::Lp;
use crate::lu::LuCache;
use crate::simplex::{Algorithm, BoundedSimplex, SimplexSolver};
use crate::status::LpStatus;

/// Extended-precision rounds attempted after the double round.
pub const MAX_ESCALATIONS: u32 = 10;
/// Mantissa width of the first extended round; later rounds grow by 1.5x.
const FIRST_MPF_PRECISION: u64 = 128;

struct Carry {
    last_status: LpStatus,
    basis: Option<Basis>,
    ray: Option<Vec<BigRational>>,
}

enum RoundOutcome {
    Done(LpStatus),
    Continue,
}

/// Treat factorization failures as "try the next precision"; structural
/// problems stay fatal.
fn verdict_or_continue(
    result: SolveResult<BasisVerdict>,
    carry: &mut Carry,
) -> SolveResult<Option<BasisVerdict>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(SolveError::Lu(err)) => {
            debug!(%err, "exact basis verification failed");
            carry.last_status = LpStatus::Unsolved;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// One precision round: copy the rational problem into flavor `R`, run the
/// simplex there, lift whatever it produced back to rationals, and try to
/// certify it. The scratch copy is dropped when the round ends.
fn run_round<R: LpScalar>(
    p_mpq: &mut Lp<BigRational>,
    lu: &mut LuCache,
    warm: Option<&Basis>,
    algo: Algorithm,
    carry: &mut Carry,
) -> SolveResult<RoundOutcome> {
    let p_r: Lp<R> = p_mpq.copy_to::<R>(&format!("{}_problem", R::NAME))?;
    let mut sx = BoundedSimplex::new(&p_r);
    match warm {
        Some(b) => sx.load_basis(b)?,
        None => sx.clear_basis(),
    }
    sx.solve(algo)?;
    let status = sx.status();
    debug!(flavor = R::NAME, %status, iters = sx.itcnt(), "simplex round finished");
    carry.last_status = status;

    match status {
        LpStatus::Optimal => {
            let mut x_mpq: Vec<BigRational> =
                sx.x_array().iter().map(LpScalar::to_rational).collect();
            let y_mpq: Vec<BigRational> =
                sx.pi_array().iter().map(LpScalar::to_rational).collect();
            let basis = sx.basis();
            if certify::optimal_test(p_mpq, &mut x_mpq, &y_mpq, &basis)?.is_ok() {
                carry.basis = Some(basis);
                return Ok(RoundOutcome::Done(LpStatus::Optimal));
            }
            debug!("candidate rejected, rebuilding the exact basic solution");
            if let Some(verdict) = verdict_or_continue(
                certify::basis_status(p_mpq, &basis, lu),
                carry,
            )? {
                if matches!(verdict, BasisVerdict::Optimal) {
                    debug!("retesting the exact solution");
                    let lifted = p_mpq.solution().map(|cache| {
                        (
                            [cache.x.clone(), cache.slack.clone()].concat(),
                            cache.pi.clone(),
                        )
                    });
                    if let Some((mut x2, y2)) = lifted {
                        if certify::optimal_test(p_mpq, &mut x2, &y2, &basis)?.is_ok() {
                            carry.basis = Some(basis);
                            return Ok(RoundOutcome::Done(LpStatus::Optimal));
                        }
                    }
                    carry.last_status = LpStatus::Unsolved;
                }
            }
            carry.basis = Some(basis);
        }
        LpStatus::Infeasible => {
            let y_mpq: Vec<BigRational> =
                sx.infeas_array().iter().map(LpScalar::to_rational).collect();
            if !y_mpq.is_empty() && certify::infeasible_test(p_mpq, &y_mpq)?.is_ok() {
                carry.basis = Some(sx.basis());
                carry.ray = Some(y_mpq);
                return Ok(RoundOutcome::Done(LpStatus::Infeasible));
            }
            debug!("ray rejected, rebuilding the exact basic solution");
            let basis = sx.basis();
            if let Some(BasisVerdict::Infeasible(exact_ray)) = verdict_or_continue(
                certify::basis_status(p_mpq, &basis, lu),
                carry,
            )? {
                if certify::infeasible_test(p_mpq, &exact_ray)?.is_ok() {
                    carry.basis = Some(basis);
                    carry.ray = Some(exact_ray);
                    return Ok(RoundOutcome::Done(LpStatus::Infeasible));
                }
                carry.last_status = LpStatus::Unsolved;
            }
            carry.basis = Some(basis);
        }
        LpStatus::Unbounded => return Ok(RoundOutcome::Done(LpStatus::Unbounded)),
        LpStatus::ObjLimit => {
            info!("objective limit reached in floating point, ending now");
            return Ok(RoundOutcome::Done(LpStatus::ObjLimit));
        }
        _ => {
            debug!(%status, "retrying at the next precision");
        }
    }
    Ok(RoundOutcome::Continue)
}

/// Solve the rational LP exactly.
///
/// The problem is first solved in machine doubles; the candidate basis
/// and vectors are lifted to rationals and certified there. While
/// certification fails, the solve is re-run in extended binary floating
/// point at 128 bits, then at 1.5x the width per round, up to
/// [`MAX_ESCALATIONS`] rounds. A previous round's basis warm-starts the
/// next (with the dual simplex) only when that round believed it reached
/// optimality or infeasibility.
///
/// On OPTIMAL, `x` (structural then logical values) and `y` (row duals)
/// are written from the verified cache; on INFEASIBLE, `y` receives the
/// certified dual ray. `ebasis` is updated with the last basis seen and
/// serves as the warm start for the double round.
pub fn solve(
    lp: &mut Lp<BigRational>,
    x: Option<&mut Vec<BigRational>>,
    y: Option<&mut Vec<BigRational>>,
    ebasis: Option<&mut Basis>,
    algo: Algorithm,
) -> SolveResult<LpStatus> {
    let mut lu = lp.lu.take().unwrap_or_default();
    let mut carry = Carry {
        last_status: LpStatus::Unsolved,
        basis: None,
        ray: None,
    };

    info!(problem = lp.name(), "trying double precision");
    let warm0: Option<Basis> = ebasis.as_ref().map(|b| (**b).clone());
    let mut outcome = run_round::<f64>(lp, &mut lu, warm0.as_ref(), algo, &mut carry)?;

    let mut precision = FIRST_MPF_PRECISION;
    let mut remaining = MAX_ESCALATIONS;
    while matches!(outcome, RoundOutcome::Continue) {
        if remaining == 0 {
            break;
        }
        remaining -= 1;
        let _guard = PrecisionGuard::new(precision);
        info!(problem = lp.name(), bits = precision, "trying extended precision");
        let (warm, round_algo) = if matches!(
            carry.last_status,
            LpStatus::Optimal | LpStatus::Infeasible
        ) && carry.basis.is_some()
        {
            debug!("re-using previous basis");
            (carry.basis.clone(), Algorithm::Dual)
        } else {
            (None, Algorithm::Primal)
        };
        outcome = run_round::<Mpf>(lp, &mut lu, warm.as_ref(), round_algo, &mut carry)?;
        precision = (precision * 3).div_ceil(2);
    }

    let status = match outcome {
        RoundOutcome::Done(s) => s,
        RoundOutcome::Continue => LpStatus::Unsolved,
    };

    match status {
        LpStatus::Optimal => {
            if let Some(cache) = lp.solution() {
                if let Some(out) = x {
                    *out = [cache.x.clone(), cache.slack.clone()].concat();
                }
                if let Some(out) = y {
                    *out = cache.pi.clone();
                }
            }
        }
        LpStatus::Infeasible => {
            if let (Some(out), Some(ray)) = (y, carry.ray.as_ref()) {
                *out = ray.clone();
            }
        }
        _ => {
            // drop anything an intermediate verification pass cached
            lp.cache = None;
            lp.status = status;
        }
    }
    if let (Some(eb), Some(b)) = (ebasis, carry.basis) {
        *eb = b;
    }
    lp.lu = Some(lu);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{RowSense, Sense};

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::from_int_ratio(p, q as u64)
    }

    /// min x1 + x2, 2x1 + x2 >= 4/3, x1 + 2x2 >= 5/3, x >= 0; the optimal
    /// vertex (1/3, 2/3) is not binary-representable at any precision.
    fn thirds_lp() -> Lp<BigRational> {
        let mut lp = Lp::new("thirds", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), BigRational::infinite_bound(), Some("x1"));
        lp.add_col(rat(1, 1), rat(0, 1), BigRational::infinite_bound(), Some("x2"));
        lp.add_ranged_rows(
            &[2, 2],
            &[0, 2],
            &[0, 1, 0, 1],
            &[rat(2, 1), rat(1, 1), rat(1, 1), rat(2, 1)],
            &[rat(4, 3), rat(5, 3)],
            &[RowSense::Gte, RowSense::Gte],
            &[rat(0, 1), rat(0, 1)],
            None,
        )
        .unwrap();
        lp
    }

    #[test]
    fn extended_precision_round_certifies_exactly() {
        let mut lp = thirds_lp();
        let mut lu = LuCache::default();
        let mut carry = Carry {
            last_status: LpStatus::Unsolved,
            basis: None,
            ray: None,
        };
        let _guard = PrecisionGuard::new(128);
        let outcome =
            run_round::<Mpf>(&mut lp, &mut lu, None, Algorithm::Primal, &mut carry).unwrap();
        assert!(matches!(outcome, RoundOutcome::Done(LpStatus::Optimal)));
        let cache = lp.solution().unwrap();
        assert_eq!(cache.x, vec![rat(1, 3), rat(2, 3)]);
        assert_eq!(cache.val, rat(1, 1));
    }

    #[test]
    fn double_round_rejects_inexact_candidates_but_recovers() {
        let mut lp = thirds_lp();
        let mut lu = LuCache::default();
        let mut carry = Carry {
            last_status: LpStatus::Unsolved,
            basis: None,
            ray: None,
        };
        let outcome =
            run_round::<f64>(&mut lp, &mut lu, None, Algorithm::Primal, &mut carry).unwrap();
        // the double candidate cannot satisfy the exact row activity, but
        // the exact rebuild of its basis does
        assert!(matches!(outcome, RoundOutcome::Done(LpStatus::Optimal)));
        assert_eq!(lp.solution().unwrap().x, vec![rat(1, 3), rat(2, 3)]);
    }
}
