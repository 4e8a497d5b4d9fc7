use std::time::{Duration, Instant};

use num_traits::{One, Zero};
use ratlp_num::LpScalar;
use tracing::debug;

use crate::basis::{Basis, ColStatus, RowStatus};
use crate::error::LpError;
use crate::lp::Lp;
use crate::lu::{LuConfig, LuFactors, LuResult, factor};
use crate::simplex::{Algorithm, SimplexSolver};
use crate::status::LpStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VStat {
    Basic(usize),
    AtLower,
    AtUpper,
    Free,
}

/// Revised bounded-variable simplex over any numeric flavor.
///
/// Phase I drives the sum of bound violations of the basic variables to
/// zero, Phase II optimizes with Bland's rule, and the dual variant
/// re-optimizes from a warm basis. Basis systems are solved through the
/// shared LU factors, with spike updates per pivot and refactorization
/// when an update is refused.
pub struct BoundedSimplex<'a, R: LpScalar> {
    lp: &'a Lp<R>,
    vstat: Vec<VStat>,
    baz: Vec<usize>,
    factors: Option<LuFactors<R>>,
    lu_config: LuConfig,
    pending_basis: Option<Basis>,
    status: LpStatus,
    x: Vec<R>,
    pi: Vec<R>,
    ray: Vec<R>,
    iters: u64,
}

impl<'a, R: LpScalar> BoundedSimplex<'a, R> {
    pub fn new(lp: &'a Lp<R>) -> Self {
        Self {
            lp,
            vstat: Vec::new(),
            baz: Vec::new(),
            factors: None,
            lu_config: LuConfig::default(),
            pending_basis: lp.basis(),
            status: LpStatus::Unsolved,
            x: Vec::new(),
            pi: Vec::new(),
            ray: Vec::new(),
            iters: 0,
        }
    }

    fn install(&mut self, basis: &Basis) {
        let total = self.lp.total_cols();
        self.vstat = vec![VStat::AtLower; total];
        self.baz.clear();
        for (i, &col) in self.lp.structmap.iter().enumerate() {
            self.vstat[col] = match basis.cstat[i] {
                ColStatus::Basic => {
                    self.baz.push(col);
                    VStat::Basic(self.baz.len() - 1)
                }
                ColStatus::Lower => VStat::AtLower,
                ColStatus::Upper => VStat::AtUpper,
                ColStatus::Free => VStat::Free,
            };
        }
        for (r, &col) in self.lp.rowmap.iter().enumerate() {
            self.vstat[col] = match basis.rstat[r] {
                RowStatus::Basic => {
                    self.baz.push(col);
                    VStat::Basic(self.baz.len() - 1)
                }
                RowStatus::Lower => VStat::AtLower,
                RowStatus::Upper => VStat::AtUpper,
            };
        }
    }

    fn factorize(&mut self) -> LuResult<()> {
        self.factors = Some(factor(&self.lp.mat, &self.baz)?);
        Ok(())
    }

    /// Nonbasic values by status, basic values through the factors.
    fn compute_x(&mut self) -> LuResult<()> {
        let lp = self.lp;
        let total = lp.total_cols();
        let mut x = vec![R::zero(); total];
        for col in 0..total {
            match self.vstat[col] {
                VStat::AtLower => x[col] = lp.lower[col].clone(),
                VStat::AtUpper => x[col] = lp.upper[col].clone(),
                VStat::Free | VStat::Basic(_) => {}
            }
        }
        let mut b_eff = lp.rhs.clone();
        for col in 0..total {
            if !matches!(self.vstat[col], VStat::Basic(_)) && !x[col].is_zero() {
                let (ind, val) = lp.mat.col(col);
                for (i, a) in ind.iter().zip(val) {
                    b_eff[*i] = b_eff[*i].clone() - a.clone() * x[col].clone();
                }
            }
        }
        let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
        let xbz = factors.ftran(&b_eff)?;
        for (k, &col) in self.baz.iter().enumerate() {
            x[col] = xbz[k].clone();
        }
        self.x = x;
        Ok(())
    }

    fn dense_col(&self, col: usize) -> Vec<R> {
        let n = self.baz.len();
        let mut a = vec![R::zero(); n];
        let (ind, val) = self.lp.mat.col(col);
        for (i, v) in ind.iter().zip(val) {
            a[*i] = v.clone();
        }
        a
    }

    /// Swap `entering` into basis position `pos`; the caller has already
    /// updated the leaving variable's status. Falls back to a fresh
    /// factorization when the spike update is refused.
    fn replace_basic(&mut self, pos: usize, entering: usize, direction: Vec<R>) -> LuResult<()> {
        self.baz[pos] = entering;
        self.vstat[entering] = VStat::Basic(pos);
        if let Some(f) = self.factors.as_mut() {
            if f.update(direction, pos, &self.lu_config).is_ok() {
                return Ok(());
            }
        }
        self.factorize()
    }

    fn deadline(&self) -> Option<Duration> {
        let cap = &self.lp.params.simplex_max_time;
        if cap.is_unbounded_above() {
            None
        } else {
            Some(Duration::from_secs_f64(cap.magnitude()))
        }
    }

    /// True when a resource limit fired; `self.status` is already set.
    fn limits_hit(&mut self, t0: Instant, deadline: Option<Duration>) -> bool {
        if self.iters >= self.lp.params.simplex_max_iterations as u64 {
            self.status = LpStatus::IterLimit;
            return true;
        }
        if let Some(d) = deadline {
            if t0.elapsed() > d {
                self.status = LpStatus::TimeLimit;
                return true;
            }
        }
        false
    }

    fn objective_value(&self) -> R {
        let mut val = R::zero();
        for col in 0..self.lp.total_cols() {
            if !self.lp.obj[col].is_zero() && !self.x[col].is_zero() {
                val = val + self.lp.obj[col].clone() * self.x[col].clone();
            }
        }
        val
    }

    /// Objective cutoff: the lower limit cuts off minimization, the upper
    /// limit cuts off maximization.
    fn objective_limit_hit(&mut self) -> bool {
        let val = self.objective_value();
        let minimize = self.lp.sense.sign() > 0;
        if minimize {
            let llim = &self.lp.params.obj_llim;
            if !llim.is_unbounded_below() && val <= llim.clone() {
                self.status = LpStatus::ObjLimit;
                return true;
            }
        } else {
            let ulim = &self.lp.params.obj_ulim;
            if !ulim.is_unbounded_above() && val >= ulim.clone() {
                self.status = LpStatus::ObjLimit;
                return true;
            }
        }
        false
    }

    /// Internal (sense-normalized) objective coefficient of a column.
    fn c_int(&self, col: usize) -> R {
        if self.lp.sense.sign() > 0 {
            self.lp.obj[col].clone()
        } else {
            R::zero() - self.lp.obj[col].clone()
        }
    }

    /// Dual ray from the basic position `pos` whose value violates a
    /// bound: the signed `pos`-th row of the basis inverse.
    fn build_ray(&mut self, pos: usize, below: bool) -> LuResult<()> {
        let n = self.baz.len();
        let mut e = vec![R::zero(); n];
        e[pos] = R::one();
        let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
        let w = factors.btran(&e)?;
        self.ray = if below {
            w.into_iter().map(|v| R::zero() - v).collect()
        } else {
            w
        };
        Ok(())
    }

    /// First basic variable outside its bounds, with the violated side.
    fn first_violation(&self) -> Option<(usize, bool)> {
        for (k, &col) in self.baz.iter().enumerate() {
            if self.x[col] < self.lp.lower[col] {
                return Some((k, true));
            }
            if self.x[col] > self.lp.upper[col] {
                return Some((k, false));
            }
        }
        None
    }

    /// Ratio test along the direction of an entering variable moving by
    /// `sigma`. Returns the blocking basic position and side, or None when
    /// the entering variable's own opposite bound blocks first, or
    /// Unbounded when nothing blocks.
    fn ratio_test(
        &self,
        entering: usize,
        sigma: i64,
        d: &[R],
        phase_one: bool,
    ) -> RatioOutcome {
        let lp = self.lp;
        // entering variable's own travel to its opposite bound
        let own_limit = {
            let lo = &lp.lower[entering];
            let hi = &lp.upper[entering];
            if lo.is_unbounded_below() || hi.is_unbounded_above() {
                None
            } else {
                Some(hi.clone() - lo.clone())
            }
        };

        let mut best: Option<(R, usize, bool)> = None;
        for (k, &col) in self.baz.iter().enumerate() {
            if d[k].is_zero() {
                continue;
            }
            // rate at which the basic value falls as the entering moves
            let rate = if sigma > 0 {
                d[k].clone()
            } else {
                R::zero() - d[k].clone()
            };
            let xb = &self.x[col];
            let lo = &lp.lower[col];
            let hi = &lp.upper[col];
            let zero = R::zero();

            let candidate: Option<(R, bool)> = if phase_one && *xb < *lo {
                // infeasible below: block only when it would reach its bound
                if rate < zero {
                    Some(((lo.clone() - xb.clone()) / (zero.clone() - rate), true))
                } else {
                    None
                }
            } else if phase_one && *xb > *hi {
                if rate > zero {
                    Some(((xb.clone() - hi.clone()) / rate, false))
                } else {
                    None
                }
            } else if rate > zero {
                if lo.is_unbounded_below() {
                    None
                } else {
                    Some(((xb.clone() - lo.clone()) / rate, true))
                }
            } else if hi.is_unbounded_above() {
                None
            } else {
                Some(((hi.clone() - xb.clone()) / (zero - rate), false))
            };

            if let Some((t, side)) = candidate {
                let better = match &best {
                    None => true,
                    Some((bt, bk, _)) => t < *bt || (t == *bt && col < self.baz[*bk]),
                };
                if better {
                    best = Some((t, k, side));
                }
            }
        }

        match (own_limit, best) {
            (Some(own), Some((t, k, side))) => {
                if own <= t {
                    RatioOutcome::BoundFlip
                } else {
                    RatioOutcome::Block { pos: k, below: side }
                }
            }
            (Some(_), None) => RatioOutcome::BoundFlip,
            (None, Some((_, k, side))) => RatioOutcome::Block { pos: k, below: side },
            (None, None) => RatioOutcome::Unbounded,
        }
    }

    fn primal(&mut self, t0: Instant, deadline: Option<Duration>) -> LuResult<()> {
        let lp = self.lp;
        let total = lp.total_cols();
        let zero = R::zero();

        // Phase I: drive the bound violations of the basic variables to zero.
        loop {
            if self.limits_hit(t0, deadline) {
                return Ok(());
            }
            self.compute_x()?;
            if self.first_violation().is_none() {
                break;
            }

            // gradient of the total violation, folded through the basis
            let n = self.baz.len();
            let mut gamma = vec![R::zero(); n];
            for (k, &col) in self.baz.iter().enumerate() {
                if self.x[col] < lp.lower[col] {
                    gamma[k] = R::one();
                } else if self.x[col] > lp.upper[col] {
                    gamma[k] = zero.clone() - R::one();
                }
            }
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let h = factors.btran(&gamma)?;

            // entering candidate by Bland's rule
            let mut entering: Option<(usize, i64)> = None;
            for col in 0..total {
                if matches!(self.vstat[col], VStat::Basic(_)) {
                    continue;
                }
                let g = lp.mat.col_dot(col, &h);
                let sigma = match self.vstat[col] {
                    VStat::AtLower if g < zero => 1,
                    VStat::AtUpper if g > zero => -1,
                    VStat::Free if g < zero => 1,
                    VStat::Free if g > zero => -1,
                    _ => continue,
                };
                entering = Some((col, sigma));
                break;
            }
            let Some((entering, sigma)) = entering else {
                // no improving direction: primal infeasible
                let (pos, below) = match self.first_violation() {
                    Some(v) => v,
                    None => break,
                };
                self.build_ray(pos, below)?;
                self.status = LpStatus::Infeasible;
                debug!(iters = self.iters, "phase one stalled, problem is infeasible");
                return Ok(());
            };

            self.iters += 1;
            let a_col = self.dense_col(entering);
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let d = factors.ftran(&a_col)?;
            match self.ratio_test(entering, sigma, &d, true) {
                RatioOutcome::BoundFlip => {
                    self.vstat[entering] = match self.vstat[entering] {
                        VStat::AtLower => VStat::AtUpper,
                        VStat::AtUpper => VStat::AtLower,
                        other => other,
                    };
                }
                RatioOutcome::Block { pos, below } => {
                    let leaving = self.baz[pos];
                    self.vstat[leaving] = if below { VStat::AtLower } else { VStat::AtUpper };
                    self.replace_basic(pos, entering, d)?;
                }
                RatioOutcome::Unbounded => {
                    // the violation sum is bounded below, so an unbounded
                    // improving direction means numeric trouble
                    self.status = LpStatus::Unsolved;
                    return Ok(());
                }
            }
        }

        // Phase II: optimize the (sense-normalized) objective.
        loop {
            if self.limits_hit(t0, deadline) {
                return Ok(());
            }
            self.compute_x()?;
            if self.objective_limit_hit() {
                return Ok(());
            }

            let cb: Vec<R> = self.baz.iter().map(|&c| self.c_int(c)).collect();
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let pi_int = factors.btran(&cb)?;

            let mut entering: Option<(usize, i64)> = None;
            for col in 0..total {
                if matches!(self.vstat[col], VStat::Basic(_)) {
                    continue;
                }
                let rc = self.c_int(col) - lp.mat.col_dot(col, &pi_int);
                let sigma = match self.vstat[col] {
                    VStat::AtLower if rc < zero => 1,
                    VStat::AtUpper if rc > zero => -1,
                    VStat::Free if rc < zero => 1,
                    VStat::Free if rc > zero => -1,
                    _ => continue,
                };
                entering = Some((col, sigma));
                break;
            }
            let Some((entering, sigma)) = entering else {
                self.finish_optimal(&pi_int);
                return Ok(());
            };

            self.iters += 1;
            let a_col = self.dense_col(entering);
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let d = factors.ftran(&a_col)?;
            match self.ratio_test(entering, sigma, &d, false) {
                RatioOutcome::BoundFlip => {
                    self.vstat[entering] = match self.vstat[entering] {
                        VStat::AtLower => VStat::AtUpper,
                        VStat::AtUpper => VStat::AtLower,
                        other => other,
                    };
                }
                RatioOutcome::Block { pos, below } => {
                    let leaving = self.baz[pos];
                    self.vstat[leaving] = if below { VStat::AtLower } else { VStat::AtUpper };
                    self.replace_basic(pos, entering, d)?;
                }
                RatioOutcome::Unbounded => {
                    self.status = LpStatus::Unbounded;
                    debug!(iters = self.iters, "unbounded improving direction");
                    return Ok(());
                }
            }
        }
    }

    fn dual(&mut self, t0: Instant, deadline: Option<Duration>) -> LuResult<()> {
        let lp = self.lp;
        let total = lp.total_cols();
        let zero = R::zero();

        // Restore dual feasibility by bound-flipping where possible; fall
        // back to the primal algorithm when a wrong-signed nonbasic has no
        // finite opposite bound.
        {
            let cb: Vec<R> = self.baz.iter().map(|&c| self.c_int(c)).collect();
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let pi_int = factors.btran(&cb)?;
            for col in 0..total {
                if matches!(self.vstat[col], VStat::Basic(_)) {
                    continue;
                }
                let rc = self.c_int(col) - lp.mat.col_dot(col, &pi_int);
                match self.vstat[col] {
                    VStat::AtLower if rc < zero => {
                        if lp.upper[col].is_unbounded_above() {
                            debug!("warm basis is not dual feasible, running primal instead");
                            return self.primal(t0, deadline);
                        }
                        self.vstat[col] = VStat::AtUpper;
                    }
                    VStat::AtUpper if rc > zero => {
                        if lp.lower[col].is_unbounded_below() {
                            debug!("warm basis is not dual feasible, running primal instead");
                            return self.primal(t0, deadline);
                        }
                        self.vstat[col] = VStat::AtLower;
                    }
                    VStat::Free if !rc.is_zero() => {
                        debug!("warm basis is not dual feasible, running primal instead");
                        return self.primal(t0, deadline);
                    }
                    _ => {}
                }
            }
        }

        loop {
            if self.limits_hit(t0, deadline) {
                return Ok(());
            }
            self.compute_x()?;

            let Some((pos, below)) = self.first_violation() else {
                let cb: Vec<R> = self.baz.iter().map(|&c| self.c_int(c)).collect();
                let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
                let pi_int = factors.btran(&cb)?;
                self.finish_optimal(&pi_int);
                return Ok(());
            };
            if self.objective_limit_hit() {
                return Ok(());
            }

            // pivot row of the leaving variable
            let n = self.baz.len();
            let mut e = vec![R::zero(); n];
            e[pos] = R::one();
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let h = factors.btran(&e)?;
            let pi_int = {
                let cb: Vec<R> = self.baz.iter().map(|&c| self.c_int(c)).collect();
                factors.btran(&cb)?
            };

            // dual ratio test: smallest |rc/alpha| over the sign-eligible
            // nonbasic columns
            let mut best: Option<(R, usize)> = None;
            for col in 0..total {
                if matches!(self.vstat[col], VStat::Basic(_)) {
                    continue;
                }
                let alpha = lp.mat.col_dot(col, &h);
                if alpha.is_zero() {
                    continue;
                }
                let eligible = match self.vstat[col] {
                    VStat::AtLower => {
                        if below { alpha < zero } else { alpha > zero }
                    }
                    VStat::AtUpper => {
                        if below { alpha > zero } else { alpha < zero }
                    }
                    VStat::Free => true,
                    VStat::Basic(_) => false,
                };
                if !eligible {
                    continue;
                }
                let rc = self.c_int(col) - lp.mat.col_dot(col, &pi_int);
                let ratio = {
                    let q = rc / alpha;
                    if q < zero { zero.clone() - q } else { q }
                };
                let better = match &best {
                    None => true,
                    Some((bq, _)) => ratio < *bq,
                };
                if better {
                    best = Some((ratio, col));
                }
            }

            let Some((_, entering)) = best else {
                // dual unbounded: primal infeasible, ray from the leaving row
                self.ray = if below {
                    h.into_iter().map(|v| zero.clone() - v).collect()
                } else {
                    h
                };
                self.status = LpStatus::Infeasible;
                debug!(iters = self.iters, "dual step has no entering column, infeasible");
                return Ok(());
            };

            self.iters += 1;
            let leaving = self.baz[pos];
            self.vstat[leaving] = if below { VStat::AtLower } else { VStat::AtUpper };
            let a_col = self.dense_col(entering);
            let factors = self.factors.as_ref().ok_or(crate::lu::LuError::NotFactored)?;
            let d = factors.ftran(&a_col)?;
            self.replace_basic(pos, entering, d)?;
        }
    }

    /// Record the optimum: primal values are current, duals flip back to
    /// the original objective sense.
    fn finish_optimal(&mut self, pi_int: &[R]) {
        self.pi = if self.lp.sense.sign() > 0 {
            pi_int.to_vec()
        } else {
            pi_int.iter().map(|v| R::zero() - v.clone()).collect()
        };
        self.status = LpStatus::Optimal;
        debug!(iters = self.iters, "simplex reached an optimal basis");
    }
}

enum RatioOutcome {
    /// The entering variable reaches its opposite bound first.
    BoundFlip,
    /// A basic variable blocks at a bound.
    Block { pos: usize, below: bool },
    Unbounded,
}

impl<'a, R: LpScalar> SimplexSolver<R> for BoundedSimplex<'a, R> {
    fn load_basis(&mut self, basis: &Basis) -> Result<(), LpError> {
        basis.check(self.lp.nstruct(), self.lp.nrows())?;
        self.pending_basis = Some(basis.clone());
        Ok(())
    }

    fn clear_basis(&mut self) {
        self.pending_basis = None;
    }

    fn solve(&mut self, algo: Algorithm) -> Result<(), LpError> {
        let t0 = Instant::now();
        self.iters = 0;
        self.status = LpStatus::Unsolved;
        self.ray.clear();
        self.pi = vec![R::zero(); self.lp.nrows()];

        let start = self
            .pending_basis
            .clone()
            .unwrap_or_else(|| self.lp.default_slack_basis());
        self.install(&start);
        if self.factorize().is_err() {
            debug!("starting basis is singular, restarting from the logical basis");
            let fallback = self.lp.default_slack_basis();
            self.install(&fallback);
            if self.factorize().is_err() {
                self.status = LpStatus::Unsolved;
                return Ok(());
            }
        }

        let deadline = self.deadline();
        let run = match algo {
            Algorithm::Primal => self.primal(t0, deadline),
            Algorithm::Dual => self.dual(t0, deadline),
        };
        if run.is_err() {
            self.status = LpStatus::Unsolved;
        }
        Ok(())
    }

    fn status(&self) -> LpStatus {
        self.status
    }

    fn x_array(&self) -> Vec<R> {
        let mut out = Vec::with_capacity(self.lp.nstruct() + self.lp.nrows());
        for &col in self.lp.structmap.iter().chain(self.lp.rowmap.iter()) {
            out.push(self.x.get(col).cloned().unwrap_or_else(R::zero));
        }
        out
    }

    fn pi_array(&self) -> Vec<R> {
        self.pi.clone()
    }

    fn infeas_array(&self) -> Vec<R> {
        self.ray.clone()
    }

    fn basis(&self) -> Basis {
        let cstat = self
            .lp
            .structmap
            .iter()
            .map(|&col| match self.vstat[col] {
                VStat::Basic(_) => ColStatus::Basic,
                VStat::AtLower => ColStatus::Lower,
                VStat::AtUpper => ColStatus::Upper,
                VStat::Free => ColStatus::Free,
            })
            .collect();
        let rstat = self
            .lp
            .rowmap
            .iter()
            .map(|&col| match self.vstat[col] {
                VStat::Basic(_) => RowStatus::Basic,
                VStat::AtUpper => RowStatus::Upper,
                _ => RowStatus::Lower,
            })
            .collect();
        Basis { cstat, rstat }
    }

    fn itcnt(&self) -> u64 {
        self.iters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{RowSense, Sense};
    use ratlp_num::BigRational;
    use rstest::rstest;

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::from_int_ratio(p, q as u64)
    }

    fn neg_inf() -> BigRational {
        BigRational::zero() - BigRational::infinite_bound()
    }

    fn solve_primal(lp: &Lp<BigRational>) -> BoundedSimplex<'_, BigRational> {
        let mut sx = BoundedSimplex::new(lp);
        sx.solve(Algorithm::Primal).unwrap();
        sx
    }

    #[test]
    fn trivial_bound_problem() {
        // min x,  x >= 1 (row),  0 <= x <= 2
        let mut lp = Lp::new("t", Sense::Minimize);
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
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::Optimal);
        assert_eq!(sx.x_array(), vec![rat(1, 1), rat(0, 1)]);
        assert_eq!(sx.pi_array(), vec![rat(1, 1)]);
        assert_eq!(sx.basis().basic_count(), 1);
    }

    #[test]
    fn two_by_two_interior_vertex() {
        // min x1 + x2,  2x1 + x2 >= 4/3,  x1 + 2x2 >= 5/3,  x >= 0
        // optimum at (1/3, 2/3) with value 1
        let mut lp = Lp::new("v", Sense::Minimize);
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
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::Optimal);
        let x = sx.x_array();
        assert_eq!(&x[..2], &[rat(1, 3), rat(2, 3)]);
    }

    #[test]
    fn infeasible_problem_yields_a_ray() {
        // x >= 1 (row) with x <= 0
        let mut lp = Lp::new("inf", Sense::Minimize);
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
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::Infeasible);
        let ray = sx.infeas_array();
        assert_eq!(ray.len(), 1);
        assert!(ray[0] > BigRational::zero());
    }

    #[test]
    fn unbounded_problem_is_detected() {
        // max x, x >= 0, no rows binding it above
        let mut lp = Lp::new("unb", Sense::Maximize);
        lp.add_col(rat(1, 1), rat(0, 1), BigRational::infinite_bound(), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(0, 1)],
            &[RowSense::Gte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::Unbounded);
    }

    #[test]
    fn maximization_flips_duals_back() {
        // max x, x <= 5 (row), x >= 0: x* = 5, y* = 1
        let mut lp = Lp::new("mx", Sense::Maximize);
        lp.add_col(rat(1, 1), rat(0, 1), BigRational::infinite_bound(), Some("x"));
        lp.add_ranged_rows(
            &[1],
            &[0],
            &[0],
            &[rat(1, 1)],
            &[rat(5, 1)],
            &[RowSense::Lte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::Optimal);
        assert_eq!(sx.x_array()[0], rat(5, 1));
        assert_eq!(sx.pi_array(), vec![rat(1, 1)]);
    }

    #[test]
    fn iteration_limit_reports_iter_limit() {
        let mut lp = Lp::new("cap", Sense::Minimize);
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
        lp.params.simplex_max_iterations = 0;
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::IterLimit);
    }

    #[rstest]
    #[case(Algorithm::Primal)]
    #[case(Algorithm::Dual)]
    fn warm_start_from_the_optimal_basis_takes_no_pivots(#[case] algo: Algorithm) {
        let mut lp = Lp::new("warm", Sense::Minimize);
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
        let first = solve_primal(&lp);
        let optimal = first.basis();

        let mut sx = BoundedSimplex::new(&lp);
        sx.load_basis(&optimal).unwrap();
        sx.solve(algo).unwrap();
        assert_eq!(sx.status(), LpStatus::Optimal);
        assert_eq!(sx.itcnt(), 0);
        assert_eq!(sx.x_array()[0], rat(1, 1));
    }

    #[test]
    fn objective_limit_stops_early() {
        // min x with obj_llim = 10 while the optimum is 1: cutoff fires
        let mut lp = Lp::new("cut", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), rat(20, 1), Some("x"));
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
        lp.params.obj_llim = rat(10, 1);
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::ObjLimit);
    }

    #[test]
    fn zero_row_lp_solves_degenerately() {
        let mut lp = Lp::new("norows", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), rat(2, 1), Some("x"));
        let sx = solve_primal(&lp);
        assert_eq!(sx.status(), LpStatus::Optimal);
        assert_eq!(sx.x_array(), vec![rat(0, 1)]);
        assert!(sx.pi_array().is_empty());
    }
}
