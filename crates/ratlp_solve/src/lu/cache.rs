use std::collections::HashMap;

use num_traits::Zero;
use ratlp_num::{BigRational, LpScalar, Mpf, PrecisionGuard};
use tracing::debug;

use crate::sparse::CscMatrix;

use super::{LuConfig, LuError, LuFactors, LuResult, factor};

/// Counters for factorization work, kept on the cache itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuCacheMetrics {
    /// Full factorizations performed (initial loads included).
    pub factor_count: usize,
    /// Spike updates committed.
    pub update_count: usize,
    /// Times the update path was abandoned for a refactorization.
    pub refactor_fallbacks: usize,
}

/// Cached exact factorization of the current basis.
///
/// `sync` brings the cache to a new basis: when few enough columns
/// changed, the differences are replayed as spike updates against the
/// cached factors; otherwise, or when an update is refused, the basis is
/// refactored from scratch. A singular basis leaves the cache unfactored
/// and surfaces the error.
#[derive(Debug)]
pub struct LuCache {
    factors: Option<LuFactors<BigRational>>,
    baz: Vec<usize>,
    config: LuConfig,
    pub metrics: LuCacheMetrics,
}

impl Default for LuCache {
    fn default() -> Self {
        Self::new(LuConfig::default())
    }
}

impl LuCache {
    pub fn new(mut config: LuConfig) -> Self {
        config.validate();
        Self {
            factors: None,
            baz: Vec::new(),
            config,
            metrics: LuCacheMetrics::default(),
        }
    }

    /// Basic columns of the cached factorization, in factor order.
    pub fn baz(&self) -> &[usize] {
        &self.baz
    }

    pub fn is_factored(&self) -> bool {
        self.factors.is_some()
    }

    pub fn ftran(&self, b: &[BigRational]) -> LuResult<Vec<BigRational>> {
        self.factors.as_ref().ok_or(LuError::NotFactored)?.ftran(b)
    }

    pub fn btran(&self, c: &[BigRational]) -> LuResult<Vec<BigRational>> {
        self.factors.as_ref().ok_or(LuError::NotFactored)?.btran(c)
    }

    /// Bring the cache in sync with the basis listed in `new_baz`.
    ///
    /// `new_baz` is reordered in place: shared columns are aligned to
    /// their cached positions first (only the set of basic columns is
    /// meaningful), and the update loop may further swap entries to land
    /// each replacement on the position with the largest direction entry.
    /// On return the cache's factors match `new_baz` exactly.
    pub fn sync(
        &mut self,
        mat: &CscMatrix<BigRational>,
        new_baz: &mut Vec<usize>,
    ) -> LuResult<()> {
        let n = new_baz.len();
        let mut factors = match self.factors.take() {
            Some(f) if f.dim == n => f,
            _ => return self.refactor(mat, new_baz),
        };

        self.align(new_baz);
        let mismatches = (0..n).filter(|&i| self.baz[i] != new_baz[i]).count();
        if mismatches == 0 {
            self.factors = Some(factors);
            return Ok(());
        }
        debug!(changed = mismatches, nrows = n, "basis differs from cached factorization");
        if n == 0 || mismatches as f64 / n as f64 > self.config.refactor_fraction {
            self.metrics.refactor_fallbacks += 1;
            debug!("too many changed columns, refactoring");
            return self.refactor(mat, new_baz);
        }

        loop {
            let Some(p) = (0..n).find(|&i| self.baz[i] != new_baz[i]) else {
                break;
            };
            let entering = new_baz[p];

            let mut a_s = vec![BigRational::zero(); n];
            let (ind, val) = mat.col(entering);
            for (i, v) in ind.iter().zip(val) {
                a_s[*i] = v.clone();
            }

            // Exact spike through the current factors.
            let spike = match factors.ftran(&a_s) {
                Ok(s) => s,
                Err(err) => {
                    debug!(%err, "exact spike solve failed, refactoring");
                    self.metrics.refactor_fallbacks += 1;
                    return self.refactor(mat, new_baz);
                }
            };

            // Direction at reduced precision: convert the exact factors to
            // an extended-float copy, solve there, lift back. The exact
            // factors stay authoritative; this copy only ranks pivots.
            let direction: Vec<BigRational> = {
                let _guard = PrecisionGuard::new(self.config.direction_prec);
                let float_factors = factors.convert::<Mpf>();
                let a_float: Vec<Mpf> = a_s.iter().map(Mpf::from_rational).collect();
                match float_factors.ftran(&a_float) {
                    Ok(d) => d.iter().map(Mpf::to_rational).collect(),
                    Err(err) => {
                        debug!(%err, "float direction solve failed, refactoring");
                        self.metrics.refactor_fallbacks += 1;
                        return self.refactor(mat, new_baz);
                    }
                }
            };

            // Land the update on the pending position with the largest
            // direction entry.
            let mut best: Option<(usize, f64)> = None;
            for q in 0..n {
                if self.baz[q] != new_baz[q] && !direction[q].is_zero() {
                    let m = direction[q].magnitude();
                    if best.is_none_or(|(_, bm)| m > bm) {
                        best = Some((q, m));
                    }
                }
            }
            let Some((q, _)) = best else {
                debug!("no usable pivot among pending positions, refactoring");
                self.metrics.refactor_fallbacks += 1;
                return self.refactor(mat, new_baz);
            };
            if q != p {
                new_baz.swap(p, q);
            }

            match factors.update(spike, q, &self.config) {
                Ok(()) => {
                    self.metrics.update_count += 1;
                    self.baz[q] = entering;
                }
                Err(err) => {
                    debug!(%err, pos = q, "spike update refused, refactoring");
                    self.metrics.refactor_fallbacks += 1;
                    return self.refactor(mat, new_baz);
                }
            }
        }

        self.factors = Some(factors);
        Ok(())
    }

    /// Factor `new_baz` from scratch and install it. On a singular basis
    /// the cache is left unfactored.
    fn refactor(&mut self, mat: &CscMatrix<BigRational>, new_baz: &[usize]) -> LuResult<()> {
        self.factors = None;
        let f = factor(mat, new_baz)?;
        self.metrics.factor_count += 1;
        self.factors = Some(f);
        self.baz = new_baz.to_vec();
        Ok(())
    }

    /// Permute `new_baz` so columns shared with the cached basis keep
    /// their cached positions; genuinely new columns fill the leftover
    /// slots in order.
    fn align(&self, new_baz: &mut Vec<usize>) {
        let pos: HashMap<usize, usize> =
            self.baz.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let mut placed: Vec<Option<usize>> = vec![None; new_baz.len()];
        let mut leftovers = Vec::new();
        for &col in new_baz.iter() {
            match pos.get(&col) {
                Some(&p) if placed[p].is_none() => placed[p] = Some(col),
                _ => leftovers.push(col),
            }
        }
        let mut it = leftovers.into_iter();
        for slot in placed.iter_mut() {
            if slot.is_none() {
                *slot = it.next();
            }
        }
        *new_baz = placed.into_iter().flatten().collect();
    }
}
