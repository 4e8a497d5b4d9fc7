mod cache;
mod error;
mod factor;
mod solve;
mod update;

pub use cache::{LuCache, LuCacheMetrics};
pub use error::{LuError, LuResult};
pub use factor::factor;
pub use update::Eta;

use ndarray::Array2;
use ratlp_num::LpScalar;

#[derive(Debug, Clone, Copy)]
pub struct LuConfig {
    /// Fraction of changed basis columns above which incremental updates
    /// are abandoned in favor of a full refactorization.
    pub refactor_fraction: f64,
    /// Maximum committed spike updates before a refactorization is forced.
    pub etamax: usize,
    /// Minimum spike pivot magnitude an update will accept.
    pub partial_tol: f64,
    /// Mantissa bits used for the float direction solve during updates.
    pub direction_prec: u64,
}

impl Default for LuConfig {
    fn default() -> Self {
        Self {
            refactor_fraction: 0.05,
            etamax: 64,
            partial_tol: 1e-12,
            direction_prec: 128,
        }
    }
}

impl LuConfig {
    pub fn validate(&mut self) {
        self.refactor_fraction = self.refactor_fraction.clamp(0.0, 1.0);
        self.etamax = self.etamax.max(1);
        self.partial_tol = self.partial_tol.max(0.0);
        self.direction_prec = self.direction_prec.max(64);
    }
}

/// LU factorization of a basis matrix, plus the product-form updates
/// committed since the base factorization.
///
/// The base triangles share one square array: L strictly below the
/// diagonal (its unit diagonal is implicit), U on and above it. `rperm[k]`
/// is the source row placed at elimination position `k`.
#[derive(Debug, Clone)]
pub struct LuFactors<R: LpScalar> {
    pub dim: usize,
    pub lu: Array2<R>,
    pub rperm: Vec<usize>,
    pub etas: Vec<Eta<R>>,
}

impl<R: LpScalar> LuFactors<R> {
    /// Element-wise conversion of the whole factorization, eta file
    /// included, into another flavor.
    pub fn convert<S: LpScalar>(&self) -> LuFactors<S> {
        LuFactors {
            dim: self.dim,
            lu: self.lu.map(|v| S::from_rational(&v.to_rational())),
            rperm: self.rperm.clone(),
            etas: self
                .etas
                .iter()
                .map(|e| Eta {
                    pos: e.pos,
                    col: e
                        .col
                        .iter()
                        .map(|v| S::from_rational(&v.to_rational()))
                        .collect(),
                })
                .collect(),
        }
    }
}
