use num_traits::Zero;
use ratlp_num::LpScalar;

use super::{LuConfig, LuError, LuFactors, LuResult};

/// One committed column replacement in product form: the basis column at
/// `pos` was replaced by a column whose solved-through direction is `col`.
#[derive(Debug, Clone)]
pub struct Eta<R> {
    pub pos: usize,
    pub col: Vec<R>,
}

impl<R: LpScalar> LuFactors<R> {
    /// Install a spike update replacing the basis column at `pos`.
    ///
    /// `spike` must be the exactly computed direction `B⁻¹ a_entering`
    /// through the current factors. The update is refused when the eta
    /// file is full or the spike pivot is zero or negligibly small; the
    /// caller falls back to a full refactorization in either case.
    pub fn update(&mut self, spike: Vec<R>, pos: usize, config: &LuConfig) -> LuResult<()> {
        if spike.len() != self.dim {
            return Err(LuError::DimensionMismatch {
                dim: self.dim,
                actual: spike.len(),
            });
        }
        if self.etas.len() >= config.etamax {
            return Err(LuError::TooManyEtas {
                count: self.etas.len(),
            });
        }
        let piv = &spike[pos];
        if piv.is_zero() || piv.magnitude() < config.partial_tol {
            return Err(LuError::UpdateUnstable { pos });
        }
        self.etas.push(Eta { pos, col: spike });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lu::factor;
    use crate::sparse::CscBuilder;
    use num_traits::One;
    use ratlp_num::BigRational;

    fn rat(p: i64) -> BigRational {
        BigRational::from_int_ratio(p, 1)
    }

    /// 3x3 system; columns 0..3 form the cached basis, column 3 is a
    /// replacement candidate.
    fn fixture() -> crate::sparse::CscMatrix<BigRational> {
        let mut b = CscBuilder::new(3, 4);
        // A = [ 2 0 1 | 1
        //       1 3 0 | 0
        //       0 1 1 | 2 ]
        b.push(0, 0, rat(2)).unwrap();
        b.push(1, 0, rat(1)).unwrap();
        b.push(1, 1, rat(3)).unwrap();
        b.push(2, 1, rat(1)).unwrap();
        b.push(0, 2, rat(1)).unwrap();
        b.push(2, 2, rat(1)).unwrap();
        b.push(0, 3, rat(1)).unwrap();
        b.push(2, 3, rat(2)).unwrap();
        b.build()
    }

    #[test]
    fn update_matches_refactor_from_scratch() {
        let mat = fixture();
        let mut f = factor(&mat, &[0, 1, 2]).unwrap();

        // replace basis column at position 1 with matrix column 3
        let mut a_s = vec![rat(0), rat(0), rat(0)];
        let (ind, val) = mat.col(3);
        for (i, v) in ind.iter().zip(val) {
            a_s[*i] = v.clone();
        }
        let spike = f.ftran(&a_s).unwrap();
        f.update(spike, 1, &LuConfig::default()).unwrap();

        let fresh = factor(&mat, &[0, 3, 2]).unwrap();
        let rhs = vec![rat(5), rat(-1), rat(4)];
        assert_eq!(f.ftran(&rhs).unwrap(), fresh.ftran(&rhs).unwrap());
        assert_eq!(f.btran(&rhs).unwrap(), fresh.btran(&rhs).unwrap());
    }

    #[test]
    fn zero_pivot_spike_is_refused() {
        let mat = fixture();
        let mut f = factor(&mat, &[0, 1, 2]).unwrap();
        let spike = vec![BigRational::one(), BigRational::from_int_ratio(0, 1), rat(1)];
        assert!(matches!(
            f.update(spike, 1, &LuConfig::default()),
            Err(LuError::UpdateUnstable { pos: 1 })
        ));
    }

    #[test]
    fn full_eta_file_is_refused() {
        let mat = fixture();
        let mut f = factor(&mat, &[0, 1, 2]).unwrap();
        let config = LuConfig {
            etamax: 1,
            ..Default::default()
        };
        let spike = vec![rat(1), rat(1), rat(1)];
        f.update(spike.clone(), 0, &config).unwrap();
        assert!(matches!(
            f.update(spike, 0, &config),
            Err(LuError::TooManyEtas { count: 1 })
        ));
    }
}
