use num_traits::Zero;
use ratlp_num::LpScalar;

use super::{LuError, LuFactors, LuResult};

impl<R: LpScalar> LuFactors<R> {
    fn check_len(&self, v: &[R]) -> LuResult<()> {
        if v.len() != self.dim {
            return Err(LuError::DimensionMismatch {
                dim: self.dim,
                actual: v.len(),
            });
        }
        Ok(())
    }

    /// Solve `B d = b`: permute, forward through L, backward through U,
    /// then replay the eta file in commit order.
    pub fn ftran(&self, b: &[R]) -> LuResult<Vec<R>> {
        self.check_len(b)?;
        let n = self.dim;
        let mut x: Vec<R> = self.rperm.iter().map(|&i| b[i].clone()).collect();

        for k in 0..n {
            if x[k].is_zero() {
                continue;
            }
            for i in k + 1..n {
                if !self.lu[[i, k]].is_zero() {
                    x[i] = x[i].clone() - self.lu[[i, k]].clone() * x[k].clone();
                }
            }
        }
        for k in (0..n).rev() {
            let mut acc = x[k].clone();
            for j in k + 1..n {
                if !self.lu[[k, j]].is_zero() && !x[j].is_zero() {
                    acc = acc - self.lu[[k, j]].clone() * x[j].clone();
                }
            }
            x[k] = acc / self.lu[[k, k]].clone();
        }

        for eta in &self.etas {
            let p = eta.pos;
            let xp = x[p].clone() / eta.col[p].clone();
            for i in 0..n {
                if i != p && !eta.col[i].is_zero() && !xp.is_zero() {
                    x[i] = x[i].clone() - eta.col[i].clone() * xp.clone();
                }
            }
            x[p] = xp;
        }
        Ok(x)
    }

    /// Solve `Bᵀ x = c`: replay the eta file transposed in reverse order,
    /// then forward through Uᵀ, backward through Lᵀ, and unpermute.
    pub fn btran(&self, c: &[R]) -> LuResult<Vec<R>> {
        self.check_len(c)?;
        let n = self.dim;
        let mut x: Vec<R> = c.to_vec();

        for eta in self.etas.iter().rev() {
            let p = eta.pos;
            let mut acc = x[p].clone();
            for i in 0..n {
                if i != p && !eta.col[i].is_zero() && !x[i].is_zero() {
                    acc = acc - eta.col[i].clone() * x[i].clone();
                }
            }
            x[p] = acc / eta.col[p].clone();
        }

        for k in 0..n {
            let mut acc = x[k].clone();
            for j in 0..k {
                if !self.lu[[j, k]].is_zero() && !x[j].is_zero() {
                    acc = acc - self.lu[[j, k]].clone() * x[j].clone();
                }
            }
            x[k] = acc / self.lu[[k, k]].clone();
        }
        for k in (0..n).rev() {
            let mut acc = x[k].clone();
            for i in k + 1..n {
                if !self.lu[[i, k]].is_zero() && !x[i].is_zero() {
                    acc = acc - self.lu[[i, k]].clone() * x[i].clone();
                }
            }
            x[k] = acc;
        }

        let mut out = vec![R::zero(); n];
        for k in 0..n {
            out[self.rperm[k]] = x[k].clone();
        }
        Ok(out)
    }
}
