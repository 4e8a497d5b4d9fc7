use ndarray::Array2;
use num_traits::Zero;
use ratlp_num::LpScalar;

use crate::sparse::CscMatrix;

use super::{LuError, LuFactors, LuResult};

/// Factor the basis submatrix `A[:, baz]` with row pivoting.
///
/// Pivot choice prefers the largest-magnitude candidate in the pivot
/// column; with exact scalars the choice affects only the conditioning of
/// converted floating copies, never correctness. A column with no usable
/// pivot reports the offending basis column as singular.
pub fn factor<R: LpScalar>(mat: &CscMatrix<R>, baz: &[usize]) -> LuResult<LuFactors<R>> {
    let n = baz.len();
    n.checked_mul(n).ok_or(LuError::Overflow {
        context: "dense factor storage",
    })?;

    let mut a = Array2::from_elem((n, n), R::zero());
    for (j, &col) in baz.iter().enumerate() {
        let (ind, val) = mat.col(col);
        for (i, v) in ind.iter().zip(val) {
            a[[*i, j]] = v.clone();
        }
    }

    let mut rperm: Vec<usize> = (0..n).collect();
    for k in 0..n {
        let mut piv = None;
        let mut best = 0.0f64;
        for i in k..n {
            if !a[[i, k]].is_zero() {
                let m = a[[i, k]].magnitude();
                if piv.is_none() || m > best {
                    piv = Some(i);
                    best = m;
                }
            }
        }
        let Some(piv) = piv else {
            return Err(LuError::Singular { col: baz[k] });
        };
        if piv != k {
            for j in 0..n {
                a.swap([piv, j], [k, j]);
            }
            rperm.swap(k, piv);
        }
        for i in k + 1..n {
            if a[[i, k]].is_zero() {
                continue;
            }
            let m = a[[i, k]].clone() / a[[k, k]].clone();
            for j in k + 1..n {
                a[[i, j]] = a[[i, j]].clone() - m.clone() * a[[k, j]].clone();
            }
            a[[i, k]] = m;
        }
    }

    Ok(LuFactors {
        dim: n,
        lu: a,
        rperm,
        etas: Vec::new(),
    })
}
