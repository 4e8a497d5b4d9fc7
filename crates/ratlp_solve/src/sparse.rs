use num_traits::Zero;
use ratlp_num::LpScalar;

use crate::error::LpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dim {
    pub nrows: usize,
    pub ncols: usize,
}

/// Compressed Sparse Column matrix over one numeric flavor.
/// - column pointers are the indices of the start and end of each column
/// - row indices are the indices of the rows of the non zero values
/// - values are the non zero values
#[derive(Debug, Clone)]
pub struct CscMatrix<R> {
    pub dim: Dim,
    /// Column pointers, len = ncols + 1
    pub column_pointers: Vec<usize>,
    /// Row indices, len = nnz
    pub row_indices: Vec<usize>,
    /// Nonzero values, len = nnz
    pub values: Vec<R>,
}

impl<R: LpScalar> CscMatrix<R> {
    /// Matrix with `nrows` rows and no columns yet.
    pub fn empty(nrows: usize) -> Self {
        Self {
            dim: Dim { nrows, ncols: 0 },
            column_pointers: vec![0],
            row_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Row indices and values of column `j`.
    pub fn col(&self, j: usize) -> (&[usize], &[R]) {
        let start = self.column_pointers[j];
        let end = self.column_pointers[j + 1];
        (&self.row_indices[start..end], &self.values[start..end])
    }

    /// Number of nonzeros in column `j`.
    pub fn col_nnz(&self, j: usize) -> usize {
        self.column_pointers[j + 1] - self.column_pointers[j]
    }

    /// Append a column. Entries must be sorted by row and in range.
    pub fn push_col(&mut self, ind: &[usize], val: &[R]) {
        debug_assert_eq!(ind.len(), val.len());
        debug_assert!(ind.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(ind.iter().all(|&i| i < self.dim.nrows));
        self.row_indices.extend_from_slice(ind);
        self.values.extend_from_slice(val);
        self.column_pointers.push(self.row_indices.len());
        self.dim.ncols += 1;
    }

    /// `y += scale * A[:, j]` into a dense vector.
    pub fn axpy_col_into(&self, j: usize, scale: &R, y: &mut [R]) {
        let (ind, val) = self.col(j);
        for (i, v) in ind.iter().zip(val) {
            y[*i] = y[*i].clone() + v.clone() * scale.clone();
        }
    }

    /// `A[:, j]^T x` for a dense vector `x`.
    pub fn col_dot(&self, j: usize, x: &[R]) -> R {
        let (ind, val) = self.col(j);
        let mut acc = R::zero();
        for (i, v) in ind.iter().zip(val) {
            acc = acc + v.clone() * x[*i].clone();
        }
        acc
    }

    /// Convert every value to another flavor, preserving the pattern.
    pub fn convert<S: LpScalar>(&self) -> CscMatrix<S> {
        CscMatrix {
            dim: self.dim,
            column_pointers: self.column_pointers.clone(),
            row_indices: self.row_indices.clone(),
            values: self
                .values
                .iter()
                .map(|v| S::from_rational(&v.to_rational()))
                .collect(),
        }
    }

    pub fn check_invariants(&self) -> Result<(), LpError> {
        if self.column_pointers.len() != self.dim.ncols + 1 {
            return Err(LpError::VectorLength {
                what: "column pointers",
                expected: self.dim.ncols + 1,
                actual: self.column_pointers.len(),
            });
        }
        for j in 0..self.dim.ncols {
            let (start, end) = (self.column_pointers[j], self.column_pointers[j + 1]);
            if start > end || end > self.row_indices.len() {
                return Err(LpError::ColumnOutOfRange {
                    col: j,
                    ncols: self.dim.ncols,
                });
            }
            for w in self.row_indices[start..end].windows(2) {
                if w[0] >= w[1] {
                    return Err(LpError::RowOutOfRange {
                        row: w[1],
                        nrows: self.dim.nrows,
                    });
                }
            }
            for &i in &self.row_indices[start..end] {
                if i >= self.dim.nrows {
                    return Err(LpError::RowOutOfRange {
                        row: i,
                        nrows: self.dim.nrows,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Triplet-based builder; duplicates in the same position are summed.
#[derive(Debug)]
pub struct CscBuilder<R> {
    dim: Dim,
    triplets: Vec<(usize, usize, R)>,
}

impl<R: LpScalar> CscBuilder<R> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            dim: Dim { nrows, ncols },
            triplets: Vec::new(),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, val: R) -> Result<(), LpError> {
        if col >= self.dim.ncols {
            return Err(LpError::ColumnOutOfRange {
                col,
                ncols: self.dim.ncols,
            });
        }
        if row >= self.dim.nrows {
            return Err(LpError::RowOutOfRange {
                row,
                nrows: self.dim.nrows,
            });
        }
        self.triplets.push((row, col, val));
        Ok(())
    }

    pub fn build(mut self) -> CscMatrix<R> {
        self.triplets.sort_by_key(|(r, c, _)| (*c, *r));
        let mut m = CscMatrix::empty(self.dim.nrows);
        let mut ind: Vec<usize> = Vec::new();
        let mut val: Vec<R> = Vec::new();
        let mut it = self.triplets.into_iter().peekable();
        for j in 0..self.dim.ncols {
            ind.clear();
            val.clear();
            while let Some((r, _, v)) = it.next_if(|(_, c, _)| *c == j) {
                if ind.last() == Some(&r) {
                    let last = val.len() - 1;
                    val[last] = val[last].clone() + v;
                } else {
                    ind.push(r);
                    val.push(v);
                }
            }
            m.push_col(&ind, &val);
        }
        m
    }
}
