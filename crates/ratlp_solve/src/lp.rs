use num_traits::{One, Zero};
use ratlp_num::LpScalar;

use crate::basis::{Basis, ColStatus, RowStatus};
use crate::cache::SolutionCache;
use crate::error::LpError;
use crate::lu::LuCache;
use crate::params::{NumParam, Param, SolverParams};
use crate::sparse::{CscBuilder, CscMatrix};
use crate::status::LpStatus;

/// Objective sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    /// Sign carried through dual feasibility and complementary slackness:
    /// `+1` for minimize, `-1` for maximize.
    pub fn sign(&self) -> i64 {
        match self {
            Sense::Minimize => 1,
            Sense::Maximize => -1,
        }
    }
}

/// Row sense for ranged row addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// `a·x <= rhs`
    Lte,
    /// `a·x >= rhs`
    Gte,
    /// `a·x == rhs`
    Eq,
    /// `rhs <= a·x <= rhs + range`
    Range,
}

/// Row-major view of the constraint rows, in the shape `add_ranged_rows`
/// accepts; used to rebuild the problem in another flavor.
#[derive(Debug, Clone)]
pub struct RangedRows<R> {
    pub rowcnt: Vec<usize>,
    pub rowbeg: Vec<usize>,
    /// Structural column indices.
    pub rowind: Vec<usize>,
    pub rowval: Vec<R>,
    pub rhs: Vec<R>,
    pub senses: Vec<RowSense>,
    pub ranges: Vec<R>,
}

/// A linear program in one numeric flavor.
///
/// The column space holds structural columns and one logical (slack)
/// column per row, in creation order; `structmap` and `rowmap` translate
/// structural / row indices into it. Every logical column has exactly one
/// nonzero.
#[derive(Debug)]
pub struct Lp<R: LpScalar> {
    pub(crate) name: String,
    pub(crate) sense: Sense,
    pub(crate) mat: CscMatrix<R>,
    /// Per-column bounds and objective over the full column space.
    pub(crate) lower: Vec<R>,
    pub(crate) upper: Vec<R>,
    pub(crate) obj: Vec<R>,
    pub(crate) rhs: Vec<R>,
    pub(crate) row_sense: Vec<RowSense>,
    pub(crate) row_range: Vec<R>,
    pub(crate) structmap: Vec<usize>,
    pub(crate) rowmap: Vec<usize>,
    pub(crate) colnames: Vec<String>,
    pub(crate) rownames: Vec<String>,
    pub(crate) params: SolverParams<R>,
    pub(crate) basis: Option<Basis>,
    pub(crate) status: LpStatus,
    pub(crate) cache: Option<SolutionCache<R>>,
    pub(crate) lu: Option<LuCache>,
}

impl<R: LpScalar> Lp<R> {
    pub fn new(name: &str, sense: Sense) -> Self {
        Self {
            name: name.to_string(),
            sense,
            mat: CscMatrix::empty(0),
            lower: Vec::new(),
            upper: Vec::new(),
            obj: Vec::new(),
            rhs: Vec::new(),
            row_sense: Vec::new(),
            row_range: Vec::new(),
            structmap: Vec::new(),
            rowmap: Vec::new(),
            colnames: Vec::new(),
            rownames: Vec::new(),
            params: SolverParams::default(),
            basis: None,
            status: LpStatus::Unsolved,
            cache: None,
            lu: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn nstruct(&self) -> usize {
        self.structmap.len()
    }

    pub fn nrows(&self) -> usize {
        self.rowmap.len()
    }

    /// Structural plus logical columns.
    pub fn total_cols(&self) -> usize {
        self.mat.dim.ncols
    }

    pub fn matrix(&self) -> &CscMatrix<R> {
        &self.mat
    }

    pub fn rhs(&self) -> &[R] {
        &self.rhs
    }

    pub fn structmap(&self) -> &[usize] {
        &self.structmap
    }

    pub fn rowmap(&self) -> &[usize] {
        &self.rowmap
    }

    /// Bounds of the structural variables.
    pub fn bounds(&self) -> (Vec<R>, Vec<R>) {
        let lower = self.structmap.iter().map(|&c| self.lower[c].clone()).collect();
        let upper = self.structmap.iter().map(|&c| self.upper[c].clone()).collect();
        (lower, upper)
    }

    /// Objective coefficients of the structural variables.
    pub fn objective(&self) -> Vec<R> {
        self.structmap.iter().map(|&c| self.obj[c].clone()).collect()
    }

    pub fn status(&self) -> LpStatus {
        self.status
    }

    pub fn solution(&self) -> Option<&SolutionCache<R>> {
        self.cache.as_ref()
    }

    pub fn param(&self, key: Param) -> i32 {
        self.params.get(key)
    }

    pub fn set_param(&mut self, key: Param, value: i32) -> Result<(), LpError> {
        self.params.set(key, value)
    }

    pub fn param_num(&self, key: NumParam) -> R {
        self.params.get_num(key)
    }

    pub fn set_param_num(&mut self, key: NumParam, value: R) {
        self.params.set_num(key, value)
    }

    /// Append a structural column with objective coefficient and bounds.
    pub fn add_col(&mut self, obj: R, lower: R, upper: R, name: Option<&str>) {
        let col = self.mat.dim.ncols;
        self.mat.push_col(&[], &[]);
        self.obj.push(obj);
        self.lower.push(lower);
        self.upper.push(upper);
        self.structmap.push(col);
        let idx = self.structmap.len() - 1;
        self.colnames
            .push(name.map(str::to_string).unwrap_or_else(|| format!("x{idx}")));
        self.touch();
    }

    /// Bulk-add ranged rows. `rowind` holds structural column indices;
    /// entry `t` of row `k` lives at `rowbeg[k] + t` for `t < rowcnt[k]`.
    /// A logical column is appended per row, with bounds derived from the
    /// row sense.
    #[allow(clippy::too_many_arguments)]
    pub fn add_ranged_rows(
        &mut self,
        rowcnt: &[usize],
        rowbeg: &[usize],
        rowind: &[usize],
        rowval: &[R],
        rhs: &[R],
        senses: &[RowSense],
        ranges: &[R],
        names: Option<&[String]>,
    ) -> Result<(), LpError> {
        let n_new = rowcnt.len();
        for (what, len) in [
            ("rowbeg", rowbeg.len()),
            ("rhs", rhs.len()),
            ("row senses", senses.len()),
            ("row ranges", ranges.len()),
        ] {
            if len != n_new {
                return Err(LpError::VectorLength {
                    what,
                    expected: n_new,
                    actual: len,
                });
            }
        }
        if rowval.len() != rowind.len() {
            return Err(LpError::VectorLength {
                what: "row values",
                expected: rowind.len(),
                actual: rowval.len(),
            });
        }
        for k in 0..n_new {
            if rowbeg[k] + rowcnt[k] > rowind.len() {
                return Err(LpError::VectorLength {
                    what: "row entries",
                    expected: rowbeg[k] + rowcnt[k],
                    actual: rowind.len(),
                });
            }
        }

        let old_nrows = self.nrows();
        let new_nrows = old_nrows + n_new;

        // Rebuild the structural block with the enlarged row count, then
        // append the new logical columns.
        let mut b = CscBuilder::new(new_nrows, self.mat.dim.ncols);
        for j in 0..self.mat.dim.ncols {
            let (ind, val) = self.mat.col(j);
            for (i, v) in ind.iter().zip(val) {
                b.push(*i, j, v.clone())?;
            }
        }
        for k in 0..n_new {
            let row = old_nrows + k;
            for t in rowbeg[k]..rowbeg[k] + rowcnt[k] {
                let sc = rowind[t];
                let col = *self.structmap.get(sc).ok_or(LpError::ColumnOutOfRange {
                    col: sc,
                    ncols: self.nstruct(),
                })?;
                b.push(row, col, rowval[t].clone())?;
            }
        }
        self.mat = b.build();

        for k in 0..n_new {
            let row = old_nrows + k;
            let col = self.mat.dim.ncols;
            self.mat.push_col(&[row], &[R::one()]);
            let (lo, hi) = match senses[k] {
                RowSense::Lte => (R::zero(), R::infinite_bound()),
                RowSense::Gte => (R::zero() - R::infinite_bound(), R::zero()),
                RowSense::Eq => (R::zero(), R::zero()),
                RowSense::Range => (R::zero() - ranges[k].clone(), R::zero()),
            };
            self.lower.push(lo);
            self.upper.push(hi);
            self.obj.push(R::zero());
            self.rhs.push(rhs[k].clone());
            self.row_sense.push(senses[k]);
            self.row_range.push(ranges[k].clone());
            self.rowmap.push(col);
            let name = names
                .and_then(|n| n.get(k).cloned())
                .unwrap_or_else(|| format!("c{row}"));
            self.rownames.push(name);
        }
        self.touch();
        Ok(())
    }

    /// Row-major view of the structural rows, for flavor copies.
    pub fn ranged_rows(&self) -> RangedRows<R> {
        let nrows = self.nrows();
        let mut per_row: Vec<Vec<(usize, R)>> = vec![Vec::new(); nrows];
        for (s, &col) in self.structmap.iter().enumerate() {
            let (ind, val) = self.mat.col(col);
            for (i, v) in ind.iter().zip(val) {
                per_row[*i].push((s, v.clone()));
            }
        }
        let mut rr = RangedRows {
            rowcnt: Vec::with_capacity(nrows),
            rowbeg: Vec::with_capacity(nrows),
            rowind: Vec::new(),
            rowval: Vec::new(),
            rhs: self.rhs.clone(),
            senses: self.row_sense.clone(),
            ranges: self.row_range.clone(),
        };
        for entries in per_row {
            rr.rowbeg.push(rr.rowind.len());
            rr.rowcnt.push(entries.len());
            for (s, v) in entries {
                rr.rowind.push(s);
                rr.rowval.push(v);
            }
        }
        rr
    }

    /// Load a basis, validating shape, status codes, and cardinality.
    pub fn load_basis(&mut self, basis: &Basis) -> Result<(), LpError> {
        basis.check(self.nstruct(), self.nrows())?;
        self.basis = Some(basis.clone());
        Ok(())
    }

    /// Copy of the currently loaded basis, if any.
    pub fn basis(&self) -> Option<Basis> {
        self.basis.clone()
    }

    /// The all-logical starting basis: every row's logical is basic and
    /// every structural variable sits at a finite bound (or at zero when
    /// free).
    pub fn default_slack_basis(&self) -> Basis {
        let cstat = self
            .structmap
            .iter()
            .map(|&c| {
                if self.lower[c].is_unbounded_below() {
                    if self.upper[c].is_unbounded_above() {
                        ColStatus::Free
                    } else {
                        ColStatus::Upper
                    }
                } else {
                    ColStatus::Lower
                }
            })
            .collect();
        let rstat = vec![RowStatus::Basic; self.nrows()];
        Basis { cstat, rstat }
    }

    /// Construct a copy of this LP in another numeric flavor: bounds,
    /// objective, ranged rows, and all parameters go through the scalar
    /// conversions.
    pub fn copy_to<S: LpScalar>(&self, new_name: &str) -> Result<Lp<S>, LpError> {
        let conv = |v: &R| S::from_rational(&v.to_rational());
        let mut p2 = Lp::<S>::new(new_name, self.sense);
        for (s, &col) in self.structmap.iter().enumerate() {
            p2.add_col(
                conv(&self.obj[col]),
                conv(&self.lower[col]),
                conv(&self.upper[col]),
                Some(&self.colnames[s]),
            );
        }
        let rr = self.ranged_rows();
        p2.add_ranged_rows(
            &rr.rowcnt,
            &rr.rowbeg,
            &rr.rowind,
            &rr.rowval.iter().map(conv).collect::<Vec<_>>(),
            &rr.rhs.iter().map(conv).collect::<Vec<_>>(),
            &rr.senses,
            &rr.ranges.iter().map(conv).collect::<Vec<_>>(),
            Some(&self.rownames),
        )?;
        p2.params = self.params.convert::<S>();
        Ok(p2)
    }

    pub(crate) fn set_solution(&mut self, cache: SolutionCache<R>) {
        self.status = cache.status;
        self.cache = Some(cache);
    }

    pub(crate) fn touch(&mut self) {
        if self.cache.is_some() || self.status != LpStatus::Unsolved {
            self.status = LpStatus::Modified;
        }
        self.cache = None;
        self.lu = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use ratlp_num::{BigRational, Mpf};

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::from_int_ratio(p, q as u64)
    }

    /// min x + y,  x + 2y >= 3 (row),  0 <= x <= 4,  y free.
    fn small_lp() -> Lp<BigRational> {
        let mut lp = Lp::new("small", Sense::Minimize);
        lp.add_col(rat(1, 1), rat(0, 1), rat(4, 1), Some("x"));
        lp.add_col(
            rat(1, 1),
            BigRational::zero() - BigRational::infinite_bound(),
            BigRational::infinite_bound(),
            Some("y"),
        );
        lp.add_ranged_rows(
            &[2],
            &[0],
            &[0, 1],
            &[rat(1, 1), rat(2, 1)],
            &[rat(3, 1)],
            &[RowSense::Gte],
            &[rat(0, 1)],
            None,
        )
        .unwrap();
        lp
    }

    #[test]
    fn logical_bounds_follow_row_sense() {
        let mut lp = Lp::<f64>::new("senses", Sense::Minimize);
        lp.add_col(0.0, 0.0, 1.0, None);
        lp.add_ranged_rows(
            &[1, 1, 1, 1],
            &[0, 1, 2, 3],
            &[0, 0, 0, 0],
            &[1.0, 1.0, 1.0, 1.0],
            &[1.0, 1.0, 1.0, 1.0],
            &[RowSense::Lte, RowSense::Gte, RowSense::Eq, RowSense::Range],
            &[0.0, 0.0, 0.0, 2.0],
            None,
        )
        .unwrap();
        let lte = lp.rowmap()[0];
        let gte = lp.rowmap()[1];
        let eq = lp.rowmap()[2];
        let rng = lp.rowmap()[3];
        assert_eq!(lp.lower[lte], 0.0);
        assert!(lp.upper[lte].is_unbounded_above());
        assert!(lp.lower[gte].is_unbounded_below());
        assert_eq!(lp.upper[gte], 0.0);
        assert_eq!((lp.lower[eq], lp.upper[eq]), (0.0, 0.0));
        assert_eq!((lp.lower[rng], lp.upper[rng]), (-2.0, 0.0));
        // every logical column has exactly one nonzero
        for &c in lp.rowmap() {
            assert_eq!(lp.matrix().col_nnz(c), 1);
        }
    }

    #[test]
    fn copy_preserves_structure_exactly() {
        let lp = small_lp();
        let dbl = lp.copy_to::<f64>("small_dbl").unwrap();
        assert_eq!(dbl.nstruct(), lp.nstruct());
        assert_eq!(dbl.nrows(), lp.nrows());
        assert_eq!(dbl.sense(), lp.sense());
        assert_eq!(dbl.matrix().nnz(), lp.matrix().nnz());
        assert_eq!(dbl.matrix().row_indices, lp.matrix().row_indices);
        // and back again
        let back = dbl.copy_to::<BigRational>("small_back").unwrap();
        assert_eq!(back.rhs()[0], rat(3, 1));
        assert_eq!(back.objective(), lp.objective());
    }

    #[test]
    fn copy_converts_parameters_through_the_backend() {
        let mut lp = small_lp();
        lp.set_param(Param::SimplexDisplay, 1).unwrap();
        lp.set_param_num(NumParam::ObjLlim, rat(-7, 2));
        let mpf = lp.copy_to::<Mpf>("small_mpf").unwrap();
        assert_eq!(mpf.param(Param::SimplexDisplay), 1);
        assert_eq!(mpf.param_num(NumParam::ObjLlim).to_rational(), rat(-7, 2));
    }

    #[test]
    fn load_basis_rejects_bad_cardinality() {
        let mut lp = small_lp();
        let bad = Basis {
            cstat: vec![ColStatus::Basic, ColStatus::Basic],
            rstat: vec![RowStatus::Basic],
        };
        assert!(matches!(
            lp.load_basis(&bad),
            Err(LpError::BasisCardinality { basic: 3, rows: 1 })
        ));
        let good = lp.default_slack_basis();
        assert!(lp.load_basis(&good).is_ok());
        assert_eq!(lp.basis(), Some(good));
    }

    #[test]
    fn default_slack_basis_respects_free_columns() {
        let lp = small_lp();
        let b = lp.default_slack_basis();
        assert_eq!(b.cstat[0], ColStatus::Lower);
        assert_eq!(b.cstat[1], ColStatus::Free);
        assert_eq!(b.rstat[0], RowStatus::Basic);
    }

    #[test]
    fn zero_dimension_lp_is_well_formed() {
        let lp = Lp::<BigRational>::new("empty", Sense::Maximize);
        assert_eq!(lp.nstruct(), 0);
        assert_eq!(lp.nrows(), 0);
        assert!(lp.ranged_rows().rowcnt.is_empty());
        let copy = lp.copy_to::<f64>("empty_dbl").unwrap();
        assert_eq!(copy.total_cols(), 0);
        assert!(BigRational::zero().is_zero());
    }
}
