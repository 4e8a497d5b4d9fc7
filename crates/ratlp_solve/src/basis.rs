use crate::error::LpError;

/// Status of a structural variable in a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColStatus {
    Basic,
    Lower,
    Upper,
    Free,
}

/// Status of a row's logical (slack) variable in a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Basic,
    Lower,
    Upper,
}

/// An assignment of basis statuses to every structural and logical
/// variable. A valid basis has exactly `nrows` BASIC entries across both
/// vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis {
    pub cstat: Vec<ColStatus>,
    pub rstat: Vec<RowStatus>,
}

impl Basis {
    pub fn nstruct(&self) -> usize {
        self.cstat.len()
    }

    pub fn nrows(&self) -> usize {
        self.rstat.len()
    }

    pub fn basic_count(&self) -> usize {
        let cols = self.cstat.iter().filter(|s| **s == ColStatus::Basic).count();
        let rows = self.rstat.iter().filter(|s| **s == RowStatus::Basic).count();
        cols + rows
    }

    /// Validate shape and basic-entry cardinality against a problem.
    pub fn check(&self, nstruct: usize, nrows: usize) -> Result<(), LpError> {
        if self.nstruct() != nstruct || self.nrows() != nrows {
            return Err(LpError::BasisShape {
                nstruct: self.nstruct(),
                nrows: self.nrows(),
                expected_nstruct: nstruct,
                expected_nrows: nrows,
            });
        }
        let basic = self.basic_count();
        if basic != nrows {
            return Err(LpError::BasisCardinality { basic, rows: nrows });
        }
        Ok(())
    }
}
