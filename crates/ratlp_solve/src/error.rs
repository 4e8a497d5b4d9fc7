use thiserror::Error;

/// Structural errors in problem or basis data. These are fatal to the
/// call that raised them, unlike certification rejections which only mean
/// "retry at higher precision".
#[derive(Debug, Error)]
pub enum LpError {
    #[error(
        "basis shape ({nstruct} structurals, {nrows} rows) does not match \
         problem ({expected_nstruct}, {expected_nrows})"
    )]
    BasisShape {
        nstruct: usize,
        nrows: usize,
        expected_nstruct: usize,
        expected_nrows: usize,
    },

    #[error("basis has {basic} basic entries, expected exactly {rows}")]
    BasisCardinality { basic: usize, rows: usize },

    #[error("entry references column {col}, but only {ncols} columns exist")]
    ColumnOutOfRange { col: usize, ncols: usize },

    #[error("entry references row {row}, but only {nrows} rows exist")]
    RowOutOfRange { row: usize, nrows: usize },

    #[error("parameter {param} rejected value {value}")]
    Param { param: &'static str, value: i64 },

    #[error("{what} has length {actual}, expected {expected}")]
    VectorLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Top-level error for the driver and verification entry points.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Lp(#[from] LpError),

    #[error(transparent)]
    Lu(#[from] crate::lu::LuError),
}

pub type SolveResult<T> = Result<T, SolveError>;
