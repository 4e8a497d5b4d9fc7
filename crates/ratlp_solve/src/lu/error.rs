use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuError {
    #[error("basis matrix is singular at pivot column {col}")]
    Singular { col: usize },

    #[error("no factorization is loaded")]
    NotFactored,

    #[error("spike pivot at position {pos} is unusable, refactorization required")]
    UpdateUnstable { pos: usize },

    #[error("eta file is full ({count} updates), refactorization required")]
    TooManyEtas { count: usize },

    #[error("factor storage size overflow: {context}")]
    Overflow { context: &'static str },

    #[error("vector length {actual} does not match factor dimension {dim}")]
    DimensionMismatch { dim: usize, actual: usize },
}

pub type LuResult<T> = Result<T, LuError>;
