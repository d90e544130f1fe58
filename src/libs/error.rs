use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum KspecError {
    /// Malformed or inconsistent parameters
    InvalidInput(String),
    /// The solver exhausted its iteration budget before reaching tolerance
    Convergence { iterations: usize },
    /// Internal shape inconsistency between matrices and vectors
    DimensionMismatch { expected: usize, found: usize },
}

impl fmt::Display for KspecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KspecError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            KspecError::Convergence { iterations } => {
                write!(
                    f,
                    "Solver did not converge within {} passes; raise --max-iter or loosen --eps",
                    iterations
                )
            }
            KspecError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for KspecError {}
