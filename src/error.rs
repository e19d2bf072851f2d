use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("cannot compute a rate over zero observations")]
    DivideByZero,

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("capacity fraction must be in (0, 1], got {0}")]
    InvalidCapacity(f64),

    #[error("bin count must be at least 1, got {0}")]
    InvalidBins(usize),

    #[error("{left} labels but {right} scores")]
    LengthMismatch { left: usize, right: usize },

    #[error("no positive labels in sample")]
    NoPositiveLabels,
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert!(EvalError::EmptyInput("scores").to_string().contains("scores"));
        assert!(EvalError::InvalidCapacity(1.5).to_string().contains("1.5"));
        let err = EvalError::LengthMismatch { left: 3, right: 4 };
        assert_eq!(err.to_string(), "3 labels but 4 scores");
    }
}
