use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MathError {
    #[error("values and log_densities must have equal length, got {values} and {log_densities}")]
    LengthMismatch { values: usize, log_densities: usize },

    #[error("t_max must be > 0, got {0}")]
    InvalidTMax(f64),

    #[error("values and densities must have equal length, got {values} and {densities}")]
    UcbLengthMismatch { values: usize, densities: usize },
}
