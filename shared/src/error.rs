use thiserror::Error;

/// Errors raised by the statistics pipeline.
///
/// Arithmetic that cannot produce a finite result is not an error: those
/// fields are `Option`s on the result rows. Unknown counter names are not an
/// error either; they land in the residual bucket.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("invalid experience value {0}: must be finite and non-negative")]
    InvalidExperience(f64),

    #[error("level {0} is outside 1..=120")]
    InvalidLevel(u32),

    #[error("counter `{name}` has non-finite value {value}")]
    InvalidCounter { name: String, value: f64 },

    #[error("counter `{0}` appears more than once")]
    DuplicateCounter(String),

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("underpriced threshold {0} must be within (0, 1]")]
    InvalidThreshold(f64),

    #[error("item catalog could not be loaded: {0}")]
    Catalog(String),
}

impl StatsError {
    /// Whether the error was caused by caller-supplied input.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Catalog(_))
    }
}
