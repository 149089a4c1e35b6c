use thiserror::Error;

/// Errors produced by the core: validation failures, extractor capability
/// failures, and propagated custom-extractor failures.
#[derive(Debug, Error)]
pub enum SimstringError {
    /// α fell outside the required `(0, 1]` range.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(f64),

    /// A custom extractor did not satisfy the `apply(text) -> tokens`
    /// capability at construction time.
    #[error("Custom extractor must provide an apply capability: {0}")]
    InvalidExtractor(String),

    /// A custom extractor's `apply` returned an error, or panicked, while
    /// processing a string.
    #[error("custom extractor failed: {0}")]
    Extractor(String),
}

pub type Result<T> = std::result::Result<T, SimstringError>;
