use thiserror::Error;

/// Error types for clustering, indexing and recommendation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansError {
    /// The requested number of clusters (or neighbors) is invalid
    #[error("Invalid cluster count: {0}")]
    InvalidClusterCount(String),

    /// A point set, corpus or ingredient domain is empty
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Dimension mismatch between points, or malformed coordinates
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),

    /// An ingredient quantity is negative or not finite
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// The iteration cap was reached before the centroids settled
    #[error("K-means did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    /// Model has not been fitted yet
    #[error("Model has not been fitted. Call fit() first.")]
    NotFitted,
}
