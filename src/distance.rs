use crate::error::KMeansError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Squared Euclidean distance between two points of equal length
#[inline]
pub fn squared_euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance between two points of equal length
#[inline]
pub fn euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Check that a point set is non-empty, has at least one dimension and
/// only finite coordinates.
pub fn validate_points(points: &ArrayView2<f64>, what: &str) -> Result<(), KMeansError> {
    if points.nrows() == 0 {
        return Err(KMeansError::EmptyInput(format!("{} contains no points", what)));
    }
    if points.ncols() == 0 {
        return Err(KMeansError::InvalidDimensions(format!(
            "{} has zero-dimensional points",
            what
        )));
    }
    if let Some(((row, col), value)) = points.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(KMeansError::InvalidDimensions(format!(
            "{} has non-finite coordinate {} at ({}, {})",
            what, value, row, col
        )));
    }
    Ok(())
}

/// Check that a single point has the expected number of coordinates
pub fn validate_dim(point: &ArrayView1<f64>, dim: usize) -> Result<(), KMeansError> {
    if point.len() != dim {
        return Err(KMeansError::InvalidDimensions(format!(
            "Expected {} features, got {}",
            dim,
            point.len()
        )));
    }
    Ok(())
}

/// Distance each centroid moved between two centroid sets whose rows are
/// aligned by cluster id.
pub fn compute_centroid_shifts(
    old_centroids: &ArrayView2<f64>,
    new_centroids: &ArrayView2<f64>,
) -> Array1<f64> {
    let shifts: Vec<f64> = (0..old_centroids.nrows())
        .into_par_iter()
        .map(|i| euclidean(&old_centroids.row(i), &new_centroids.row(i)))
        .collect();

    Array1::from(shifts)
}
