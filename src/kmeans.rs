use crate::algorithm::{assign_points, run_kmeans, Clustering};
use crate::config::KMeansConfig;
use crate::distance::validate_points;
use crate::error::KMeansError;
use crate::evaluator;
use ndarray::{Array2, ArrayView2};
use std::collections::BTreeMap;

/// K-means clustering with farthest-point seeding.
///
/// Clusters keep the integer id they were seeded with for the whole run, so
/// results can be compared across iterations and across `predict` calls.
///
/// # Example
///
/// ```
/// use recipe_kmeans_rs::KMeans;
/// use ndarray::array;
///
/// let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 10.0], [10.0, 11.0]];
///
/// let mut kmeans = KMeans::new(2);
/// kmeans.fit(&data.view()).unwrap();
///
/// let labels = kmeans.predict(&data.view()).unwrap();
/// assert_eq!(labels[0], labels[1]);
/// assert_ne!(labels[0], labels[2]);
/// ```
pub struct KMeans {
    /// Model configuration
    config: KMeansConfig,

    /// Number of features (dimensions), 0 until the first fit
    d: usize,

    /// Result of the last fit
    clustering: Option<Clustering>,
}

impl KMeans {
    /// Create a new KMeans instance with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `k` is 0.
    pub fn new(k: usize) -> Self {
        Self::with_config(KMeansConfig::new(k))
    }

    /// Create a new KMeans instance with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.k` is 0.
    pub fn with_config(config: KMeansConfig) -> Self {
        assert!(config.k > 0, "k must be greater than 0");

        Self {
            config,
            d: 0,
            clustering: None,
        }
    }

    /// Cluster the rows of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `data` is empty or has fewer rows than k
    /// - Data dimensions don't match an earlier fit
    /// - The run hit `max_iters` while `require_convergence` is set
    pub fn fit(&mut self, data: &ArrayView2<f64>) -> Result<&mut Self, KMeansError> {
        let n_features = data.ncols();
        if self.d != 0 && n_features != self.d {
            return Err(KMeansError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d, n_features
            )));
        }

        let clustering = run_kmeans(data, &self.config)?;

        self.d = n_features;
        self.clustering = Some(clustering);
        Ok(self)
    }

    /// Cluster id of the nearest fitted centroid for every row of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been fitted yet or the data
    /// dimensions don't match.
    pub fn predict(&self, data: &ArrayView2<f64>) -> Result<Vec<usize>, KMeansError> {
        let clustering = self.clustering.as_ref().ok_or(KMeansError::NotFitted)?;
        validate_points(data, "Prediction point set")?;

        assign_points(data, clustering.centroids())
    }

    /// Fit the model and return the label of every training row.
    pub fn fit_predict(&mut self, data: &ArrayView2<f64>) -> Result<Vec<usize>, KMeansError> {
        self.fit(data)?;
        let clustering = self.clustering.as_ref().ok_or(KMeansError::NotFitted)?;
        Ok(clustering.labels().to_vec())
    }

    /// Within-cluster sum of squares of the fitted clustering over `data`,
    /// which must be the training set.
    pub fn objective(&self, data: &ArrayView2<f64>) -> Result<f64, KMeansError> {
        let clustering = self.clustering.as_ref().ok_or(KMeansError::NotFitted)?;
        evaluator::objective(clustering, data)
    }

    /// Result of the last fit, if any.
    pub fn clustering(&self) -> Option<&Clustering> {
        self.clustering.as_ref()
    }

    /// Fitted centroids, one row per cluster in id order.
    pub fn centroids(&self) -> Option<ArrayView2<'_, f64>> {
        self.clustering.as_ref().map(|c| c.centroids().coords())
    }

    /// Get the number of requested clusters.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the number of features (dimensions).
    pub fn d(&self) -> usize {
        self.d
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }
}

/// Cluster `points` into `k` groups and return the member points of each
/// cluster by id.
///
/// `epsilon` is the largest centroid movement still counted as converged.
pub fn cluster(
    points: &ArrayView2<f64>,
    k: usize,
    epsilon: f64,
) -> Result<BTreeMap<usize, Array2<f64>>, KMeansError> {
    let config = KMeansConfig::new(k).with_tol(epsilon);
    let clustering = run_kmeans(points, &config)?;
    Ok(clustering.member_points(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    #[test]
    fn test_kmeans_new() {
        let kmeans = KMeans::new(10);
        assert_eq!(kmeans.k(), 10);
        assert_eq!(kmeans.d(), 0);
        assert!(kmeans.centroids().is_none());
    }

    #[test]
    fn test_kmeans_fit() {
        let data = Array2::random((500, 32), Uniform::new(-1.0, 1.0));
        let mut kmeans = KMeans::new(5);

        kmeans.fit(&data.view()).unwrap();

        let centroids = kmeans.centroids().unwrap();
        assert_eq!(centroids.nrows(), 5);
        assert_eq!(centroids.ncols(), 32);
        assert_eq!(kmeans.d(), 32);
    }

    #[test]
    fn test_kmeans_predict() {
        let train_data = Array2::random((500, 16), Uniform::new(-1.0, 1.0));
        let test_data = Array2::random((100, 16), Uniform::new(-1.0, 1.0));

        let mut kmeans = KMeans::new(8);
        kmeans.fit(&train_data.view()).unwrap();

        let labels = kmeans.predict(&test_data.view()).unwrap();
        assert_eq!(labels.len(), 100);
        assert!(labels.iter().all(|&label| label < 8));
    }

    #[test]
    fn test_kmeans_fit_predict() {
        let data = Array2::random((300, 8), Uniform::new(-1.0, 1.0));
        let mut kmeans = KMeans::new(4);

        let labels = kmeans.fit_predict(&data.view()).unwrap();
        assert_eq!(labels.len(), 300);
        assert!(kmeans.objective(&data.view()).unwrap() > 0.0);
    }

    #[test]
    fn test_kmeans_predict_before_fit() {
        let data = Array2::random((100, 8), Uniform::new(-1.0, 1.0));
        let kmeans = KMeans::new(5);

        let result = kmeans.predict(&data.view());
        assert!(matches!(result, Err(KMeansError::NotFitted)));
    }

    #[test]
    fn test_kmeans_dimension_mismatch() {
        let train_data = Array2::random((100, 8), Uniform::new(-1.0, 1.0));
        let test_data = Array2::random((50, 16), Uniform::new(-1.0, 1.0));

        let mut kmeans = KMeans::new(5);
        kmeans.fit(&train_data.view()).unwrap();

        let result = kmeans.predict(&test_data.view());
        assert!(matches!(result, Err(KMeansError::InvalidDimensions(_))));

        let refit = kmeans.fit(&test_data.view());
        assert!(matches!(refit, Err(KMeansError::InvalidDimensions(_))));
    }

    #[test]
    #[should_panic(expected = "k must be greater than 0")]
    fn test_kmeans_k_zero() {
        let _ = KMeans::new(0);
    }
}
