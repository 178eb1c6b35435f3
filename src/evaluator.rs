use crate::algorithm::{Centroids, Clustering};
use crate::distance::squared_euclidean;
use crate::error::KMeansError;
use ndarray::ArrayView2;

/// Within-cluster sum of squares of a finished clustering.
///
/// Every point counts once, against the centroid of the cluster it belongs
/// to.
///
/// # Errors
///
/// Returns an error if `points` is not the point set that was clustered.
pub fn objective(clustering: &Clustering, points: &ArrayView2<f64>) -> Result<f64, KMeansError> {
    if clustering.labels().len() != points.nrows() {
        return Err(KMeansError::InvalidDimensions(format!(
            "Clustering covers {} points, got {}",
            clustering.labels().len(),
            points.nrows()
        )));
    }
    assignment_cost(points, clustering.centroids(), clustering.labels())
}

/// Sum of squared distances between each point and the centroid its label
/// points to.
///
/// # Errors
///
/// Returns an error on a label without a centroid or mismatched dimensions.
pub fn assignment_cost(
    points: &ArrayView2<f64>,
    centroids: &Centroids,
    labels: &[usize],
) -> Result<f64, KMeansError> {
    if centroids.dim() != points.ncols() {
        return Err(KMeansError::InvalidDimensions(format!(
            "Expected {} features, got {}",
            centroids.dim(),
            points.ncols()
        )));
    }

    points
        .rows()
        .into_iter()
        .zip(labels)
        .map(|(point, &label)| {
            centroids
                .get(label)
                .map(|centroid| squared_euclidean(&point, &centroid))
                .ok_or_else(|| {
                    KMeansError::InvalidClusterCount(format!("no centroid for cluster {}", label))
                })
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::run_kmeans;
    use crate::config::KMeansConfig;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_objective_two_clusters() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 10.0], [10.0, 11.0]];
        let clustering = run_kmeans(&data.view(), &KMeansConfig::new(2)).unwrap();

        // Each point sits 0.5 away from its centroid
        let j = objective(&clustering, &data.view()).unwrap();
        assert_relative_eq!(j, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_assignment_cost_unknown_label() {
        let data = array![[0.0], [1.0]];
        let centroids = Centroids::new(vec![0], array![[0.0]]).unwrap();

        assert!(matches!(
            assignment_cost(&data.view(), &centroids, &[0, 7]),
            Err(KMeansError::InvalidClusterCount(_))
        ));
    }

    #[test]
    fn test_objective_wrong_point_set() {
        let data = array![[0.0], [1.0], [5.0]];
        let clustering = run_kmeans(&data.view(), &KMeansConfig::new(1)).unwrap();
        let other = array![[0.0], [1.0]];

        assert!(matches!(
            objective(&clustering, &other.view()),
            Err(KMeansError::InvalidDimensions(_))
        ));
    }
}
