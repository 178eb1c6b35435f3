use serde::{Deserialize, Serialize};

/// Ingredient name the parsing stage emits when it cannot resolve an ingredient.
///
/// Some recipe parsers spell it `"undifined"`; set
/// [`RecommenderConfig::with_unresolved_ingredient`] to match their output.
pub const UNRESOLVED_INGREDIENT: &str = "undefined";

/// What happens to a cluster that ends an iteration without members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyClusterPolicy {
    /// Keep the cluster alive with its previous centroid.
    #[default]
    RetainPrevious,
    /// Remove the cluster for the rest of the run, reducing k.
    Drop,
}

/// Configuration for the k-means engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,

    /// Maximum number of Lloyd iterations before giving up
    pub max_iters: usize,

    /// Convergence threshold. The run stops once no centroid moved
    /// further than this between two iterations.
    pub tol: f64,

    /// Random seed for picking the first centroid
    pub seed: u64,

    /// Handling of clusters that lose all their members
    pub empty_cluster_policy: EmptyClusterPolicy,

    /// Fail with `NotConverged` instead of returning the last state when
    /// `max_iters` is exhausted
    pub require_convergence: bool,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 2,
            max_iters: 300,
            tol: 0.01,
            seed: 0,
            empty_cluster_policy: EmptyClusterPolicy::RetainPrevious,
            require_convergence: false,
        }
    }
}

impl KMeansConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence threshold
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the empty cluster policy
    pub fn with_empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster_policy = policy;
        self
    }

    /// Require convergence within `max_iters`
    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.require_convergence = require;
        self
    }
}

/// Configuration for building a recipe corpus index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Sentinel name of unresolved ingredients; never becomes an axis.
    pub unresolved_ingredient: String,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            unresolved_ingredient: UNRESOLVED_INGREDIENT.to_string(),
        }
    }
}

impl RecommenderConfig {
    /// Set the unresolved ingredient sentinel
    pub fn with_unresolved_ingredient(mut self, name: impl Into<String>) -> Self {
        self.unresolved_ingredient = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KMeansConfig::default();
        assert_eq!(config.tol, 0.01);
        assert_eq!(config.empty_cluster_policy, EmptyClusterPolicy::RetainPrevious);
        assert!(!config.require_convergence);
    }

    #[test]
    fn test_builder() {
        let config = KMeansConfig::new(4)
            .with_max_iters(10)
            .with_tol(0.5)
            .with_seed(7)
            .with_empty_cluster_policy(EmptyClusterPolicy::Drop)
            .with_require_convergence(true);

        assert_eq!(config.k, 4);
        assert_eq!(config.max_iters, 10);
        assert_eq!(config.tol, 0.5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.empty_cluster_policy, EmptyClusterPolicy::Drop);
        assert!(config.require_convergence);
    }

    #[test]
    fn test_partial_json() {
        let config: KMeansConfig =
            serde_json::from_str(r#"{"k": 3, "empty_cluster_policy": "drop"}"#).unwrap();
        assert_eq!(config.k, 3);
        assert_eq!(config.max_iters, 300);
        assert_eq!(config.empty_cluster_policy, EmptyClusterPolicy::Drop);

        let rec: RecommenderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(rec.unresolved_ingredient, UNRESOLVED_INGREDIENT);
    }
}
