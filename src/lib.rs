//! # recipe-kmeans-rs
//!
//! Groups recipes by ingredient usage and recommends recipes for a list of
//! ingredients.
//!
//! ## Features
//!
//! - **Ingredient vectors**: one axis per known ingredient, sorted by name;
//!   corpus recipes are normalized by the largest quantity seen, queries are
//!   encoded by presence
//! - **K-d tree index**: exact nearest-k queries that keep every entry tied
//!   at the k-th distance
//! - **K-means**: farthest-point seeding by aggregate distance, Lloyd
//!   iterations with stable cluster ids, an explicit empty-cluster policy and
//!   an iteration cap
//! - **Parallel assignment**: uses rayon for per-point nearest-centroid work
//! - **ndarray compatible**: point sets are `Array2<f64>`, one row per point
//!
//! ## Example
//!
//! ```rust
//! use recipe_kmeans_rs::{cluster, objective, KMeansConfig, Recipe, Recommender, RecommenderConfig};
//!
//! let recipes = vec![
//!     Recipe::new("omelette", [("egg", 3.0), ("salt", 0.1)]).unwrap(),
//!     Recipe::new("shortbread", [("flour", 2.0), ("sugar", 1.0), ("butter", 1.0)]).unwrap(),
//!     Recipe::new("meringue", [("egg", 2.0), ("sugar", 1.0)]).unwrap(),
//! ];
//!
//! let recommender = Recommender::new(&recipes, RecommenderConfig::default()).unwrap();
//! let names = recommender.recommend(&["egg", "salt"], 1).unwrap();
//! assert_eq!(names, vec!["omelette".to_string()]);
//!
//! let clustering = recommender.cluster(&KMeansConfig::new(2)).unwrap();
//! let j = objective(&clustering, &recommender.points()).unwrap();
//! assert!(j >= 0.0);
//!
//! let groups = cluster(&recommender.points(), 2, 0.01).unwrap();
//! assert_eq!(groups.len(), 2);
//! ```

mod algorithm;
mod config;
mod distance;
mod error;
mod evaluator;
mod features;
mod kdtree;
mod kmeans;
mod recommender;

pub use algorithm::{
    assign_points, group_members, has_converged, run_kmeans, seed_centroids, seed_indices,
    update_means, Centroids, Clustering,
};
pub use config::{EmptyClusterPolicy, KMeansConfig, RecommenderConfig, UNRESOLVED_INGREDIENT};
pub use distance::{euclidean, squared_euclidean};
pub use error::KMeansError;
pub use evaluator::{assignment_cost, objective};
pub use features::{IngredientDomain, PointMode, Recipe};
pub use kdtree::{KdTree, Neighbor};
pub use kmeans::{cluster, KMeans};
pub use recommender::Recommender;
