//! Recipe lookup by ingredient list.
//!
//! Corpus recipes are indexed as normalized-mode points; a query is a
//! presence-mode point in the same space. Several recipes may share a point,
//! so results are expanded through a point to names multimap.

use crate::algorithm::{run_kmeans, Clustering};
use crate::config::{KMeansConfig, RecommenderConfig};
use crate::error::KMeansError;
use crate::features::{IngredientDomain, Recipe};
use crate::kdtree::KdTree;
use ndarray::{ArrayView1, ArrayView2};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Exact bit pattern of a point, usable as a map key.
type PointKey = Vec<u64>;

fn point_key(point: &ArrayView1<f64>) -> PointKey {
    // +0.0 and -0.0 are the same coordinate
    point
        .iter()
        .map(|v| if *v == 0.0 { 0 } else { v.to_bits() })
        .collect()
}

/// Nearest-neighbor recommender over a fixed recipe corpus
#[derive(Debug, Clone)]
pub struct Recommender {
    domain: IngredientDomain,
    recipe_count: usize,
    names_by_point: HashMap<PointKey, Vec<String>>,
    index: KdTree,
}

impl Recommender {
    /// Index `recipes`: build the ingredient domain, one normalized point
    /// per recipe, and the point to recipe names multimap.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no recipes or no known ingredients.
    pub fn new(recipes: &[Recipe], config: RecommenderConfig) -> Result<Self, KMeansError> {
        if recipes.is_empty() {
            return Err(KMeansError::EmptyInput("recipe corpus is empty".to_string()));
        }

        let domain = IngredientDomain::from_recipes(recipes, &config.unresolved_ingredient);
        if domain.is_empty() {
            return Err(KMeansError::EmptyInput(
                "recipe corpus has no known ingredients".to_string(),
            ));
        }

        let points = domain.build_points(recipes, &config.unresolved_ingredient);

        let mut names_by_point: HashMap<PointKey, Vec<String>> = HashMap::new();
        for (row, recipe) in points.rows().into_iter().zip(recipes) {
            names_by_point
                .entry(point_key(&row))
                .or_default()
                .push(recipe.name().to_string());
        }

        let index = KdTree::new(&points.view())?;

        info!(
            "Indexed {} recipes over {} ingredients ({} distinct points)",
            recipes.len(),
            domain.len(),
            names_by_point.len()
        );

        Ok(Self {
            domain,
            recipe_count: recipes.len(),
            names_by_point,
            index,
        })
    }

    /// Recipes closest to a set of ingredient names.
    ///
    /// `k` is a target, not a cap: recipes tied at the k-th distance are all
    /// returned, and recipes sharing a point are expanded together. Names
    /// are deduplicated in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is zero.
    pub fn recommend<S: AsRef<str>>(&self, ingredients: &[S], k: usize) -> Result<Vec<String>, KMeansError> {
        let query = self.domain.query_point(ingredients);
        let neighbors = self.index.nearest_k(&query.view(), k)?;

        debug!(
            "Query matched {} corpus points for k = {}",
            neighbors.len(),
            k
        );

        let mut seen = HashSet::new();
        let mut recommended = Vec::new();
        for neighbor in neighbors {
            for name in self.names_at(&self.index.point(neighbor.index)) {
                if seen.insert(name.as_str()) {
                    recommended.push(name.clone());
                }
            }
        }

        Ok(recommended)
    }

    /// Run k-means over the corpus points.
    pub fn cluster(&self, config: &KMeansConfig) -> Result<Clustering, KMeansError> {
        run_kmeans(&self.points(), config)
    }

    /// Translate a clustering of the corpus points into recipe names, by
    /// cluster id.
    ///
    /// # Errors
    ///
    /// Returns an error if `clustering` was not computed over this corpus.
    pub fn cluster_recipes(
        &self,
        clustering: &Clustering,
    ) -> Result<BTreeMap<usize, Vec<String>>, KMeansError> {
        if clustering.labels().len() != self.recipe_count() {
            return Err(KMeansError::InvalidDimensions(format!(
                "Clustering covers {} points, corpus has {} recipes",
                clustering.labels().len(),
                self.recipe_count()
            )));
        }

        Ok(clustering
            .members()
            .iter()
            .map(|(&id, rows)| {
                let mut seen = HashSet::new();
                let names: Vec<String> = rows
                    .iter()
                    .flat_map(|&row| self.names_at(&self.index.point(row)))
                    .filter(|name| seen.insert(name.as_str()))
                    .cloned()
                    .collect();
                (id, names)
            })
            .collect())
    }

    /// Ingredient axes of the corpus.
    pub fn domain(&self) -> &IngredientDomain {
        &self.domain
    }

    /// Corpus points, one row per recipe in input order.
    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.index.points()
    }

    /// Number of indexed recipes.
    pub fn recipe_count(&self) -> usize {
        self.recipe_count
    }

    fn names_at(&self, point: &ArrayView1<f64>) -> &[String] {
        self.names_by_point
            .get(&point_key(point))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
