//! Turning recipes into points.
//!
//! Every distinct known ingredient becomes one axis. Axes are ordered by
//! ingredient name so that the same corpus always yields the same coordinate
//! space.

use crate::error::KMeansError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A recipe with its ingredients already resolved to a common unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    name: String,
    ingredients: Vec<(String, f64)>,
}

impl Recipe {
    /// Create a recipe from (ingredient name, quantity) pairs.
    ///
    /// An ingredient listed more than once is merged into a single entry
    /// whose quantity is the sum of all its listings.
    ///
    /// # Errors
    ///
    /// Returns an error if any quantity is negative or not finite.
    pub fn new<N, I, S>(name: N, ingredients: I) -> Result<Self, KMeansError>
    where
        N: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut merged: Vec<(String, f64)> = Vec::new();

        for (ingredient, quantity) in ingredients {
            let ingredient = ingredient.into();
            if !quantity.is_finite() || quantity < 0.0 {
                return Err(KMeansError::InvalidQuantity(format!(
                    "{} in recipe '{}' has quantity {}",
                    ingredient, name, quantity
                )));
            }

            match merged.iter_mut().find(|(n, _)| *n == ingredient) {
                Some((_, total)) => *total += quantity,
                None => merged.push((ingredient, quantity)),
            }
        }

        Ok(Self {
            name,
            ingredients: merged,
        })
    }

    /// Recipe name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ingredients in listing order, repeated names merged.
    pub fn ingredients(&self) -> &[(String, f64)] {
        &self.ingredients
    }

    /// Name to quantity map, without the unresolved sentinel.
    pub fn ingredient_quantities(&self, unresolved: &str) -> BTreeMap<String, f64> {
        self.ingredients
            .iter()
            .filter(|(name, _)| name != unresolved)
            .map(|(name, quantity)| (name.clone(), *quantity))
            .collect()
    }

    /// Ingredients ordered by descending quantity.
    pub fn ranked_ingredients(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .ingredients
            .iter()
            .map(|(name, quantity)| (name.as_str(), *quantity))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// How ingredient quantities are encoded on each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointMode {
    /// Quantity divided by the largest quantity seen for that ingredient.
    /// Used for corpus recipes.
    Normalized,
    /// 1.0 when the ingredient is present at all. Used for user queries.
    Presence,
}

/// The known ingredients of a corpus and the largest quantity seen for each.
///
/// Axis `i` of every point built from this domain is `names()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientDomain {
    names: Vec<String>,
    max_quantities: Vec<f64>,
}

impl IngredientDomain {
    /// Scan `recipes` and keep the largest quantity of every ingredient,
    /// skipping the `unresolved` sentinel.
    pub fn from_recipes(recipes: &[Recipe], unresolved: &str) -> Self {
        let mut max_by_name: BTreeMap<&str, f64> = BTreeMap::new();

        for recipe in recipes {
            for (name, quantity) in recipe.ingredients() {
                if name == unresolved {
                    continue;
                }
                let max = max_by_name.entry(name.as_str()).or_insert(*quantity);
                if *quantity > *max {
                    *max = *quantity;
                }
            }
        }

        let domain = Self {
            names: max_by_name.keys().map(|name| name.to_string()).collect(),
            max_quantities: max_by_name.values().copied().collect(),
        };
        domain.warn_zero_axes();
        domain
    }

    /// Build a domain from explicit (ingredient, max quantity) pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a maximum is negative or not finite.
    pub fn from_max_quantities<I, S>(entries: I) -> Result<Self, KMeansError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut max_by_name: BTreeMap<String, f64> = BTreeMap::new();
        for (name, max) in entries {
            let name = name.into();
            if !max.is_finite() || max < 0.0 {
                return Err(KMeansError::InvalidQuantity(format!(
                    "maximum of {} is {}",
                    name, max
                )));
            }
            let entry = max_by_name.entry(name).or_insert(max);
            *entry = entry.max(max);
        }

        let domain = Self {
            names: max_by_name.keys().cloned().collect(),
            max_quantities: max_by_name.into_values().collect(),
        };
        domain.warn_zero_axes();
        Ok(domain)
    }

    /// Number of axes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no ingredient is known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ingredient names in axis order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Largest quantity seen for `name`, if it is a known ingredient.
    pub fn max_quantity(&self, name: &str) -> Option<f64> {
        self.axis(name).map(|axis| self.max_quantities[axis])
    }

    /// Axis of `name`, if it is a known ingredient.
    pub fn axis(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    /// Encode an ingredient to quantity map as a point in this domain.
    ///
    /// Ingredients unknown to the domain are ignored. An axis whose maximum
    /// is zero always contributes 0 in normalized mode.
    pub fn build_point(&self, quantities: &BTreeMap<String, f64>, mode: PointMode) -> Array1<f64> {
        self.names
            .iter()
            .zip(self.max_quantities.iter())
            .map(|(name, &max)| match (quantities.get(name), mode) {
                (None, _) => 0.0,
                (Some(_), PointMode::Presence) => 1.0,
                (Some(_), PointMode::Normalized) if max == 0.0 => 0.0,
                (Some(&quantity), PointMode::Normalized) => quantity / max,
            })
            .collect()
    }

    /// Presence-mode point for a set of ingredient names.
    pub fn query_point<S: AsRef<str>>(&self, names: &[S]) -> Array1<f64> {
        let mut point = Array1::zeros(self.len());
        for name in names {
            match self.axis(name.as_ref()) {
                Some(axis) => point[axis] = 1.0,
                None => debug!("Ignoring unknown query ingredient '{}'", name.as_ref()),
            }
        }
        point
    }

    /// Normalized-mode points for `recipes`, one row per recipe.
    pub fn build_points(&self, recipes: &[Recipe], unresolved: &str) -> Array2<f64> {
        let mut points = Array2::zeros((recipes.len(), self.len()));
        for (mut row, recipe) in points.rows_mut().into_iter().zip(recipes) {
            let quantities = recipe.ingredient_quantities(unresolved);
            row.assign(&self.build_point(&quantities, PointMode::Normalized));
        }
        points
    }

    fn warn_zero_axes(&self) {
        let zero_axes: Vec<&str> = self
            .names
            .iter()
            .zip(self.max_quantities.iter())
            .filter(|(_, &max)| max == 0.0)
            .map(|(name, _)| name.as_str())
            .collect();

        if !zero_axes.is_empty() {
            warn!(
                "Ingredients with zero maximum quantity contribute nothing: {:?}",
                zero_axes
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const UNRESOLVED: &str = "undefined";

    fn recipe(name: &str, ingredients: &[(&str, f64)]) -> Recipe {
        Recipe::new(name, ingredients.iter().copied()).unwrap()
    }

    #[test]
    fn test_recipe_merges_repeated_ingredients() {
        let r = recipe("cake", &[("flour", 1.0), ("egg", 2.0), ("flour", 0.5)]);

        assert_eq!(r.ingredients().len(), 2);
        assert_eq!(r.ingredients()[0], ("flour".to_string(), 1.5));
    }

    #[test]
    fn test_recipe_rejects_bad_quantity() {
        let negative = Recipe::new("bad", [("salt", -1.0)]);
        assert!(matches!(negative, Err(KMeansError::InvalidQuantity(_))));

        let nan = Recipe::new("bad", [("salt", f64::NAN)]);
        assert!(matches!(nan, Err(KMeansError::InvalidQuantity(_))));
    }

    #[test]
    fn test_ranked_ingredients() {
        let r = recipe("soup", &[("salt", 0.1), ("water", 4.0), ("carrot", 1.0)]);
        let ranked: Vec<&str> = r.ranked_ingredients().iter().map(|(n, _)| *n).collect();
        assert_eq!(ranked, vec!["water", "carrot", "salt"]);
    }

    #[test]
    fn test_domain_sorted_and_maxed() {
        let recipes = vec![
            recipe("a", &[("sugar", 1.0), ("egg", 2.0), (UNRESOLVED, 5.0)]),
            recipe("b", &[("egg", 3.0), ("butter", 0.5)]),
        ];
        let domain = IngredientDomain::from_recipes(&recipes, UNRESOLVED);

        assert_eq!(domain.names(), &["butter", "egg", "sugar"]);
        assert_eq!(domain.max_quantity("egg"), Some(3.0));
        assert_eq!(domain.max_quantity(UNRESOLVED), None);
    }

    #[test]
    fn test_domain_order_independent_of_input_order() {
        let forward = vec![
            recipe("a", &[("zucchini", 1.0)]),
            recipe("b", &[("apple", 1.0)]),
        ];
        let backward: Vec<Recipe> = forward.iter().rev().cloned().collect();

        assert_eq!(
            IngredientDomain::from_recipes(&forward, UNRESOLVED),
            IngredientDomain::from_recipes(&backward, UNRESOLVED)
        );
    }

    #[test]
    fn test_normalized_and_presence_modes() {
        let domain =
            IngredientDomain::from_max_quantities([("egg", 4.0), ("flour", 2.0), ("milk", 1.0)])
                .unwrap();
        let quantities: BTreeMap<String, f64> =
            [("egg".to_string(), 1.0), ("flour".to_string(), 2.0)].into();

        let normalized = domain.build_point(&quantities, PointMode::Normalized);
        assert_eq!(normalized, array![0.25, 1.0, 0.0]);

        let presence = domain.build_point(&quantities, PointMode::Presence);
        assert_eq!(presence, array![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_zero_max_contributes_zero() {
        let domain = IngredientDomain::from_max_quantities([("pepper", 1.0), ("salt", 0.0)]).unwrap();
        let quantities: BTreeMap<String, f64> = [("salt".to_string(), 0.0)].into();

        let point = domain.build_point(&quantities, PointMode::Normalized);
        assert_eq!(point, array![0.0, 0.0]);
        assert!(point.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_query_point_ignores_unknown() {
        let domain = IngredientDomain::from_max_quantities([("egg", 1.0), ("salt", 1.0)]).unwrap();
        let point = domain.query_point(&["salt", "saffron"]);
        assert_eq!(point, array![0.0, 1.0]);
    }

    #[test]
    fn test_build_points_rows() {
        let recipes = vec![
            recipe("a", &[("egg", 2.0), (UNRESOLVED, 1.0)]),
            recipe("b", &[("egg", 1.0), ("salt", 3.0)]),
        ];
        let domain = IngredientDomain::from_recipes(&recipes, UNRESOLVED);
        let points = domain.build_points(&recipes, UNRESOLVED);

        assert_eq!(points.dim(), (2, 2));
        assert_eq!(points, array![[1.0, 0.0], [0.5, 1.0]]);
    }
}
