//! Basic example: cluster a small recipe corpus and ask for recommendations
//!
//! Run with: RUST_LOG=debug cargo run --example basic

use recipe_kmeans_rs::{objective, KMeansConfig, KMeansError, Recipe, Recommender, RecommenderConfig};
use tracing_subscriber::EnvFilter;

fn corpus() -> Result<Vec<Recipe>, KMeansError> {
    Ok(vec![
        Recipe::new("pancakes", [("flour", 1.5), ("milk", 1.25), ("egg", 0.5), ("sugar", 0.2)])?,
        Recipe::new("waffles", [("flour", 2.0), ("milk", 1.75), ("egg", 0.5), ("butter", 0.5)])?,
        Recipe::new("crepes", [("flour", 1.0), ("milk", 1.5), ("egg", 0.75)])?,
        Recipe::new("omelette", [("egg", 0.75), ("milk", 0.1), ("salt", 0.02)])?,
        Recipe::new("scrambled eggs", [("egg", 1.0), ("butter", 0.1), ("salt", 0.02)])?,
        Recipe::new("vinaigrette", [("oil", 0.75), ("vinegar", 0.25), ("salt", 0.01)])?,
        Recipe::new("mayonnaise", [("oil", 1.0), ("egg", 0.25), ("vinegar", 0.05)])?,
        Recipe::new("shortbread", [("flour", 2.0), ("butter", 1.0), ("sugar", 0.5)])?,
        Recipe::new("mystery stew", [("undefined", 2.0), ("salt", 0.05)])?,
    ])
}

fn main() -> Result<(), KMeansError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== recipe-kmeans-rs example ===\n");

    let recipes = corpus()?;
    let recommender = Recommender::new(&recipes, RecommenderConfig::default())?;

    println!(
        "Indexed {} recipes over {} ingredients: {:?}\n",
        recommender.recipe_count(),
        recommender.domain().len(),
        recommender.domain().names()
    );

    let config = KMeansConfig::new(3).with_seed(42);
    let clustering = recommender.cluster(&config)?;
    let j = objective(&clustering, &recommender.points())?;

    println!(
        "K-means with k={} finished after {} iterations (converged: {}, J = {:.4})",
        config.k,
        clustering.n_iterations(),
        clustering.converged(),
        j
    );
    for (id, names) in recommender.cluster_recipes(&clustering)? {
        println!("  Cluster {}: {}", id, names.join(", "));
    }
    println!();

    for query in [vec!["egg", "salt"], vec!["flour", "milk"], vec!["oil", "vinegar"]] {
        let names = recommender.recommend(&query, 2)?;
        println!("Ingredients {:?} -> {}", query, names.join(", "));
    }

    println!("\n=== Done! ===");
    Ok(())
}
