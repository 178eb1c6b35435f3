use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use recipe_kmeans_rs::{KMeans, KMeansConfig, KdTree, Recipe, Recommender, RecommenderConfig};
use std::time::Duration;

fn benchmark_kmeans_varying_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans_samples");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_features = 32;
    let k = 10;
    let sample_sizes = [500, 2_000, 5_000];

    for n_samples in sample_sizes.iter() {
        group.throughput(Throughput::Elements(*n_samples as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_samples),
            n_samples,
            |b, &n_samples| {
                let data = Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0));
                let config = KMeansConfig::new(k).with_max_iters(5).with_seed(42);

                b.iter(|| {
                    let mut kmeans = KMeans::with_config(config.clone());
                    kmeans.fit(black_box(&data.view())).unwrap();
                    kmeans
                });
            },
        );
    }
    group.finish();
}

fn benchmark_kmeans_varying_clusters(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans_clusters");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_samples = 2_000;
    let n_features = 32;
    let cluster_counts = [5, 20, 50];

    for k in cluster_counts.iter() {
        group.throughput(Throughput::Elements(*k as u64));
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            let data = Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0));
            let config = KMeansConfig::new(k).with_max_iters(5).with_seed(42);

            b.iter(|| {
                let mut kmeans = KMeans::with_config(config.clone());
                kmeans.fit(black_box(&data.view())).unwrap();
                kmeans
            });
        });
    }
    group.finish();
}

fn benchmark_nearest_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_nearest_k");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_features = 8;
    let index_sizes = [1_000, 10_000];

    for n_points in index_sizes.iter() {
        group.throughput(Throughput::Elements(*n_points as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_points),
            n_points,
            |b, &n_points| {
                let data = Array2::random((n_points, n_features), Uniform::new(-1.0, 1.0));
                let queries = Array2::random((100, n_features), Uniform::new(-1.0, 1.0));
                let tree = KdTree::new(&data.view()).unwrap();

                b.iter(|| {
                    for query in queries.rows() {
                        black_box(tree.nearest_k(&query, 10).unwrap());
                    }
                });
            },
        );
    }
    group.finish();
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    // Synthetic corpus: every recipe uses a sliding window of ingredients
    let ingredients: Vec<String> = (0..60).map(|i| format!("ingredient{:02}", i)).collect();
    let recipes: Vec<Recipe> = (0..2_000)
        .map(|r| {
            let used = (0..6).map(|j| {
                let name = ingredients[(r * 7 + j * 11) % ingredients.len()].clone();
                (name, 1.0 + ((r + j) % 5) as f64)
            });
            Recipe::new(format!("recipe{}", r), used).unwrap()
        })
        .collect();
    let recommender = Recommender::new(&recipes, RecommenderConfig::default()).unwrap();
    let query = ["ingredient03", "ingredient14", "ingredient25"];

    group.bench_function("2k_recipes_k10", |b| {
        b.iter(|| recommender.recommend(black_box(&query), 10).unwrap());
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_kmeans_varying_samples,
    benchmark_kmeans_varying_clusters,
    benchmark_nearest_k,
    benchmark_recommend,
);
criterion_main!(benches);
