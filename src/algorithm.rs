use crate::config::{EmptyClusterPolicy, KMeansConfig};
use crate::distance::{compute_centroid_shifts, validate_points};
use crate::error::KMeansError;
use crate::kdtree::KdTree;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Centroids keyed by stable cluster id.
///
/// Row `i` of `coords()` is the centroid of cluster `ids()[i]`. Ids are
/// strictly ascending and never reused, so two centroid sets from different
/// iterations line up by id even after clusters were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Centroids {
    ids: Vec<usize>,
    coords: Array2<f64>,
}

impl Centroids {
    /// Pair centroid rows with cluster ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the id count differs from the row count or the
    /// ids are not strictly ascending.
    pub fn new(ids: Vec<usize>, coords: Array2<f64>) -> Result<Self, KMeansError> {
        if ids.len() != coords.nrows() {
            return Err(KMeansError::InvalidDimensions(format!(
                "{} cluster ids for {} centroids",
                ids.len(),
                coords.nrows()
            )));
        }
        if ids.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(KMeansError::InvalidClusterCount(
                "cluster ids must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { ids, coords })
    }

    /// Cluster ids in ascending order.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Centroid coordinates, one row per id.
    pub fn coords(&self) -> ArrayView2<'_, f64> {
        self.coords.view()
    }

    /// Number of live clusters.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no cluster is left.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dimension of the centroids.
    pub fn dim(&self) -> usize {
        self.coords.ncols()
    }

    /// Centroid of cluster `id`.
    pub fn get(&self, id: usize) -> Option<ArrayView1<'_, f64>> {
        self.position(id).map(|pos| self.coords.row(pos))
    }

    fn position(&self, id: usize) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }
}

/// Final state of a k-means run
#[derive(Debug, Clone)]
pub struct Clustering {
    centroids: Centroids,
    members: BTreeMap<usize, Vec<usize>>,
    labels: Vec<usize>,
    n_iterations: usize,
    converged: bool,
}

impl Clustering {
    /// Final centroids by cluster id.
    pub fn centroids(&self) -> &Centroids {
        &self.centroids
    }

    /// Row indices of the points in each cluster, by cluster id.
    pub fn members(&self) -> &BTreeMap<usize, Vec<usize>> {
        &self.members
    }

    /// Cluster id of every input point, in input order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of clusters in the result.
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Number of Lloyd iterations performed.
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Whether the centroids settled before the iteration cap.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Copy the member points of every cluster out of `points`.
    pub fn member_points(&self, points: &ArrayView2<f64>) -> BTreeMap<usize, Array2<f64>> {
        self.members
            .iter()
            .map(|(&id, rows)| (id, points.select(Axis(0), rows)))
            .collect()
    }
}

/// Pick `k` row indices with farthest-point seeding.
///
/// The first row is drawn uniformly at random. Each further row is the
/// not-yet-chosen row with the largest sum of distances to all rows chosen so
/// far; the earliest row wins a tie.
pub fn seed_indices<R: Rng + ?Sized>(
    points: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>, KMeansError> {
    validate_points(points, "Seeding point set")?;
    validate_k(k, points.nrows())?;

    let first = rng.gen_range(0..points.nrows());
    let mut chosen = vec![first];
    let mut pool: Vec<usize> = (0..points.nrows()).filter(|&i| i != first).collect();

    while chosen.len() < k {
        let reference = KdTree::new(&points.select(Axis(0), &chosen).view())?;

        let mut farthest: Option<(usize, f64)> = None;
        for (pos, &row) in pool.iter().enumerate() {
            let total = reference.total_distance(&points.row(row))?;
            if farthest.map_or(true, |(_, best)| total > best) {
                farthest = Some((pos, total));
            }
        }

        match farthest {
            Some((pos, _)) => chosen.push(pool.remove(pos)),
            None => {
                return Err(KMeansError::InvalidClusterCount(format!(
                    "ran out of candidates after {} of {} centroids",
                    chosen.len(),
                    k
                )))
            }
        }
    }

    Ok(chosen)
}

/// Seed `k` centroids, assigning ids `0..k` in pick order.
pub fn seed_centroids<R: Rng + ?Sized>(
    points: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Result<Centroids, KMeansError> {
    let chosen = seed_indices(points, k, rng)?;
    Centroids::new((0..k).collect(), points.select(Axis(0), &chosen))
}

/// Label every point with the id of its nearest centroid.
///
/// When several centroids are equally close the one with the largest id
/// wins.
pub fn assign_points(
    points: &ArrayView2<f64>,
    centroids: &Centroids,
) -> Result<Vec<usize>, KMeansError> {
    if centroids.dim() != points.ncols() {
        return Err(KMeansError::InvalidDimensions(format!(
            "Expected {} features, got {}",
            centroids.dim(),
            points.ncols()
        )));
    }

    let tree = KdTree::new(&centroids.coords())?;

    points
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|point| {
            tree.nearest(&point)
                .map(|neighbor| centroids.ids[neighbor.index])
        })
        .collect()
}

/// Group point rows by label. Every id in `ids` gets an entry, possibly empty.
pub fn group_members(labels: &[usize], ids: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut members: BTreeMap<usize, Vec<usize>> = ids.iter().map(|&id| (id, Vec::new())).collect();
    for (row, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(row);
    }
    members
}

/// Recompute every centroid as the mean of its members.
///
/// Clusters without members follow `policy`: they either keep their previous
/// centroid or disappear from the returned set.
pub fn update_means(
    points: &ArrayView2<f64>,
    members: &BTreeMap<usize, Vec<usize>>,
    previous: &Centroids,
    policy: EmptyClusterPolicy,
) -> Result<Centroids, KMeansError> {
    let mut ids = Vec::with_capacity(previous.len());
    let mut rows: Vec<Array1<f64>> = Vec::with_capacity(previous.len());

    for (pos, &id) in previous.ids.iter().enumerate() {
        let mean = members
            .get(&id)
            .filter(|rows| !rows.is_empty())
            .and_then(|rows| points.select(Axis(0), rows).mean_axis(Axis(0)));

        match (mean, policy) {
            (Some(mean), _) => {
                ids.push(id);
                rows.push(mean);
            }
            (None, EmptyClusterPolicy::RetainPrevious) => {
                warn!("Cluster {} has no members, keeping its previous centroid", id);
                ids.push(id);
                rows.push(previous.coords.row(pos).to_owned());
            }
            (None, EmptyClusterPolicy::Drop) => {
                warn!("Cluster {} has no members, dropping it", id);
            }
        }
    }

    let mut coords = Array2::zeros((rows.len(), previous.dim()));
    for (mut target, row) in coords.rows_mut().into_iter().zip(rows.iter()) {
        target.assign(row);
    }

    Centroids::new(ids, coords)
}

/// True when every cluster of `new` moved at most `epsilon` from its
/// centroid in `old`. Clusters are matched by id.
pub fn has_converged(old: &Centroids, new: &Centroids, epsilon: f64) -> bool {
    let positions: Option<Vec<usize>> = new.ids.iter().map(|&id| old.position(id)).collect();
    let Some(positions) = positions else {
        return false;
    };

    let aligned_old = old.coords.select(Axis(0), &positions);
    compute_centroid_shifts(&aligned_old.view(), &new.coords.view())
        .iter()
        .all(|&shift| shift <= epsilon)
}

/// Run farthest-point seeded Lloyd iterations until the centroids settle or
/// `config.max_iters` is reached.
pub fn run_kmeans(points: &ArrayView2<f64>, config: &KMeansConfig) -> Result<Clustering, KMeansError> {
    validate_points(points, "Clustering point set")?;
    validate_k(config.k, points.nrows())?;

    let start = Instant::now();
    let max_iters = config.max_iters.max(1);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    info!(
        "Training k-means: {} points, {} features, {} clusters",
        points.nrows(),
        points.ncols(),
        config.k
    );

    let mut centroids = seed_centroids(points, config.k, &mut rng)?;
    let mut labels = Vec::new();
    let mut members = BTreeMap::new();
    let mut n_iterations = 0;
    let mut converged = false;

    while n_iterations < max_iters {
        let iter_start = Instant::now();
        n_iterations += 1;

        labels = assign_points(points, &centroids)?;
        members = group_members(&labels, centroids.ids());
        let new_centroids = update_means(points, &members, &centroids, config.empty_cluster_policy)?;
        converged = has_converged(&centroids, &new_centroids, config.tol);

        debug!(
            "Iteration {}/{}: {} clusters, converged = {}, time = {:.4}s",
            n_iterations,
            max_iters,
            new_centroids.len(),
            converged,
            iter_start.elapsed().as_secs_f64()
        );

        centroids = new_centroids;
        if converged {
            break;
        }
    }

    // Dropped clusters leave an empty entry behind in the last grouping.
    members.retain(|id, _| centroids.position(*id).is_some());

    if converged {
        info!(
            "Converged after {} iterations in {:.4}s",
            n_iterations,
            start.elapsed().as_secs_f64()
        );
    } else {
        warn!(
            "K-means stopped at the iteration cap ({}) without converging",
            max_iters
        );
        if config.require_convergence {
            return Err(KMeansError::NotConverged {
                iterations: n_iterations,
            });
        }
    }

    Ok(Clustering {
        centroids,
        members,
        labels,
        n_iterations,
        converged,
    })
}

fn validate_k(k: usize, n_points: usize) -> Result<(), KMeansError> {
    if k == 0 {
        return Err(KMeansError::InvalidClusterCount(
            "k must be greater than 0".to_string(),
        ));
    }
    if k > n_points {
        return Err(KMeansError::InvalidClusterCount(format!(
            "Number of points ({}) is less than k ({})",
            n_points, k
        )));
    }
    Ok(())
}
