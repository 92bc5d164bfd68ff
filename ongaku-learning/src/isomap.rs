//! Isomap manifold learning
//!
//! Embeds high-dimensional points into a low-dimensional metric space
//! while preserving geodesic structure: build a k-nearest-neighbour
//! graph, measure shortest paths through it with Dijkstra, then run
//! classical multidimensional scaling on the geodesic distance matrix.
//! The eigendecomposition in the MDS step uses power iteration with
//! deflation, so no linear-algebra backend is required.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::{Array1, Array2};
use tracing::warn;

use ongaku_common::{Error, Result};

const MDS_POWER_ITERATIONS: usize = 100;
const EIGENVALUE_FLOOR: f64 = 1e-9;

/// Isomap parameters
#[derive(Debug, Clone, Copy)]
pub struct IsomapConfig {
    /// Neighbours per point in the geodesic graph
    pub n_neighbors: usize,
    /// Output dimensionality (clamped to `n_points - 1`)
    pub n_components: usize,
}

impl Default for IsomapConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            n_components: 45,
        }
    }
}

/// Embed `data` (`n_points x n_features`) into `n_components` dimensions.
///
/// Fails with `InvalidInput` when the neighbour graph is disconnected;
/// a larger `n_neighbors` usually fixes that.
pub fn isomap(data: &Array2<f64>, config: &IsomapConfig) -> Result<Array2<f64>> {
    let n = data.nrows();
    if n == 0 {
        return Err(Error::InvalidInput("cannot embed an empty corpus".into()));
    }
    if config.n_neighbors == 0 {
        return Err(Error::InvalidInput(
            "isomap needs at least one neighbour per point".into(),
        ));
    }

    let mut n_components = config.n_components;
    if n_components >= n && n > 1 {
        warn!(
            requested = config.n_components,
            clamped = n - 1,
            "more components requested than points can support"
        );
        n_components = n - 1;
    }
    if n == 1 {
        return Ok(Array2::zeros((1, n_components.max(1))));
    }

    let euclidean = pairwise_distances(data);
    let graph = neighbor_graph(&euclidean, config.n_neighbors.min(n - 1));
    let geodesic = geodesic_distances(&graph, n)?;
    Ok(classical_mds(&geodesic, n_components))
}

fn pairwise_distances(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows();
    let mut distances = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = &data.row(i) - &data.row(j);
            let d = diff.dot(&diff).sqrt();
            distances[[i, j]] = d;
            distances[[j, i]] = d;
        }
    }
    distances
}

/// Symmetrized kNN graph as adjacency lists: an edge exists when either
/// endpoint counts the other among its k nearest
fn neighbor_graph(distances: &Array2<f64>, k: usize) -> Vec<Vec<(usize, f64)>> {
    let n = distances.nrows();
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for i in 0..n {
        let mut order: Vec<usize> = (0..n).filter(|&j| j != i).collect();
        order.sort_by(|&a, &b| distances[[i, a]].total_cmp(&distances[[i, b]]));
        for &j in order.iter().take(k) {
            let d = distances[[i, j]];
            if !adjacency[i].iter().any(|&(nbr, _)| nbr == j) {
                adjacency[i].push((j, d));
            }
            if !adjacency[j].iter().any(|&(nbr, _)| nbr == i) {
                adjacency[j].push((i, d));
            }
        }
    }
    adjacency
}

#[derive(Debug, PartialEq)]
struct QueueEntry {
    distance: f64,
    node: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// All-pairs shortest paths over the neighbour graph
fn geodesic_distances(graph: &[Vec<(usize, f64)>], n: usize) -> Result<Array2<f64>> {
    let mut geodesic = Array2::from_elem((n, n), f64::INFINITY);
    for source in 0..n {
        let mut dist = vec![f64::INFINITY; n];
        dist[source] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry {
            distance: 0.0,
            node: source,
        });
        while let Some(QueueEntry { distance, node }) = heap.pop() {
            if distance > dist[node] {
                continue;
            }
            for &(next, weight) in &graph[node] {
                let candidate = distance + weight;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    heap.push(QueueEntry {
                        distance: candidate,
                        node: next,
                    });
                }
            }
        }
        if dist.iter().any(|d| d.is_infinite()) {
            return Err(Error::InvalidInput(
                "neighbour graph is disconnected; increase the neighbour count".into(),
            ));
        }
        for (target, &d) in dist.iter().enumerate() {
            geodesic[[source, target]] = d;
        }
    }
    Ok(geodesic)
}

/// Classical MDS: double-centre the squared distances, then read the
/// embedding off the leading eigenpairs of B = -1/2 J D² J
fn classical_mds(distances: &Array2<f64>, n_components: usize) -> Array2<f64> {
    let n = distances.nrows();
    let mut b = distances.mapv(|d| d * d);

    let row_means: Array1<f64> = b
        .rows()
        .into_iter()
        .map(|row| row.mean().unwrap_or(0.0))
        .collect();
    let grand_mean = row_means.mean().unwrap_or(0.0);
    for i in 0..n {
        for j in 0..n {
            b[[i, j]] = -0.5 * (b[[i, j]] - row_means[i] - row_means[j] + grand_mean);
        }
    }

    let mut coords = Array2::zeros((n, n_components));
    for comp in 0..n_components {
        let Some((eigenvalue, eigenvector)) = dominant_eigenpair(&b, comp) else {
            break;
        };
        if eigenvalue <= EIGENVALUE_FLOOR {
            // remaining spectrum is non-positive, leave the columns zero
            break;
        }
        let scale = eigenvalue.sqrt();
        for i in 0..n {
            coords[[i, comp]] = eigenvector[i] * scale;
        }
        // deflate: B <- B - lambda v vᵀ
        for i in 0..n {
            for j in 0..n {
                b[[i, j]] -= eigenvalue * eigenvector[i] * eigenvector[j];
            }
        }
    }
    coords
}

fn dominant_eigenpair(matrix: &Array2<f64>, seed: usize) -> Option<(f64, Array1<f64>)> {
    let n = matrix.nrows();
    let mut v = crate::pca::seeded_direction(n, seed as u64);
    let norm = v.dot(&v).sqrt();
    if norm < EIGENVALUE_FLOOR {
        return None;
    }
    v /= norm;

    for _ in 0..MDS_POWER_ITERATIONS {
        let next = matrix.dot(&v);
        let norm = next.dot(&next).sqrt();
        if norm < EIGENVALUE_FLOOR {
            return None;
        }
        v = next / norm;
    }
    let eigenvalue = v.dot(&matrix.dot(&v));
    Some((eigenvalue, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn collinear_points_unroll_onto_one_axis() {
        // Six equally spaced points on a line in 5 dimensions
        let direction = [0.2, 0.4, 0.1, 0.8, 0.4];
        let mut data = Array2::zeros((6, 5));
        for i in 0..6 {
            for (j, d) in direction.iter().enumerate() {
                data[[i, j]] = i as f64 * d;
            }
        }
        let step = direction.iter().map(|d| d * d).sum::<f64>().sqrt();

        let config = IsomapConfig {
            n_neighbors: 2,
            n_components: 2,
        };
        let coords = isomap(&data, &config).unwrap();
        assert_eq!(coords.dim(), (6, 2));

        // First component recovers the line spacing, second collapses
        for i in 0..5 {
            let gap = (coords[[i + 1, 0]] - coords[[i, 0]]).abs();
            assert!(
                (gap - step).abs() < 0.05,
                "gap {} should be near {}",
                gap,
                step
            );
        }
        for i in 0..6 {
            assert!(coords[[i, 1]].abs() < 0.05);
        }
    }

    #[test]
    fn disconnected_graph_is_rejected() {
        // Two tight clusters far apart with k=1: no path between them
        let data = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [100.0, 0.0],
            [100.1, 0.0],
        ];
        let config = IsomapConfig {
            n_neighbors: 1,
            n_components: 2,
        };
        let err = isomap(&data, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn component_request_is_clamped_to_point_count() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let config = IsomapConfig {
            n_neighbors: 2,
            n_components: 45,
        };
        let coords = isomap(&data, &config).unwrap();
        assert_eq!(coords.dim(), (3, 2));
    }

    #[test]
    fn zero_neighbors_is_invalid() {
        let data = array![[0.0], [1.0]];
        let config = IsomapConfig {
            n_neighbors: 0,
            n_components: 1,
        };
        assert!(matches!(
            isomap(&data, &config),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn embedding_distances_match_geodesics_on_a_square() {
        // Four corners of a unit square, fully connected with k=3
        let data = array![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ];
        let config = IsomapConfig {
            n_neighbors: 3,
            n_components: 2,
        };
        let coords = isomap(&data, &config).unwrap();
        let dist = |i: usize, j: usize| -> f64 {
            let diff = &coords.row(i) - &coords.row(j);
            diff.dot(&diff).sqrt()
        };
        // Edges are length 1, diagonals sqrt(2)
        assert!((dist(0, 1) - 1.0).abs() < 0.05);
        assert!((dist(1, 2) - 1.0).abs() < 0.05);
        assert!((dist(0, 2) - 2f64.sqrt()).abs() < 0.05);
    }
}
