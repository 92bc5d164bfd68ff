//! Geometry over the embedded space
//!
//! A playlist shape starts from a straight line between two songs. The
//! line is sampled at a fixed resolution, and every song in the corpus
//! is assigned to its nearest sample point; the shapes then decide which
//! assignments fall inside them. Ties always resolve to the earlier
//! sample point so repeated runs produce identical playlists.

use ndarray::{Array1, Array2, ArrayView1};

use ongaku_common::{Error, Manifold, Result};

/// A song's relation to the sampled line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePosition {
    /// Index of the nearest sample point along the line
    pub sample: usize,
    /// Distance from the song to that sample point
    pub distance: f64,
}

/// A manifold together with line-sampling helpers
#[derive(Debug)]
pub struct SongSpace<'a> {
    manifold: &'a Manifold,
}

impl<'a> SongSpace<'a> {
    pub fn new(manifold: &'a Manifold) -> Self {
        Self { manifold }
    }

    pub fn manifold(&self) -> &Manifold {
        self.manifold
    }

    /// Look a tag up, with a playlist-friendly error
    pub fn index_of(&self, tag: &str) -> Result<usize> {
        self.manifold
            .index_of(tag)
            .ok_or_else(|| Error::NotFound(format!("song not in manifold: {tag}")))
    }

    /// Sample `resolution` evenly spaced points from song `a` to song `b`,
    /// endpoints included. The resolution must be even (shape profiles
    /// mirror around the midpoint) and at least 2.
    pub fn line_points(&self, a: usize, b: usize, resolution: usize) -> Result<Array2<f64>> {
        if resolution < 2 || resolution % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "line resolution must be even and at least 2, got {resolution}"
            )));
        }
        let start = self.manifold.coords().row(a);
        let end = self.manifold.coords().row(b);
        let dims = start.len();

        let mut points = Array2::zeros((resolution, dims));
        for i in 0..resolution {
            let t = i as f64 / (resolution - 1) as f64;
            for d in 0..dims {
                points[[i, d]] = start[d] + t * (end[d] - start[d]);
            }
        }
        Ok(points)
    }

    /// For every song, the nearest line sample and the distance to it
    pub fn line_positions(&self, line: &Array2<f64>) -> Vec<LinePosition> {
        self.manifold
            .coords()
            .rows()
            .into_iter()
            .map(|song| nearest_sample(song, line))
            .collect()
    }

    /// Indices of the `count` nearest songs to `seed`, nearest first,
    /// the seed itself excluded
    pub fn nearest_neighbors(&self, seed: usize, count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.manifold.len()).filter(|&i| i != seed).collect();
        order.sort_by(|&a, &b| {
            self.manifold
                .distance(seed, a)
                .total_cmp(&self.manifold.distance(seed, b))
                .then(a.cmp(&b))
        });
        order.truncate(count);
        order
    }
}

fn nearest_sample(song: ArrayView1<'_, f64>, line: &Array2<f64>) -> LinePosition {
    let mut best = LinePosition {
        sample: 0,
        distance: f64::INFINITY,
    };
    for (i, point) in line.rows().into_iter().enumerate() {
        let diff: Array1<f64> = &song - &point;
        let d = diff.dot(&diff).sqrt();
        if d < best.distance {
            best = LinePosition {
                sample: i,
                distance: d,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn manifold() -> Manifold {
        Manifold::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            array![
                [0.0, 0.0],
                [10.0, 0.0],
                [5.0, 1.0],
                [9.0, 3.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn line_points_span_the_endpoints() {
        let m = manifold();
        let space = SongSpace::new(&m);
        let line = space.line_points(0, 1, 6).unwrap();
        assert_eq!(line.dim(), (6, 2));
        assert_eq!(line.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(line.row(5).to_vec(), vec![10.0, 0.0]);
        assert!((line[[1, 0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn odd_resolution_is_rejected() {
        let m = manifold();
        let space = SongSpace::new(&m);
        assert!(space.line_points(0, 1, 5).is_err());
        assert!(space.line_points(0, 1, 0).is_err());
    }

    #[test]
    fn positions_pick_the_nearest_sample() {
        let m = manifold();
        let space = SongSpace::new(&m);
        let line = space.line_points(0, 1, 6).unwrap();
        let positions = space.line_positions(&line);

        // Song "c" at (5, 1) sits between samples 2 (4,0) and 3 (6,0),
        // equidistant; the earlier sample wins
        assert_eq!(positions[2].sample, 2);
        assert!((positions[2].distance - 2f64.sqrt()).abs() < 1e-12);

        // Endpoints land on their own sample at distance zero
        assert_eq!(positions[0].sample, 0);
        assert!(positions[0].distance < 1e-12);
        assert_eq!(positions[1].sample, 5);
    }

    #[test]
    fn nearest_neighbors_sort_by_distance() {
        let m = manifold();
        let space = SongSpace::new(&m);
        // Distances from "b" (10,0): d=sqrt(10), c=sqrt(26), a=10
        assert_eq!(space.nearest_neighbors(1, 2), vec![3, 2]);
        assert_eq!(space.nearest_neighbors(1, 10), vec![3, 2, 0]);
    }

    #[test]
    fn unknown_tag_is_not_found() {
        let m = manifold();
        let space = SongSpace::new(&m);
        assert!(matches!(space.index_of("zz"), Err(Error::NotFound(_))));
        assert_eq!(space.index_of("c").unwrap(), 2);
    }
}
