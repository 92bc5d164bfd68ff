//! Playlist shapes
//!
//! Playlists are derived from shapes in the embedded space:
//!
//! - **nearest**: a seed song plus its nearest neighbours
//! - **line**: the songs closest to each sample point of a line between
//!   two songs
//! - **swept shapes** (cone, inverse cone, cylinder): a radius profile
//!   swept along the line; every song within the profile at its nearest
//!   line position is included. The radius grows until the playlist is
//!   long enough or the shape has swallowed the whole line neighbourhood.
//!
//! Swept playlists run in line order from the first song to the second,
//! so a cone from a mellow song to a harsh one plays as a transition.

use tracing::debug;

use ongaku_common::config::PlaylistConfig;
use ongaku_common::{Error, Manifold, Result};

use crate::space::{LinePosition, SongSpace};

/// Starting sweep radius before any growth rounds
const INITIAL_RADIUS: f64 = 1.0;

/// Radius profile swept along the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepShape {
    /// Zero radius at both endpoints, widest at the midpoint
    Cone,
    /// Widest at both endpoints, pinched to zero at the midpoint
    InverseCone,
    /// Constant radius along the whole line
    Cylinder,
}

impl SweepShape {
    /// Profile value in `[0, 1]` at sample `i` of `resolution`
    fn profile(&self, i: usize, resolution: usize) -> f64 {
        let t = i as f64 / (resolution - 1) as f64;
        let edge_distance = 1.0 - (2.0 * t - 1.0).abs();
        match self {
            SweepShape::Cone => edge_distance,
            SweepShape::InverseCone => 1.0 - edge_distance,
            SweepShape::Cylinder => 1.0,
        }
    }
}

/// An ordered list of corpus tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tags: Vec<String>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Derives playlists from a manifold
#[derive(Debug)]
pub struct PlaylistBuilder<'a> {
    space: SongSpace<'a>,
    config: PlaylistConfig,
}

impl<'a> PlaylistBuilder<'a> {
    pub fn new(manifold: &'a Manifold) -> Self {
        Self {
            space: SongSpace::new(manifold),
            config: PlaylistConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlaylistConfig) -> Self {
        self.config = config;
        self
    }

    /// The seed song followed by its `length - 1` nearest neighbours
    pub fn nearest(&self, seed: &str, length: usize) -> Result<Playlist> {
        if length == 0 {
            return Err(Error::InvalidInput(
                "a playlist needs at least one song".into(),
            ));
        }
        let seed_index = self.space.index_of(seed)?;
        let manifold = self.space.manifold();

        let mut tags = vec![manifold.tags()[seed_index].clone()];
        for i in self.space.nearest_neighbors(seed_index, length - 1) {
            tags.push(manifold.tags()[i].clone());
        }
        Ok(Playlist {
            name: format!("nearest {seed}"),
            tags,
        })
    }

    /// The song nearest each sample point of the line from `a` to `b`,
    /// duplicates dropped while keeping first-appearance order
    pub fn line(&self, a: &str, b: &str) -> Result<Playlist> {
        let (ia, ib) = (self.space.index_of(a)?, self.space.index_of(b)?);
        let line = self
            .space
            .line_points(ia, ib, self.config.line_resolution)?;
        let manifold = self.space.manifold();

        let mut tags: Vec<String> = Vec::new();
        for point in line.rows() {
            let mut best = 0usize;
            let mut best_distance = f64::INFINITY;
            for (i, song) in manifold.coords().rows().into_iter().enumerate() {
                let diff = &song - &point;
                let d = diff.dot(&diff).sqrt();
                if d < best_distance {
                    best = i;
                    best_distance = d;
                }
            }
            let tag = &manifold.tags()[best];
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        Ok(Playlist {
            name: format!("line {a} to {b}"),
            tags,
        })
    }

    /// Cone swept from `a` to `b`: narrow at the endpoints, widest in
    /// the middle
    pub fn cone(&self, a: &str, b: &str) -> Result<Playlist> {
        self.swept(a, b, SweepShape::Cone)
    }

    /// Inverse cone swept from `a` to `b`: widest at the endpoints,
    /// pinched in the middle
    pub fn inverse_cone(&self, a: &str, b: &str) -> Result<Playlist> {
        self.swept(a, b, SweepShape::InverseCone)
    }

    /// Cylinder swept from `a` to `b`: constant radius along the line
    pub fn cylinder(&self, a: &str, b: &str) -> Result<Playlist> {
        self.swept(a, b, SweepShape::Cylinder)
    }

    /// Sweep `shape` along the line from `a` to `b`, growing the radius
    /// until the playlist reaches the configured minimum length (or the
    /// radius exceeds the endpoint distance, whichever comes first)
    pub fn swept(&self, a: &str, b: &str, shape: SweepShape) -> Result<Playlist> {
        let (ia, ib) = (self.space.index_of(a)?, self.space.index_of(b)?);
        let resolution = self.config.line_resolution;
        let line = self.space.line_points(ia, ib, resolution)?;
        let positions = self.space.line_positions(&line);
        let span = self.space.manifold().distance(ia, ib);

        let mut radius = INITIAL_RADIUS;
        let mut members = self.members_within(&positions, shape, radius, resolution);
        while members.len() < self.config.min_length && radius <= span {
            radius += self.config.growth_step;
            members = self.members_within(&positions, shape, radius, resolution);
        }
        debug!(
            shape = ?shape,
            radius,
            songs = members.len(),
            "sweep settled"
        );

        let manifold = self.space.manifold();
        let tags = members
            .into_iter()
            .map(|i| manifold.tags()[i].clone())
            .collect();
        let label = match shape {
            SweepShape::Cone => "cone",
            SweepShape::InverseCone => "inverse cone",
            SweepShape::Cylinder => "cylinder",
        };
        Ok(Playlist {
            name: format!("{label} {a} to {b}"),
            tags,
        })
    }

    /// Songs inside the profile at radius `radius`, ordered by line
    /// position (manifold order breaks ties)
    fn members_within(
        &self,
        positions: &[LinePosition],
        shape: SweepShape,
        radius: f64,
        resolution: usize,
    ) -> Vec<usize> {
        let mut members: Vec<usize> = positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance <= radius * shape.profile(p.sample, resolution))
            .map(|(i, _)| i)
            .collect();
        members.sort_by_key(|&i| (positions[i].sample, i));
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Twelve songs spaced 1 apart on the x axis, with three outliers
    /// hovering above the line
    fn manifold() -> Manifold {
        let mut coords = Vec::new();
        let mut tags = Vec::new();
        for i in 0..12 {
            tags.push(format!("on{i}"));
            coords.push([i as f64, 0.0]);
        }
        tags.push("mid-high".into());
        coords.push([5.5, 2.0]);
        tags.push("start-high".into());
        coords.push([0.0, 2.5]);
        tags.push("end-high".into());
        coords.push([11.0, 2.5]);

        let flat: Vec<f64> = coords.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((tags.len(), 2), flat).unwrap();
        Manifold::new(tags, matrix).unwrap()
    }

    fn config(resolution: usize, min_length: usize) -> PlaylistConfig {
        PlaylistConfig {
            line_resolution: resolution,
            min_length,
            growth_step: 1.0,
        }
    }

    #[test]
    fn nearest_starts_at_the_seed() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m).with_config(config(12, 1));
        let playlist = builder.nearest("on5", 4).unwrap();
        assert_eq!(playlist.len(), 4);
        assert_eq!(playlist.tags[0], "on5");
        // neighbours at distance 1 come before the outlier at distance 2+
        assert_eq!(playlist.tags[1..3].to_vec(), vec!["on4".to_string(), "on6".into()]);
    }

    #[test]
    fn line_runs_from_start_to_end_without_duplicates() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m).with_config(config(100, 1));
        let playlist = builder.line("on0", "on11").unwrap();
        let expected: Vec<String> = (0..12).map(|i| format!("on{i}")).collect();
        assert_eq!(playlist.tags, expected);
    }

    #[test]
    fn cylinder_keeps_every_on_line_song() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m).with_config(config(12, 1));
        let playlist = builder.cylinder("on0", "on11").unwrap();
        // radius 1 covers the on-line songs but none of the outliers
        assert_eq!(playlist.len(), 12);
        assert_eq!(playlist.tags[0], "on0");
        assert_eq!(playlist.tags[11], "on11");
        assert!(!playlist.tags.contains(&"mid-high".to_string()));
    }

    #[test]
    fn cone_admits_the_midline_outlier_before_the_end_ones() {
        let m = manifold();
        // min_length 13 forces growth until an outlier fits; the cone is
        // widest mid-line, so "mid-high" joins first
        let builder = PlaylistBuilder::new(&m).with_config(config(12, 13));
        let playlist = builder.cone("on0", "on11").unwrap();
        assert!(playlist.tags.contains(&"mid-high".to_string()));
        assert!(!playlist.tags.contains(&"start-high".to_string()));
        assert!(!playlist.tags.contains(&"end-high".to_string()));
    }

    #[test]
    fn inverse_cone_admits_the_endpoint_outliers_first() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m).with_config(config(12, 13));
        let playlist = builder.inverse_cone("on0", "on11").unwrap();
        assert!(playlist.tags.contains(&"start-high".to_string()));
        assert!(playlist.tags.contains(&"end-high".to_string()));
        assert!(!playlist.tags.contains(&"mid-high".to_string()));
    }

    #[test]
    fn sweep_order_follows_the_line() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m).with_config(config(12, 1));
        let playlist = builder.cylinder("on0", "on11").unwrap();
        let positions: Vec<usize> = playlist
            .tags
            .iter()
            .map(|t| t[2..].parse().unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn growth_stops_once_the_radius_spans_the_line() {
        let m = manifold();
        // Impossible target: growth must still terminate
        let builder = PlaylistBuilder::new(&m).with_config(config(12, 1000));
        let playlist = builder.cylinder("on0", "on11").unwrap();
        assert_eq!(playlist.len(), 15);
    }

    #[test]
    fn unknown_endpoint_is_not_found() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m);
        assert!(matches!(
            builder.line("on0", "nope"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn zero_length_nearest_is_invalid() {
        let m = manifold();
        let builder = PlaylistBuilder::new(&m);
        assert!(matches!(
            builder.nearest("on0", 0),
            Err(Error::InvalidInput(_))
        ));
    }
}
