//! Embedding-quality metrics
//!
//! Summary statistics over an embedded manifold: how spread out the
//! corpus is per dimension, and how tightly songs cluster overall and
//! within artist or album groups. Cohesion values are normalised so
//! corpora of different sizes and dimensionalities stay comparable.

use std::collections::BTreeMap;

use ongaku_common::{CorpusTag, Error, Manifold, Result};

/// Cross-dimensional standard deviation: the mean over embedding
/// dimensions of each dimension's sample standard deviation
pub fn corpus_xdsd(manifold: &Manifold) -> Result<f64> {
    let n = manifold.len();
    if n < 2 {
        return Err(Error::InvalidInput(
            "cross-dimensional deviation needs at least two songs".into(),
        ));
    }
    let coords = manifold.coords();
    let total: f64 = (0..coords.ncols())
        .map(|dim| {
            let column = coords.column(dim);
            let mean = column.sum() / n as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        })
        .sum();
    Ok(total / coords.ncols() as f64)
}

/// Mean pairwise distance across the whole corpus, scaled down by
/// `ln(n_songs)` so growing the library does not inflate the number
pub fn corpus_cohesion(manifold: &Manifold) -> Result<f64> {
    let n = manifold.len();
    if n < 2 {
        return Err(Error::InvalidInput(
            "cohesion needs at least two songs".into(),
        ));
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            total += manifold.distance(i, j);
            pairs += 1;
        }
    }
    Ok(total / pairs as f64 / (n as f64).ln())
}

/// Per-artist cross-dimensional deviation; artists with a single song
/// are skipped (a sample deviation needs two points)
pub fn artist_xdsd(manifold: &Manifold) -> BTreeMap<String, f64> {
    group_xdsd(manifold, |tag| tag.artist.clone())
}

/// Per-album cross-dimensional deviation; single-song albums are skipped
pub fn album_xdsd(manifold: &Manifold) -> BTreeMap<String, f64> {
    group_xdsd(manifold, |tag| tag.album.clone())
}

/// Mean cross-dimensional deviation across all multi-song artists
pub fn avg_artist_xdsd(manifold: &Manifold) -> Option<f64> {
    average(&artist_xdsd(manifold))
}

/// Mean cross-dimensional deviation across all multi-song albums
pub fn avg_album_xdsd(manifold: &Manifold) -> Option<f64> {
    average(&album_xdsd(manifold))
}

/// Per-artist cohesion: mean log-distance between an artist's songs,
/// scaled by `ln(n_dimensions)`. Artists with a single song are skipped.
pub fn artist_cohesion(manifold: &Manifold) -> Result<BTreeMap<String, f64>> {
    group_cohesion(manifold, |tag| tag.artist.clone())
}

/// Per-album cohesion; albums with a single song are skipped
pub fn album_cohesion(manifold: &Manifold) -> Result<BTreeMap<String, f64>> {
    group_cohesion(manifold, |tag| tag.album.clone())
}

/// Mean cohesion across all multi-song artists
pub fn avg_artist_cohesion(manifold: &Manifold) -> Result<Option<f64>> {
    Ok(average(&artist_cohesion(manifold)?))
}

/// Mean cohesion across all multi-song albums
pub fn avg_album_cohesion(manifold: &Manifold) -> Result<Option<f64>> {
    Ok(average(&album_cohesion(manifold)?))
}

fn average(groups: &BTreeMap<String, f64>) -> Option<f64> {
    if groups.is_empty() {
        None
    } else {
        Some(groups.values().sum::<f64>() / groups.len() as f64)
    }
}

fn group_members(
    manifold: &Manifold,
    group_key: impl Fn(&CorpusTag) -> String,
) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, tag) in manifold.tags().iter().enumerate() {
        if let Some(parsed) = CorpusTag::parse(tag) {
            groups.entry(group_key(&parsed)).or_default().push(i);
        }
    }
    groups
}

fn group_xdsd(
    manifold: &Manifold,
    group_key: impl Fn(&CorpusTag) -> String,
) -> BTreeMap<String, f64> {
    let coords = manifold.coords();
    let mut result = BTreeMap::new();
    for (key, members) in group_members(manifold, group_key) {
        let n = members.len();
        if n < 2 {
            continue;
        }
        let total: f64 = (0..coords.ncols())
            .map(|dim| {
                let mean =
                    members.iter().map(|&i| coords[[i, dim]]).sum::<f64>() / n as f64;
                let var = members
                    .iter()
                    .map(|&i| (coords[[i, dim]] - mean).powi(2))
                    .sum::<f64>()
                    / (n - 1) as f64;
                var.sqrt()
            })
            .sum();
        result.insert(key, total / coords.ncols() as f64);
    }
    result
}

fn group_cohesion(
    manifold: &Manifold,
    group_key: impl Fn(&CorpusTag) -> String,
) -> Result<BTreeMap<String, f64>> {
    let n_dims = manifold.n_components();
    if n_dims < 2 {
        return Err(Error::InvalidInput(
            "group cohesion needs at least two embedding dimensions".into(),
        ));
    }

    let scale = (n_dims as f64).ln();
    let mut cohesion = BTreeMap::new();
    for (key, members) in group_members(manifold, group_key) {
        if members.len() < 2 {
            continue;
        }
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (a, &i) in members.iter().enumerate() {
            for &j in &members[a + 1..] {
                total += manifold.distance(i, j).ln();
                pairs += 1;
            }
        }
        cohesion.insert(key, total / pairs as f64 / scale);
    }
    Ok(cohesion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn manifold() -> Manifold {
        Manifold::new(
            vec![
                "Alpha - First - One".into(),
                "Alpha - First - Two".into(),
                "Alpha - Second - Three".into(),
                "Beta - Third - Four".into(),
            ],
            array![
                [0.0, 0.0],
                [1.0, 0.0],
                [0.0, 8.0],
                [20.0, 20.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn xdsd_matches_hand_computation() {
        let m = Manifold::new(
            vec!["a - b - c".into(), "a - b - d".into(), "a - b - e".into()],
            array![[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
        )
        .unwrap();
        // dim 0: std of [0,1,2] with ddof 1 is 1.0; dim 1 is constant
        assert!((corpus_xdsd(&m).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn corpus_cohesion_scales_by_log_size() {
        let m = Manifold::new(
            vec!["a - b - c".into(), "a - b - d".into()],
            array![[0.0, 0.0], [3.0, 4.0]],
        )
        .unwrap();
        // one pair at distance 5, divided by ln(2)
        assert!((corpus_cohesion(&m).unwrap() - 5.0 / 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn grouped_xdsd_covers_multi_song_groups_only() {
        let m = manifold();
        let artists = artist_xdsd(&m);
        // "Alpha" holds songs at (0,0), (1,0), (0,8):
        // dim 0 std of [0,1,0], dim 1 std of [0,0,8], averaged
        let dim0 = (2.0 / 3.0 / 2.0f64).sqrt();
        let dim1 = (128.0 / 3.0 / 2.0f64).sqrt();
        assert!((artists["Alpha"] - (dim0 + dim1) / 2.0).abs() < 1e-12);
        assert!(!artists.contains_key("Beta"));

        let albums = album_xdsd(&m);
        assert!(albums.contains_key("First"));
        assert!(!albums.contains_key("Second"));
        assert!(avg_album_xdsd(&m).is_some());
    }

    #[test]
    fn singleton_groups_are_skipped() {
        let m = manifold();
        let artists = artist_cohesion(&m).unwrap();
        assert!(artists.contains_key("Alpha"));
        assert!(!artists.contains_key("Beta"));
        let albums = album_cohesion(&m).unwrap();
        assert!(albums.contains_key("First"));
        assert!(!albums.contains_key("Second"));
        assert!(!albums.contains_key("Third"));
    }

    #[test]
    fn group_cohesion_matches_hand_computation() {
        let m = manifold();
        let albums = album_cohesion(&m).unwrap();
        // "First" holds songs 0 and 1, one pair at distance 1: ln(1) = 0
        assert!((albums["First"] - 0.0).abs() < 1e-12);

        let artists = artist_cohesion(&m).unwrap();
        // "Alpha" pairs: d(0,1)=1, d(0,2)=8, d(1,2)=sqrt(65)
        let expected =
            (1f64.ln() + 8f64.ln() + 65f64.sqrt().ln()) / 3.0 / 2f64.ln();
        assert!((artists["Alpha"] - expected).abs() < 1e-12);
    }

    #[test]
    fn averages_are_none_without_multi_song_groups() {
        let m = Manifold::new(
            vec!["a - b - c".into(), "x - y - z".into()],
            array![[0.0, 0.0], [1.0, 1.0]],
        )
        .unwrap();
        assert!(avg_artist_cohesion(&m).unwrap().is_none());
        assert!(avg_album_cohesion(&m).unwrap().is_none());
    }

    #[test]
    fn too_few_songs_is_an_error() {
        let m = Manifold::new(vec!["a - b - c".into()], array![[0.0, 0.0]]).unwrap();
        assert!(corpus_xdsd(&m).is_err());
        assert!(corpus_cohesion(&m).is_err());
    }
}
