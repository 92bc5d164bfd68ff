//! Cepstrum persistence
//!
//! Samples are stored as a JSON array in row-major order. JSON has no
//! representation for infinities, so `-inf` dB values (silent windows) are
//! written as `null` and restored on load.

use crate::{Cepstrum, Error, Result};
use sqlx::{Row, SqlitePool};

/// Analysis parameters recorded next to each cepstrum
#[derive(Debug, Clone, Copy)]
pub struct CepstrumParams {
    pub window_seconds: f64,
    pub min_frequency: f64,
}

/// Store a song's cepstrum, replacing any previous analysis
pub async fn save_cepstrum(
    pool: &SqlitePool,
    tag: &str,
    cepstrum: &Cepstrum,
    params: CepstrumParams,
) -> Result<()> {
    let samples = encode_samples(&cepstrum.to_samples());

    sqlx::query(
        r#"
        INSERT INTO cepstra (tag, bands, frames, samples, window_seconds, min_frequency)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(tag) DO UPDATE SET
            bands = excluded.bands,
            frames = excluded.frames,
            samples = excluded.samples,
            window_seconds = excluded.window_seconds,
            min_frequency = excluded.min_frequency
        "#,
    )
    .bind(tag)
    .bind(cepstrum.bands() as i64)
    .bind(cepstrum.frames() as i64)
    .bind(samples)
    .bind(params.window_seconds)
    .bind(params.min_frequency)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one song's cepstrum
pub async fn load_cepstrum(pool: &SqlitePool, tag: &str) -> Result<Option<Cepstrum>> {
    let row = sqlx::query("SELECT bands, frames, samples FROM cepstra WHERE tag = ?")
        .bind(tag)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let bands = row.get::<i64, _>("bands") as usize;
            let frames = row.get::<i64, _>("frames") as usize;
            let samples = decode_samples(&row.get::<String, _>("samples"))?;
            Ok(Some(Cepstrum::from_samples(bands, frames, samples)?))
        }
        None => Ok(None),
    }
}

/// Load every stored cepstrum as (tag, cepstrum) pairs, sorted by tag
pub async fn load_all(pool: &SqlitePool) -> Result<Vec<(String, Cepstrum)>> {
    let rows = sqlx::query("SELECT tag, bands, frames, samples FROM cepstra ORDER BY tag")
        .fetch_all(pool)
        .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let tag = row.get::<String, _>("tag");
        let bands = row.get::<i64, _>("bands") as usize;
        let frames = row.get::<i64, _>("frames") as usize;
        let samples = decode_samples(&row.get::<String, _>("samples"))?;
        out.push((tag, Cepstrum::from_samples(bands, frames, samples)?));
    }
    Ok(out)
}

/// True when a cepstrum already exists for the tag (preprocessing skips it)
pub async fn has_cepstrum(pool: &SqlitePool, tag: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM cepstra WHERE tag = ?")
        .bind(tag)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

fn encode_samples(samples: &[f64]) -> String {
    let encoded: Vec<Option<f64>> = samples
        .iter()
        .map(|&v| if v == f64::NEG_INFINITY { None } else { Some(v) })
        .collect();
    // Vec<Option<f64>> with finite values cannot fail to serialize
    serde_json::to_string(&encoded).unwrap_or_default()
}

fn decode_samples(json: &str) -> Result<Vec<f64>> {
    let decoded: Vec<Option<f64>> = serde_json::from_str(json)
        .map_err(|e| Error::Internal(format!("Corrupt cepstrum samples: {}", e)))?;
    Ok(decoded
        .into_iter()
        .map(|v| v.unwrap_or(f64::NEG_INFINITY))
        .collect())
}
