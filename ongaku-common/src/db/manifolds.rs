//! Manifold persistence
//!
//! Embeddings are stored under a name so multiple pipeline runs (different
//! crop lengths, dimensionalities) can coexist. Row order is preserved via
//! an explicit position column.

use crate::{Error, Manifold, Result};
use ndarray::Array2;
use sqlx::{Row, SqlitePool};

/// Store a manifold under a name, replacing any previous embedding with
/// that name.
pub async fn save_manifold(pool: &SqlitePool, name: &str, manifold: &Manifold) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM manifolds WHERE name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;

    for (position, tag) in manifold.tags().iter().enumerate() {
        let coords: Vec<f64> = manifold.coords().row(position).to_vec();
        let coords_json = serde_json::to_string(&coords)
            .map_err(|e| Error::Internal(format!("Failed to encode coordinates: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO manifolds (name, position, tag, coords)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(position as i64)
        .bind(tag)
        .bind(coords_json)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load a named manifold
pub async fn load_manifold(pool: &SqlitePool, name: &str) -> Result<Manifold> {
    let rows = sqlx::query(
        "SELECT tag, coords FROM manifolds WHERE name = ? ORDER BY position",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(Error::NotFound(format!("No manifold named '{}'", name)));
    }

    let mut tags = Vec::with_capacity(rows.len());
    let mut coords: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
    for row in rows {
        tags.push(row.get::<String, _>("tag"));
        let decoded: Vec<f64> = serde_json::from_str(&row.get::<String, _>("coords"))
            .map_err(|e| Error::Internal(format!("Corrupt manifold coordinates: {}", e)))?;
        coords.push(decoded);
    }

    let n_components = coords.first().map(Vec::len).unwrap_or(0);
    if coords.iter().any(|c| c.len() != n_components) {
        return Err(Error::Internal(format!(
            "Manifold '{}' has rows of mixed dimensionality",
            name
        )));
    }

    let flat: Vec<f64> = coords.into_iter().flatten().collect();
    let matrix = Array2::from_shape_vec((tags.len(), n_components), flat)
        .map_err(|e| Error::Internal(format!("Manifold shape error: {}", e)))?;

    Manifold::new(tags, matrix)
}

/// Names of all stored manifolds, sorted
pub async fn list_manifolds(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT name FROM manifolds ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.get::<String, _>("name")).collect())
}
