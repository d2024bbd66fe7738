use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// Gallery photo, append-only: never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: Uuid,
    pub url: String,
    pub year: i32,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

pub async fn insert_photo(
    db: &PgPool,
    user_id: Uuid,
    year: i32,
    url: &str,
) -> Result<Photo, ApiError> {
    let photo = sqlx::query_as::<_, Photo>(
        r#"
        INSERT INTO photos (url, year, user_id)
        VALUES ($1, $2, $3)
        RETURNING id, url, year, user_id, created_at
        "#,
    )
    .bind(url)
    .bind(year)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(photo)
}

pub async fn list_by_year(db: &PgPool, year: i32) -> Result<Vec<Photo>, ApiError> {
    let rows = sqlx::query_as::<_, Photo>(
        r#"
        SELECT id, url, year, user_id, created_at
        FROM photos
        WHERE year = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(year)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Photo count per year, only for years that have rows; callers zero-fill.
pub async fn year_counts(db: &PgPool, years: &[i32]) -> Result<Vec<(i32, i64)>, ApiError> {
    let rows: Vec<(i32, i64)> = sqlx::query_as::<_, (i32, i64)>(
        r#"
        SELECT year, COUNT(*)
        FROM photos
        WHERE year = ANY($1)
        GROUP BY year
        "#,
    )
    .bind(years)
    .fetch_all(db)
    .await
    .context("photo year counts")
    .map_err(ApiError::Internal)?;
    Ok(rows)
}
