use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::{
    error::ApiError,
    photos::{
        dto::{ListPhotosQuery, PhotoEnvelope, PhotosEnvelope, SummaryEnvelope, UploadPhotoRequest},
        repo,
    },
    state::AppState,
};

pub const GALLERY_FOLDER: &str = "boat_trip/gallery";

/// Trip years shown on the gallery overview.
const SUMMARY_YEARS: [i32; 6] = [2020, 2021, 2022, 2023, 2024, 2025];

pub fn photo_routes() -> Router<AppState> {
    Router::new()
        .route("/photos/upload", post(upload))
        .route("/photos", get(list_by_year))
        .route("/photos/summary", get(summary))
}

// Like the profile endpoints, missing upload input yields a null-valued
// success envelope, not a 4xx.
#[instrument(skip(state, payload))]
pub async fn upload(
    State(state): State<AppState>,
    Json(payload): Json<UploadPhotoRequest>,
) -> Result<Json<PhotoEnvelope>, ApiError> {
    let (Some(user_id), Some(year), Some(image)) = (
        payload.user_id,
        payload.year.filter(|y| *y != 0),
        payload.image_base64.filter(|s| !s.is_empty()),
    ) else {
        return Ok(Json(PhotoEnvelope { photo: None }));
    };

    let blob = state
        .storage
        .as_deref()
        .ok_or_else(|| ApiError::Storage("Blob store is not configured".into()))?;
    let url = blob.upload_image(&image, GALLERY_FOLDER).await?;
    let photo = repo::insert_photo(&state.db, user_id, year, &url).await?;

    info!(photo_id = %photo.id, user_id = %user_id, year, "photo uploaded");
    Ok(Json(PhotoEnvelope { photo: Some(photo) }))
}

#[instrument(skip(state))]
pub async fn list_by_year(
    State(state): State<AppState>,
    Query(query): Query<ListPhotosQuery>,
) -> Result<Json<PhotosEnvelope>, ApiError> {
    let year = query.year.as_deref().and_then(|y| y.parse::<i32>().ok());
    let Some(year) = year.filter(|y| *y != 0) else {
        return Ok(Json(PhotosEnvelope { photos: Vec::new() }));
    };

    let photos = repo::list_by_year(&state.db, year).await?;
    Ok(Json(PhotosEnvelope { photos }))
}

#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Result<Json<SummaryEnvelope>, ApiError> {
    let counts = repo::year_counts(&state.db, &SUMMARY_YEARS).await?;
    Ok(Json(SummaryEnvelope {
        summary: zero_filled_summary(&SUMMARY_YEARS, counts),
    }))
}

fn zero_filled_summary(years: &[i32], counts: Vec<(i32, i64)>) -> BTreeMap<i32, i64> {
    let mut summary: BTreeMap<i32, i64> = years.iter().map(|y| (*y, 0)).collect();
    for (year, count) in counts {
        summary.insert(year, count);
    }
    summary
}
