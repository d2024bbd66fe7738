use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            ProfilePictureEnvelope, ProfilePictureRequest, ProfileUpdateRequest, PublicProfile,
            UserEnvelope, UserView, UsersEnvelope,
        },
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", post(update_profile))
        .route("/users/profile-picture", post(profile_picture))
        .route("/users/public", get(list_public))
}

// Profile endpoints answer missing input with a null-valued success envelope
// rather than a 4xx; existing clients depend on that shape.
#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let Some(user_id) = payload.user_id else {
        return Ok(Json(UserEnvelope { user: None }));
    };

    let user = services::update_profile(state.users.as_ref(), user_id, payload.into_patch())
        .await?;
    Ok(Json(UserEnvelope {
        user: user.map(UserView::from),
    }))
}

#[instrument(skip(state, payload))]
pub async fn profile_picture(
    State(state): State<AppState>,
    Json(payload): Json<ProfilePictureRequest>,
) -> Result<Json<ProfilePictureEnvelope>, ApiError> {
    let Some(image) = payload.image_base64.filter(|s| !s.is_empty()) else {
        return Ok(Json(ProfilePictureEnvelope {
            url: None,
            user: None,
        }));
    };

    let user_id = services::resolve_user_id(
        state.users.as_ref(),
        payload.user_id,
        payload.email.as_deref(),
    )
    .await?;
    let Some(user_id) = user_id else {
        return Ok(Json(ProfilePictureEnvelope {
            url: None,
            user: None,
        }));
    };

    let blob = state
        .storage
        .as_deref()
        .ok_or_else(|| ApiError::Storage("Blob store is not configured".into()))?;
    let (url, user) =
        services::set_profile_picture(state.users.as_ref(), blob, user_id, &image).await?;

    Ok(Json(ProfilePictureEnvelope {
        url: Some(url),
        user: user.map(UserView::from),
    }))
}

#[instrument(skip(state))]
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<UsersEnvelope>, ApiError> {
    let users = services::list_public_profiles(state.users.as_ref()).await?;
    Ok(Json(UsersEnvelope {
        users: users.into_iter().map(PublicProfile::from).collect(),
    }))
}
