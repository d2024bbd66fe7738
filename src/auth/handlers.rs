use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{GoogleLoginRequest, LoginRequest, RegisterRequest},
        services,
    },
    error::ApiError,
    state::AppState,
    users::dto::UserEnvelope,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", post(google_login))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let credential = payload.credential.unwrap_or_default();
    if credential.is_empty() {
        return Err(ApiError::Unauthenticated("Missing Google credential".into()));
    }

    let identity = state.verifier.verify(&credential).await?;
    let user = services::resolve_google_login(state.users.as_ref(), identity).await?;
    Ok(Json(UserEnvelope::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = services::register_local(
        state.users.as_ref(),
        payload.email,
        payload.name,
        payload.password,
    )
    .await?;
    Ok(Json(UserEnvelope::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user =
        services::authenticate_local(state.users.as_ref(), payload.email, payload.password)
            .await?;
    Ok(Json(UserEnvelope::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn google_login_without_credential_is_rejected() {
        let state = AppState::fake();
        let err = google_login(
            State(state),
            Json(GoogleLoginRequest { credential: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn google_login_resolves_via_verifier() {
        let state = AppState::fake();
        let envelope = google_login(
            State(state.clone()),
            Json(GoogleLoginRequest {
                credential: Some("fake-token".into()),
            }),
        )
        .await
        .unwrap();
        let user = envelope.0.user.expect("user envelope");
        assert_eq!(user.email, "fake@example.com");

        // Same credential again: same account, not a duplicate.
        let again = google_login(
            State(state),
            Json(GoogleLoginRequest {
                credential: Some("fake-token".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(again.0.user.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn register_and_login_through_handlers() {
        let state = AppState::fake();
        let registered = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: Some("zoe@x.com".into()),
                name: Some("Zoe".into()),
                password: Some("pw123".into()),
            }),
        )
        .await
        .unwrap();
        let registered = registered.0.user.unwrap();

        let logged_in = login(
            State(state),
            Json(LoginRequest {
                email: Some("zoe@x.com".into()),
                password: Some("pw123".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(logged_in.0.user.unwrap().id, registered.id);
    }
}
