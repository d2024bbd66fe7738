use tracing::info;
use uuid::Uuid;

use crate::auth::services::normalize_email;
use crate::error::ApiError;
use crate::storage::BlobStore;
use crate::users::repo::{User, UserPatch, UserStore};

pub const PROFILE_PICTURE_FOLDER: &str = "boat_trip/profiles";

/// Apply a partial profile mutation. `None` means the record does not exist;
/// the HTTP layer turns that into a null-payload success.
pub async fn update_profile(
    store: &dyn UserStore,
    user_id: Uuid,
    patch: UserPatch,
) -> Result<Option<User>, ApiError> {
    let updated = store.update_fields(user_id, patch).await?;
    if let Some(user) = &updated {
        info!(user_id = %user.id, "profile updated");
    }
    Ok(updated)
}

/// Upload a profile picture and point the record's `picture` at the stored
/// URL. The URL is returned even when the follow-up update finds no record.
pub async fn set_profile_picture(
    store: &dyn UserStore,
    blob: &dyn BlobStore,
    user_id: Uuid,
    image_base64: &str,
) -> Result<(String, Option<User>), ApiError> {
    let url = blob
        .upload_image(image_base64, PROFILE_PICTURE_FOLDER)
        .await?;
    let user = store
        .update_fields(
            user_id,
            UserPatch {
                picture: Some(url.clone()),
                ..Default::default()
            },
        )
        .await?;
    Ok((url, user))
}

/// Look a user up by id, falling back to normalized email.
pub async fn resolve_user_id(
    store: &dyn UserStore,
    user_id: Option<Uuid>,
    email: Option<&str>,
) -> Result<Option<Uuid>, ApiError> {
    if let Some(id) = user_id {
        return Ok(Some(id));
    }
    match email {
        Some(email) => Ok(store
            .find_by_email(&normalize_email(email))
            .await?
            .map(|u| u.id)),
        None => Ok(None),
    }
}

pub async fn list_public_profiles(store: &dyn UserStore) -> Result<Vec<User>, ApiError> {
    store.list_public().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::register_local;
    use crate::users::repo::memory::MemoryUserStore;

    async fn seed(store: &MemoryUserStore, email: &str, name: &str) -> User {
        register_local(
            store,
            Some(email.into()),
            Some(name.into()),
            Some("pw".into()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let store = MemoryUserStore::new();
        let user = seed(&store, "ann@x.com", "Ann").await;

        update_profile(
            &store,
            user.id,
            UserPatch {
                favorite_color: Some("teal".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update_profile(
            &store,
            user.id,
            UserPatch {
                about: Some("sailor".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("record exists");

        assert_eq!(updated.about.as_deref(), Some("sailor"));
        assert_eq!(updated.favorite_color.as_deref(), Some("teal"));
        assert_eq!(updated.name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn update_of_unknown_user_is_none() {
        let store = MemoryUserStore::new();
        let result = update_profile(&store, Uuid::new_v4(), UserPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn listing_only_shows_visible_profiles_in_name_order() {
        let store = MemoryUserStore::new();
        let hidden = seed(&store, "hidden@x.com", "Aaa Hidden").await;
        let second = seed(&store, "b@x.com", "Bob Z").await;
        let first = seed(&store, "a@x.com", "Amy A").await;

        for id in [second.id, first.id] {
            update_profile(
                &store,
                id,
                UserPatch {
                    show_profile: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        // hidden keeps show_profile = false
        let _ = hidden;

        let listed = list_public_profiles(&store).await.unwrap();
        let names: Vec<_> = listed.iter().map(|u| u.first_name.clone().unwrap()).collect();
        assert_eq!(names, vec!["Amy".to_string(), "Bob".to_string()]);
    }

    #[tokio::test]
    async fn resolve_user_id_falls_back_to_email() {
        let store = MemoryUserStore::new();
        let user = seed(&store, "finn@x.com", "Finn").await;

        let by_id = resolve_user_id(&store, Some(user.id), None).await.unwrap();
        assert_eq!(by_id, Some(user.id));

        let by_email = resolve_user_id(&store, None, Some(" Finn@X.com "))
            .await
            .unwrap();
        assert_eq!(by_email, Some(user.id));

        let neither = resolve_user_id(&store, None, None).await.unwrap();
        assert!(neither.is_none());
    }
}
