use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::{User, UserPatch};

/// User as returned to the account owner (auth and profile responses).
/// Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub favorite_color: Option<String>,
    pub nickname: Option<String>,
    pub favorite_food: Option<String>,
    pub participation_years: Vec<i32>,
    pub past_experience: Option<String>,
    pub show_profile: bool,
    pub picture: Option<String>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            first_name: u.first_name,
            last_name: u.last_name,
            about: u.about,
            favorite_color: u.favorite_color,
            nickname: u.nickname,
            favorite_food: u.favorite_food,
            participation_years: u.participation_years,
            past_experience: u.past_experience,
            show_profile: u.show_profile,
            picture: u.picture,
        }
    }
}

/// Stranger-facing projection for the public listing: no email, no
/// visibility flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub favorite_food: Option<String>,
    pub past_experience: Option<String>,
    pub about: Option<String>,
    pub favorite_color: Option<String>,
    pub participation_years: Vec<i32>,
    pub picture: Option<String>,
}

impl From<User> for PublicProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            first_name: u.first_name,
            last_name: u.last_name,
            nickname: u.nickname,
            favorite_food: u.favorite_food,
            past_experience: u.past_experience,
            about: u.about,
            favorite_color: u.favorite_color,
            participation_years: u.participation_years,
            picture: u.picture,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: Option<UserView>,
}

impl From<User> for UserEnvelope {
    fn from(u: User) -> Self {
        Self {
            user: Some(UserView::from(u)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersEnvelope {
    pub users: Vec<PublicProfile>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePictureEnvelope {
    pub url: Option<String>,
    pub user: Option<UserView>,
}

/// Partial profile mutation. A field absent from the request body stays
/// untouched; a field present with an empty value is applied as-is.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub favorite_color: Option<String>,
    pub nickname: Option<String>,
    pub favorite_food: Option<String>,
    pub participation_years: Option<Vec<i32>>,
    pub past_experience: Option<String>,
    pub show_profile: Option<bool>,
    pub picture: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn into_patch(self) -> UserPatch {
        UserPatch {
            name: self.name.map(|n| n.trim().to_string()),
            first_name: self.first_name,
            last_name: self.last_name,
            about: self.about,
            favorite_color: self.favorite_color,
            nickname: self.nickname,
            favorite_food: self.favorite_food,
            past_experience: self.past_experience,
            picture: self.picture,
            participation_years: self.participation_years,
            show_profile: self.show_profile,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureRequest {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub image_base64: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            auth_provider: "password".into(),
            google_id: None,
            email: "carol@example.com".into(),
            password_hash: Some("secret-hash".into()),
            name: Some("Carol Danvers".into()),
            first_name: Some("Carol".into()),
            last_name: Some("Danvers".into()),
            about: None,
            favorite_color: Some("red".into()),
            nickname: None,
            favorite_food: None,
            past_experience: None,
            picture: None,
            participation_years: vec![2023, 2024],
            show_profile: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn user_view_never_contains_password_hash() {
        let json = serde_json::to_string(&UserView::from(sample_user())).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("passwordHash"));
        assert!(json.contains("carol@example.com"));
        assert!(json.contains("participationYears"));
    }

    #[test]
    fn public_profile_omits_email_and_visibility() {
        let json = serde_json::to_string(&PublicProfile::from(sample_user())).unwrap();
        assert!(!json.contains("carol@example.com"));
        assert!(!json.contains("showProfile"));
        assert!(json.contains("Carol"));
    }

    #[test]
    fn omitted_fields_stay_out_of_the_patch() {
        let req: ProfileUpdateRequest =
            serde_json::from_str(r#"{"userId":null,"about":"x","name":"  Dana  "}"#).unwrap();
        let patch = req.into_patch();
        assert_eq!(patch.about.as_deref(), Some("x"));
        assert_eq!(patch.name.as_deref(), Some("Dana"));
        assert!(patch.favorite_color.is_none());
        assert!(patch.show_profile.is_none());
    }

    #[test]
    fn explicit_empty_string_is_applied() {
        let req: ProfileUpdateRequest = serde_json::from_str(r#"{"nickname":""}"#).unwrap();
        let patch = req.into_patch();
        assert_eq!(patch.nickname.as_deref(), Some(""));
    }
}
