use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::auth::google::VerifiedIdentity;
use crate::auth::password;
use crate::error::ApiError;
use crate::users::repo::{NewUser, User, UserPatch, UserStore, PROVIDER_GOOGLE, PROVIDER_PASSWORD};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First token before the first space becomes the first name, the remainder
/// the last name. Either half may end up empty.
fn split_name(name: &str) -> (String, String) {
    match name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (name.to_string(), String::new()),
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthenticated("Invalid credentials".into())
}

/// Keep an already-filled profile field; only fill it when currently empty.
fn fill_if_empty(current: &Option<String>, incoming: Option<String>) -> Option<String> {
    match current.as_deref() {
        Some(v) if !v.is_empty() => None,
        _ => incoming,
    }
}

/// Resolve a verified Google identity to exactly one user record.
///
/// Lookup order: subject id first, then normalized email (an existing
/// password account being claimed becomes dual-capable — its password hash
/// is left untouched). Identity fields are re-asserted on every login;
/// profile fields are first-write-wins.
pub async fn resolve_google_login(
    store: &dyn UserStore,
    identity: VerifiedIdentity,
) -> Result<User, ApiError> {
    if identity.subject.is_empty() || identity.email.is_empty() {
        return Err(ApiError::Unauthenticated("Invalid Google token".into()));
    }

    let email = normalize_email(&identity.email);
    let name = identity.name.clone().unwrap_or_else(|| email.clone());
    let (first_name, last_name) = split_name(name.trim());

    let existing = match store.find_by_google_id(&identity.subject).await? {
        Some(user) => Some(user),
        None => store.find_by_email(&email).await?,
    };

    match existing {
        None => {
            let user = store
                .insert(NewUser {
                    auth_provider: PROVIDER_GOOGLE.into(),
                    google_id: Some(identity.subject),
                    email,
                    name: Some(name),
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    picture: identity.picture,
                    ..Default::default()
                })
                .await?;
            info!(user_id = %user.id, "google user created");
            Ok(user)
        }
        Some(user) => {
            let patch = UserPatch {
                auth_provider: Some(PROVIDER_GOOGLE.into()),
                google_id: Some(identity.subject),
                email: Some(email),
                name: fill_if_empty(&user.name, Some(name)),
                first_name: fill_if_empty(&user.first_name, Some(first_name)),
                last_name: fill_if_empty(&user.last_name, Some(last_name)),
                picture: fill_if_empty(&user.picture, identity.picture),
                ..Default::default()
            };
            let updated = store
                .update_fields(user.id, patch)
                .await?
                .ok_or(ApiError::NotFound)?;
            info!(user_id = %updated.id, "google login refreshed");
            Ok(updated)
        }
    }
}

/// Create a password-backed account. Never links to an existing record:
/// an email already claimed by either method is a conflict.
pub async fn register_local(
    store: &dyn UserStore,
    email: Option<String>,
    name: Option<String>,
    raw_password: Option<String>,
) -> Result<User, ApiError> {
    let email = email.as_deref().map(normalize_email).unwrap_or_default();
    let name = name.as_deref().map(str::trim).unwrap_or_default().to_string();
    let raw_password = raw_password.unwrap_or_default();

    if email.is_empty() || raw_password.is_empty() {
        return Err(ApiError::Validation("Missing email or password".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    match store.find_by_email(&email).await? {
        Some(existing) if existing.password_hash.is_some() => {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Some(_) => {
            return Err(ApiError::Conflict("Email registered with Google".into()));
        }
        None => {}
    }

    let password_hash = password::hash_password(&raw_password)?;
    let display_name = if name.is_empty() {
        // No display name given: the email local-part stands in.
        email.split('@').next().unwrap_or_default().to_string()
    } else {
        name
    };
    let (first_name, last_name) = split_name(&display_name);

    let user = store
        .insert(NewUser {
            auth_provider: PROVIDER_PASSWORD.into(),
            email,
            password_hash: Some(password_hash),
            name: Some(display_name),
            first_name: Some(first_name),
            last_name: Some(last_name),
            ..Default::default()
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, "local user registered");
    Ok(user)
}

/// Email/password login. Unknown email, password-less account and wrong
/// password are indistinguishable to the caller.
pub async fn authenticate_local(
    store: &dyn UserStore,
    email: Option<String>,
    raw_password: Option<String>,
) -> Result<User, ApiError> {
    let email = email.as_deref().map(normalize_email).unwrap_or_default();
    let raw_password = raw_password.unwrap_or_default();

    if email.is_empty() || raw_password.is_empty() {
        return Err(ApiError::Validation("Missing email or password".into()));
    }

    let Some(user) = store.find_by_email(&email).await? else {
        return Err(invalid_credentials());
    };
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(invalid_credentials());
    };
    if !password::verify_password(&raw_password, hash) {
        return Err(invalid_credentials());
    }

    info!(user_id = %user.id, "local login");
    Ok(user)
}
