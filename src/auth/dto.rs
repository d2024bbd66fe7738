use serde::Deserialize;

/// Request body for Google sign-in: the raw ID token from the client.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub credential: Option<String>,
}

/// Request body for local registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Request body for local login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
