use derive_more::{AsRef, Display};

use crate::{AuthError, User};

#[allow(async_fn_in_trait)]
pub trait AuthService {
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthError>;
    async fn register(&self, credentials: Credentials) -> Result<Session, AuthError>;
    /// Make subsequent requests act on behalf of the given token.
    fn use_token(&self, token: Option<AuthToken>);
}

#[allow(async_fn_in_trait)]
pub trait AuthRepository {
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthError>;
    async fn register(&self, credentials: Credentials) -> Result<Session, AuthError>;
    fn set_token(&self, token: Option<AuthToken>);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Only used for registration.
    pub email: Option<String>,
}

#[derive(AsRef, Display, Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(token: &str) -> Option<Self> {
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }
}

/// An authenticated user together with the bearer token issued for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: AuthToken,
    pub user: User,
}
