use derive_more::{Deref, Display};

use crate::UpdateError;

#[allow(async_fn_in_trait)]
pub trait UserService {
    async fn update_profile_picture(
        &self,
        profile_picture: Option<String>,
    ) -> Result<User, UpdateError>;
}

#[allow(async_fn_in_trait)]
pub trait UserRepository {
    async fn update_profile_picture(
        &self,
        profile_picture: Option<String>,
    ) -> Result<User, UpdateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserID,
    pub username: String,
    pub email: Option<String>,
    /// Image reference, usually a data URL.
    pub profile_picture: Option<String>,
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserID(u32);

impl UserID {
    #[must_use]
    pub fn nil() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for UserID {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
