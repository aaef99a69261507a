//! User-scoped preference namespaces
//!
//! Local state that belongs to an account is stored under keys of the form `<base>:<identity>`.
//! The identity is the numeric user ID if known, otherwise the username prefixed with `@`,
//! otherwise `guest`. The prefix keeps usernames like `42` or `guest` apart from the other forms.

use std::fmt;

use chrono::{DateTime, Utc};
use derive_more::Display;
use uuid::Uuid;

use crate::{User, WorkoutID};

pub const IMAGE_BOARD_KEY: &str = "imageBoard";
pub const PROFILE_PICTURE_KEY: &str = "profilePic";
pub const SET_OVERRIDES_KEY: &str = "setOverrides";

pub const IMAGE_BOARD_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Id(u32),
    Username(String),
    Guest,
}

impl Identity {
    #[must_use]
    pub fn resolve(user: Option<&User>) -> Self {
        match user {
            Some(user) if !user.id.is_nil() => Identity::Id(*user.id),
            Some(user) if !user.username.is_empty() => Identity::Username(user.username.clone()),
            _ => Identity::Guest,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Id(id) => write!(f, "{id}"),
            Identity::Username(username) => write!(f, "@{username}"),
            Identity::Guest => write!(f, "guest"),
        }
    }
}

#[must_use]
pub fn scoped_key(base: &str, identity: &Identity) -> String {
    format!("{base}:{identity}")
}

/// Key of the set overrides of a workout session, independent of the user.
#[must_use]
pub fn session_key(session: WorkoutID) -> String {
    format!("{SET_OVERRIDES_KEY}:{session}")
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageID(Uuid);

impl ImageID {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageID {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ImageID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ImageID> for Uuid {
    fn from(value: ImageID) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub id: ImageID,
    /// Image reference, usually a data URL.
    pub url: String,
    pub workout_id: Option<WorkoutID>,
    pub created: DateTime<Utc>,
}

/// Images of a user, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBoard(Vec<ImageEntry>);

impl ImageBoard {
    #[must_use]
    pub fn new(mut entries: Vec<ImageEntry>) -> Self {
        entries.truncate(IMAGE_BOARD_LIMIT);
        Self(entries)
    }

    pub fn add(&mut self, entry: ImageEntry) {
        self.0.insert(0, entry);
        self.0.truncate(IMAGE_BOARD_LIMIT);
    }

    pub fn remove(&mut self, id: ImageID) -> bool {
        let len = self.0.len();
        self.0.retain(|e| e.id != id);
        self.0.len() != len
    }

    #[must_use]
    pub fn entries(&self) -> &[ImageEntry] {
        &self.0
    }

    pub fn for_workout(&self, workout_id: WorkoutID) -> impl Iterator<Item = &ImageEntry> {
        self.0
            .iter()
            .filter(move |e| e.workout_id == Some(workout_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
