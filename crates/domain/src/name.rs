use derive_more::{AsRef, Display};

/// Display name of a custom exercise.
#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub const MAX_CHARS: usize = 100;

    pub fn new(name: &str) -> Result<Self, NameError> {
        let name = name.trim();
        match name.chars().count() {
            0 => Err(NameError::Empty),
            chars if chars > Self::MAX_CHARS => Err(NameError::TooLong(chars)),
            _ => Ok(Self(name.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NameError {
    #[error("Exercise name is required")]
    Empty,
    #[error("Exercise name is too long ({0} > {max} characters)", max = Name::MAX_CHARS)]
    TooLong(usize),
}
