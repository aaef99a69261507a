use derive_more::{Deref, Display};
use indexmap::IndexSet;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::{CreateError, FieldSet, Name, ReadError};

#[allow(async_fn_in_trait)]
pub trait ExerciseService {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError>;
}

#[allow(async_fn_in_trait)]
pub trait ExerciseRepository {
    async fn read_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: MuscleGroup,
    pub equipment: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub fields: FieldSet,
    pub is_custom: bool,
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(u32);

impl ExerciseID {
    #[must_use]
    pub fn nil() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ExerciseID {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Open set of muscle group names.
#[derive(Display, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MuscleGroup(String);

impl MuscleGroup {
    pub const OTHER: &'static str = "Other";

    /// Groups suggested when creating an exercise.
    pub const SUGGESTED: [&'static str; 21] = [
        "Chest",
        "Back",
        "Shoulders",
        "Biceps",
        "Triceps",
        "Forearms",
        "Core",
        "Obliques",
        "Lower Back",
        "Quadriceps",
        "Hamstrings",
        "Glutes",
        "Calves",
        "Hip Adductors",
        "Hip Abductors",
        "Traps",
        "Lats",
        "Neck",
        "Full Body",
        "Cardio",
        "Other",
    ];

    #[must_use]
    pub fn new(name: &str) -> Self {
        let trimmed_name = name.trim();
        if trimmed_name.is_empty() {
            Self::default()
        } else {
            Self(trimmed_name.to_string())
        }
    }
}

impl Default for MuscleGroup {
    fn default() -> Self {
        Self(Self::OTHER.to_string())
    }
}

impl AsRef<str> for MuscleGroup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, StrumDisplay, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: Name,
    pub muscle_group: MuscleGroup,
    pub equipment: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub fields: FieldSet,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExerciseFilter {
    /// `None` matches every muscle group.
    pub muscle_group: Option<String>,
    pub query: String,
}

impl ExerciseFilter {
    pub const ALL: &'static str = "all";

    #[must_use]
    pub fn exercises<'a>(
        &self,
        exercises: impl Iterator<Item = &'a Exercise>,
    ) -> Vec<&'a Exercise> {
        let muscle_group = self
            .muscle_group
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty() && g != Self::ALL);
        let query = self.query.trim().to_lowercase();
        exercises
            .filter(|e| {
                muscle_group
                    .as_ref()
                    .is_none_or(|g| e.muscle_group.as_ref().to_lowercase() == *g)
                    && (query.is_empty()
                        || e.name.to_lowercase().contains(&query)
                        || e.muscle_group.as_ref().to_lowercase().contains(&query)
                        || e
                            .equipment
                            .as_ref()
                            .is_some_and(|eq| eq.to_lowercase().contains(&query))
                        || e
                            .difficulty
                            .is_some_and(|d| d.as_ref().contains(&query)))
            })
            .collect()
    }
}

/// Distinct muscle groups in order of first occurrence.
#[must_use]
pub fn muscle_groups(exercises: &[Exercise]) -> Vec<MuscleGroup> {
    exercises
        .iter()
        .map(|e| e.muscle_group.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}
