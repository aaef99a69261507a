use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::{
    CreateError, DeleteError, Distance, Exercise, ExerciseID, FieldSet, MuscleGroup, ReadError,
    Reps, Seconds, UpdateError, UserID, Weight,
};

#[allow(async_fn_in_trait)]
pub trait WorkoutService {
    async fn get_active_workout(&self) -> Result<Option<Workout>, ReadError>;
    async fn get_workouts(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError>;
    async fn start_workout(&self, name: String) -> Result<Workout, CreateError>;
    async fn modify_workout(
        &self,
        id: WorkoutID,
        name: Option<String>,
        notes: Option<String>,
    ) -> Result<Workout, UpdateError>;
    async fn replace_workout(&self, workout: Workout) -> Result<Workout, UpdateError>;
    async fn end_workout(&self, id: WorkoutID, notes: String) -> Result<Workout, UpdateError>;
    async fn add_workout_exercise(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
        order: u32,
    ) -> Result<WorkoutExercise, CreateError>;
    async fn delete_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExerciseID, DeleteError>;
    async fn create_set(
        &self,
        workout_exercise_id: WorkoutExerciseID,
        set: NewSet,
    ) -> Result<Set, CreateError>;
    async fn modify_set(&self, id: SetID, patch: SetPatch) -> Result<Set, UpdateError>;
    async fn delete_set(&self, id: SetID) -> Result<SetID, DeleteError>;
}

#[allow(async_fn_in_trait)]
pub trait WorkoutRepository {
    async fn read_active_workout(&self) -> Result<Option<Workout>, ReadError>;
    async fn read_workouts(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError>;
    async fn create_workout(&self, name: String) -> Result<Workout, CreateError>;
    async fn modify_workout(
        &self,
        id: WorkoutID,
        name: Option<String>,
        notes: Option<String>,
    ) -> Result<Workout, UpdateError>;
    async fn replace_workout(&self, workout: Workout) -> Result<Workout, UpdateError>;
    async fn end_workout(&self, id: WorkoutID, notes: String) -> Result<Workout, UpdateError>;
    async fn create_workout_exercise(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
        order: u32,
    ) -> Result<WorkoutExercise, CreateError>;
    async fn delete_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExerciseID, DeleteError>;
    async fn create_set(
        &self,
        workout_exercise_id: WorkoutExerciseID,
        set: NewSet,
    ) -> Result<Set, CreateError>;
    async fn modify_set(&self, id: SetID, patch: SetPatch) -> Result<Set, UpdateError>;
    async fn delete_set(&self, id: SetID) -> Result<SetID, DeleteError>;
}

/// Lifecycle of a workout session as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    None,
    Active,
    Ended,
}

impl SessionState {
    #[must_use]
    pub fn of(workout: Option<&Workout>) -> Self {
        match workout {
            None => SessionState::None,
            Some(workout) => workout.state(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutID,
    pub user_id: UserID,
    pub name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub notes: String,
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.end.is_some() {
            SessionState::Ended
        } else {
            SessionState::Active
        }
    }

    #[must_use]
    pub fn set_ids(&self) -> BTreeSet<SetID> {
        self.exercises
            .iter()
            .flat_map(|we| we.sets.iter().map(|s| s.id))
            .collect()
    }

    #[must_use]
    pub fn workout_exercise(&self, id: WorkoutExerciseID) -> Option<&WorkoutExercise> {
        self.exercises.iter().find(|we| we.id == id)
    }

    #[must_use]
    pub fn find_set(&self, id: SetID) -> Option<(&WorkoutExercise, &Set)> {
        self.exercises
            .iter()
            .find_map(|we| we.sets.iter().find(|s| s.id == id).map(|s| (we, s)))
    }

    /// Order index for the next workout exercise.
    #[must_use]
    pub fn next_order(&self) -> u32 {
        u32::try_from(self.exercises.len()).unwrap_or(u32::MAX - 1) + 1
    }

    /// Remove a workout exercise and return it including its sets.
    pub fn remove_workout_exercise(&mut self, id: WorkoutExerciseID) -> Option<WorkoutExercise> {
        let idx = self.exercises.iter().position(|we| we.id == id)?;
        Some(self.exercises.remove(idx))
    }

    pub fn add_set(&mut self, workout_exercise_id: WorkoutExerciseID, set: Set) -> bool {
        match self
            .exercises
            .iter_mut()
            .find(|we| we.id == workout_exercise_id)
        {
            Some(we) => {
                we.sets.push(set);
                true
            }
            None => false,
        }
    }

    /// Remove a set and renumber the remaining sets of its workout exercise contiguously.
    pub fn remove_set(&mut self, workout_exercise_id: WorkoutExerciseID, id: SetID) -> bool {
        let Some(we) = self
            .exercises
            .iter_mut()
            .find(|we| we.id == workout_exercise_id)
        else {
            return false;
        };
        let len = we.sets.len();
        we.sets.retain(|s| s.id != id);
        for (set_number, set) in (1..).zip(we.sets.iter_mut()) {
            set.set_number = set_number;
        }
        we.sets.len() != len
    }

    /// Replace the set with the same identity.
    pub fn replace_set(&mut self, set: Set) -> bool {
        for we in &mut self.exercises {
            if let Some(s) = we.sets.iter_mut().find(|s| s.id == set.id) {
                *s = set;
                return true;
            }
        }
        false
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutID(u32);

impl WorkoutID {
    #[must_use]
    pub fn nil() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for WorkoutID {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExercise {
    pub id: WorkoutExerciseID,
    pub exercise_id: ExerciseID,
    pub exercise: Option<Exercise>,
    pub order: u32,
    pub sets: Vec<Set>,
}

impl WorkoutExercise {
    #[must_use]
    pub fn fields(&self) -> FieldSet {
        self.exercise
            .as_ref()
            .map(|e| e.fields.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn muscle_group(&self) -> MuscleGroup {
        self.exercise
            .as_ref()
            .map(|e| e.muscle_group.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn next_set_number(&self) -> u32 {
        u32::try_from(self.sets.len()).unwrap_or(u32::MAX - 1) + 1
    }
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutExerciseID(u32);

impl From<u32> for WorkoutExerciseID {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub id: SetID,
    pub set_number: u32,
    pub set_type: SetType,
    pub reps: Option<Reps>,
    pub weight: Option<Weight>,
    pub duration: Option<Seconds>,
    pub distance: Option<Distance>,
    pub rest_time: Option<Seconds>,
    pub notes: Option<String>,
}

#[derive(Deref, Display, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SetID(u32);

impl From<u32> for SetID {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, StrumDisplay, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum SetType {
    #[default]
    Normal,
    Warmup,
    Dropset,
    Superset,
}

/// Request payload for a new set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSet {
    pub set_number: u32,
    pub set_type: SetType,
    pub reps: Option<Reps>,
    pub weight: Option<Weight>,
    pub duration: Option<Seconds>,
    pub distance: Option<Distance>,
    pub rest_time: Option<Seconds>,
}

/// Partial update of the editable fields of a set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetPatch {
    pub set_type: Option<SetType>,
    pub reps: Option<Reps>,
    pub weight: Option<Weight>,
    pub duration: Option<Seconds>,
    pub distance: Option<Distance>,
    pub rest_time: Option<Seconds>,
    pub notes: Option<String>,
}

impl SetPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == SetPatch::default()
    }

    /// Field-level merge, fields present in `other` win.
    pub fn merge(&mut self, other: SetPatch) {
        if other.set_type.is_some() {
            self.set_type = other.set_type;
        }
        if other.reps.is_some() {
            self.reps = other.reps;
        }
        if other.weight.is_some() {
            self.weight = other.weight;
        }
        if other.duration.is_some() {
            self.duration = other.duration;
        }
        if other.distance.is_some() {
            self.distance = other.distance;
        }
        if other.rest_time.is_some() {
            self.rest_time = other.rest_time;
        }
        if other.notes.is_some() {
            self.notes = other.notes;
        }
    }

    /// Overlay the patch on a set without modifying the set.
    #[must_use]
    pub fn apply(&self, set: &Set) -> Set {
        Set {
            id: set.id,
            set_number: set.set_number,
            set_type: self.set_type.unwrap_or(set.set_type),
            reps: self.reps.or(set.reps),
            weight: self.weight.or(set.weight),
            duration: self.duration.or(set.duration),
            distance: self.distance.or(set.distance),
            rest_time: self.rest_time.or(set.rest_time),
            notes: self.notes.clone().or_else(|| set.notes.clone()),
        }
    }

    /// Drop numeric fields that are not part of the field set.
    #[must_use]
    pub fn restricted_to(&self, fields: &FieldSet) -> SetPatch {
        use crate::Field;

        SetPatch {
            set_type: self.set_type,
            reps: self.reps.filter(|_| fields.contains(Field::Reps)),
            weight: self.weight.filter(|_| fields.contains(Field::Weight)),
            duration: self.duration.filter(|_| fields.contains(Field::Duration)),
            distance: self.distance.filter(|_| fields.contains(Field::Distance)),
            rest_time: self.rest_time,
            notes: self.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::Field;

    use super::*;

    fn set(id: u32, set_number: u32) -> Set {
        Set {
            id: id.into(),
            set_number,
            set_type: SetType::Normal,
            reps: Some(Reps::new(10)),
            weight: Some(Weight::new(20.0).unwrap()),
            duration: None,
            distance: None,
            rest_time: None,
            notes: None,
        }
    }

    static WORKOUT: std::sync::LazyLock<Workout> = std::sync::LazyLock::new(|| Workout {
        id: 1.into(),
        user_id: 42.into(),
        name: String::from("Push"),
        start: Some(Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()),
        end: None,
        notes: String::new(),
        exercises: vec![
            WorkoutExercise {
                id: 10.into(),
                exercise_id: 100.into(),
                exercise: None,
                order: 1,
                sets: vec![set(1, 1), set(2, 2), set(3, 3)],
            },
            WorkoutExercise {
                id: 11.into(),
                exercise_id: 101.into(),
                exercise: None,
                order: 2,
                sets: vec![set(4, 1)],
            },
        ],
    });

    #[test]
    fn test_session_state() {
        let mut workout = WORKOUT.clone();
        assert_eq!(SessionState::of(None), SessionState::None);
        assert_eq!(SessionState::of(Some(&workout)), SessionState::Active);
        workout.end = Some(Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap());
        assert_eq!(SessionState::of(Some(&workout)), SessionState::Ended);
    }

    #[test]
    fn test_workout_set_ids() {
        assert_eq!(
            WORKOUT.set_ids(),
            BTreeSet::from([1.into(), 2.into(), 3.into(), 4.into()])
        );
    }

    #[test]
    fn test_workout_find_set() {
        let (we, s) = WORKOUT.find_set(4.into()).unwrap();
        assert_eq!(we.id, 11.into());
        assert_eq!(s.set_number, 1);
        assert_eq!(WORKOUT.find_set(5.into()), None);
    }

    #[test]
    fn test_workout_next_order() {
        assert_eq!(WORKOUT.next_order(), 3);
        assert_eq!(WORKOUT.exercises[0].next_set_number(), 4);
    }

    #[rstest]
    #[case::first(1, vec![(2, 1), (3, 2)])]
    #[case::middle(2, vec![(1, 1), (3, 2)])]
    #[case::last(3, vec![(1, 1), (2, 2)])]
    fn test_workout_remove_set(#[case] id: u32, #[case] expected: Vec<(u32, u32)>) {
        let mut workout = WORKOUT.clone();
        assert!(workout.remove_set(10.into(), id.into()));
        assert_eq!(
            workout.exercises[0]
                .sets
                .iter()
                .map(|s| (*s.id, s.set_number))
                .collect::<Vec<_>>(),
            expected
        );
    }

    #[test]
    fn test_workout_remove_set_unknown() {
        let mut workout = WORKOUT.clone();
        assert!(!workout.remove_set(10.into(), 4.into()));
        assert!(!workout.remove_set(12.into(), 1.into()));
        assert_eq!(workout, *WORKOUT);
    }

    #[test]
    fn test_workout_remove_workout_exercise() {
        let mut workout = WORKOUT.clone();
        let removed = workout.remove_workout_exercise(10.into()).unwrap();
        assert_eq!(removed.sets.len(), 3);
        assert_eq!(workout.exercises.len(), 1);
        assert_eq!(workout.remove_workout_exercise(10.into()), None);
    }

    #[test]
    fn test_workout_add_and_replace_set() {
        let mut workout = WORKOUT.clone();
        assert!(workout.add_set(11.into(), set(5, 2)));
        assert!(!workout.add_set(12.into(), set(6, 1)));
        let mut replacement = set(5, 2);
        replacement.reps = Some(Reps::new(3));
        assert!(workout.replace_set(replacement.clone()));
        assert_eq!(workout.find_set(5.into()).unwrap().1, &replacement);
        assert!(!workout.replace_set(set(7, 1)));
    }

    #[test]
    fn test_set_patch_merge_later_wins() {
        let mut patch = SetPatch {
            reps: Some(Reps::new(5)),
            notes: Some(String::from("a")),
            ..SetPatch::default()
        };
        patch.merge(SetPatch {
            reps: Some(Reps::new(6)),
            weight: Some(Weight::new(40.0).unwrap()),
            ..SetPatch::default()
        });
        assert_eq!(
            patch,
            SetPatch {
                reps: Some(Reps::new(6)),
                weight: Some(Weight::new(40.0).unwrap()),
                notes: Some(String::from("a")),
                ..SetPatch::default()
            }
        );
    }

    #[test]
    fn test_set_patch_apply() {
        let original = set(1, 1);
        let patch = SetPatch {
            reps: Some(Reps::new(12)),
            rest_time: Some(Seconds::new(90)),
            ..SetPatch::default()
        };
        let patched = patch.apply(&original);
        assert_eq!(patched.reps, Some(Reps::new(12)));
        assert_eq!(patched.rest_time, Some(Seconds::new(90)));
        assert_eq!(patched.weight, original.weight);
        assert_eq!(patched.set_number, original.set_number);
        assert_eq!(SetPatch::default().apply(&original), original);
    }

    #[test]
    fn test_set_patch_restricted_to() {
        let patch = SetPatch {
            reps: Some(Reps::new(12)),
            weight: Some(Weight::new(40.0).unwrap()),
            duration: Some(Seconds::new(30)),
            rest_time: Some(Seconds::new(60)),
            ..SetPatch::default()
        };
        assert_eq!(
            patch.restricted_to(&FieldSet::new([Field::Duration]).unwrap()),
            SetPatch {
                duration: Some(Seconds::new(30)),
                rest_time: Some(Seconds::new(60)),
                ..SetPatch::default()
            }
        );
    }

    #[test]
    fn test_workout_exercise_defaults() {
        let we = &WORKOUT.exercises[0];
        assert_eq!(we.fields(), FieldSet::default());
        assert_eq!(we.muscle_group(), MuscleGroup::default());
    }

    #[rstest]
    #[case("normal", SetType::Normal)]
    #[case("warmup", SetType::Warmup)]
    #[case("dropset", SetType::Dropset)]
    #[case("superset", SetType::Superset)]
    fn test_set_type_from_str(#[case] name: &str, #[case] expected: SetType) {
        assert_eq!(name.parse::<SetType>(), Ok(expected));
        assert_eq!(expected.as_ref(), name);
    }
}
