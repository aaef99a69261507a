use crate::{OverrideStore, Set, SetID, SetPatch, Workout, WorkoutExerciseID};

/// Effective state of a set as shown and edited in the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SetView {
    pub set: Set,
    pub done: bool,
}

/// Merge the pending patch of a set over the server record.
#[must_use]
pub fn decorate(set: &Set, store: &OverrideStore) -> SetView {
    match store.get(set.id) {
        Some(set_override) => SetView {
            set: set_override.edit.apply(set),
            done: set_override.is_done(),
        },
        None => SetView {
            set: set.clone(),
            done: false,
        },
    }
}

/// Pending edits of a set limited to the fields of its exercise.
///
/// Returns `None` if the set is unknown or nothing is pending.
#[must_use]
pub fn pending_patch(workout: &Workout, store: &OverrideStore, id: SetID) -> Option<SetPatch> {
    let (workout_exercise, _) = workout.find_set(id)?;
    let set_override = store.get(id)?;
    let patch = set_override.edit.restricted_to(&workout_exercise.fields());
    if patch.is_empty() { None } else { Some(patch) }
}

/// Apply a set confirmed by the server.
///
/// The raw record is replaced and the pending edits are cleared. The completion flag stays.
pub fn confirm_set_saved(workout: &mut Workout, store: &mut OverrideStore, saved: Set) -> bool {
    let id = saved.id;
    if workout.replace_set(saved) {
        store.clear_edit(id);
        true
    } else {
        false
    }
}

pub fn confirm_set_added(
    workout: &mut Workout,
    store: &mut OverrideStore,
    workout_exercise_id: WorkoutExerciseID,
    set: Set,
) -> bool {
    // a stale entry for a reused identity must not show up on the new set
    store.drop_overrides_for([set.id]);
    workout.add_set(workout_exercise_id, set)
}

pub fn confirm_set_deleted(
    workout: &mut Workout,
    store: &mut OverrideStore,
    workout_exercise_id: WorkoutExerciseID,
    id: SetID,
) -> bool {
    store.drop_overrides_for([id]);
    workout.remove_set(workout_exercise_id, id)
}

pub fn confirm_workout_exercise_deleted(
    workout: &mut Workout,
    store: &mut OverrideStore,
    id: WorkoutExerciseID,
) -> bool {
    match workout.remove_workout_exercise(id) {
        Some(removed) => {
            store.drop_overrides_for(removed.sets.iter().map(|s| s.id));
            true
        }
        None => false,
    }
}

/// Remove overrides of sets that are no longer part of the workout.
pub fn prune_overrides(workout: &Workout, store: &mut OverrideStore) {
    store.retain_existing(&workout.set_ids());
}
