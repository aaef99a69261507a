//! Application state
//!
//! `AppState` owns everything the client knows: the authenticated user, the exercise catalog,
//! the active workout together with its set overrides, the workout history and the user-scoped
//! preferences. All changes go through its operations.
//!
//! Failed requests leave the state unchanged. The failure has already been logged by the
//! service, so the operations do not return it. Authentication is the exception, its error is
//! shown to the user.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use spotter_domain::{
    AuthError, AuthService, Credentials, Exercise, ExerciseFilter, ExerciseID, ExerciseService,
    FieldSet, HistoryWindow, Identity, ImageBoard, ImageEntry, ImageID, NewExercise,
    OverrideStore, SessionState, Set, SetID, SetInput, SetInputError, SetOverride, SetPatch,
    SetView, Statistics, StatisticsWindow, User, UserService, Workout, WorkoutExerciseID,
    WorkoutID, WorkoutService, aggregate, confirm_set_added, confirm_set_deleted,
    confirm_set_saved, confirm_workout_exercise_deleted, decorate, filter_history, pending_patch,
    prune_overrides,
};

use crate::{Deferred, PreferenceService};

/// Set overrides of a workout session waiting to be persisted.
pub type OverrideSnapshot = (WorkoutID, BTreeMap<SetID, SetOverride>);

pub struct AppState<S, P, D> {
    service: S,
    preferences: P,
    persist: D,
    session: Option<spotter_domain::Session>,
    profile_picture: Option<String>,
    profile_picture_persist_failed: bool,
    image_board: ImageBoard,
    image_persist_failed: bool,
    exercises: Vec<Exercise>,
    active: Option<Workout>,
    overrides: OverrideStore,
    set_inputs: BTreeMap<WorkoutExerciseID, SetInput>,
    history: Vec<Workout>,
}

impl<S, P, D> AppState<S, P, D>
where
    S: AuthService + UserService + ExerciseService + WorkoutService,
    P: PreferenceService,
    D: Deferred<OverrideSnapshot>,
{
    pub fn new(service: S, preferences: P, persist: D) -> Self {
        Self {
            service,
            preferences,
            persist,
            session: None,
            profile_picture: None,
            profile_picture_persist_failed: false,
            image_board: ImageBoard::default(),
            image_persist_failed: false,
            exercises: vec![],
            active: None,
            overrides: OverrideStore::default(),
            set_inputs: BTreeMap::new(),
            history: vec![],
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::resolve(self.user())
    }

    #[must_use]
    pub fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }

    /// The confirmed profile picture could not be stored on this device.
    #[must_use]
    pub fn profile_picture_persist_failed(&self) -> bool {
        self.profile_picture_persist_failed
    }

    #[must_use]
    pub fn image_board(&self) -> &ImageBoard {
        &self.image_board
    }

    /// The last write of the image board failed, newly added images may be lost on reload.
    #[must_use]
    pub fn image_persist_failed(&self) -> bool {
        self.image_persist_failed
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    #[must_use]
    pub fn filtered_exercises(&self, filter: &ExerciseFilter) -> Vec<&Exercise> {
        filter.exercises(self.exercises.iter())
    }

    #[must_use]
    pub fn active_workout(&self) -> Option<&Workout> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        SessionState::of(self.active.as_ref())
    }

    #[must_use]
    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    #[must_use]
    pub fn set_view(&self, set: &Set) -> SetView {
        decorate(set, &self.overrides)
    }

    #[must_use]
    pub fn set_views(&self, workout_exercise_id: WorkoutExerciseID) -> Vec<SetView> {
        self.active
            .as_ref()
            .and_then(|w| w.workout_exercise(workout_exercise_id))
            .map(|we| we.sets.iter().map(|s| self.set_view(s)).collect())
            .unwrap_or_default()
    }

    /// Fields that can be entered for a workout exercise of the active workout.
    #[must_use]
    pub fn fields(&self, workout_exercise_id: WorkoutExerciseID) -> FieldSet {
        self.active
            .as_ref()
            .and_then(|w| w.workout_exercise(workout_exercise_id))
            .map(spotter_domain::WorkoutExercise::fields)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn set_input(&self, workout_exercise_id: WorkoutExerciseID) -> Option<&SetInput> {
        self.set_inputs.get(&workout_exercise_id)
    }

    pub fn set_input_mut(&mut self, workout_exercise_id: WorkoutExerciseID) -> &mut SetInput {
        self.set_inputs.entry(workout_exercise_id).or_default()
    }

    #[must_use]
    pub fn history(&self) -> &[Workout] {
        &self.history
    }

    #[must_use]
    pub fn filtered_history(&self, window: HistoryWindow, now: DateTime<Utc>) -> Vec<&Workout> {
        filter_history(&self.history, window, now)
    }

    #[must_use]
    pub fn statistics(&self, window: StatisticsWindow, now: DateTime<Utc>) -> Statistics {
        aggregate(&self.history, window.days(), now)
    }

    /// Continue the session stored on this device.
    ///
    /// Returns `false` if the user needs to log in.
    pub async fn restore(&mut self) -> bool {
        let Some(session) = self.preferences.get_auth() else {
            return false;
        };
        self.service.use_token(Some(session.token.clone()));
        self.session = Some(session);
        self.load_user_namespaces();
        self.refresh_active_workout().await;
        self.refresh_history().await;
        true
    }

    pub async fn login(&mut self, credentials: Credentials) -> Result<(), AuthError> {
        let session = self.service.login(credentials).await?;
        self.sign_in(session).await;
        Ok(())
    }

    pub async fn register(&mut self, credentials: Credentials) -> Result<(), AuthError> {
        let session = self.service.register(credentials).await?;
        self.sign_in(session).await;
        Ok(())
    }

    async fn sign_in(&mut self, session: spotter_domain::Session) {
        self.service.use_token(Some(session.token.clone()));
        let _ = self.preferences.set_auth(Some(&session));
        self.session = Some(session);
        self.load_user_namespaces();
        self.refresh_active_workout().await;
        self.refresh_history().await;
    }

    pub fn logout(&mut self) {
        self.set_active_workout(None);
        self.service.use_token(None);
        let _ = self.preferences.set_auth(None);
        self.session = None;
        self.profile_picture = None;
        self.profile_picture_persist_failed = false;
        self.image_board = ImageBoard::default();
        self.image_persist_failed = false;
        self.history.clear();
    }

    fn load_user_namespaces(&mut self) {
        let identity = self.identity();
        self.image_board = self.preferences.get_image_board(&identity);
        self.image_persist_failed = false;
        self.profile_picture_persist_failed = false;
        self.profile_picture = match self.user().and_then(|u| u.profile_picture.clone()) {
            Some(profile_picture) => Some(profile_picture),
            None => self.preferences.get_profile_picture(&identity),
        };
    }

    pub async fn update_profile_picture(&mut self, profile_picture: Option<String>) {
        if !self.is_authenticated() {
            return;
        }
        let Ok(user) = self.service.update_profile_picture(profile_picture).await else {
            return;
        };
        self.profile_picture_persist_failed = self
            .preferences
            .set_profile_picture(
                &Identity::resolve(Some(&user)),
                user.profile_picture.as_deref(),
            )
            .is_err();
        self.profile_picture.clone_from(&user.profile_picture);
        if let Some(session) = self.session.as_mut() {
            session.user = user;
            let _ = self.preferences.set_auth(Some(session));
        }
    }

    pub async fn load_exercises(&mut self) {
        if let Ok(exercises) = self.service.get_exercises().await {
            self.exercises = exercises;
        }
    }

    /// Create a custom exercise and optionally add it to the active workout.
    pub async fn create_exercise(
        &mut self,
        exercise: NewExercise,
        add_to_workout: bool,
    ) -> Option<ExerciseID> {
        let exercise = self.service.create_exercise(exercise).await.ok()?;
        let id = exercise.id;
        self.exercises.push(exercise);
        if add_to_workout && self.session_state() == SessionState::Active {
            self.add_exercise(id).await;
        }
        Some(id)
    }

    pub async fn refresh_active_workout(&mut self) {
        if let Ok(workout) = self.service.get_active_workout().await {
            self.set_active_workout(workout);
        }
    }

    pub async fn refresh_history(&mut self) {
        let Some(user_id) = self.user().map(|u| u.id) else {
            return;
        };
        if let Ok(history) = self.service.get_workouts(user_id).await {
            self.history = history;
        }
    }

    fn set_active_workout(&mut self, workout: Option<Workout>) {
        let session = workout.as_ref().map(|w| w.id);
        if session != self.overrides.session() {
            self.persist.flush();
            let overrides = session
                .map(|id| self.preferences.get_set_overrides(id))
                .unwrap_or_default();
            self.overrides.reload(session, overrides);
            self.set_inputs.clear();
        }
        self.active = workout;
        if let Some(active) = &self.active {
            let count = self.overrides.overrides().len();
            prune_overrides(active, &mut self.overrides);
            if self.overrides.overrides().len() != count {
                self.persist_overrides();
            }
        }
    }

    pub async fn start_workout(&mut self, name: &str) {
        if !self.is_authenticated() || self.session_state() == SessionState::Active {
            return;
        }
        if let Ok(workout) = self.service.start_workout(name.to_string()).await {
            self.set_active_workout(Some(workout));
        }
    }

    pub async fn end_workout(&mut self, notes: String) {
        let Some(id) = self.mutable_workout().map(|w| w.id) else {
            return;
        };
        let Ok(workout) = self.service.end_workout(id, notes).await else {
            return;
        };
        self.history.retain(|w| w.id != workout.id);
        self.history.insert(0, workout);
        self.set_active_workout(None);
    }

    pub async fn add_exercise(&mut self, exercise_id: ExerciseID) {
        let Some((workout_id, order)) = self.mutable_workout().map(|w| (w.id, w.next_order()))
        else {
            return;
        };
        let Ok(mut workout_exercise) = self
            .service
            .add_workout_exercise(workout_id, exercise_id, order)
            .await
        else {
            return;
        };
        if workout_exercise.exercise.is_none() {
            workout_exercise.exercise = self
                .exercises
                .iter()
                .find(|e| e.id == exercise_id)
                .cloned();
        }
        if let Some(active) = self.active.as_mut().filter(|w| w.id == workout_id) {
            active.exercises.push(workout_exercise);
        }
        self.sync_active_workout().await;
    }

    pub async fn remove_workout_exercise(&mut self, id: WorkoutExerciseID) {
        if self
            .mutable_workout()
            .and_then(|w| w.workout_exercise(id))
            .is_none()
        {
            return;
        }
        if self.service.delete_workout_exercise(id).await.is_err() {
            return;
        }
        let removed = match self.active.as_mut() {
            Some(active) => confirm_workout_exercise_deleted(active, &mut self.overrides, id),
            None => false,
        };
        if removed {
            self.set_inputs.remove(&id);
            self.persist_overrides();
            self.sync_active_workout().await;
        }
    }

    /// Add a set based on the current input of the workout exercise.
    ///
    /// Returns an error and keeps the input if it is invalid.
    pub async fn add_set(
        &mut self,
        workout_exercise_id: WorkoutExerciseID,
    ) -> Result<(), SetInputError> {
        let Some(workout_exercise) = self
            .mutable_workout()
            .and_then(|w| w.workout_exercise(workout_exercise_id))
        else {
            return Ok(());
        };
        let new_set = self
            .set_inputs
            .get(&workout_exercise_id)
            .cloned()
            .unwrap_or_default()
            .to_new_set(
                &workout_exercise.fields(),
                workout_exercise.next_set_number(),
            )?;
        let Ok(set) = self.service.create_set(workout_exercise_id, new_set).await else {
            return Ok(());
        };
        if let Some(active) = self.active.as_mut() {
            confirm_set_added(active, &mut self.overrides, workout_exercise_id, set);
        }
        self.set_inputs.remove(&workout_exercise_id);
        self.persist_overrides();
        self.sync_active_workout().await;
        Ok(())
    }

    pub async fn delete_set(&mut self, workout_exercise_id: WorkoutExerciseID, id: SetID) {
        if self
            .mutable_workout()
            .and_then(|w| w.find_set(id))
            .is_none_or(|(we, _)| we.id != workout_exercise_id)
        {
            return;
        }
        if self.service.delete_set(id).await.is_err() {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            confirm_set_deleted(active, &mut self.overrides, workout_exercise_id, id);
        }
        self.persist_overrides();
        self.sync_active_workout().await;
    }

    /// Record pending edits of a set without sending them to the server.
    pub fn edit_set(&mut self, id: SetID, patch: SetPatch) {
        if self.active_set(id).is_none() {
            return;
        }
        self.overrides.apply_patch(id, patch);
        self.persist_overrides();
    }

    pub fn toggle_set_done(&mut self, id: SetID) -> bool {
        if self.active_set(id).is_none() {
            return false;
        }
        let done = self.overrides.toggle_done(id);
        self.persist_overrides();
        done
    }

    /// Send the pending edits of a set to the server.
    pub async fn save_set(&mut self, id: SetID) {
        let Some(patch) = self
            .active
            .as_ref()
            .and_then(|w| pending_patch(w, &self.overrides, id))
        else {
            return;
        };
        let Ok(set) = self.service.modify_set(id, patch).await else {
            return;
        };
        if let Some(active) = self.active.as_mut() {
            confirm_set_saved(active, &mut self.overrides, set);
        }
        self.persist_overrides();
        self.sync_active_workout().await;
    }

    /// Save the notes of the active or any past workout.
    pub async fn save_notes(&mut self, id: WorkoutID, notes: String) {
        let Ok(workout) = self.service.modify_workout(id, None, Some(notes)).await else {
            return;
        };
        for entry in self.history.iter_mut().filter(|w| w.id == id) {
            entry.notes.clone_from(&workout.notes);
        }
        if let Some(active) = self.active.as_mut().filter(|w| w.id == id) {
            active.notes = workout.notes;
        }
    }

    pub fn add_image(&mut self, url: String, workout_id: Option<WorkoutID>, now: DateTime<Utc>) {
        self.image_board.add(ImageEntry {
            id: ImageID::new(),
            url,
            workout_id,
            created: now,
        });
        self.persist_image_board();
    }

    pub fn remove_image(&mut self, id: ImageID) {
        if self.image_board.remove(id) {
            self.persist_image_board();
        }
    }

    /// Write pending set overrides immediately, e.g. before the application is closed.
    pub fn flush(&mut self) {
        self.persist.flush();
    }

    fn persist_image_board(&mut self) {
        self.image_persist_failed = self
            .preferences
            .set_image_board(&self.identity(), &self.image_board)
            .is_err();
    }

    fn persist_overrides(&mut self) {
        if let Some(session) = self.overrides.session() {
            self.persist
                .schedule((session, self.overrides.overrides().clone()));
        }
    }

    async fn sync_active_workout(&self) {
        if let Some(active) = self.mutable_workout() {
            let _ = self.service.replace_workout(active.clone()).await;
        }
    }

    fn mutable_workout(&self) -> Option<&Workout> {
        let workout = self.active.as_ref()?;
        if workout.state() == SessionState::Active {
            Some(workout)
        } else {
            debug!("workout {} is not active", workout.id);
            None
        }
    }

    fn active_set(&self, id: SetID) -> Option<&Set> {
        self.active
            .as_ref()
            .and_then(|w| w.find_set(id))
            .map(|(_, s)| s)
    }
}
