use log::{debug, error};

use crate::{
    AuthError, AuthRepository, AuthService, AuthToken, CreateError, Credentials, DeleteError,
    Exercise, ExerciseID, ExerciseRepository, ExerciseService, NewExercise, NewSet, ReadError,
    Session, Set, SetID, SetPatch, UpdateError, User, UserID, UserRepository, UserService,
    Workout, WorkoutExercise, WorkoutExerciseID, WorkoutID, WorkoutRepository, WorkoutService,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

macro_rules! log_on_auth_error {
    ($func: expr, $action: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                AuthError::NoConnection => {
                    debug!("failed to {}: {err}", $action);
                }
                AuthError::Rejected(_) => {
                    error!("failed to {}: {err}", $action);
                }
            },
        }
        result
    }};
}

impl<R: AuthRepository> AuthService for Service<R> {
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthError> {
        log_on_auth_error!(self.repository.login(credentials), "log in")
    }

    async fn register(&self, credentials: Credentials) -> Result<Session, AuthError> {
        log_on_auth_error!(self.repository.register(credentials), "register")
    }

    fn use_token(&self, token: Option<AuthToken>) {
        self.repository.set_token(token);
    }
}

impl<R: UserRepository> UserService for Service<R> {
    async fn update_profile_picture(
        &self,
        profile_picture: Option<String>,
    ) -> Result<User, UpdateError> {
        log_on_error!(
            self.repository.update_profile_picture(profile_picture),
            UpdateError,
            "update",
            "profile picture"
        )
    }
}

impl<R: ExerciseRepository> ExerciseService for Service<R> {
    async fn get_exercises(&self) -> Result<Vec<Exercise>, ReadError> {
        log_on_error!(
            self.repository.read_exercises(),
            ReadError,
            "get",
            "exercises"
        )
    }

    async fn create_exercise(&self, exercise: NewExercise) -> Result<Exercise, CreateError> {
        log_on_error!(
            self.repository.create_exercise(exercise),
            CreateError,
            "create",
            "exercise"
        )
    }
}

impl<R: WorkoutRepository> WorkoutService for Service<R> {
    async fn get_active_workout(&self) -> Result<Option<Workout>, ReadError> {
        log_on_error!(
            self.repository.read_active_workout(),
            ReadError,
            "get",
            "active workout"
        )
    }

    async fn get_workouts(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError> {
        log_on_error!(
            self.repository.read_workouts(user_id),
            ReadError,
            "get",
            "workouts"
        )
    }

    async fn start_workout(&self, name: String) -> Result<Workout, CreateError> {
        log_on_error!(
            self.repository.create_workout(name),
            CreateError,
            "start",
            "workout"
        )
    }

    async fn modify_workout(
        &self,
        id: WorkoutID,
        name: Option<String>,
        notes: Option<String>,
    ) -> Result<Workout, UpdateError> {
        log_on_error!(
            self.repository.modify_workout(id, name, notes),
            UpdateError,
            "modify",
            "workout"
        )
    }

    async fn replace_workout(&self, workout: Workout) -> Result<Workout, UpdateError> {
        log_on_error!(
            self.repository.replace_workout(workout),
            UpdateError,
            "replace",
            "workout"
        )
    }

    async fn end_workout(&self, id: WorkoutID, notes: String) -> Result<Workout, UpdateError> {
        log_on_error!(
            self.repository.end_workout(id, notes),
            UpdateError,
            "end",
            "workout"
        )
    }

    async fn add_workout_exercise(
        &self,
        workout_id: WorkoutID,
        exercise_id: ExerciseID,
        order: u32,
    ) -> Result<WorkoutExercise, CreateError> {
        log_on_error!(
            self.repository
                .create_workout_exercise(workout_id, exercise_id, order),
            CreateError,
            "add",
            "workout exercise"
        )
    }

    async fn delete_workout_exercise(
        &self,
        id: WorkoutExerciseID,
    ) -> Result<WorkoutExerciseID, DeleteError> {
        log_on_error!(
            self.repository.delete_workout_exercise(id),
            DeleteError,
            "delete",
            "workout exercise"
        )
    }

    async fn create_set(
        &self,
        workout_exercise_id: WorkoutExerciseID,
        set: NewSet,
    ) -> Result<Set, CreateError> {
        log_on_error!(
            self.repository.create_set(workout_exercise_id, set),
            CreateError,
            "create",
            "set"
        )
    }

    async fn modify_set(&self, id: SetID, patch: SetPatch) -> Result<Set, UpdateError> {
        log_on_error!(
            self.repository.modify_set(id, patch),
            UpdateError,
            "modify",
            "set"
        )
    }

    async fn delete_set(&self, id: SetID) -> Result<SetID, DeleteError> {
        log_on_error!(
            self.repository.delete_set(id),
            DeleteError,
            "delete",
            "set"
        )
    }
}
