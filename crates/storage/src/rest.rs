//! REST
//!
//! Client for the workout tracker API. The server is the authoritative data source, no data is
//! cached. All requests except login and registration carry the bearer token set by
//! `set_token`.

use std::cell::RefCell;

use chrono::NaiveDateTime;
use gloo_net::http::{Request, RequestBuilder, Response};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use spotter_domain as domain;

use crate::Config;

const AUTHENTICATION_FAILED: &str = "Authentication failed";

#[allow(async_fn_in_trait)]
pub trait SendRequest {
    async fn send_request(&self, request: Request) -> Result<Response, gloo_net::Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlooNetSendRequest;

impl SendRequest for GlooNetSendRequest {
    async fn send_request(&self, request: Request) -> Result<Response, gloo_net::Error> {
        request.send().await
    }
}

pub struct REST<S: SendRequest> {
    pub sender: S,
    base_url: String,
    token: RefCell<Option<domain::AuthToken>>,
}

impl REST<GlooNetSendRequest> {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_sender(GlooNetSendRequest, config)
    }
}

impl<S: SendRequest> REST<S> {
    pub fn with_sender(sender: S, config: &Config) -> Self {
        Self {
            sender,
            base_url: config.api_url.clone(),
            token: RefCell::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.borrow().as_ref() {
            Some(token) => builder.header("Authorization", &format!("Bearer {token}")),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(Request::get(&self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(Request::post(&self.url(path)))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.authorized(Request::put(&self.url(path)))
    }

    fn patch(&self, path: &str) -> RequestBuilder {
        self.authorized(Request::patch(&self.url(path)))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.authorized(Request::delete(&self.url(path)))
    }

    async fn send(
        &self,
        request: Result<Request, gloo_net::Error>,
    ) -> Result<Response, domain::StorageError> {
        let request = request.map_err(|err| domain::StorageError::Other(Box::new(err)))?;
        self.sender
            .send_request(request)
            .await
            .map_err(|_| domain::StorageError::NoConnection)
    }

    async fn fetch<T, E>(
        &self,
        request: Result<Request, gloo_net::Error>,
        error: fn(&Response) -> E,
    ) -> Result<T, E>
    where
        T: DeserializeOwned,
        E: From<domain::StorageError>,
    {
        let response = self.send(request).await?;
        if !response.ok() {
            return Err(error(&response));
        }
        Ok(decode(response).await?)
    }

    async fn fetch_no_content<E>(
        &self,
        request: Result<Request, gloo_net::Error>,
        error: fn(&Response) -> E,
    ) -> Result<(), E>
    where
        E: From<domain::StorageError>,
    {
        let response = self.send(request).await?;
        if !response.ok() {
            return Err(error(&response));
        }
        Ok(())
    }

    async fn authenticate(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<domain::Session, domain::AuthError> {
        let request = Request::post(&self.url(path))
            .json(credentials)
            .map_err(|err| {
                debug!("failed to build authentication request: {err}");
                rejected(None)
            })?;
        let response = self
            .sender
            .send_request(request)
            .await
            .map_err(|_| domain::AuthError::NoConnection)?;
        if response.ok() {
            match response.json::<Session>().await {
                Ok(session) => domain::Session::try_from(session),
                Err(err) => {
                    debug!("failed to decode session: {err}");
                    Err(rejected(None))
                }
            }
        } else {
            let message = response
                .json::<Message>()
                .await
                .ok()
                .and_then(|m| m.message);
            Err(rejected(message))
        }
    }
}

impl<S: SendRequest> domain::AuthRepository for REST<S> {
    async fn login(
        &self,
        credentials: domain::Credentials,
    ) -> Result<domain::Session, domain::AuthError> {
        self.authenticate(
            "login",
            &Credentials {
                email: None,
                ..Credentials::from(credentials)
            },
        )
        .await
    }

    async fn register(
        &self,
        credentials: domain::Credentials,
    ) -> Result<domain::Session, domain::AuthError> {
        self.authenticate("register", &Credentials::from(credentials))
            .await
    }

    fn set_token(&self, token: Option<domain::AuthToken>) {
        *self.token.borrow_mut() = token;
    }
}

impl<S: SendRequest> domain::UserRepository for REST<S> {
    async fn update_profile_picture(
        &self,
        profile_picture: Option<String>,
    ) -> Result<domain::User, domain::UpdateError> {
        self.fetch::<User, _>(
            self.put("me")
                .json(&json!({ "profile_picture": profile_picture })),
            update_error,
        )
        .await
        .map(domain::User::from)
    }
}

impl<S: SendRequest> domain::ExerciseRepository for REST<S> {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        let exercises = self
            .fetch::<Vec<Exercise>, _>(self.get("exercises").build(), read_error)
            .await?;
        Ok(exercises.into_iter().map(domain::Exercise::from).collect())
    }

    async fn create_exercise(
        &self,
        exercise: domain::NewExercise,
    ) -> Result<domain::Exercise, domain::CreateError> {
        self.fetch::<Exercise, _>(
            self.post("exercises").json(&NewExercise::from(exercise)),
            create_error,
        )
        .await
        .map(domain::Exercise::from)
    }
}

impl<S: SendRequest> domain::WorkoutRepository for REST<S> {
    async fn read_active_workout(&self) -> Result<Option<domain::Workout>, domain::ReadError> {
        let response = self.send(self.get("workouts/active").build()).await?;
        if response.status() == 204 {
            return Ok(None);
        }
        if !response.ok() {
            return Err(read_error(&response));
        }
        Ok(Some(decode::<Workout>(response).await?.into()))
    }

    async fn read_workouts(
        &self,
        user_id: domain::UserID,
    ) -> Result<Vec<domain::Workout>, domain::ReadError> {
        let workouts = self
            .fetch::<Vec<Workout>, _>(
                self.get(&format!("users/{user_id}/workouts")).build(),
                read_error,
            )
            .await?;
        Ok(workouts.into_iter().map(domain::Workout::from).collect())
    }

    async fn create_workout(&self, name: String) -> Result<domain::Workout, domain::CreateError> {
        self.fetch::<Workout, _>(
            self.post("workouts").json(&json!({ "name": name })),
            create_error,
        )
        .await
        .map(domain::Workout::from)
    }

    async fn modify_workout(
        &self,
        id: domain::WorkoutID,
        name: Option<String>,
        notes: Option<String>,
    ) -> Result<domain::Workout, domain::UpdateError> {
        let mut content = Map::new();
        if let Some(name) = name {
            content.insert("name".into(), json!(name));
        }
        if let Some(notes) = notes {
            content.insert("notes".into(), json!(notes));
        }
        self.fetch::<Workout, _>(
            self.patch(&format!("workouts/{id}")).json(&content),
            update_error,
        )
        .await
        .map(domain::Workout::from)
    }

    async fn replace_workout(
        &self,
        workout: domain::Workout,
    ) -> Result<domain::Workout, domain::UpdateError> {
        self.fetch::<Workout, _>(
            self.patch(&format!("workouts/{}", workout.id))
                .json(&Workout::from(workout)),
            update_error,
        )
        .await
        .map(domain::Workout::from)
    }

    async fn end_workout(
        &self,
        id: domain::WorkoutID,
        notes: String,
    ) -> Result<domain::Workout, domain::UpdateError> {
        self.fetch::<Workout, _>(
            self.put(&format!("workouts/{id}"))
                .json(&json!({ "notes": notes })),
            update_error,
        )
        .await
        .map(domain::Workout::from)
    }

    async fn create_workout_exercise(
        &self,
        workout_id: domain::WorkoutID,
        exercise_id: domain::ExerciseID,
        order: u32,
    ) -> Result<domain::WorkoutExercise, domain::CreateError> {
        self.fetch::<WorkoutExercise, _>(
            self.post(&format!("workouts/{workout_id}/exercises"))
                .json(&json!({
                    "exercise_id": *exercise_id,
                    "order_in_workout": order,
                })),
            create_error,
        )
        .await
        .map(domain::WorkoutExercise::from)
    }

    async fn delete_workout_exercise(
        &self,
        id: domain::WorkoutExerciseID,
    ) -> Result<domain::WorkoutExerciseID, domain::DeleteError> {
        self.fetch_no_content(
            self.delete(&format!("workout-exercises/{id}")).build(),
            delete_error,
        )
        .await?;
        Ok(id)
    }

    async fn create_set(
        &self,
        workout_exercise_id: domain::WorkoutExerciseID,
        set: domain::NewSet,
    ) -> Result<domain::Set, domain::CreateError> {
        self.fetch::<Set, _>(
            self.post(&format!("workout-exercises/{workout_exercise_id}/sets"))
                .json(&NewSet::from(set)),
            create_error,
        )
        .await
        .map(domain::Set::from)
    }

    async fn modify_set(
        &self,
        id: domain::SetID,
        patch: domain::SetPatch,
    ) -> Result<domain::Set, domain::UpdateError> {
        self.fetch::<Set, _>(
            self.patch(&format!("sets/{id}"))
                .json(&SetPatch::from(patch)),
            update_error,
        )
        .await
        .map(domain::Set::from)
    }

    async fn delete_set(&self, id: domain::SetID) -> Result<domain::SetID, domain::DeleteError> {
        self.fetch_no_content(self.delete(&format!("sets/{id}")).build(), delete_error)
            .await?;
        Ok(id)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, domain::StorageError> {
    response.json::<T>().await.map_err(|err| {
        domain::StorageError::Other(format!("deserialization failed: {err}").into())
    })
}

fn status_error(response: &Response) -> domain::StorageError {
    if response.status() == 401 {
        domain::StorageError::Unauthorized
    } else {
        domain::StorageError::Other(
            format!("{} {}", response.status(), response.status_text()).into(),
        )
    }
}

fn read_error(response: &Response) -> domain::ReadError {
    if response.status() == 404 {
        domain::ReadError::NotFound
    } else {
        domain::ReadError::Storage(status_error(response))
    }
}

fn create_error(response: &Response) -> domain::CreateError {
    if response.status() == 409 {
        domain::CreateError::Conflict
    } else {
        domain::CreateError::Storage(status_error(response))
    }
}

fn update_error(response: &Response) -> domain::UpdateError {
    if response.status() == 409 {
        domain::UpdateError::Conflict
    } else {
        domain::UpdateError::Storage(status_error(response))
    }
}

fn delete_error(response: &Response) -> domain::DeleteError {
    domain::DeleteError::Storage(status_error(response))
}

fn rejected(message: Option<String>) -> domain::AuthError {
    domain::AuthError::Rejected(
        message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| AUTHENTICATION_FAILED.to_string()),
    )
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<domain::Credentials> for Credentials {
    fn from(value: domain::Credentials) -> Self {
        Self {
            username: value.username.trim().to_string(),
            password: value.password,
            email: value
                .email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
        }
    }
}

#[derive(Deserialize)]
struct Message {
    message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

impl TryFrom<Session> for domain::Session {
    type Error = domain::AuthError;

    fn try_from(value: Session) -> Result<Self, Self::Error> {
        Ok(domain::Session {
            token: domain::AuthToken::new(&value.access_token).ok_or_else(|| rejected(None))?,
            user: value.user.into(),
        })
    }
}

impl From<domain::Session> for Session {
    fn from(value: domain::Session) -> Self {
        Self {
            access_token: value.token.to_string(),
            user: value.user.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub username: String,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<User> for domain::User {
    fn from(value: User) -> Self {
        domain::User {
            id: value.id.into(),
            username: value.username,
            email: value.email.filter(|email| !email.is_empty()),
            profile_picture: value.profile_picture.filter(|p| !p.is_empty()),
        }
    }
}

impl From<domain::User> for User {
    fn from(value: domain::User) -> Self {
        Self {
            id: *value.id,
            username: value.username,
            email: value.email,
            profile_picture: value.profile_picture,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub difficulty: Option<String>,
    /// Field configuration, either as serialized JSON string or as object.
    pub instructions: Option<Value>,
    #[serde(default)]
    pub is_custom: bool,
}

impl From<Exercise> for domain::Exercise {
    fn from(value: Exercise) -> Self {
        domain::Exercise {
            id: value.id.into(),
            name: value.name,
            description: value.description.filter(|d| !d.is_empty()),
            muscle_group: domain::MuscleGroup::new(value.muscle_group.as_deref().unwrap_or("")),
            equipment: value.equipment.filter(|e| !e.is_empty()),
            difficulty: value
                .difficulty
                .and_then(|d| d.trim().to_lowercase().parse().ok()),
            fields: domain::resolve_fields(&domain::FieldConfig::from(value.instructions)),
            is_custom: value.is_custom,
        }
    }
}

impl From<domain::Exercise> for Exercise {
    fn from(value: domain::Exercise) -> Self {
        Self {
            id: *value.id,
            name: value.name,
            description: value.description,
            muscle_group: Some(value.muscle_group.as_ref().to_string()),
            equipment: value.equipment,
            difficulty: value.difficulty.map(|d| d.to_string()),
            instructions: Some(Value::String(value.fields.to_config())),
            is_custom: value.is_custom,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct NewExercise {
    name: String,
    muscle_group: String,
    equipment: Option<String>,
    difficulty: Option<String>,
    instructions: String,
}

impl From<domain::NewExercise> for NewExercise {
    fn from(value: domain::NewExercise) -> Self {
        Self {
            name: value.name.to_string(),
            muscle_group: value.muscle_group.as_ref().to_string(),
            equipment: value
                .equipment
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            difficulty: value.difficulty.map(|d| d.to_string()),
            instructions: value.fields.to_config(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: u32,
    pub user_id: u32,
    pub name: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

impl From<Workout> for domain::Workout {
    fn from(value: Workout) -> Self {
        let mut exercises = value
            .exercises
            .into_iter()
            .map(domain::WorkoutExercise::from)
            .collect::<Vec<_>>();
        exercises.sort_by_key(|e| e.order);
        domain::Workout {
            id: value.id.into(),
            user_id: value.user_id.into(),
            name: value.name.unwrap_or_default(),
            start: value.start_time.map(|t| t.and_utc()),
            end: value.end_time.map(|t| t.and_utc()),
            notes: value.notes.unwrap_or_default(),
            exercises,
        }
    }
}

impl From<domain::Workout> for Workout {
    fn from(value: domain::Workout) -> Self {
        Self {
            id: *value.id,
            user_id: *value.user_id,
            name: Some(value.name),
            start_time: value.start.map(|t| t.naive_utc()),
            end_time: value.end.map(|t| t.naive_utc()),
            notes: Some(value.notes),
            exercises: value
                .exercises
                .into_iter()
                .map(WorkoutExercise::from)
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutExercise {
    pub id: u32,
    pub exercise_id: u32,
    pub exercise: Option<Exercise>,
    pub order_in_workout: u32,
    #[serde(default)]
    pub sets: Vec<Set>,
}

impl From<WorkoutExercise> for domain::WorkoutExercise {
    fn from(value: WorkoutExercise) -> Self {
        let mut sets = value
            .sets
            .into_iter()
            .map(domain::Set::from)
            .collect::<Vec<_>>();
        sets.sort_by_key(|s| s.set_number);
        domain::WorkoutExercise {
            id: value.id.into(),
            exercise_id: value.exercise_id.into(),
            exercise: value.exercise.map(domain::Exercise::from),
            order: value.order_in_workout,
            sets,
        }
    }
}

impl From<domain::WorkoutExercise> for WorkoutExercise {
    fn from(value: domain::WorkoutExercise) -> Self {
        Self {
            id: *value.id,
            exercise_id: *value.exercise_id,
            exercise: value.exercise.map(Exercise::from),
            order_in_workout: value.order,
            sets: value.sets.into_iter().map(Set::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Set {
    pub id: u32,
    pub set_number: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub weight: Option<f32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub distance: Option<f32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rest_time: Option<u32>,
    pub set_type: Option<String>,
    pub notes: Option<String>,
}

impl From<Set> for domain::Set {
    fn from(value: Set) -> Self {
        domain::Set {
            id: value.id.into(),
            set_number: value.set_number,
            set_type: set_type(value.set_type.as_deref()),
            reps: value.reps.map(domain::Reps::new),
            weight: value.weight.and_then(|w| domain::Weight::new(w).ok()),
            duration: value.duration.map(domain::Seconds::new),
            distance: value.distance.and_then(|d| domain::Distance::new(d).ok()),
            rest_time: value.rest_time.map(domain::Seconds::new),
            notes: value.notes.filter(|n| !n.is_empty()),
        }
    }
}

impl From<domain::Set> for Set {
    fn from(value: domain::Set) -> Self {
        Self {
            id: *value.id,
            set_number: value.set_number,
            reps: value.reps.map(u32::from),
            weight: value.weight.map(f32::from),
            duration: value.duration.map(u32::from),
            distance: value.distance.map(f32::from),
            rest_time: value.rest_time.map(u32::from),
            set_type: Some(value.set_type.to_string()),
            notes: value.notes,
        }
    }
}

// Set values are stored by the server as sent by clients. A value of the wrong kind is treated as
// absent instead of failing the whole response.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| {
        let count = match &value {
            Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(string) => string.trim().parse().ok(),
            _ => None,
        };
        if count.is_none() && !value.is_null() {
            debug!("ignoring invalid count {value}");
        }
        count
    }))
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| {
        #[allow(clippy::cast_possible_truncation)]
        let amount = match &value {
            Value::Number(number) => number.as_f64(),
            Value::String(string) => string.trim().parse().ok(),
            _ => None,
        }
        .map(|amount| amount as f32)
        .filter(|amount| amount.is_finite() && *amount >= 0.0);
        if amount.is_none() && !value.is_null() {
            debug!("ignoring invalid amount {value}");
        }
        amount
    }))
}

fn set_type(value: Option<&str>) -> domain::SetType {
    match value.map(str::parse::<domain::SetType>) {
        Some(Ok(set_type)) => set_type,
        Some(Err(_)) => {
            debug!("unknown set type {value:?}");
            domain::SetType::default()
        }
        None => domain::SetType::default(),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct NewSet {
    set_number: u32,
    set_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rest_time: Option<u32>,
}

impl From<domain::NewSet> for NewSet {
    fn from(value: domain::NewSet) -> Self {
        Self {
            set_number: value.set_number,
            set_type: value.set_type.to_string(),
            reps: value.reps.map(u32::from),
            weight: value.weight.map(f32::from),
            duration: value.duration.map(u32::from),
            distance: value.distance.map(f32::from),
            rest_time: value.rest_time.map(u32::from),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct SetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    set_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rest_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl From<domain::SetPatch> for SetPatch {
    fn from(value: domain::SetPatch) -> Self {
        Self {
            set_type: value.set_type.map(|t| t.to_string()),
            reps: value.reps.map(u32::from),
            weight: value.weight.map(f32::from),
            duration: value.duration.map(u32::from),
            distance: value.distance.map(f32::from),
            rest_time: value.rest_time.map(u32::from),
            notes: value.notes,
        }
    }
}
