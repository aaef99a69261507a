//! Local storage
//!
//! Client state that has to survive a reload. All values are stored as strings under the keys
//! used by earlier releases of the client, so data written by them stays readable.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Mutex,
};

use chrono::DateTime;
use gloo_storage::Storage as _;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use spotter_domain as domain;
use spotter_web_app::{PreferenceRepository, Settings, SettingsRepository, log};
use uuid::Uuid;
use wasm_bindgen::{JsCast, JsValue};

use crate::rest;

const KEY_AUTH_TOKEN: &str = "authToken";
const KEY_USER_DATA: &str = "userData";
const KEY_ANIMATION: &str = "glitterEnabled";
const KEY_PARTICLE_DENSITY: &str = "glitterCount";
const KEY_LOG: &str = "log";

pub trait KeyValue {
    fn get(&self, key: &str) -> Result<Option<String>, domain::PersistError>;
    fn set(&self, key: &str, value: &str) -> Result<(), domain::PersistError>;
    fn remove(&self, key: &str) -> Result<(), domain::PersistError>;
}

/// `window.localStorage`
#[derive(Debug, Clone, Copy, Default)]
pub struct Browser;

impl KeyValue for Browser {
    fn get(&self, key: &str) -> Result<Option<String>, domain::PersistError> {
        gloo_storage::LocalStorage::raw()
            .get_item(key)
            .map_err(js_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), domain::PersistError> {
        gloo_storage::LocalStorage::raw()
            .set_item(key, value)
            .map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), domain::PersistError> {
        gloo_storage::LocalStorage::raw()
            .remove_item(key)
            .map_err(js_error)
    }
}

fn js_error(err: JsValue) -> domain::PersistError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(exception) if exception.name() == "QuotaExceededError" => {
            domain::PersistError::QuotaExceeded
        }
        Some(exception) => domain::PersistError::Other(exception.message()),
        None => domain::PersistError::Other(format!("{err:?}")),
    }
}

/// Volatile storage for environments without `localStorage`.
#[derive(Debug, Default)]
pub struct Memory {
    entries: Mutex<HashMap<String, String>>,
    /// Maximum total length of all keys and values.
    quota: Option<usize>,
}

impl Memory {
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(quota),
        }
    }

    fn entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, domain::PersistError> {
        self.entries
            .lock()
            .map_err(|err| domain::PersistError::Other(err.to_string()))
    }
}

impl KeyValue for Memory {
    fn get(&self, key: &str) -> Result<Option<String>, domain::PersistError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), domain::PersistError> {
        let mut entries = self.entries()?;
        if let Some(quota) = self.quota {
            let used = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>();
            if used + key.len() + value.len() > quota {
                return Err(domain::PersistError::QuotaExceeded);
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), domain::PersistError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LocalStorage<B: KeyValue = Browser> {
    backend: B,
}

impl<B: KeyValue> LocalStorage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, domain::PersistError> {
        match self.backend.get(key)? {
            Some(value) => serde_json::from_str(&value)
                .map(Some)
                .map_err(|err| domain::PersistError::Other(format!("invalid {key}: {err}"))),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), domain::PersistError> {
        let value = serde_json::to_string(value)
            .map_err(|err| domain::PersistError::Other(err.to_string()))?;
        self.backend.set(key, &value)
    }
}

impl<B: KeyValue> PreferenceRepository for LocalStorage<B> {
    fn read_image_board(&self, key: &str) -> Result<Option<domain::ImageBoard>, domain::PersistError> {
        Ok(self.read_json::<Vec<ImageEntry>>(key)?.map(|entries| {
            domain::ImageBoard::new(entries.into_iter().map(domain::ImageEntry::from).collect())
        }))
    }

    fn write_image_board(
        &self,
        key: &str,
        board: &domain::ImageBoard,
    ) -> Result<(), domain::PersistError> {
        self.write_json(
            key,
            &board
                .entries()
                .iter()
                .map(ImageEntry::from)
                .collect::<Vec<_>>(),
        )
    }

    fn read_profile_picture(&self, key: &str) -> Result<Option<String>, domain::PersistError> {
        Ok(self.backend.get(key)?.filter(|p| !p.is_empty()))
    }

    fn write_profile_picture(
        &self,
        key: &str,
        profile_picture: &str,
    ) -> Result<(), domain::PersistError> {
        self.backend.set(key, profile_picture)
    }

    fn read_set_overrides(
        &self,
        key: &str,
    ) -> Result<Option<BTreeMap<domain::SetID, domain::SetOverride>>, domain::PersistError> {
        Ok(self
            .read_json::<BTreeMap<u32, SetOverride>>(key)?
            .map(|overrides| {
                overrides
                    .into_iter()
                    .map(|(id, o)| (domain::SetID::from(id), domain::SetOverride::from(o)))
                    .filter(|(_, o)| !o.is_empty())
                    .collect()
            }))
    }

    fn write_set_overrides(
        &self,
        key: &str,
        overrides: &BTreeMap<domain::SetID, domain::SetOverride>,
    ) -> Result<(), domain::PersistError> {
        self.write_json(
            key,
            &overrides
                .iter()
                .map(|(id, o)| (**id, SetOverride::from(o)))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn read_auth(&self) -> Result<Option<domain::Session>, domain::PersistError> {
        let token = self
            .backend
            .get(KEY_AUTH_TOKEN)?
            .and_then(|token| domain::AuthToken::new(&token));
        let user = self.read_json::<rest::User>(KEY_USER_DATA)?;
        Ok(match (token, user) {
            (Some(token), Some(user)) => Some(domain::Session {
                token,
                user: user.into(),
            }),
            _ => None,
        })
    }

    fn write_auth(&self, session: &domain::Session) -> Result<(), domain::PersistError> {
        self.backend.set(KEY_AUTH_TOKEN, session.token.as_ref())?;
        self.write_json(KEY_USER_DATA, &rest::User::from(session.user.clone()))
    }

    fn delete_auth(&self) -> Result<(), domain::PersistError> {
        self.backend.remove(KEY_AUTH_TOKEN)?;
        self.backend.remove(KEY_USER_DATA)
    }

    fn delete(&self, key: &str) -> Result<(), domain::PersistError> {
        self.backend.remove(key)
    }
}

impl<B: KeyValue> SettingsRepository for LocalStorage<B> {
    async fn read_settings(&self) -> Result<Settings, String> {
        let animation = match self
            .backend
            .get(KEY_ANIMATION)
            .map_err(|err| err.to_string())?
            .as_deref()
        {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        let settings = Settings {
            animation,
            ..Settings::default()
        };
        Ok(
            match self
                .backend
                .get(KEY_PARTICLE_DENSITY)
                .map_err(|err| err.to_string())?
                .and_then(|value| value.trim().parse::<u32>().ok())
            {
                Some(density) => {
                    settings.with_particle_density(u8::try_from(density).unwrap_or(u8::MAX))
                }
                None => settings,
            },
        )
    }

    async fn write_settings(&self, settings: Settings) -> Result<(), String> {
        match settings.animation {
            Some(animation) => self.backend.set(KEY_ANIMATION, &animation.to_string()),
            None => self.backend.remove(KEY_ANIMATION),
        }
        .map_err(|err| err.to_string())?;
        self.backend
            .set(KEY_PARTICLE_DENSITY, &settings.particle_density.to_string())
            .map_err(|err| err.to_string())
    }
}

impl<B: KeyValue + Send + Sync + 'static> log::Repository for LocalStorage<B> {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        self.read_json(KEY_LOG)
            .map(Option::unwrap_or_default)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        let mut entries = self.read_entries()?;
        log::prepend(&mut entries, entry);
        self.write_json(KEY_LOG, &entries)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ImageEntry {
    id: String,
    url: String,
    workout_id: Option<u32>,
    /// Creation time in milliseconds since the epoch.
    ts: i64,
}

impl From<ImageEntry> for domain::ImageEntry {
    fn from(value: ImageEntry) -> Self {
        domain::ImageEntry {
            id: Uuid::parse_str(&value.id)
                .map(domain::ImageID::from)
                .unwrap_or_default(),
            url: value.url,
            workout_id: value.workout_id.map(domain::WorkoutID::from),
            created: DateTime::from_timestamp_millis(value.ts).unwrap_or_default(),
        }
    }
}

impl From<&domain::ImageEntry> for ImageEntry {
    fn from(value: &domain::ImageEntry) -> Self {
        Self {
            id: Uuid::from(value.id).to_string(),
            url: value.url.clone(),
            workout_id: value.workout_id.map(|id| *id),
            ts: value.created.timestamp_millis(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct SetOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
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

impl From<SetOverride> for domain::SetOverride {
    fn from(value: SetOverride) -> Self {
        domain::SetOverride {
            done: value.done,
            edit: domain::SetPatch {
                set_type: value.set_type.and_then(|t| t.parse().ok()),
                reps: value.reps.map(domain::Reps::new),
                weight: value.weight.and_then(|w| domain::Weight::new(w).ok()),
                duration: value.duration.map(domain::Seconds::new),
                distance: value.distance.and_then(|d| domain::Distance::new(d).ok()),
                rest_time: value.rest_time.map(domain::Seconds::new),
                notes: value.notes,
            },
        }
    }
}

impl From<&domain::SetOverride> for SetOverride {
    fn from(value: &domain::SetOverride) -> Self {
        let edit = &value.edit;
        Self {
            done: value.done,
            set_type: edit.set_type.map(|t| t.to_string()),
            reps: edit.reps.map(u32::from),
            weight: edit.weight.map(f32::from),
            duration: edit.duration.map(u32::from),
            distance: edit.distance.map(f32::from),
            rest_time: edit.rest_time.map(u32::from),
            notes: edit.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use spotter_web_app::{PreferenceService, Service, log};

    use crate::tests::data::USER;

    use super::*;

    fn storage() -> LocalStorage<Memory> {
        LocalStorage::new(Memory::default())
    }

    fn entry(url: &str, workout_id: Option<u32>) -> domain::ImageEntry {
        domain::ImageEntry {
            id: domain::ImageID::new(),
            url: url.to_string(),
            workout_id: workout_id.map(domain::WorkoutID::from),
            created: Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_image_board() {
        let storage = storage();
        let board = domain::ImageBoard::new(vec![entry("data:a", Some(7)), entry("data:b", None)]);
        assert_eq!(storage.read_image_board("imageBoard:1"), Ok(None));
        storage.write_image_board("imageBoard:1", &board).unwrap();
        assert_eq!(storage.read_image_board("imageBoard:1"), Ok(Some(board)));
    }

    #[test]
    fn test_image_board_legacy_format() {
        let storage = storage();
        storage
            .backend
            .set(
                "imageBoard",
                r#"[{"id":"1717264800000-k3j2h1","url":"data:a","workoutId":7,"ts":1717264800000}]"#,
            )
            .unwrap();
        let board = storage.read_image_board("imageBoard").unwrap().unwrap();
        let entry = &board.entries()[0];
        assert_eq!(entry.url, "data:a");
        assert_eq!(entry.workout_id, Some(7.into()));
        assert_eq!(
            entry.created,
            Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_image_board_malformed() {
        let storage = storage();
        storage.backend.set("imageBoard:1", "{").unwrap();
        assert!(matches!(
            storage.read_image_board("imageBoard:1"),
            Err(domain::PersistError::Other(_))
        ));
    }

    #[test]
    fn test_image_board_quota_exceeded() {
        let storage = LocalStorage::new(Memory::with_quota(64));
        let board = domain::ImageBoard::new(vec![entry(&"x".repeat(100), None)]);
        assert_eq!(
            storage.write_image_board("imageBoard:1", &board),
            Err(domain::PersistError::QuotaExceeded)
        );
        assert_eq!(storage.read_image_board("imageBoard:1"), Ok(None));
    }

    #[test]
    fn test_profile_picture() {
        let storage = storage();
        assert_eq!(storage.read_profile_picture("profilePic:1"), Ok(None));
        storage
            .write_profile_picture("profilePic:1", "data:image/png;base64,AAAA")
            .unwrap();
        assert_eq!(
            storage.backend.get("profilePic:1"),
            Ok(Some(String::from("data:image/png;base64,AAAA")))
        );
        storage.delete("profilePic:1").unwrap();
        assert_eq!(storage.read_profile_picture("profilePic:1"), Ok(None));
    }

    #[test]
    fn test_set_overrides() {
        let storage = storage();
        let overrides = BTreeMap::from([
            (
                domain::SetID::from(21),
                domain::SetOverride {
                    done: Some(true),
                    edit: domain::SetPatch {
                        reps: Some(domain::Reps::new(12)),
                        ..domain::SetPatch::default()
                    },
                },
            ),
            (
                domain::SetID::from(22),
                domain::SetOverride {
                    done: None,
                    edit: domain::SetPatch {
                        set_type: Some(domain::SetType::Warmup),
                        weight: Some(domain::Weight::new(42.5).unwrap()),
                        ..domain::SetPatch::default()
                    },
                },
            ),
        ]);
        storage
            .write_set_overrides("setOverrides:7", &overrides)
            .unwrap();
        assert_eq!(
            storage.backend.get("setOverrides:7"),
            Ok(Some(String::from(
                r#"{"21":{"done":true,"reps":12},"22":{"set_type":"warmup","weight":42.5}}"#
            )))
        );
        assert_eq!(
            storage.read_set_overrides("setOverrides:7"),
            Ok(Some(overrides))
        );
    }

    #[test]
    fn test_set_overrides_drop_unusable_entries() {
        let storage = storage();
        storage
            .backend
            .set(
                "setOverrides:7",
                r#"{"21":{},"22":{"weight":-1},"23":{"done":false}}"#,
            )
            .unwrap();
        assert_eq!(
            storage.read_set_overrides("setOverrides:7"),
            Ok(Some(BTreeMap::from([(
                domain::SetID::from(23),
                domain::SetOverride {
                    done: Some(false),
                    edit: domain::SetPatch::default()
                }
            )])))
        );
    }

    #[test]
    fn test_auth() {
        let storage = storage();
        let session = domain::Session {
            token: domain::AuthToken::new("abc").unwrap(),
            user: USER.clone(),
        };
        assert_eq!(storage.read_auth(), Ok(None));
        storage.write_auth(&session).unwrap();
        assert_eq!(
            storage.backend.get(KEY_AUTH_TOKEN),
            Ok(Some(String::from("abc")))
        );
        assert_eq!(storage.read_auth(), Ok(Some(session)));
        storage.delete_auth().unwrap();
        assert_eq!(storage.read_auth(), Ok(None));
        assert_eq!(storage.backend.get(KEY_USER_DATA), Ok(None));
    }

    #[test]
    fn test_auth_requires_token_and_user() {
        let storage = storage();
        storage.backend.set(KEY_AUTH_TOKEN, "abc").unwrap();
        assert_eq!(storage.read_auth(), Ok(None));
        storage.backend.remove(KEY_AUTH_TOKEN).unwrap();
        storage
            .backend
            .set(
                KEY_USER_DATA,
                r#"{"id":1,"username":"alice","email":null,"profile_picture":null}"#,
            )
            .unwrap();
        assert_eq!(storage.read_auth(), Ok(None));
    }

    #[rstest]
    #[case(None, None, Settings::default())]
    #[case(Some("true"), Some("24"), Settings { animation: Some(true), particle_density: 24 })]
    #[case(Some("false"), Some("1000"), Settings { animation: Some(false), particle_density: 80 })]
    #[case(Some("yes"), Some("many"), Settings::default())]
    fn test_read_settings(
        #[case] animation: Option<&str>,
        #[case] particle_density: Option<&str>,
        #[case] expected: Settings,
    ) {
        let storage = storage();
        if let Some(animation) = animation {
            storage.backend.set(KEY_ANIMATION, animation).unwrap();
        }
        if let Some(particle_density) = particle_density {
            storage
                .backend
                .set(KEY_PARTICLE_DENSITY, particle_density)
                .unwrap();
        }
        assert_eq!(block_on(storage.read_settings()), Ok(expected));
    }

    #[test]
    fn test_write_settings() {
        let storage = storage();
        let settings = Settings {
            animation: Some(false),
            particle_density: 32,
        };
        block_on(storage.write_settings(settings)).unwrap();
        assert_eq!(
            storage.backend.get(KEY_ANIMATION),
            Ok(Some(String::from("false")))
        );
        assert_eq!(
            storage.backend.get(KEY_PARTICLE_DENSITY),
            Ok(Some(String::from("32")))
        );
        assert_eq!(block_on(storage.read_settings()), Ok(settings));

        block_on(storage.write_settings(Settings::default())).unwrap();
        assert_eq!(storage.backend.get(KEY_ANIMATION), Ok(None));
    }

    #[test]
    fn test_log() {
        let storage = storage();
        for i in 0..=log::LOG_LIMIT {
            log::Repository::write_entry(
                &storage,
                log::Entry {
                    time: String::from("Jun 01 18:00:00"),
                    level: ::log::Level::Info,
                    message: format!("{i}"),
                },
            )
            .unwrap();
        }
        let entries = log::Repository::read_entries(&storage).unwrap();
        assert_eq!(entries.len(), log::LOG_LIMIT);
        assert_eq!(entries[0].message, log::LOG_LIMIT.to_string());
    }

    #[test]
    fn test_legacy_image_board_migration() {
        let storage = storage();
        storage
            .backend
            .set(
                "imageBoard",
                r#"[{"id":"1-a","url":"data:a","workoutId":null,"ts":0}]"#,
            )
            .unwrap();
        let service = Service::new(storage);
        let alice = domain::Identity::resolve(Some(&USER));

        assert_eq!(service.get_image_board(&alice).len(), 1);
        assert_eq!(
            service.get_image_board(&domain::Identity::Guest).len(),
            0
        );
    }

    #[test]
    fn test_memory_quota_counts_replaced_value_once() {
        let memory = Memory::with_quota(10);
        memory.set("k", "123456789").unwrap();
        memory.set("k", "987654321").unwrap();
        assert_eq!(
            memory.set("l", "1"),
            Err(domain::PersistError::QuotaExceeded)
        );
    }
}
