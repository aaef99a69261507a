use std::collections::{BTreeMap, VecDeque};

use log::{debug, error};
use spotter_domain::{
    IMAGE_BOARD_KEY, Identity, ImageBoard, PROFILE_PICTURE_KEY, PersistError, Session, SetID,
    SetOverride, WorkoutID, scoped_key, session_key,
};

use crate::{
    PreferenceRepository, PreferenceService, Settings, SettingsRepository, SettingsService,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

impl<R: crate::log::Repository> crate::log::Service for Service<R> {
    fn get_log_entries(&self) -> Result<VecDeque<crate::log::Entry>, crate::log::Error> {
        self.repository.read_entries()
    }

    fn add_log_entry(&self, entry: crate::log::Entry) -> Result<(), crate::log::Error> {
        self.repository.write_entry(entry)
    }
}

impl<R: SettingsRepository> SettingsService for Service<R> {
    async fn get_settings(&self) -> Result<Settings, String> {
        self.repository.read_settings().await
    }

    async fn set_settings(&self, settings: Settings) -> Result<(), String> {
        self.repository.write_settings(settings).await
    }
}

impl<R: PreferenceRepository> PreferenceService for Service<R> {
    fn get_image_board(&self, identity: &Identity) -> ImageBoard {
        let key = scoped_key(IMAGE_BOARD_KEY, identity);
        match self.repository.read_image_board(&key) {
            Ok(Some(board)) => board,
            Ok(None) => {
                let board = match self.repository.read_image_board(IMAGE_BOARD_KEY) {
                    Ok(Some(legacy)) => {
                        debug!("migrating image board to {key}");
                        legacy
                    }
                    Ok(None) => ImageBoard::default(),
                    Err(err) => {
                        error!("failed to read legacy image board: {err}");
                        ImageBoard::default()
                    }
                };
                // an existing scoped entry prevents any later migration for this user
                match self.repository.write_image_board(&key, &board) {
                    Ok(()) => {
                        if !board.is_empty() {
                            self.remove_legacy(IMAGE_BOARD_KEY);
                        }
                    }
                    Err(err) => error!("failed to write image board: {err}"),
                }
                board
            }
            Err(err) => {
                error!("failed to read image board: {err}");
                ImageBoard::default()
            }
        }
    }

    fn set_image_board(&self, identity: &Identity, board: &ImageBoard) -> Result<(), PersistError> {
        let result = self
            .repository
            .write_image_board(&scoped_key(IMAGE_BOARD_KEY, identity), board);
        if let Err(ref err) = result {
            error!("failed to write image board: {err}");
        }
        result
    }

    fn get_profile_picture(&self, identity: &Identity) -> Option<String> {
        let key = scoped_key(PROFILE_PICTURE_KEY, identity);
        match self.repository.read_profile_picture(&key) {
            Ok(Some(profile_picture)) => Some(profile_picture),
            Ok(None) => {
                let legacy = match self.repository.read_profile_picture(PROFILE_PICTURE_KEY) {
                    Ok(legacy) => legacy?,
                    Err(err) => {
                        error!("failed to read legacy profile picture: {err}");
                        return None;
                    }
                };
                debug!("migrating profile picture to {key}");
                match self.repository.write_profile_picture(&key, &legacy) {
                    Ok(()) => self.remove_legacy(PROFILE_PICTURE_KEY),
                    Err(err) => error!("failed to write profile picture: {err}"),
                }
                Some(legacy)
            }
            Err(err) => {
                error!("failed to read profile picture: {err}");
                None
            }
        }
    }

    fn set_profile_picture(
        &self,
        identity: &Identity,
        profile_picture: Option<&str>,
    ) -> Result<(), PersistError> {
        let key = scoped_key(PROFILE_PICTURE_KEY, identity);
        let result = match profile_picture {
            Some(profile_picture) => self.repository.write_profile_picture(&key, profile_picture),
            None => self.repository.delete(&key),
        };
        if let Err(ref err) = result {
            error!("failed to write profile picture: {err}");
        }
        result
    }

    fn get_set_overrides(&self, session: WorkoutID) -> BTreeMap<SetID, SetOverride> {
        match self.repository.read_set_overrides(&session_key(session)) {
            Ok(overrides) => overrides.unwrap_or_default(),
            Err(err) => {
                error!("failed to read set overrides: {err}");
                BTreeMap::new()
            }
        }
    }

    fn set_set_overrides(
        &self,
        session: WorkoutID,
        overrides: &BTreeMap<SetID, SetOverride>,
    ) -> Result<(), PersistError> {
        let result = self
            .repository
            .write_set_overrides(&session_key(session), overrides);
        if let Err(ref err) = result {
            error!("failed to write set overrides: {err}");
        }
        result
    }

    fn get_auth(&self) -> Option<Session> {
        match self.repository.read_auth() {
            Ok(session) => session,
            Err(err) => {
                error!("failed to read authentication: {err}");
                None
            }
        }
    }

    fn set_auth(&self, session: Option<&Session>) -> Result<(), PersistError> {
        let result = match session {
            Some(session) => self.repository.write_auth(session),
            None => self.repository.delete_auth(),
        };
        if let Err(ref err) = result {
            error!("failed to write authentication: {err}");
        }
        result
    }
}

impl<R: PreferenceRepository> Service<R> {
    fn remove_legacy(&self, key: &str) {
        if let Err(err) = self.repository.delete(key) {
            error!("failed to remove legacy {key}: {err}");
        }
    }
}
