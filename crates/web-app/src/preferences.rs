use std::collections::BTreeMap;

use spotter_domain::{
    Identity, ImageBoard, PersistError, Session, SetID, SetOverride, WorkoutID,
};

/// Local state that is kept in the browser instead of on the server.
///
/// Image board and profile picture are scoped by user, set overrides by workout session. The
/// authentication snapshot is global.
pub trait PreferenceService {
    fn get_image_board(&self, identity: &Identity) -> ImageBoard;
    fn set_image_board(&self, identity: &Identity, board: &ImageBoard) -> Result<(), PersistError>;

    fn get_profile_picture(&self, identity: &Identity) -> Option<String>;
    fn set_profile_picture(
        &self,
        identity: &Identity,
        profile_picture: Option<&str>,
    ) -> Result<(), PersistError>;

    fn get_set_overrides(&self, session: WorkoutID) -> BTreeMap<SetID, SetOverride>;
    fn set_set_overrides(
        &self,
        session: WorkoutID,
        overrides: &BTreeMap<SetID, SetOverride>,
    ) -> Result<(), PersistError>;

    fn get_auth(&self) -> Option<Session>;
    fn set_auth(&self, session: Option<&Session>) -> Result<(), PersistError>;
}

/// Raw access to the key-value namespaces.
pub trait PreferenceRepository {
    fn read_image_board(&self, key: &str) -> Result<Option<ImageBoard>, PersistError>;
    fn write_image_board(&self, key: &str, board: &ImageBoard) -> Result<(), PersistError>;

    fn read_profile_picture(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn write_profile_picture(&self, key: &str, profile_picture: &str) -> Result<(), PersistError>;

    fn read_set_overrides(
        &self,
        key: &str,
    ) -> Result<Option<BTreeMap<SetID, SetOverride>>, PersistError>;
    fn write_set_overrides(
        &self,
        key: &str,
        overrides: &BTreeMap<SetID, SetOverride>,
    ) -> Result<(), PersistError>;

    fn read_auth(&self) -> Result<Option<Session>, PersistError>;
    fn write_auth(&self, session: &Session) -> Result<(), PersistError>;
    fn delete_auth(&self) -> Result<(), PersistError>;

    fn delete(&self, key: &str) -> Result<(), PersistError>;
}
