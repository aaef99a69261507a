use log::error;

#[allow(async_fn_in_trait)]
pub trait SettingsService {
    async fn get_settings(&self) -> Result<Settings, String>;
    async fn set_settings(&self, settings: Settings) -> Result<(), String>;
}

#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    async fn read_settings(&self) -> Result<Settings, String>;
    async fn write_settings(&self, settings: Settings) -> Result<(), String>;
}

/// Device-wide animation preferences.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// `None` if the user has not chosen yet.
    pub animation: Option<bool>,
    pub particle_density: u8,
}

impl Settings {
    pub const MIN_PARTICLE_DENSITY: u8 = 8;
    pub const MAX_PARTICLE_DENSITY: u8 = 80;
    pub const PARTICLE_DENSITY_STEP: u8 = 4;
    pub const DEFAULT_PARTICLE_DENSITY: u8 = 48;

    #[must_use]
    pub fn animation_enabled(&self) -> bool {
        self.animation_enabled_with(prefers_reduced_motion())
    }

    /// Without an explicit choice, animations are only shown if reduced motion is not requested.
    #[must_use]
    pub fn animation_enabled_with(&self, prefers_reduced_motion: bool) -> bool {
        self.animation.unwrap_or(!prefers_reduced_motion)
    }

    /// Clamp the value into the supported range and round it down to a valid step.
    #[must_use]
    pub fn with_particle_density(self, particle_density: u8) -> Self {
        let clamped =
            particle_density.clamp(Self::MIN_PARTICLE_DENSITY, Self::MAX_PARTICLE_DENSITY);
        let stepped = clamped
            - (clamped - Self::MIN_PARTICLE_DENSITY) % Self::PARTICLE_DENSITY_STEP;
        Self {
            particle_density: stepped,
            ..self
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animation: None,
            particle_density: Self::DEFAULT_PARTICLE_DENSITY,
        }
    }
}

fn prefers_reduced_motion() -> bool {
    let Some(window) = web_sys::window() else {
        error!("failed to access window to determine preferred motion");
        return false;
    };
    match window.match_media("(prefers-reduced-motion: reduce)") {
        Ok(Some(media_query_list)) => media_query_list.matches(),
        Ok(None) => {
            error!("failed to determine preferred motion");
            false
        }
        Err(_) => {
            error!("failed to match media to determine preferred motion");
            false
        }
    }
}
