#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod log;
mod persist;
mod preferences;
mod service;
mod settings;
mod state;

pub use persist::*;
pub use preferences::*;
pub use service::*;
pub use settings::*;
pub use state::*;
