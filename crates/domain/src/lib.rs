#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod auth;
mod calculator;
mod error;
mod exercise;
mod field;
mod name;
mod preference;
mod reconcile;
mod service;
mod set_input;
mod set_override;
mod statistics;
mod user;
mod value;
mod workout;

pub use auth::*;
pub use calculator::*;
pub use error::*;
pub use exercise::*;
pub use field::*;
pub use name::*;
pub use preference::*;
pub use reconcile::*;
pub use service::*;
pub use set_input::*;
pub use set_override::*;
pub use statistics::*;
pub use user::*;
pub use value::*;
pub use workout::*;
