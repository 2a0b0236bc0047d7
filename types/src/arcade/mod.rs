//! Arcade domain types.
//!
//! Defines game/round/profile/limit state and constants used by the execution layer
//! and clients.

mod constants;
mod game;
mod limits;
mod profile;

pub use constants::*;
pub use game::*;
pub use limits::*;
pub use profile::*;
