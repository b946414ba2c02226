//! Ball module - state, force integration, collision response and weather

mod collision;
mod components;
mod physics;
mod weather;

pub use collision::*;
pub use components::*;
pub use physics::*;
pub use weather::*;
