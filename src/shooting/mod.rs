//! Shooting module - shot command contract, charge meter and aim

mod charge;
mod command;

pub use charge::*;
pub use command::*;
