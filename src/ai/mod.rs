//! AI module - goalkeeper decision model, prediction and agent

mod cache;
mod decision;
mod goalkeeper;
mod memory;
mod prediction;

pub use cache::*;
pub use decision::*;
pub use goalkeeper::*;
pub use memory::*;
pub use prediction::*;
