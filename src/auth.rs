//! Token models consumed by requests and persisted by session state.

pub mod token;

pub use token::{response::*, secret::*};
