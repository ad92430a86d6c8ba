//! Token response model and the redacting secret wrapper.

pub mod response;
pub mod secret;
