//! Core SAML types and configuration.

mod config;
mod constants;
mod response;

pub use config::*;
pub use constants::*;
pub use response::*;
